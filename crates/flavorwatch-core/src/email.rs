//! Email bodies sent to subscribers.
//!
//! Every interpolated value is HTML-escaped; flavor names and patterns come
//! from scraped pages and user input respectively.

use crate::{mail::OutgoingEmail, matcher::Notification};

/// Build the confirm-your-subscription email.
pub fn confirm_email(from: &str, to: &str, flavor_pattern: &str, confirm_url: &str) -> OutgoingEmail {
  let html = format!(
    r#"<!DOCTYPE html>
<html>
<body style="font-family:sans-serif;max-width:500px;margin:40px auto;color:#3D2817">
  <h2>🍦 Confirm your subscription</h2>
  <p>You asked to be notified when <strong>{pattern}</strong> is available.</p>
  <p style="margin:30px 0">
    <a href="{url}"
       style="background:#FF6B9D;color:white;padding:14px 28px;border-radius:25px;text-decoration:none;font-weight:700;font-size:1rem">
      Confirm Subscription
    </a>
  </p>
  <p style="font-size:12px;color:#999">If you didn't request this, you can safely ignore this email.</p>
</body>
</html>"#,
    pattern = html_escape(flavor_pattern),
    url = html_escape(confirm_url),
  );

  OutgoingEmail {
    from: from.to_owned(),
    to: to.to_owned(),
    subject: "Confirm your flavor alert subscription".to_owned(),
    html,
  }
}

/// Build the grouped "your flavor just appeared" email for one subscriber.
pub fn notify_email(
  from: &str,
  notification: &Notification,
  app_url: &str,
  unsubscribe_url: &str,
) -> OutgoingEmail {
  let lines: String = notification
    .items
    .iter()
    .map(|i| {
      format!(
        "<li>{}: {}</li>",
        html_escape(&i.location_name),
        html_escape(&i.item_name)
      )
    })
    .collect();

  let headline = notification
    .items
    .first()
    .map_or("Your flavor", |i| i.item_name.as_str());

  let html = format!(
    r#"<!DOCTYPE html>
<html>
<body style="font-family:sans-serif;max-width:500px;margin:40px auto;color:#3D2817">
  <h2>🍦 The flavor you're watching just appeared!</h2>
  <ul style="line-height:1.8">{lines}</ul>
  <p style="margin:30px 0">
    <a href="{app}"
       style="background:#FF6B9D;color:white;padding:14px 28px;border-radius:25px;text-decoration:none;font-weight:700;font-size:1rem">
      Check the Tracker
    </a>
  </p>
  <p style="font-size:12px;color:#999"><a href="{unsub}" style="color:#999">Unsubscribe</a></p>
</body>
</html>"#,
    app = html_escape(app_url),
    unsub = html_escape(unsubscribe_url),
  );

  OutgoingEmail {
    from: from.to_owned(),
    to: notification.subscription.email.clone(),
    subject: format!("{headline} is available! 🍦"),
    html,
  }
}

fn html_escape(s: &str) -> String {
  s.replace('&', "&amp;")
    .replace('<', "&lt;")
    .replace('>', "&gt;")
    .replace('"', "&quot;")
    .replace('\'', "&#39;")
}

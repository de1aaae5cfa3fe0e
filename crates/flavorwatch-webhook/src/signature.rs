//! Svix-style webhook signature verification.
//!
//! The provider signs `"{svix-id}.{svix-timestamp}." ++ body` with
//! HMAC-SHA256 and sends one or more `v1,<base64>` candidates in
//! `svix-signature`, separated by spaces. Any matching `v1` candidate makes
//! the request authentic.

use axum::http::HeaderMap;
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const ID_HEADER: &str = "svix-id";
pub const TIMESTAMP_HEADER: &str = "svix-timestamp";
pub const SIGNATURE_HEADER: &str = "svix-signature";

/// Maximum distance, in seconds, between the signed timestamp and now.
pub const TOLERANCE_SECS: u64 = 300;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
  #[error("missing {0} header")]
  MissingHeader(&'static str),
  #[error("timestamp is not a unix time")]
  InvalidTimestamp,
  #[error("timestamp outside the tolerance window")]
  Expired,
  #[error("no signature matched")]
  NoMatch,
}

#[derive(Debug, Error)]
pub enum SecretError {
  #[error("webhook secret is empty")]
  Empty,
  #[error("webhook secret is not valid base64: {0}")]
  Base64(#[from] base64::DecodeError),
  #[error("webhook secret is not a usable HMAC key")]
  Key,
}

/// A decoded signing secret, ready to key HMAC instances.
#[derive(Clone)]
pub struct WebhookSecret {
  mac: HmacSha256,
}

impl WebhookSecret {
  /// Accepts `whsec_<base64>`; a value without the prefix is decoded as-is.
  pub fn parse(raw: &str) -> Result<Self, SecretError> {
    let raw = raw.trim();
    let encoded = raw.strip_prefix("whsec_").unwrap_or(raw);
    if encoded.is_empty() {
      return Err(SecretError::Empty);
    }
    let key = B64.decode(encoded)?;
    let mac = HmacSha256::new_from_slice(&key).map_err(|_| SecretError::Key)?;
    Ok(Self { mac })
  }

  fn sign(&self, id: &str, timestamp: &str, body: &[u8]) -> HmacSha256 {
    let mut mac = self.mac.clone();
    mac.update(id.as_bytes());
    mac.update(b".");
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);
    mac
  }
}

/// Verify `body` against the signature headers at the current time.
pub fn verify_signature(
  secret: &WebhookSecret,
  headers: &HeaderMap,
  body: &[u8],
) -> Result<(), SignatureError> {
  verify_signature_at(secret, headers, body, chrono::Utc::now().timestamp())
}

/// Verify `body` as if the current unix time were `now`.
pub fn verify_signature_at(
  secret: &WebhookSecret,
  headers: &HeaderMap,
  body: &[u8],
  now: i64,
) -> Result<(), SignatureError> {
  let id = header(headers, ID_HEADER)?;
  let timestamp = header(headers, TIMESTAMP_HEADER)?;
  let signatures = header(headers, SIGNATURE_HEADER)?;

  let sent_at: i64 = timestamp
    .trim()
    .parse()
    .map_err(|_| SignatureError::InvalidTimestamp)?;
  if now.abs_diff(sent_at) > TOLERANCE_SECS {
    return Err(SignatureError::Expired);
  }

  let mac = secret.sign(id, timestamp, body);

  let matched = signatures
    .split_whitespace()
    .filter_map(|candidate| candidate.strip_prefix("v1,"))
    .filter_map(|encoded| B64.decode(encoded).ok())
    .any(|expected| mac.clone().verify_slice(&expected).is_ok());

  if matched { Ok(()) } else { Err(SignatureError::NoMatch) }
}

fn header<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, SignatureError> {
  headers
    .get(name)
    .and_then(|v| v.to_str().ok())
    .filter(|v| !v.is_empty())
    .ok_or(SignatureError::MissingHeader(name))
}

#[cfg(test)]
pub(crate) mod tests {
  use axum::http::HeaderValue;

  use super::*;

  pub const SECRET: &str = "whsec_MfKQ9r8GKYqrTwjUPD8ILPZIo2LaLaSw";
  const NOW: i64 = 1_700_000_000;

  /// Sign `body` the way the provider does.
  pub fn sign(secret: &str, id: &str, timestamp: i64, body: &[u8]) -> String {
    let key = B64.decode(secret.trim_start_matches("whsec_")).unwrap();
    let mut mac = HmacSha256::new_from_slice(&key).unwrap();
    mac.update(format!("{id}.{timestamp}.").as_bytes());
    mac.update(body);
    format!("v1,{}", B64.encode(mac.finalize().into_bytes()))
  }

  pub fn signed_headers(id: &str, timestamp: i64, signature: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ID_HEADER, HeaderValue::from_str(id).unwrap());
    headers.insert(TIMESTAMP_HEADER, HeaderValue::from_str(&timestamp.to_string()).unwrap());
    headers.insert(SIGNATURE_HEADER, HeaderValue::from_str(signature).unwrap());
    headers
  }

  fn secret() -> WebhookSecret { WebhookSecret::parse(SECRET).unwrap() }

  const BODY: &[u8] = br#"{"type":"email.bounced","data":{"to":["a@example.com"]}}"#;

  #[test]
  fn valid_signature_is_accepted() {
    let headers = signed_headers("msg_1", NOW, &sign(SECRET, "msg_1", NOW, BODY));
    assert_eq!(verify_signature_at(&secret(), &headers, BODY, NOW), Ok(()));
  }

  #[test]
  fn any_v1_candidate_may_match() {
    let good = sign(SECRET, "msg_1", NOW, BODY);
    let list = format!("v2,ignored v1,!!notbase64!! v1,AAAA {good}");
    let headers = signed_headers("msg_1", NOW, &list);
    assert_eq!(verify_signature_at(&secret(), &headers, BODY, NOW), Ok(()));
  }

  #[test]
  fn non_v1_candidate_never_matches() {
    let good = sign(SECRET, "msg_1", NOW, BODY).replacen("v1,", "v2,", 1);
    let headers = signed_headers("msg_1", NOW, &good);
    assert_eq!(
      verify_signature_at(&secret(), &headers, BODY, NOW),
      Err(SignatureError::NoMatch)
    );
  }

  #[test]
  fn tampered_body_is_rejected() {
    let headers = signed_headers("msg_1", NOW, &sign(SECRET, "msg_1", NOW, BODY));
    assert_eq!(
      verify_signature_at(&secret(), &headers, b"{\"type\":\"other\"}", NOW),
      Err(SignatureError::NoMatch)
    );
  }

  #[test]
  fn signature_binds_the_message_id() {
    let headers = signed_headers("msg_2", NOW, &sign(SECRET, "msg_1", NOW, BODY));
    assert_eq!(
      verify_signature_at(&secret(), &headers, BODY, NOW),
      Err(SignatureError::NoMatch)
    );
  }

  #[test]
  fn wrong_secret_is_rejected() {
    let other = "whsec_dGhpcyBpcyBhIGRpZmZlcmVudCBzZWNyZXQ=";
    let headers = signed_headers("msg_1", NOW, &sign(other, "msg_1", NOW, BODY));
    assert_eq!(
      verify_signature_at(&secret(), &headers, BODY, NOW),
      Err(SignatureError::NoMatch)
    );
  }

  #[test]
  fn missing_headers_are_reported() {
    for name in [ID_HEADER, TIMESTAMP_HEADER, SIGNATURE_HEADER] {
      let mut headers = signed_headers("msg_1", NOW, &sign(SECRET, "msg_1", NOW, BODY));
      headers.remove(name);
      assert_eq!(
        verify_signature_at(&secret(), &headers, BODY, NOW),
        Err(SignatureError::MissingHeader(name))
      );
    }
  }

  #[test]
  fn timestamp_window_is_enforced() {
    let old = NOW - 301;
    let headers = signed_headers("msg_1", old, &sign(SECRET, "msg_1", old, BODY));
    assert_eq!(
      verify_signature_at(&secret(), &headers, BODY, NOW),
      Err(SignatureError::Expired)
    );

    let future = NOW + 299;
    let headers = signed_headers("msg_1", future, &sign(SECRET, "msg_1", future, BODY));
    assert_eq!(verify_signature_at(&secret(), &headers, BODY, NOW), Ok(()));
  }

  #[test]
  fn unparseable_timestamp_is_rejected() {
    let mut headers = signed_headers("msg_1", NOW, "v1,AAAA");
    headers.insert(TIMESTAMP_HEADER, HeaderValue::from_static("yesterday"));
    assert_eq!(
      verify_signature_at(&secret(), &headers, BODY, NOW),
      Err(SignatureError::InvalidTimestamp)
    );
  }

  #[test]
  fn secret_prefix_is_optional() {
    let bare = SECRET.trim_start_matches("whsec_");
    let headers = signed_headers("msg_1", NOW, &sign(SECRET, "msg_1", NOW, BODY));
    let secret = WebhookSecret::parse(bare).unwrap();
    assert_eq!(verify_signature_at(&secret, &headers, BODY, NOW), Ok(()));
  }

  #[test]
  fn malformed_secrets_are_rejected() {
    assert!(matches!(WebhookSecret::parse("whsec_"), Err(SecretError::Empty)));
    assert!(matches!(WebhookSecret::parse("whsec_%%%"), Err(SecretError::Base64(_))));
  }
}

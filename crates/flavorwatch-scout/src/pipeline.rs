//! One end-to-end run: discover, reconcile, refresh, detect, notify.

use chrono::NaiveDate;
use flavorwatch_core::{
  fetch::Fetcher, location::Location, mail::Mailer, observation::ItemObservation,
  reconcile::ReconcilePolicy, store::FlavorStore,
};
use tracing::{error, info, warn};

use crate::{
  config::ScoutConfig,
  detector, discovery,
  ledger::{self, LocationOutcome},
  notifier::{self, NotifyReport, NotifySettings},
  reconciler::{self, ReconcileReport},
};

#[derive(Debug, Clone)]
pub struct PipelineSettings {
  pub site_url:    String,
  pub policy:      ReconcilePolicy,
  /// Upper bound on concurrent location refreshes.
  pub concurrency: usize,
  pub notify:      NotifySettings,
}

impl PipelineSettings {
  pub fn from_config(cfg: &ScoutConfig) -> Self {
    Self {
      site_url:    cfg.site_url.clone(),
      policy:      cfg.reconcile,
      concurrency: cfg.concurrency,
      notify:      NotifySettings {
        from:        cfg.mail_from.clone(),
        app_url:     cfg.app_url.clone(),
        concurrency: cfg.concurrency,
      },
    }
  }
}

/// Everything a run observed. Stages that did not run are `None`.
#[derive(Debug, Default)]
pub struct RunReport {
  /// Locations found on the directory page, if discovery succeeded.
  pub discovered: Option<usize>,
  pub reconcile:  Option<ReconcileReport>,
  pub locations:  Vec<LocationOutcome>,
  pub new_items:  Vec<ItemObservation>,
  pub notify:     Option<NotifyReport>,
}

impl RunReport {
  pub fn failed_locations(&self) -> usize {
    self
      .locations
      .iter()
      .filter(|o| matches!(o, LocationOutcome::Failed { .. }))
      .count()
  }
}

pub struct Pipeline<S, F, M> {
  store:    S,
  fetcher:  F,
  /// Without a mailer, notification is skipped.
  mailer:   Option<M>,
  settings: PipelineSettings,
}

impl<S: FlavorStore, F: Fetcher, M: Mailer> Pipeline<S, F, M> {
  pub fn new(store: S, fetcher: F, mailer: Option<M>, settings: PipelineSettings) -> Self {
    Self { store, fetcher, mailer, settings }
  }

  pub fn store(&self) -> &S { &self.store }

  /// Run every stage for `today`. Never fails: each stage logs and contains
  /// its own errors so the later stages still run.
  pub async fn run(&self, today: NaiveDate) -> RunReport {
    let mut report = RunReport::default();

    self.discover_and_reconcile(&mut report).await;

    let locations = match self.store.list_active_locations().await {
      Ok(locations) => locations,
      Err(e) => {
        error!(error = %e, "failed to load active locations");
        Vec::new()
      }
    };
    info!(count = locations.len(), "refreshing active locations");

    report.locations = ledger::refresh_locations(
      &self.store,
      &self.fetcher,
      &locations,
      today,
      self.settings.concurrency,
    )
    .await;

    report.new_items = match detector::new_items(&self.store, today).await {
      Ok(items) => items,
      Err(e) => {
        error!(error = %e, "failed to detect new items");
        Vec::new()
      }
    };
    info!(count = report.new_items.len(), %today, "new items today");

    if !report.new_items.is_empty() {
      report.notify = self.notify(&report.new_items, &locations, today).await;
    }

    info!(
      locations = report.locations.len(),
      failed = report.failed_locations(),
      new_items = report.new_items.len(),
      notified = report.notify.as_ref().map_or(0, NotifyReport::sent),
      "run complete"
    );
    report
  }

  async fn discover_and_reconcile(&self, report: &mut RunReport) {
    let discovered = match discovery::discover(&self.fetcher, &self.settings.site_url).await {
      Ok(found) => found,
      Err(e) => {
        warn!(error = %e, "location discovery failed, continuing with stored locations");
        return;
      }
    };
    info!(count = discovered.len(), site = %self.settings.site_url, "discovered locations");
    report.discovered = Some(discovered.len());

    if discovered.is_empty() {
      warn!("directory page listed no locations, skipping reconciliation");
      return;
    }

    match reconciler::reconcile(&self.store, &discovered, &self.settings.policy).await {
      Ok(r) => report.reconcile = Some(r),
      Err(e) => warn!(error = %e, "location reconciliation failed"),
    }
  }

  async fn notify(
    &self,
    new_items: &[ItemObservation],
    locations: &[Location],
    today: NaiveDate,
  ) -> Option<NotifyReport> {
    let Some(mailer) = &self.mailer else {
      warn!("no mailer configured, skipping notifications");
      return None;
    };

    match notifier::notify(
      &self.store,
      mailer,
      new_items,
      locations,
      &self.settings.notify,
      today,
    )
    .await
    {
      Ok(r) => Some(r),
      Err(e) => {
        error!(error = %e, "failed to notify subscribers");
        None
      }
    }
  }
}

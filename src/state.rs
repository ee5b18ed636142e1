use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::config::Config;
use crate::coordinator::Coordinator;
use crate::errors::ConfigError;
use crate::models::Report;
use crate::notifier::{Gateway, HttpGateway, LogGateway, Notifier};
use crate::scraper::{HttpSource, Inspector, Scraper};


pub type State = Arc<Watcher>;

/// Everything a run needs, shared by the poller, every attempt and the
/// status server.
pub struct Watcher {
  pub target: String,
  pub interval: Duration,
  pub scraper: Scraper,
  pub notifier: Notifier,
  pub coordinator: Coordinator,
  pub stats: Stats,
}

impl Watcher {
  pub fn new(target: String, interval: Duration, scraper: Scraper, notifier: Notifier) -> State {
    Arc::new(Watcher {
      target,
      interval,
      scraper,
      notifier,
      coordinator: Coordinator::new(),
      stats: Stats::default(),
    })
  }

  pub fn from_config(config: &Config) -> Result<State, ConfigError> {
    let client = surf::Client::new();

    let inspector = Inspector::new(&config.selector, config.marker_text.clone(), config.mode)?;
    let source = HttpSource::new(client.clone(), config.target_url.clone(), config.fetch_timeout);

    let gateway: Arc<dyn Gateway> = if config.dry_run {
      Arc::new(LogGateway)
    } else {
      Arc::new(HttpGateway::new(
        client,
        config.sms_endpoint.clone(),
        config.api_key.clone(),
        config.sms_timeout,
      ))
    };

    Ok(Watcher::new(
      config.target_url.to_string(),
      config.interval,
      Scraper::new(Arc::new(source), inspector),
      Notifier::new(gateway, config.recipients.clone(), config.message.clone()),
    ))
  }

  pub fn phase(&self) -> &'static str {
    match self.coordinator.reason() {
      None => "polling",
      Some(reason) => reason.as_str(),
    }
  }

  pub fn snapshot(&self) -> StatusSnapshot {
    StatusSnapshot {
      phase: self.phase(),
      target: self.target.clone(),
      interval_ms: self.interval.as_millis() as u64,
      in_flight: self.coordinator.in_flight(),
      stats: self.stats.snapshot(),
    }
  }
}

#[derive(Debug, Default)]
pub struct Stats {
  launched: AtomicU64,
  available: AtomicU64,
  unavailable: AtomicU64,
  errors: AtomicU64,
  sent: AtomicU64,
  failed: AtomicU64,
}

impl Stats {
  /// Bumps the launch counter and hands back the attempt's sequence number.
  pub fn next_attempt(&self) -> u64 {
    self.launched.fetch_add(1, Ordering::SeqCst) + 1
  }

  pub fn record_available(&self) {
    self.available.fetch_add(1, Ordering::SeqCst);
  }

  pub fn record_unavailable(&self) {
    self.unavailable.fetch_add(1, Ordering::SeqCst);
  }

  pub fn record_error(&self) {
    self.errors.fetch_add(1, Ordering::SeqCst);
  }

  pub fn record_report(&self, report: Report) {
    self.sent.fetch_add(report.sent as u64, Ordering::SeqCst);
    self.failed.fetch_add(report.failed as u64, Ordering::SeqCst);
  }

  pub fn snapshot(&self) -> StatsSnapshot {
    StatsSnapshot {
      launched: self.launched.load(Ordering::SeqCst),
      available: self.available.load(Ordering::SeqCst),
      unavailable: self.unavailable.load(Ordering::SeqCst),
      errors: self.errors.load(Ordering::SeqCst),
      sent: self.sent.load(Ordering::SeqCst),
      failed: self.failed.load(Ordering::SeqCst),
    }
  }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct StatsSnapshot {
  pub launched: u64,
  pub available: u64,
  pub unavailable: u64,
  pub errors: u64,
  pub sent: u64,
  pub failed: u64,
}

#[derive(Serialize, Debug, Clone)]
pub struct StatusSnapshot {
  pub phase: &'static str,
  pub target: String,
  pub interval_ms: u64,
  pub in_flight: usize,
  pub stats: StatsSnapshot,
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::MarkerMode;

  fn lookup(key: &str) -> Option<String> {
    let value = match key {
      "TARGET_URL" => "http://tickets.test/show",
      "POLL_INTERVAL" => "2s",
      "RECIPIENTS" => "+1,+2",
      "AVAILABILITY_SELECTOR" => ".buy",
      "DRY_RUN" => "1",
      _ => return None,
    };
    Some(value.to_string())
  }

  #[test]
  fn test_from_config_builds_polling_watcher() {
    let config = Config::from_lookup(lookup).unwrap();
    assert_eq!(config.mode, MarkerMode::Present);
    let state = Watcher::from_config(&config).unwrap();
    assert_eq!(state.phase(), "polling");
    assert_eq!(state.notifier.recipients().to_vec(), vec!["+1".to_string(), "+2".to_string()]);

    let snapshot = state.snapshot();
    assert_eq!(snapshot.interval_ms, 2000);
    assert_eq!(snapshot.target, "http://tickets.test/show");
    assert_eq!(snapshot.in_flight, 0);
    assert_eq!(snapshot.stats.launched, 0);
  }

  #[test]
  fn test_stats_counts() {
    let stats = Stats::default();
    assert_eq!(stats.next_attempt(), 1);
    assert_eq!(stats.next_attempt(), 2);
    stats.record_unavailable();
    stats.record_error();
    stats.record_available();
    stats.record_report(Report { sent: 3, failed: 1 });
    assert_eq!(
      stats.snapshot(),
      StatsSnapshot { launched: 2, available: 1, unavailable: 1, errors: 1, sent: 3, failed: 1 }
    );
  }
}

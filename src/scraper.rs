use std::sync::Arc;
use std::time::Duration;

use async_std::future::timeout;
use async_trait::async_trait;
use ::scraper::{Html, Selector};
use surf::middleware::Redirect;
use surf::{Client, StatusCode, Url};
use tide::log;

use crate::errors::{ConfigError, ScrapeError};
use crate::models::{Availability, MarkerMode};
use crate::state::Watcher;


pub const USER_AGENT: &str = concat!("ticketwatch/", env!("CARGO_PKG_VERSION"));

/// Where page bodies come from.
#[async_trait]
pub trait Source: Send + Sync {
  async fn fetch(&self) -> Result<String, ScrapeError>;
}

/// Plain GET against the target url. Redirects are followed.
#[derive(Debug, Clone)]
pub struct HttpSource {
  client: Client,
  url: Url,
  timeout: Duration,
}

impl HttpSource {
  pub fn new(client: Client, url: Url, timeout: Duration) -> Self {
    HttpSource {
      client: client.with(Redirect::default()),
      url,
      timeout,
    }
  }
}

#[async_trait]
impl Source for HttpSource {
  async fn fetch(&self) -> Result<String, ScrapeError> {
    let request = async {
      let mut resp = self
        .client
        .get(self.url.as_str())
        .header("User-Agent", USER_AGENT)
        .await
        .map_err(|e| ScrapeError::Transport(e.to_string()))?;

      let status: StatusCode = resp.status();
      if !status.is_success() {
        return Err(ScrapeError::Status(status as u16));
      }
      resp
        .body_string()
        .await
        .map_err(|e| ScrapeError::Body(e.to_string()))
    };

    timeout(self.timeout, request)
      .await
      .map_err(|_| ScrapeError::Timeout(self.timeout))?
  }
}

/// Decides availability from a page body.
#[derive(Debug)]
pub struct Inspector {
  selector: Selector,
  text: Option<String>,
  mode: MarkerMode,
}

impl Inspector {
  pub fn new(selector: &str, text: Option<String>, mode: MarkerMode) -> Result<Self, ConfigError> {
    let parsed = Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
      value: selector.to_string(),
      reason: e.to_string(),
    })?;
    Ok(Inspector {
      selector: parsed,
      text: text.map(|t| normalize(&t)),
      mode,
    })
  }

  pub fn inspect(&self, body: &str) -> Availability {
    let document = Html::parse_document(body);
    let marked = document.select(&self.selector).any(|element| match &self.text {
      Some(text) => normalize(&element.text().collect::<String>()).contains(text.as_str()),
      None => true,
    });

    match (self.mode, marked) {
      (MarkerMode::Present, true) | (MarkerMode::Absent, false) => Availability::Available,
      _ => Availability::Unavailable,
    }
  }
}

// lowercase + collapse whitespace
fn normalize(s: &str) -> String {
  s.split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase()
}

/// One fetch plus one inspection.
pub struct Scraper {
  source: Arc<dyn Source>,
  inspector: Inspector,
}

impl Scraper {
  pub fn new(source: Arc<dyn Source>, inspector: Inspector) -> Self {
    Scraper { source, inspector }
  }

  pub async fn check(&self) -> Result<Availability, ScrapeError> {
    let body = self.source.fetch().await?;
    Ok(self.inspector.inspect(&body))
  }
}

/// Runs attempt number `seq`. The attempt that wins the completion flag is
/// the only one that notifies.
pub async fn attempt(watcher: &Watcher, seq: u64) -> Option<Availability> {
  let stats = &watcher.stats;
  match watcher.scraper.check().await {
    Ok(Availability::Available) => {
      stats.record_available();
      if watcher.coordinator.complete() {
        log::info!("attempt #{}: tickets available, notifying recipients", seq);
        let report = watcher.notifier.fan_out().await;
        stats.record_report(report);
        log::info!(
          "attempt #{}: notified {} recipient(s), {} failed",
          seq,
          report.sent,
          report.failed
        );
      } else {
        log::debug!("attempt #{}: available, already handled by an earlier attempt", seq);
      }
      Some(Availability::Available)
    }
    Ok(Availability::Unavailable) => {
      stats.record_unavailable();
      log::debug!("attempt #{}: not available yet", seq);
      Some(Availability::Unavailable)
    }
    Err(e) => {
      stats.record_error();
      log::warn!("attempt #{}: {}", seq, e);
      None
    }
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  const SOLD_OUT: &str = r#"
    <html><body>
      <div class="banner">Sold   Out</div>
      <button class="buy" disabled>Notify me</button>
    </body></html>
  "#;

  const ON_SALE: &str = r#"
    <html><body>
      <button class="buy">
        Buy   Tickets
      </button>
    </body></html>
  "#;

  #[test]
  fn test_present_selector_only() {
    let inspector = Inspector::new("button.buy:not([disabled])", None, MarkerMode::Present).unwrap();
    assert_eq!(inspector.inspect(SOLD_OUT), Availability::Unavailable);
    assert_eq!(inspector.inspect(ON_SALE), Availability::Available);
  }

  #[test]
  fn test_present_with_text_is_case_and_space_insensitive() {
    let inspector = Inspector::new("button", Some("buy tickets".into()), MarkerMode::Present).unwrap();
    assert_eq!(inspector.inspect(ON_SALE), Availability::Available);
    assert_eq!(inspector.inspect(SOLD_OUT), Availability::Unavailable);
  }

  #[test]
  fn test_absent_mode_flips_result() {
    let inspector = Inspector::new(".banner", Some("SOLD OUT".into()), MarkerMode::Absent).unwrap();
    assert_eq!(inspector.inspect(SOLD_OUT), Availability::Unavailable);
    assert_eq!(inspector.inspect(ON_SALE), Availability::Available);
  }

  #[test]
  fn test_garbage_body_is_unavailable() {
    let inspector = Inspector::new("button.buy", None, MarkerMode::Present).unwrap();
    assert_eq!(inspector.inspect("<<<not html"), Availability::Unavailable);
    assert_eq!(inspector.inspect(""), Availability::Unavailable);
  }

  #[test]
  fn test_bad_selector_is_config_error() {
    let err = Inspector::new("button[", None, MarkerMode::Present).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidSelector { .. }));
  }
}

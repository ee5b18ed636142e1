use std::time::Duration;
use thiserror::Error;


/// Startup errors. Any of these stops the process before polling begins.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
  #[error("{0} must be set")]
  Missing(&'static str),

  #[error("{var} is not a valid url ({value:?}): {reason}")]
  InvalidUrl { var: &'static str, value: String, reason: String },

  #[error("{var} is not a valid duration: {value:?}")]
  InvalidDuration { var: &'static str, value: String },

  #[error("POLL_INTERVAL must be greater than zero")]
  ZeroInterval,

  #[error("RECIPIENTS must name at least one phone number")]
  NoRecipients,

  #[error("AVAILABILITY_SELECTOR is not a valid css selector ({value:?}): {reason}")]
  InvalidSelector { value: String, reason: String },

  #[error("AVAILABILITY_MODE must be `present` or `absent`, got {0:?}")]
  InvalidMode(String),
}

/// A failed scrape attempt. Logged, never fatal; the next tick retries.
#[derive(Debug, Error)]
pub enum ScrapeError {
  #[error("request failed: {0}")]
  Transport(String),

  #[error("request timed out after {0:?}")]
  Timeout(Duration),

  #[error("unexpected http status {0}")]
  Status(u16),

  #[error("could not read response body: {0}")]
  Body(String),
}

/// A failed send to a single recipient. Never aborts the rest of the batch.
#[derive(Debug, Error)]
pub enum NotifyError {
  #[error("request failed: {0}")]
  Transport(String),

  #[error("request timed out after {0:?}")]
  Timeout(Duration),

  #[error("gateway returned http status {0}")]
  Status(u16),

  #[error("gateway rejected message: {0}")]
  Rejected(String),

  #[error("could not encode request: {0}")]
  Encode(String),
}

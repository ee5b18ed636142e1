use std::env;
use std::time::Duration;

use surf::Url;
use tide::log::LevelFilter;

use crate::errors::ConfigError;
use crate::models::MarkerMode;


pub const DEFAULT_SMS_ENDPOINT: &str = "https://textbelt.com/text";
pub const DEFAULT_MESSAGE: &str = "Tickets may be available: {url}";
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_SMS_TIMEOUT: Duration = Duration::from_secs(10);

/// Process configuration, read once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct Config {
  pub target_url: Url,
  pub interval: Duration,
  pub recipients: Vec<String>,
  pub api_key: String,
  pub selector: String,
  pub marker_text: Option<String>,
  pub mode: MarkerMode,
  pub message: String,
  pub sms_endpoint: Url,
  pub fetch_timeout: Duration,
  pub sms_timeout: Duration,
  pub status_addr: Option<String>,
  pub dry_run: bool,
}

impl Config {
  /// Reads the process environment. `.env` is loaded once by `main`.
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::from_lookup(|key| env::var(key).ok())
  }

  /// Builds a config from any key lookup. Blank values count as unset.
  pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let get = |key: &str| {
      lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
    };
    let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

    let target_url = parse_url("TARGET_URL", &require("TARGET_URL")?)?;

    let interval = parse_duration("POLL_INTERVAL", &require("POLL_INTERVAL")?)?;
    if interval.is_zero() {
      return Err(ConfigError::ZeroInterval);
    }

    let recipients = parse_recipients(&require("RECIPIENTS")?);
    if recipients.is_empty() {
      return Err(ConfigError::NoRecipients);
    }

    let dry_run = get("DRY_RUN").map_or(false, |v| parse_flag(&v));
    let api_key = match get("SMS_API_KEY") {
      Some(key) => key,
      None if dry_run => String::new(),
      None => return Err(ConfigError::Missing("SMS_API_KEY")),
    };

    let selector = require("AVAILABILITY_SELECTOR")?;
    let mode = match get("AVAILABILITY_MODE") {
      Some(v) => parse_mode(&v)?,
      None => MarkerMode::default(),
    };

    let sms_endpoint = match get("SMS_ENDPOINT") {
      Some(v) => parse_url("SMS_ENDPOINT", &v)?,
      None => parse_url("SMS_ENDPOINT", DEFAULT_SMS_ENDPOINT)?,
    };

    let fetch_timeout = match get("FETCH_TIMEOUT") {
      Some(v) => parse_duration("FETCH_TIMEOUT", &v)?,
      None => DEFAULT_FETCH_TIMEOUT,
    };

    let sms_timeout = match get("SMS_TIMEOUT") {
      Some(v) => parse_duration("SMS_TIMEOUT", &v)?,
      None => DEFAULT_SMS_TIMEOUT,
    };

    let message = get("NOTIFY_MESSAGE")
      .unwrap_or_else(|| DEFAULT_MESSAGE.to_string())
      .replace("{url}", target_url.as_str());

    Ok(Config {
      target_url,
      interval,
      recipients,
      api_key,
      selector,
      marker_text: get("AVAILABILITY_TEXT"),
      mode,
      message,
      sms_endpoint,
      fetch_timeout,
      sms_timeout,
      status_addr: get("STATUS_ADDR"),
      dry_run,
    })
  }
}

/// Level for `LOG_LEVEL`, `info` when unset. A rejected value comes back as
/// `Err` so it can be reported once logging is up.
pub fn log_level(value: Option<&str>) -> Result<LevelFilter, String> {
  match value.map(str::trim).filter(|v| !v.is_empty()) {
    None => Ok(LevelFilter::Info),
    Some(v) => v.parse::<LevelFilter>().map_err(|_| v.to_string()),
  }
}

fn parse_url(var: &'static str, value: &str) -> Result<Url, ConfigError> {
  let invalid = |reason: String| ConfigError::InvalidUrl {
    var,
    value: value.to_string(),
    reason,
  };
  let url = Url::parse(value).map_err(|e| invalid(e.to_string()))?;
  match url.scheme() {
    "http" | "https" => Ok(url),
    other => Err(invalid(format!("unsupported scheme `{}`", other))),
  }
}

/// Accepts `500ms`, `30s`, `2m`, `1h`, or a bare number of seconds.
pub fn parse_duration(var: &'static str, value: &str) -> Result<Duration, ConfigError> {
  let invalid = || ConfigError::InvalidDuration {
    var,
    value: value.to_string(),
  };
  let value = value.trim();
  let split = value
    .find(|c: char| !c.is_ascii_digit())
    .unwrap_or(value.len());
  let (digits, unit) = value.split_at(split);
  let amount: u64 = digits.parse().map_err(|_| invalid())?;
  let duration = match unit.trim() {
    "" | "s" => Duration::from_secs(amount),
    "ms" => Duration::from_millis(amount),
    "m" => Duration::from_secs(amount.checked_mul(60).ok_or_else(invalid)?),
    "h" => Duration::from_secs(amount.checked_mul(3600).ok_or_else(invalid)?),
    _ => return Err(invalid()),
  };
  Ok(duration)
}

fn parse_recipients(value: &str) -> Vec<String> {
  value
    .split(',')
    .map(str::trim)
    .filter(|p| !p.is_empty())
    .map(String::from)
    .collect()
}

fn parse_mode(value: &str) -> Result<MarkerMode, ConfigError> {
  match value.to_ascii_lowercase().as_str() {
    "present" => Ok(MarkerMode::Present),
    "absent" => Ok(MarkerMode::Absent),
    _ => Err(ConfigError::InvalidMode(value.to_string())),
  }
}

fn parse_flag(value: &str) -> bool {
  matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

use serde::{Deserialize, Serialize};


#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Availability {
  Available,
  Unavailable,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MarkerMode {
  // Available once the marker shows up on the page
  #[default]
  Present,
  // Available once the marker disappears from the page
  Absent,
}

/// Why the watcher stopped scheduling attempts.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Reason {
  Completed,
  Cancelled,
}

impl Reason {
  pub fn as_str(&self) -> &'static str {
    match self {
      Reason::Completed => "completed",
      Reason::Cancelled => "cancelled",
    }
  }
}

/// Body of one POST to the SMS gateway.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct SmsRequest {
  pub phone: String,
  pub message: String,
  pub key: String,
}

/// What the gateway answers with. Fields are optional since only some
/// gateways send a body at all.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct GatewayReply {
  pub success: Option<bool>,
  pub error: Option<String>,
}

/// Outcome of one notification fan-out.
#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct Report {
  pub sent: usize,
  pub failed: usize,
}

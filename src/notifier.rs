use std::sync::Arc;
use std::time::Duration;

use async_std::future::timeout;
use async_trait::async_trait;
use futures::future::join_all;
use surf::{Client, StatusCode, Url};
use tide::log;

use crate::errors::NotifyError;
use crate::models::{GatewayReply, Report, SmsRequest};


/// Delivers one text message to one phone number.
#[async_trait]
pub trait Gateway: Send + Sync {
  async fn send(&self, phone: &str, message: &str) -> Result<(), NotifyError>;
}

/// JSON-over-HTTP SMS gateway (textbelt style).
#[derive(Debug, Clone)]
pub struct HttpGateway {
  client: Client,
  endpoint: Url,
  key: String,
  timeout: Duration,
}

impl HttpGateway {
  pub fn new(client: Client, endpoint: Url, key: String, timeout: Duration) -> Self {
    HttpGateway { client, endpoint, key, timeout }
  }
}

#[async_trait]
impl Gateway for HttpGateway {
  async fn send(&self, phone: &str, message: &str) -> Result<(), NotifyError> {
    let body = SmsRequest {
      phone: phone.to_string(),
      message: message.to_string(),
      key: self.key.clone(),
    };
    let request = self
      .client
      .post(self.endpoint.as_str())
      .body_json(&body)
      .map_err(|e| NotifyError::Encode(e.to_string()))?;

    let exchange = async {
      let mut resp = request
        .await
        .map_err(|e| NotifyError::Transport(e.to_string()))?;
      if resp.status() != StatusCode::Ok {
        return Err(NotifyError::Status(resp.status() as u16));
      }
      // a 200 can still carry a rejection
      let reply: GatewayReply = resp.body_json().await.unwrap_or_default();
      match reply.success {
        Some(false) => Err(NotifyError::Rejected(
          reply.error.unwrap_or_else(|| "no reason given".to_string()),
        )),
        _ => Ok(()),
      }
    };

    timeout(self.timeout, exchange)
      .await
      .map_err(|_| NotifyError::Timeout(self.timeout))?
  }
}

/// Logs instead of sending. Used with `DRY_RUN`.
#[derive(Debug, Clone, Default)]
pub struct LogGateway;

#[async_trait]
impl Gateway for LogGateway {
  async fn send(&self, phone: &str, message: &str) -> Result<(), NotifyError> {
    log::info!("dry run: would text {}: {}", phone, message);
    Ok(())
  }
}

pub struct Notifier {
  gateway: Arc<dyn Gateway>,
  recipients: Vec<String>,
  message: String,
}

impl Notifier {
  pub fn new(gateway: Arc<dyn Gateway>, recipients: Vec<String>, message: String) -> Self {
    Notifier { gateway, recipients, message }
  }

  pub fn recipients(&self) -> &[String] {
    &self.recipients
  }

  /// Sends to every recipient at once. Failures are logged per recipient and
  /// never stop the other sends.
  pub async fn fan_out(&self) -> Report {
    let message = self.message.as_str();
    let gateway = &self.gateway;
    let results = join_all(self.recipients.iter().map(|phone| async move {
      let result = gateway.send(phone, message).await;
      match &result {
        Ok(_) => log::info!("notified {}", phone),
        Err(e) => log::warn!("failed to notify {}: {}", phone, e),
      }
      result
    }))
    .await;

    let sent = results.iter().filter(|r| r.is_ok()).count();
    Report {
      sent,
      failed: results.len() - sent,
    }
  }
}

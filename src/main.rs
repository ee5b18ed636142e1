use std::env;

use async_std::task;
use tide::log::{self, LevelFilter};

use ticketwatch::{config, server, signals, Config, Watcher};


#[async_std::main]
async fn main() -> tide::Result<()> {
  dotenvy::dotenv().ok();
  let level = config::log_level(env::var("LOG_LEVEL").ok().as_deref());
  log::with_level(*level.as_ref().unwrap_or(&LevelFilter::Info));
  if let Err(rejected) = &level {
    log::warn!("ignoring unknown LOG_LEVEL {:?}, using info", rejected);
  }

  let config = Config::from_env().map_err(|e| {
    log::error!("invalid configuration: {}", e);
    e
  })?;
  let state = Watcher::from_config(&config)?;
  if config.dry_run {
    log::warn!("dry run: notifications will only be logged");
  }

  signals::install(state.clone())?;

  if let Some(addr) = config.status_addr.clone() {
    let app = server::new(state.clone());
    task::spawn(async move {
      if let Err(e) = app.listen(addr).await {
        log::error!("status server stopped: {}", e);
      }
    });
  }

  let reason = ticketwatch::run(state.clone()).await;
  let stats = state.stats.snapshot();
  log::info!(
    "done ({}): {} attempt(s), {} sms sent, {} failed",
    reason.as_str(),
    stats.launched,
    stats.sent,
    stats.failed
  );

  Ok(())
}

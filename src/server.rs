use tide::prelude::*;
use tide::{Request, Server};

use crate::state::State;
use crate::utils::RespUtil;


/// Read-only status endpoint. It never touches scheduling.
pub fn new(state: State) -> Server<State> {
  let mut app: Server<State> = Server::with_state(state);

  app.at("/info").get(|_| async move {
    RespUtil::ok(json!({
      "message": "ticketwatch is watching for tickets",
      "product": "ticketwatch",
      "component": "watcher",
      "version": option_env!("CARGO_PKG_VERSION"),
    }))
  });

  app.at("/status").get(|req: Request<State>| async move {
    let snapshot = req.state().snapshot();
    RespUtil::ok(json!(snapshot))
  });

  app
}


#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;
  use std::time::Duration;

  use async_trait::async_trait;
  use serde_json::Value;
  use tide::http::{Method, Request as HttpRequest, Response as HttpResponse, Url};

  use crate::errors::ScrapeError;
  use crate::models::MarkerMode;
  use crate::notifier::{LogGateway, Notifier};
  use crate::scraper::{Inspector, Scraper, Source};
  use crate::state::Watcher;

  struct Blank;

  #[async_trait]
  impl Source for Blank {
    async fn fetch(&self) -> Result<String, ScrapeError> {
      Ok(String::new())
    }
  }

  fn state() -> State {
    let inspector = Inspector::new(".buy", None, MarkerMode::Present).unwrap();
    Watcher::new(
      "http://tickets.test/".into(),
      Duration::from_secs(5),
      Scraper::new(Arc::new(Blank), inspector),
      Notifier::new(Arc::new(LogGateway), vec!["+1".into()], "hi".into()),
    )
  }

  async fn call(app: &Server<State>, path: &str) -> HttpResponse {
    let url = Url::parse("http://localhost/").unwrap().join(path).unwrap();
    app.respond(HttpRequest::new(Method::Get, url)).await.unwrap()
  }

  async fn get(app: &Server<State>, path: &str) -> (u16, Value) {
    let mut res = call(app, path).await;
    let status = res.status() as u16;
    (status, res.body_json().await.unwrap())
  }

  #[async_std::test]
  async fn test_status_reports_phase_and_counters() {
    let state = state();
    state.stats.next_attempt();
    state.stats.record_unavailable();
    let app = new(state.clone());

    let (status, body) = get(&app, "/status").await;
    assert_eq!(status, 200);
    assert_eq!(body["phase"], "polling");
    assert_eq!(body["interval_ms"], 5000);
    assert_eq!(body["target"], "http://tickets.test/");
    assert_eq!(body["stats"]["launched"], 1);
    assert_eq!(body["stats"]["unavailable"], 1);

    state.coordinator.cancel();
    let (_, body) = get(&app, "/status").await;
    assert_eq!(body["phase"], "cancelled");
  }

  #[async_std::test]
  async fn test_info_and_unknown_routes() {
    let app = new(state());
    let (status, body) = get(&app, "/info").await;
    assert_eq!(status, 200);
    assert_eq!(body["product"], "ticketwatch");

    let res = call(&app, "/nope").await;
    assert_eq!(res.status() as u16, 404);
  }
}

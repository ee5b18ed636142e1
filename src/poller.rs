use async_std::prelude::*;
use async_std::stream;
use tide::log;

use crate::models::Reason;
use crate::scraper;
use crate::state::State;


enum Wake {
  Tick,
  Stop(Reason),
}

/// Launches one attempt now and one per interval after that, never waiting
/// on earlier attempts. Returns once a flag fires.
pub async fn run(state: State) -> Reason {
  let mut ticks = stream::interval(state.interval);
  log::info!("watching {} every {:?}", state.target, state.interval);

  loop {
    if let Some(reason) = state.coordinator.reason() {
      return reason;
    }
    if !launch(&state) {
      // the group only refuses work once draining started
      return state.coordinator.reason().unwrap_or(Reason::Cancelled);
    }

    let tick = async {
      ticks.next().await;
      Wake::Tick
    };
    let stop = async { Wake::Stop(state.coordinator.triggered().await) };
    if let Wake::Stop(reason) = tick.race(stop).await {
      return reason;
    }
  }
}

fn launch(state: &State) -> bool {
  let seq = state.stats.next_attempt();
  let watcher = state.clone();
  log::debug!("launching attempt #{}", seq);
  state.coordinator.spawn(async move {
    scraper::attempt(&watcher, seq).await;
  })
}

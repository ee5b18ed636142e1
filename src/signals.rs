use std::io;
use std::process;
use std::thread;

use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use tide::log;

use crate::state::State;


/// Routes SIGINT/SIGTERM into the coordinator. The first signal asks for a
/// graceful drain, a second one exits right away.
pub fn install(state: State) -> io::Result<()> {
  let mut signals = Signals::new([SIGINT, SIGTERM])?;

  thread::Builder::new()
    .name("ticketwatch-signals".into())
    .spawn(move || {
      for signal in signals.forever() {
        let name = match signal {
          SIGINT => "SIGINT",
          SIGTERM => "SIGTERM",
          _ => "signal",
        };
        if state.coordinator.cancel() {
          log::info!(
            "received {}, draining {} in-flight task(s)",
            name,
            state.coordinator.in_flight()
          );
        } else {
          log::warn!("received {} again, exiting without draining", name);
          process::exit(130);
        }
      }
    })?;
  Ok(())
}

//! Watches a ticket page, texts everyone on the list once tickets show up,
//! then drains in-flight work and stops.

pub mod config;
pub mod coordinator;
pub mod errors;
pub mod models;
pub mod notifier;
pub mod poller;
pub mod scraper;
pub mod server;
pub mod signals;
pub mod state;
mod utils;

pub use config::Config;
pub use coordinator::{run, Coordinator};
pub use models::Reason;
pub use state::{State, Watcher};

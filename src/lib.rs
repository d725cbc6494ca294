pub mod config;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod play_store;
pub mod sheets;

pub mod util {
    pub mod env;
}

pub use config::{Catalog, Markets};
pub use orchestrator::{run_sync, RunOptions, RunSummary};

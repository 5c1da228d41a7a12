pub mod cli;
pub mod config;
pub mod logging;
pub mod reporter;

pub use copyapp_updater_lib as updater;

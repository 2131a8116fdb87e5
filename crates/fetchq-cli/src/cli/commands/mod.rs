//! CLI command handlers. Each command is in its own file.

mod get;
mod show_config;

pub use get::{run_get, GetOptions};
pub use show_config::run_show_config;

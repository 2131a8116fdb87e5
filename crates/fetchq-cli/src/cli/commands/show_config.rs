//! `fetchq config` – print config path and effective values.

use anyhow::Result;
use fetchq_core::config::{self, FetchqConfig};

pub fn run_show_config(cfg: &FetchqConfig) -> Result<()> {
    println!("# {}", config::config_path()?.display());
    let mut effective = cfg.clone();
    effective.transport = Some(cfg.transport_config());
    print!("{}", toml::to_string_pretty(&effective)?);
    Ok(())
}

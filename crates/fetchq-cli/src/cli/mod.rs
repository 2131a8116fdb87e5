//! CLI for the fetchq download queue.

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use fetchq_core::config;
use fetchq_core::Prioritization;
use std::path::PathBuf;

use commands::{run_get, run_show_config, GetOptions};

/// Top-level CLI for fetchq.
#[derive(Debug, Parser)]
#[command(name = "fetchq")]
#[command(about = "fetchq: download URLs through a bounded, ordered queue", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download one or more URLs, at most N at a time.
    Get {
        /// HTTP/HTTPS URLs to download.
        #[arg(required = true)]
        urls: Vec<String>,
        /// Maximum concurrent downloads (default from config).
        #[arg(short = 'j', long = "max-active", value_name = "N")]
        max_active: Option<usize>,
        /// Order for queued downloads: fifo or lifo (default from config).
        #[arg(long, value_name = "ORDER")]
        order: Option<Prioritization>,
        /// Save bodies into this directory (named after the URL path).
        #[arg(short = 'o', long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
        /// Print SHA-256 of each body instead of saving it.
        #[arg(long, conflicts_with = "output_dir")]
        sha256: bool,
        /// Accepted Content-Type (repeatable, e.g. image/*). Default: anything.
        #[arg(long = "accept", value_name = "TYPE")]
        accept: Vec<String>,
    },

    /// Show the config file path and effective configuration.
    Config,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Get {
                urls,
                max_active,
                order,
                output_dir,
                sha256,
                accept,
            } => {
                let opts = GetOptions {
                    max_active,
                    order,
                    output_dir,
                    sha256,
                    accept,
                };
                run_get(&cfg, &urls, opts).await?;
            }
            CliCommand::Config => run_show_config(&cfg)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;

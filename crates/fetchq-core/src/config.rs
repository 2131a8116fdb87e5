use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::admission::{Prioritization, DEFAULT_MAX_ACTIVE_DOWNLOADS};

/// HTTP transport settings (optional `[transport]` section in config.toml).
///
/// Passed through untouched to the transport; the admission controller never
/// reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// TCP/TLS connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds (0 = no limit).
    pub timeout_secs: u64,
    /// Follow HTTP redirects.
    pub follow_redirects: bool,
    /// Optional `User-Agent` header value.
    pub user_agent: Option<String>,
    /// Extra headers sent with every request.
    pub headers: BTreeMap<String, String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 15,
            timeout_secs: 60,
            follow_redirects: true,
            user_agent: None,
            headers: BTreeMap::new(),
        }
    }
}

/// Global configuration loaded from `~/.config/fetchq/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchqConfig {
    /// Maximum number of downloads running at once. Must be at least 1.
    pub max_active_downloads: usize,
    /// Order in which queued downloads start: "fifo" (default) or "lifo".
    #[serde(default)]
    pub prioritization: Prioritization,
    /// Optional transport settings; if missing, built-in defaults are used.
    #[serde(default)]
    pub transport: Option<TransportConfig>,
}

impl Default for FetchqConfig {
    fn default() -> Self {
        Self {
            max_active_downloads: DEFAULT_MAX_ACTIVE_DOWNLOADS,
            prioritization: Prioritization::Fifo,
            transport: None,
        }
    }
}

impl FetchqConfig {
    /// Transport settings, or defaults when the section is absent.
    pub fn transport_config(&self) -> TransportConfig {
        self.transport.clone().unwrap_or_default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_active_downloads == 0 {
            anyhow::bail!("max_active_downloads must be at least 1");
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("fetchq")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FetchqConfig> {
    load_or_init_at(&config_path()?)
}

/// Like [`load_or_init`] but for an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<FetchqConfig> {
    if !path.exists() {
        let default_cfg = FetchqConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml).with_context(|| format!("write {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: FetchqConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

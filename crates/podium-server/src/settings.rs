//! Runtime configuration, deserialised from `config.toml` and `PODIUM_*`
//! environment variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use podium_core::{EngineConfig, champion::DEFAULT_TOP_N, placement::PointsTable};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:            String,
  #[serde(default = "default_port")]
  pub port:            u16,
  #[serde(default = "default_store_path")]
  pub store_path:      PathBuf,
  /// How long a recompute waits on a busy scope before answering 503.
  #[serde(default = "default_lock_timeout_ms")]
  pub lock_timeout_ms: u64,
  #[serde(default = "default_champion_top_n")]
  pub champion_top_n:  usize,
  /// Medal weighting for scopes that do not define their own.
  #[serde(default)]
  pub points:          PointsTable,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/podium/podium.db") }

fn default_lock_timeout_ms() -> u64 { 5_000 }

fn default_champion_top_n() -> usize { DEFAULT_TOP_N }

impl ServerConfig {
  /// Load `path` (optional) layered under `PODIUM_*` environment variables.
  /// Nested keys use a double underscore, e.g. `PODIUM_POINTS__GOLD=5`.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("PODIUM").separator("__"))
      .build()?
      .try_deserialize()
  }

  pub fn engine_config(&self) -> podium_core::Result<EngineConfig> {
    self.points.validate()?;
    Ok(EngineConfig {
      default_points: self.points,
      lock_timeout:   Duration::from_millis(self.lock_timeout_ms),
      champion_top_n: self.champion_top_n,
    })
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

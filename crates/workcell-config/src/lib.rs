//! Workcell Config
//!
//! Serializable configuration for the workcell adapter, loaded from a JSON
//! file passed on the command line. Everything beyond workcell identity has
//! defaults, so a minimal file is just:
//!
//! ```json
//! {
//!   "workcell": { "name": "invisibot_dispenser_workcell",
//!                 "guid": "invisibot_dispenser",
//!                 "kind": "dispenser" }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use workcell_messages::WorkcellKind;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("failed to read config file: {0}")]
  Io(#[from] std::io::Error),

  #[error("failed to parse config file: {0}")]
  Parse(#[from] serde_json::Error),
}

/// Top-level adapter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterConfig {
  pub workcell: WorkcellSection,
  #[serde(default)]
  pub driver: DriverSection,
  #[serde(default)]
  pub timing: TimingSection,
}

/// Identity of the workcell this process represents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkcellSection {
  /// Human-readable node name, used for logging.
  pub name: String,
  /// Guid requests are addressed to.
  pub guid: String,
  /// Dispenser or ingestor; selects the topic triple.
  pub kind: WorkcellKind,
}

/// Robot driver endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverSection {
  /// Base URL of the driver's REST surface.
  #[serde(default = "default_prefix")]
  pub prefix: String,
  /// Robot name passed as a query parameter on command endpoints.
  #[serde(default = "default_robot_name")]
  pub robot_name: String,
  /// Block startup until the driver answers `GET /status`.
  #[serde(default)]
  pub wait_until_reachable: bool,
}

impl Default for DriverSection {
  fn default() -> Self {
    Self {
      prefix: default_prefix(),
      robot_name: default_robot_name(),
      wait_until_reachable: false,
    }
  }
}

/// Coordinator timing knobs. Defaults match the fleet-side expectations:
/// state published at 1 Hz, confirmation polled at 1 Hz with a 30 s budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingSection {
  #[serde(default = "default_publish_interval")]
  pub publish_interval_secs: f64,
  #[serde(default = "default_poll_interval")]
  pub confirmation_poll_interval_secs: f64,
  #[serde(default = "default_timeout")]
  pub confirmation_timeout_secs: f64,
}

impl Default for TimingSection {
  fn default() -> Self {
    Self {
      publish_interval_secs: default_publish_interval(),
      confirmation_poll_interval_secs: default_poll_interval(),
      confirmation_timeout_secs: default_timeout(),
    }
  }
}

fn default_prefix() -> String {
  "http://localhost:8080".to_string()
}

fn default_robot_name() -> String {
  "invisibot".to_string()
}

fn default_publish_interval() -> f64 {
  1.0
}

fn default_poll_interval() -> f64 {
  1.0
}

fn default_timeout() -> f64 {
  30.0
}

impl AdapterConfig {
  /// Load a configuration from a JSON file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
  }
}

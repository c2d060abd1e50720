//! Optional driver capabilities.
//!
//! Some drivers expose operations beyond the core navigate/stop/map surface.
//! Rather than stubbing those out with hardcoded failure returns, each one is
//! declared here so callers can query support up front and the "unsupported"
//! answer is an explicit, testable value.

use async_trait::async_trait;

use crate::client::RobotDriver;

/// Operations a driver may or may not implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
  /// Begin a named process on the robot (load/unload a cart, clean a zone).
  StartActivity,
}

/// Error type for capability calls.
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
  #[error("driver does not support {0:?}")]
  Unsupported(Capability),
}

/// The capability seam over a concrete driver.
#[async_trait]
pub trait DriverCapabilities: Send + Sync {
  /// Whether this driver implements `capability`.
  fn supports(&self, capability: Capability) -> bool;

  /// Start a named activity. Returns whether the process was queued, or
  /// [`CapabilityError::Unsupported`] if the driver has no such operation.
  async fn start_activity(&self, activity: &str, label: &str) -> Result<bool, CapabilityError>;
}

#[async_trait]
impl DriverCapabilities for RobotDriver {
  fn supports(&self, capability: Capability) -> bool {
    match capability {
      Capability::StartActivity => false,
    }
  }

  async fn start_activity(&self, _activity: &str, _label: &str) -> Result<bool, CapabilityError> {
    Err(CapabilityError::Unsupported(Capability::StartActivity))
  }
}

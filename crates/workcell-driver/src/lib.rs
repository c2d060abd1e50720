//! Workcell Driver
//!
//! REST boundary to the physical robot's remote control surface. Every call
//! here is a soft operation: transport errors are caught, logged, and
//! reported to the caller as "data unavailable this cycle" (`None`) or
//! "command not accepted" (`false`), never as an error the coordinator
//! has to handle.
//!
//! The one capability the underlying driver does not implement (starting a
//! named activity) is modeled as an explicit [`DriverCapabilities`] seam with
//! an `Unsupported` error, so the boundary stays testable without a live
//! robot.

mod capability;
mod client;
mod status;

pub use capability::{Capability, CapabilityError, DriverCapabilities};
pub use client::{Pose, RobotDriver};
pub use status::{Position, RobotStatus};

/// Error type for driver construction. Runtime calls never surface errors;
/// only building a client with a bad prefix does.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
  #[error("invalid driver prefix: {0}")]
  InvalidPrefix(#[from] url::ParseError),

  #[error("failed to build http client: {0}")]
  Client(#[from] reqwest::Error),
}

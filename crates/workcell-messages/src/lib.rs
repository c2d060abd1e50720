//! Workcell Messages
//!
//! This crate contains the serializable message types exchanged over the
//! fleet bus. These types mirror the wire format of the fleet network's
//! dispenser/ingestor messages:
//!
//! - [`WorkcellRequest`]: consumed from the request topic
//! - [`WorkcellState`]: published on the state topic (~1 Hz)
//! - [`RequestResult`]: published on the result topic, one per transition
//!
//! Enums that are integer-coded on the wire ([`Mode`], [`ResultStatus`])
//! serialize through their `u8` representation.

mod request;
mod result;
mod state;
mod topics;

pub use request::WorkcellRequest;
pub use result::{RequestResult, ResultStatus};
pub use state::{Mode, WorkcellState};
pub use topics::{TopicSet, WorkcellKind};

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as fractional seconds since the Unix epoch.
///
/// This is the `time` field carried by every published message.
pub fn now_secs() -> f64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|d| d.as_secs_f64())
    .unwrap_or(0.0)
}

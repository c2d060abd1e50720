//! Workcell Bus
//!
//! Publish/subscribe transport abstraction the coordinator talks over. The
//! real fleet network provides delivery (at-least-once, no ordering guarantee
//! across publishers); this crate only defines the seam plus an in-process
//! implementation used by tests and single-process wiring.
//!
//! Messages are `serde_json::Value`; typed encoding/decoding happens at the
//! edges, in the loops that own the message types.

mod in_process;

pub use in_process::InProcessBus;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::warn;

/// Error type for bus operations.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
  /// The bus has shut down and no longer accepts publishes.
  #[error("bus is closed")]
  Closed,
}

/// A handle to one subscription on one topic.
///
/// Wraps a broadcast receiver; slow subscribers that fall behind skip the
/// messages they missed rather than stalling publishers (at-least-once
/// delivery is the transport's job, not ours).
pub struct Subscription {
  topic: String,
  receiver: broadcast::Receiver<serde_json::Value>,
}

impl Subscription {
  pub(crate) fn new(topic: String, receiver: broadcast::Receiver<serde_json::Value>) -> Self {
    Self { topic, receiver }
  }

  /// Receive the next message, or `None` once the topic has no more
  /// publishers and the backlog is drained.
  pub async fn recv(&mut self) -> Option<serde_json::Value> {
    loop {
      match self.receiver.recv().await {
        Ok(message) => return Some(message),
        Err(broadcast::error::RecvError::Lagged(skipped)) => {
          warn!(topic = %self.topic, skipped, "subscriber lagged, skipping messages");
        }
        Err(broadcast::error::RecvError::Closed) => return None,
      }
    }
  }
}

/// The publish/subscribe seam.
///
/// Implementations must deliver each published message to every live
/// subscriber of that topic. Publishing to a topic nobody subscribes to is
/// not an error.
#[async_trait]
pub trait Bus: Send + Sync {
  /// Subscribe to a topic. Only messages published after this call are
  /// delivered.
  fn subscribe(&self, topic: &str) -> Subscription;

  /// Publish a message on a topic.
  async fn publish(&self, topic: &str, message: serde_json::Value) -> Result<(), BusError>;
}

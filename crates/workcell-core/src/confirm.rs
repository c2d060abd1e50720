//! Confirmation source seam.
//!
//! A checked-out request is only resolved once an external party (an
//! operator app, a device signal) acknowledges it. The processor raises a
//! ready flag, then polls for the acknowledgment; what sits behind those two
//! calls is an implementation detail.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

/// The processor's view of the external acknowledgment signal.
#[async_trait]
pub trait ConfirmationSource: Send + Sync {
  /// Signal that an action is pending and awaiting acknowledgment.
  async fn raise_ready(&self);

  /// Whether the pending action has been acknowledged.
  async fn is_acknowledged(&self) -> bool;

  /// Reset the signal after the processor has consumed the outcome.
  async fn clear(&self);
}

#[derive(Debug, Default)]
struct PanelFlags {
  pending: bool,
  acknowledged: bool,
}

/// An in-process confirmation source.
///
/// The processor side drives it through [`ConfirmationSource`]; the operator
/// side holds a clone and calls [`acknowledge`](ConfirmationPanel::acknowledge)
/// when the pending action has been handled.
#[derive(Debug, Clone, Default)]
pub struct ConfirmationPanel {
  flags: Arc<Mutex<PanelFlags>>,
}

impl ConfirmationPanel {
  pub fn new() -> Self {
    Self::default()
  }

  /// Acknowledge the pending action, if any.
  pub fn acknowledge(&self) {
    let mut flags = self.flags.lock().expect("panel flags poisoned");
    if flags.pending {
      flags.acknowledged = true;
    }
  }

  /// Whether an action is currently awaiting acknowledgment.
  pub fn is_pending(&self) -> bool {
    let flags = self.flags.lock().expect("panel flags poisoned");
    flags.pending && !flags.acknowledged
  }
}

#[async_trait]
impl ConfirmationSource for ConfirmationPanel {
  async fn raise_ready(&self) {
    let mut flags = self.flags.lock().expect("panel flags poisoned");
    flags.pending = true;
    flags.acknowledged = false;
  }

  async fn is_acknowledged(&self) -> bool {
    self.flags.lock().expect("panel flags poisoned").acknowledged
  }

  async fn clear(&self) {
    let mut flags = self.flags.lock().expect("panel flags poisoned");
    flags.pending = false;
    flags.acknowledged = false;
  }
}

//! Driver-backed confirmation source.
//!
//! Deployments without an operator app still need an acknowledgment signal
//! for the processor to wait on. This wiring treats the robot driver's
//! `completed_request` flag as that signal: once the ready flag is raised,
//! the request counts as acknowledged when the driver reports its last
//! command finished.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use workcell_core::ConfirmationSource;
use workcell_driver::RobotDriver;

pub struct DriverConfirmation {
  driver: RobotDriver,
  pending: AtomicBool,
}

impl DriverConfirmation {
  pub fn new(driver: RobotDriver) -> Self {
    Self {
      driver,
      pending: AtomicBool::new(false),
    }
  }
}

#[async_trait]
impl ConfirmationSource for DriverConfirmation {
  async fn raise_ready(&self) {
    self.pending.store(true, Ordering::SeqCst);
  }

  async fn is_acknowledged(&self) -> bool {
    if !self.pending.load(Ordering::SeqCst) {
      return false;
    }
    // An unreachable driver reports completed, matching the driver's own
    // forgiving default: a dead driver must not wedge the queue.
    self.driver.is_command_completed().await
  }

  async fn clear(&self) {
    self.pending.store(false, Ordering::SeqCst);
  }
}

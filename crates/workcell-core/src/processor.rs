//! Request processor: one request at a time through the confirmation
//! protocol.
//!
//! The cycle is: check out the queue head (this flips the workcell BUSY),
//! raise the ready flag on the confirmation source, then poll it on a fixed
//! tick. An acknowledgment inside the budget resolves the request as a
//! success; running out the budget resolves it as a failure. Failed requests
//! leave the queue like successful ones (no retry) but never enter the
//! ledger, so the fleet may redeliver them as fresh requests.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use workcell_bus::Bus;
use workcell_messages::{ResultStatus, TopicSet};

use crate::confirm::ConfirmationSource;
use crate::coordinator::{CoordinatorHandle, Outcome};
use crate::error::CoreError;
use crate::results::ResultPublisher;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(30);

/// The single worker draining the request queue.
pub struct RequestProcessor {
  coordinator: CoordinatorHandle,
  confirmation: Arc<dyn ConfirmationSource>,
  results: ResultPublisher,
  poll_interval: Duration,
  timeout: Duration,
}

impl RequestProcessor {
  pub fn new(
    bus: Arc<dyn Bus>,
    coordinator: CoordinatorHandle,
    confirmation: Arc<dyn ConfirmationSource>,
    guid: impl Into<String>,
    topics: TopicSet,
  ) -> Self {
    Self {
      coordinator,
      confirmation,
      results: ResultPublisher::new(bus, topics.results, guid),
      poll_interval: DEFAULT_POLL_INTERVAL,
      timeout: DEFAULT_CONFIRMATION_TIMEOUT,
    }
  }

  /// Override the confirmation poll interval and timeout budget.
  pub fn with_timing(mut self, poll_interval: Duration, timeout: Duration) -> Self {
    self.poll_interval = poll_interval;
    self.timeout = timeout;
    self
  }

  /// Run processing cycles until cancelled.
  pub async fn run(self, cancel: CancellationToken) -> Result<(), CoreError> {
    info!("request processor started");

    loop {
      let lease = tokio::select! {
        _ = cancel.cancelled() => break,
        lease = self.coordinator.checkout() => match lease {
          Ok(lease) => lease,
          // Coordinator gone means we are shutting down.
          Err(CoreError::CoordinatorClosed) => break,
          Err(e) => return Err(e),
        },
      };
      let request_guid = lease.request().request_guid.clone();
      info!(request_guid = %request_guid, "handling request");

      self.confirmation.raise_ready().await;

      match self.await_confirmation(&cancel).await {
        Some(true) => {
          lease.resolve(Outcome::Succeeded);
          self.results.publish(&request_guid, ResultStatus::Success).await?;
        }
        Some(false) => {
          warn!(request_guid = %request_guid, "confirmation timeout, dropping request");
          lease.resolve(Outcome::Failed);
          self.results.publish(&request_guid, ResultStatus::Failed).await?;
        }
        // Cancelled mid-wait: the lease drop releases the request and
        // restores IDLE.
        None => break,
      }
      self.confirmation.clear().await;
    }

    info!("request processor stopped");
    Ok(())
  }

  /// Poll the confirmation source until it acknowledges or the budget runs
  /// out. `None` means the wait was cancelled.
  async fn await_confirmation(&self, cancel: &CancellationToken) -> Option<bool> {
    let mut ticker = tokio::time::interval(self.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Budget measured from the first poll; the first tick fires immediately.
    let deadline = Instant::now() + self.timeout;
    loop {
      tokio::select! {
        _ = cancel.cancelled() => return None,
        _ = ticker.tick() => {}
      }
      if self.confirmation.is_acknowledged().await {
        return Some(true);
      }
      if Instant::now() >= deadline {
        return Some(false);
      }
    }
  }
}

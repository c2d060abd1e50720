//! State publisher: periodic snapshots of the workcell state.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::info;

use workcell_bus::Bus;
use workcell_messages::TopicSet;

use crate::coordinator::CoordinatorHandle;
use crate::error::CoreError;

pub const DEFAULT_PUBLISH_INTERVAL: Duration = Duration::from_secs(1);

/// Publishes a time-stamped [`WorkcellState`](workcell_messages::WorkcellState)
/// snapshot on the state topic at a fixed cadence. No other side effects.
pub struct StatePublisher {
  bus: Arc<dyn Bus>,
  coordinator: CoordinatorHandle,
  topic: String,
  interval: Duration,
}

impl StatePublisher {
  pub fn new(bus: Arc<dyn Bus>, coordinator: CoordinatorHandle, topics: TopicSet) -> Self {
    Self {
      bus,
      coordinator,
      topic: topics.states.to_string(),
      interval: DEFAULT_PUBLISH_INTERVAL,
    }
  }

  pub fn with_interval(mut self, interval: Duration) -> Self {
    self.interval = interval;
    self
  }

  /// Publish snapshots until cancelled. Guaranteed quiet after return.
  pub async fn run(self, cancel: CancellationToken) -> Result<(), CoreError> {
    let mut ticker = tokio::time::interval(self.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(topic = %self.topic, "state publisher started");

    loop {
      tokio::select! {
        _ = cancel.cancelled() => break,
        _ = ticker.tick() => {
          let snapshot = match self.coordinator.snapshot().await {
            Ok(snapshot) => snapshot,
            // Coordinator gone means we are shutting down.
            Err(CoreError::CoordinatorClosed) => break,
            Err(e) => return Err(e),
          };
          self.bus.publish(&self.topic, serde_json::to_value(&snapshot)?).await?;
        }
      }
    }

    info!(topic = %self.topic, "state publisher stopped");
    Ok(())
  }
}

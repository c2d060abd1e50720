//! Intake loop: bus subscription, validation, deduplication, acknowledgment.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use workcell_bus::Bus;
use workcell_messages::{ResultStatus, TopicSet, WorkcellRequest};

use crate::coordinator::{CoordinatorHandle, Disposition};
use crate::error::CoreError;
use crate::results::ResultPublisher;

/// Consumes the request topic and feeds valid requests to the coordinator.
///
/// Per delivery: requests addressed to another workcell are ignored without
/// a reply; replays of an already-succeeded guid are answered with SUCCESS;
/// duplicates of a queued guid are dropped silently; everything else is
/// enqueued and answered with ACKNOWLEDGED.
pub struct IntakeLoop {
  bus: Arc<dyn Bus>,
  coordinator: CoordinatorHandle,
  results: ResultPublisher,
  guid: String,
  request_topic: String,
}

impl IntakeLoop {
  pub fn new(
    bus: Arc<dyn Bus>,
    coordinator: CoordinatorHandle,
    guid: impl Into<String>,
    topics: TopicSet,
  ) -> Self {
    let guid = guid.into();
    let results = ResultPublisher::new(bus.clone(), topics.results, guid.clone());
    Self {
      bus,
      coordinator,
      results,
      guid,
      request_topic: topics.requests.to_string(),
    }
  }

  /// Run until cancelled or the request topic closes.
  pub async fn run(self, cancel: CancellationToken) -> Result<(), CoreError> {
    let mut subscription = self.bus.subscribe(&self.request_topic);
    info!(guid = %self.guid, topic = %self.request_topic, "intake started");

    loop {
      tokio::select! {
        _ = cancel.cancelled() => break,
        message = subscription.recv() => match message {
          Some(message) => match self.handle_delivery(message).await {
            Ok(()) => {}
            // Coordinator gone means we are shutting down.
            Err(CoreError::CoordinatorClosed) => break,
            Err(e) => return Err(e),
          },
          None => {
            info!(guid = %self.guid, "request topic closed");
            break;
          }
        }
      }
    }

    info!(guid = %self.guid, "intake stopped");
    Ok(())
  }

  async fn handle_delivery(&self, message: serde_json::Value) -> Result<(), CoreError> {
    let request: WorkcellRequest = match serde_json::from_value(message) {
      Ok(request) => request,
      Err(e) => {
        warn!(error = %e, "ignoring malformed request message");
        return Ok(());
      }
    };

    if request.target_guid != self.guid {
      debug!(
        target_guid = %request.target_guid,
        "request addressed to another workcell"
      );
      return Ok(());
    }

    let request_guid = request.request_guid.clone();
    match self.coordinator.submit(request).await? {
      Disposition::AlreadyDone => {
        self
          .results
          .publish(&request_guid, ResultStatus::Success)
          .await
      }
      Disposition::DuplicateInFlight => Ok(()),
      Disposition::Accepted => {
        self
          .results
          .publish(&request_guid, ResultStatus::Acknowledged)
          .await
      }
    }
  }
}

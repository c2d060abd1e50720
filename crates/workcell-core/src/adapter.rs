//! Adapter lifecycle: wiring and shutdown of the coordinator loops.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use workcell_bus::Bus;
use workcell_messages::WorkcellKind;

use crate::confirm::ConfirmationSource;
use crate::coordinator::{Coordinator, CoordinatorHandle};
use crate::error::CoreError;
use crate::intake::IntakeLoop;
use crate::processor::{DEFAULT_CONFIRMATION_TIMEOUT, DEFAULT_POLL_INTERVAL, RequestProcessor};
use crate::publisher::{DEFAULT_PUBLISH_INTERVAL, StatePublisher};

/// Timing knobs for the three loops.
#[derive(Debug, Clone, Copy)]
pub struct AdapterSettings {
  pub publish_interval: Duration,
  pub confirmation_poll_interval: Duration,
  pub confirmation_timeout: Duration,
}

impl Default for AdapterSettings {
  fn default() -> Self {
    Self {
      publish_interval: DEFAULT_PUBLISH_INTERVAL,
      confirmation_poll_interval: DEFAULT_POLL_INTERVAL,
      confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
    }
  }
}

/// One workcell device on the fleet bus.
///
/// Owns the coordinator actor plus the intake, processor, and publisher
/// loops. [`run`](WorkcellAdapter::run) drives all of them and returns only
/// after every loop has terminated, so once it returns nothing will publish
/// again.
pub struct WorkcellAdapter {
  coordinator: Coordinator,
  handle: CoordinatorHandle,
  intake: IntakeLoop,
  processor: RequestProcessor,
  publisher: StatePublisher,
}

impl WorkcellAdapter {
  pub fn new(
    bus: Arc<dyn Bus>,
    kind: WorkcellKind,
    guid: impl Into<String>,
    confirmation: Arc<dyn ConfirmationSource>,
    settings: AdapterSettings,
  ) -> Self {
    let guid = guid.into();
    let topics = kind.topics();
    let (coordinator, handle) = Coordinator::new(guid.clone());

    let intake = IntakeLoop::new(bus.clone(), handle.clone(), guid.clone(), topics);
    let processor = RequestProcessor::new(
      bus.clone(),
      handle.clone(),
      confirmation,
      guid.clone(),
      topics,
    )
    .with_timing(
      settings.confirmation_poll_interval,
      settings.confirmation_timeout,
    );
    let publisher = StatePublisher::new(bus, handle.clone(), topics)
      .with_interval(settings.publish_interval);

    Self {
      coordinator,
      handle,
      intake,
      processor,
      publisher,
    }
  }

  /// Handle for inspecting or feeding the coordinator directly.
  pub fn coordinator(&self) -> CoordinatorHandle {
    self.handle.clone()
  }

  /// Run all loops until `cancel` fires, then wait for each to terminate.
  pub async fn run(self, cancel: CancellationToken) -> Result<(), CoreError> {
    info!("workcell adapter starting");

    let coordinator = tokio::spawn(self.coordinator.run(cancel.clone()));
    let intake = tokio::spawn(self.intake.run(cancel.clone()));
    let processor = tokio::spawn(self.processor.run(cancel.clone()));
    let publisher = tokio::spawn(self.publisher.run(cancel.clone()));

    let mut first_error = None;
    for (name, handle) in [
      ("intake", intake),
      ("processor", processor),
      ("publisher", publisher),
    ] {
      match handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
          first_error.get_or_insert(e);
        }
        Err(e) => {
          first_error.get_or_insert(CoreError::TaskFailed(format!("{} task: {}", name, e)));
        }
      }
    }
    if let Err(e) = coordinator.await {
      first_error.get_or_insert(CoreError::TaskFailed(format!("coordinator task: {}", e)));
    }

    info!("workcell adapter stopped");
    match first_error {
      Some(e) => Err(e),
      None => Ok(()),
    }
  }
}

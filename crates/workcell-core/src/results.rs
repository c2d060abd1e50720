//! Result topic publishing, shared by intake and the processor.

use std::sync::Arc;

use tracing::info;

use workcell_bus::Bus;
use workcell_messages::{RequestResult, ResultStatus, now_secs};

use crate::error::CoreError;

/// Publishes [`RequestResult`] messages on behalf of one workcell.
#[derive(Clone)]
pub struct ResultPublisher {
  bus: Arc<dyn Bus>,
  topic: String,
  source_guid: String,
}

impl ResultPublisher {
  pub fn new(bus: Arc<dyn Bus>, topic: impl Into<String>, source_guid: impl Into<String>) -> Self {
    Self {
      bus,
      topic: topic.into(),
      source_guid: source_guid.into(),
    }
  }

  pub async fn publish(&self, request_guid: &str, status: ResultStatus) -> Result<(), CoreError> {
    let result = RequestResult {
      time: now_secs(),
      request_guid: request_guid.to_string(),
      source_guid: self.source_guid.clone(),
      status,
    };
    info!(request_guid = %request_guid, ?status, "publishing result");
    self
      .bus
      .publish(&self.topic, serde_json::to_value(&result)?)
      .await?;
    Ok(())
  }
}

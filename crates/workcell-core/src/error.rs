use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
  /// The coordinator actor is gone; no further commands can be served.
  #[error("coordinator is no longer running")]
  CoordinatorClosed,

  #[error("bus error: {0}")]
  Bus(#[from] workcell_bus::BusError),

  #[error("failed to encode message: {0}")]
  Encode(#[from] serde_json::Error),

  #[error("background task failed: {0}")]
  TaskFailed(String),
}

use serde::{Deserialize, Serialize};

/// Terminal and acknowledgment statuses for a request, integer-coded on the
/// wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ResultStatus {
  Acknowledged,
  Success,
  Failed,
}

impl From<ResultStatus> for u8 {
  fn from(status: ResultStatus) -> u8 {
    match status {
      ResultStatus::Acknowledged => 0,
      ResultStatus::Success => 1,
      ResultStatus::Failed => 2,
    }
  }
}

impl TryFrom<u8> for ResultStatus {
  type Error = String;

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    match value {
      0 => Ok(ResultStatus::Acknowledged),
      1 => Ok(ResultStatus::Success),
      2 => Ok(ResultStatus::Failed),
      other => Err(format!("invalid result status: {}", other)),
    }
  }
}

/// Outcome message for a single request, published on the result topic.
///
/// Produced once per transition (acknowledgment on intake, then exactly one
/// of success/failure on resolution) and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestResult {
  pub time: f64,
  pub request_guid: String,
  pub source_guid: String,
  pub status: ResultStatus,
}

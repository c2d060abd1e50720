use serde::{Deserialize, Serialize};

/// Workcell operating mode, integer-coded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Mode {
  Idle,
  Busy,
}

impl From<Mode> for u8 {
  fn from(mode: Mode) -> u8 {
    match mode {
      Mode::Idle => 0,
      Mode::Busy => 1,
    }
  }
}

impl TryFrom<u8> for Mode {
  type Error = String;

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    match value {
      0 => Ok(Mode::Idle),
      1 => Ok(Mode::Busy),
      other => Err(format!("invalid workcell mode: {}", other)),
    }
  }
}

/// Snapshot of a workcell's advertised state.
///
/// Published on the state topic at a fixed cadence. `request_guid_queue`
/// mirrors the membership and order of the pending request queue at the
/// instant the snapshot was taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkcellState {
  pub time: f64,
  pub guid: String,
  pub mode: Mode,
  #[serde(default)]
  pub request_guid_queue: Vec<String>,
}

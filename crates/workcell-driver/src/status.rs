use serde::{Deserialize, Serialize};

/// Body of `GET /status`, unwrapped from its `data` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotStatus {
  pub position: Position,
  /// Battery percentage, 0..100.
  pub battery: f64,
  pub map_name: String,
  /// Whether the last accepted command has finished.
  pub completed_request: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
  pub x: f64,
  pub y: f64,
  pub yaw: f64,
}

/// Wire envelope for the status endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct StatusEnvelope {
  pub data: RobotStatus,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_the_status_envelope() {
    let raw = serde_json::json!({
      "data": {
        "position": {"x": 1.0, "y": -2.5, "yaw": 0.3},
        "battery": 87.0,
        "map_name": "L1",
        "completed_request": true,
      }
    });

    let envelope: StatusEnvelope = serde_json::from_value(raw).unwrap();
    assert_eq!(envelope.data.map_name, "L1");
    assert_eq!(envelope.data.position.y, -2.5);
    assert!(envelope.data.completed_request);
  }
}

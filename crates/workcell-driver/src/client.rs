//! The reqwest-backed driver client.

use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url::Url;

use crate::DriverError;
use crate::status::{RobotStatus, StatusEnvelope};

/// Per-call budget; anything slower counts as unavailable this cycle.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Delay between connection attempts while waiting for the driver to come up.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// A pose in the robot's coordinate convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
  pub x: f64,
  pub y: f64,
  pub yaw: f64,
}

/// REST client for one robot driver.
///
/// All runtime methods are infallible at the type level: a transport error is
/// logged and reported as `None`/`false`.
#[derive(Debug, Clone)]
pub struct RobotDriver {
  client: reqwest::Client,
  prefix: Url,
  robot_name: String,
}

impl RobotDriver {
  pub fn new(prefix: &str, robot_name: impl Into<String>) -> Result<Self, DriverError> {
    let client = reqwest::Client::builder()
      .timeout(REQUEST_TIMEOUT)
      .build()?;
    Ok(Self {
      client,
      prefix: Url::parse(prefix)?,
      robot_name: robot_name.into(),
    })
  }

  pub fn robot_name(&self) -> &str {
    &self.robot_name
  }

  fn endpoint(&self, path: &str) -> Url {
    let mut url = self.prefix.clone();
    // The prefix never carries a path of its own, so join is plain append.
    url.set_path(path);
    url
  }

  /// Fetch the full driver status, or `None` if it is unavailable.
  pub async fn status(&self) -> Option<RobotStatus> {
    let url = self.endpoint("/status");
    let result = async {
      let response = self.client.get(url.clone()).send().await?;
      let response = response.error_for_status()?;
      response.json::<StatusEnvelope>().await
    }
    .await;

    match result {
      Ok(envelope) => Some(envelope.data),
      Err(e) => {
        warn!(url = %url, error = %e, "driver status unavailable");
        None
      }
    }
  }

  /// `[x, y, yaw]` in the robot's frame, or `None`.
  pub async fn position(&self) -> Option<Pose> {
    self.status().await.map(|s| Pose {
      x: s.position.x,
      y: s.position.y,
      yaw: s.position.yaw,
    })
  }

  /// State of charge in `0.0..=1.0`, or `None`.
  pub async fn battery_soc(&self) -> Option<f64> {
    self.status().await.map(|s| s.battery / 100.0)
  }

  /// Name of the map the robot is currently on, or `None`.
  pub async fn map(&self) -> Option<String> {
    self.status().await.map(|s| s.map_name)
  }

  /// Whether the last command has finished. Unavailable status counts as
  /// completed so a dead driver cannot wedge a caller waiting on it.
  pub async fn is_command_completed(&self) -> bool {
    match self.status().await {
      Some(status) => status.completed_request,
      None => true,
    }
  }

  /// Ask the robot to navigate to `pose` on `map_name`. Returns whether the
  /// driver accepted the goal.
  pub async fn navigate(&self, pose: Pose, map_name: &str, speed_limit: f64) -> bool {
    let mut url = self.endpoint("/navigate_to_pose");
    url
      .query_pairs_mut()
      .append_pair("robot_name", &self.robot_name);

    let body = json!({
      "timestamp": 0,
      "x": pose.x,
      "y": pose.y,
      "yaw": pose.yaw,
      "obey_approach_speed_limit": false,
      "approach_speed_limit": speed_limit,
      "level_name": map_name,
      "index": 0,
    });

    self.post_accepted(url, Some(body)).await
  }

  /// Command the robot to stop where it is.
  pub async fn stop(&self) -> bool {
    self.post_accepted(self.endpoint("/stop"), None).await
  }

  /// Switch the robot to another map.
  pub async fn change_map(&self, map_name: &str) -> bool {
    let mut url = self.endpoint("/map_switch");
    url
      .query_pairs_mut()
      .append_pair("robot_name", &self.robot_name)
      .append_pair("map", map_name);
    self.post_accepted(url, None).await
  }

  /// Whether the driver answers its status endpoint at all.
  pub async fn is_reachable(&self) -> bool {
    self.status().await.is_some()
  }

  /// Block until the driver becomes reachable, retrying on a fixed delay.
  /// Returns `false` if cancelled first.
  pub async fn wait_until_reachable(&self, cancel: &CancellationToken) -> bool {
    loop {
      if self.is_reachable().await {
        info!(prefix = %self.prefix, "driver is reachable");
        return true;
      }
      warn!(prefix = %self.prefix, "driver not reachable, retrying");
      tokio::select! {
        _ = cancel.cancelled() => return false,
        _ = tokio::time::sleep(RECONNECT_DELAY) => {}
      }
    }
  }

  async fn post_accepted(&self, url: Url, body: Option<serde_json::Value>) -> bool {
    let request = self.client.post(url.clone());
    let request = match body {
      Some(body) => request.json(&body),
      None => request,
    };

    match request.send().await {
      Ok(response) if response.status().is_success() => true,
      Ok(response) => {
        warn!(url = %url, status = %response.status(), "driver rejected command");
        false
      }
      Err(e) => {
        warn!(url = %url, error = %e, "driver command failed to send");
        false
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn endpoint_urls_are_built_from_the_prefix() {
    let driver = RobotDriver::new("http://localhost:8080", "invisibot").unwrap();
    assert_eq!(
      driver.endpoint("/status").as_str(),
      "http://localhost:8080/status"
    );
  }

  #[test]
  fn query_parameters_are_appended() {
    let driver = RobotDriver::new("http://localhost:8080", "invisibot").unwrap();
    let mut url = driver.endpoint("/map_switch");
    url
      .query_pairs_mut()
      .append_pair("robot_name", driver.robot_name())
      .append_pair("map", "L2");
    assert_eq!(
      url.as_str(),
      "http://localhost:8080/map_switch?robot_name=invisibot&map=L2"
    );
  }

  #[test]
  fn bad_prefix_is_rejected_at_construction() {
    assert!(RobotDriver::new("not a url", "invisibot").is_err());
  }
}

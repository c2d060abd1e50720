//! In-process bus backed by per-topic broadcast channels.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::{Bus, BusError, Subscription};

const TOPIC_CAPACITY: usize = 64;

/// A single-process [`Bus`] implementation.
///
/// Each topic is one broadcast channel, created lazily on first subscribe or
/// publish. Senders are kept alive for the lifetime of the bus, so
/// subscriptions stay open across idle periods.
pub struct InProcessBus {
  topics: Mutex<HashMap<String, broadcast::Sender<serde_json::Value>>>,
}

impl InProcessBus {
  pub fn new() -> Self {
    Self {
      topics: Mutex::new(HashMap::new()),
    }
  }

  fn sender(&self, topic: &str) -> broadcast::Sender<serde_json::Value> {
    let mut topics = self.topics.lock().expect("bus topic map poisoned");
    topics
      .entry(topic.to_string())
      .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
      .clone()
  }
}

impl Default for InProcessBus {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl Bus for InProcessBus {
  fn subscribe(&self, topic: &str) -> Subscription {
    Subscription::new(topic.to_string(), self.sender(topic).subscribe())
  }

  async fn publish(&self, topic: &str, message: serde_json::Value) -> Result<(), BusError> {
    // A send error only means there are no subscribers right now.
    let _ = self.sender(topic).send(message);
    Ok(())
  }
}

use serde::{Deserialize, Serialize};

/// The two flavors of workcell device in the fleet network.
///
/// The flavor only selects which topic triple the adapter binds to; the
/// coordination logic is identical for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkcellKind {
  Dispenser,
  Ingestor,
}

/// The topic triple a workcell communicates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicSet {
  /// Consumed: incoming requests for all workcells of this kind.
  pub requests: &'static str,
  /// Produced: periodic state snapshots.
  pub states: &'static str,
  /// Produced: per-request acknowledgments and terminal results.
  pub results: &'static str,
}

impl WorkcellKind {
  pub fn topics(self) -> TopicSet {
    match self {
      WorkcellKind::Dispenser => TopicSet {
        requests: "/dispenser_requests",
        states: "/dispenser_states",
        results: "/dispenser_results",
      },
      WorkcellKind::Ingestor => TopicSet {
        requests: "/ingestor_requests",
        states: "/ingestor_states",
        results: "/ingestor_results",
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn kind_parses_from_config_strings() {
    let kind: WorkcellKind = serde_json::from_str("\"dispenser\"").unwrap();
    assert_eq!(kind, WorkcellKind::Dispenser);
    let kind: WorkcellKind = serde_json::from_str("\"ingestor\"").unwrap();
    assert_eq!(kind, WorkcellKind::Ingestor);
  }

  #[test]
  fn topic_triples_are_distinct() {
    let d = WorkcellKind::Dispenser.topics();
    let i = WorkcellKind::Ingestor.topics();
    assert_ne!(d.requests, i.requests);
    assert_ne!(d.states, i.states);
    assert_ne!(d.results, i.results);
  }
}

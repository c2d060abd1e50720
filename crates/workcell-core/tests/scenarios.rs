//! End-to-end scenarios over the in-process bus: one adapter, requests
//! delivered on the request topic, results and state observed as a fleet
//! subscriber would see them.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use workcell_bus::{Bus, InProcessBus, Subscription};
use workcell_core::{AdapterSettings, ConfirmationPanel, CoordinatorHandle, CoreError, WorkcellAdapter};
use workcell_messages::{Mode, RequestResult, ResultStatus, WorkcellKind, WorkcellState};

const GUID: &str = "invisibot_dispenser";

struct Fixture {
  bus: Arc<InProcessBus>,
  panel: ConfirmationPanel,
  coordinator: CoordinatorHandle,
  cancel: CancellationToken,
  running: JoinHandle<Result<(), CoreError>>,
}

fn start_adapter(confirmation_timeout: Duration) -> Fixture {
  let bus = Arc::new(InProcessBus::new());
  let panel = ConfirmationPanel::new();
  let settings = AdapterSettings {
    confirmation_timeout,
    ..AdapterSettings::default()
  };

  let adapter = WorkcellAdapter::new(
    bus.clone(),
    WorkcellKind::Dispenser,
    GUID,
    Arc::new(panel.clone()),
    settings,
  );
  let coordinator = adapter.coordinator();
  let cancel = CancellationToken::new();
  let running = tokio::spawn(adapter.run(cancel.clone()));

  Fixture {
    bus,
    panel,
    coordinator,
    cancel,
    running,
  }
}

async fn settle() {
  // In paused-time tests this parks every spawned loop (subscriptions made,
  // checkouts waiting) before the clock moves on.
  tokio::time::sleep(Duration::from_millis(1)).await;
}

async fn deliver(bus: &InProcessBus, request_guid: &str, target_guid: &str) {
  bus
    .publish(
      "/dispenser_requests",
      serde_json::json!({"request_guid": request_guid, "target_guid": target_guid}),
    )
    .await
    .unwrap();
}

async fn next_result(results: &mut Subscription) -> RequestResult {
  let value = results.recv().await.expect("result topic closed");
  serde_json::from_value(value).expect("malformed result message")
}

async fn next_state(states: &mut Subscription) -> WorkcellState {
  let value = states.recv().await.expect("state topic closed");
  serde_json::from_value(value).expect("malformed state message")
}

#[tokio::test(start_paused = true)]
async fn scenario_acknowledged_then_success() {
  let fixture = start_adapter(Duration::from_secs(30));
  let mut results = fixture.bus.subscribe("/dispenser_results");
  settle().await;

  deliver(&fixture.bus, "r1", GUID).await;

  let ack = next_result(&mut results).await;
  assert_eq!(ack.status, ResultStatus::Acknowledged);
  assert_eq!(ack.request_guid, "r1");
  assert_eq!(ack.source_guid, GUID);

  // Confirmation arrives after roughly two polls.
  tokio::time::sleep(Duration::from_secs(2)).await;
  fixture.panel.acknowledge();

  let done = next_result(&mut results).await;
  assert_eq!(done.status, ResultStatus::Success);
  assert_eq!(done.request_guid, "r1");

  let snapshot = fixture.coordinator.snapshot().await.unwrap();
  assert!(snapshot.request_guid_queue.is_empty());
  assert_eq!(snapshot.mode, Mode::Idle);

  // Ledger remembers the success: replaying the same guid yields SUCCESS
  // again without a queue entry.
  deliver(&fixture.bus, "r1", GUID).await;
  let replay = next_result(&mut results).await;
  assert_eq!(replay.status, ResultStatus::Success);
  let snapshot = fixture.coordinator.snapshot().await.unwrap();
  assert!(snapshot.request_guid_queue.is_empty());

  fixture.cancel.cancel();
  fixture.running.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn scenario_timeout_publishes_failed_and_drops_the_request() {
  let fixture = start_adapter(Duration::from_secs(30));
  let mut results = fixture.bus.subscribe("/dispenser_results");
  settle().await;

  deliver(&fixture.bus, "r2", GUID).await;

  let ack = next_result(&mut results).await;
  assert_eq!(ack.status, ResultStatus::Acknowledged);

  // Never acknowledged: the budget runs out at ~30 s.
  let failed = next_result(&mut results).await;
  assert_eq!(failed.status, ResultStatus::Failed);
  assert_eq!(failed.request_guid, "r2");

  // Drop-on-failure: gone from the advertised queue, mode back to IDLE, and
  // no ledger entry, so a redelivery is accepted as a fresh request.
  let snapshot = fixture.coordinator.snapshot().await.unwrap();
  assert!(snapshot.request_guid_queue.is_empty());
  assert_eq!(snapshot.mode, Mode::Idle);

  deliver(&fixture.bus, "r2", GUID).await;
  let ack = next_result(&mut results).await;
  assert_eq!(ack.status, ResultStatus::Acknowledged);

  fixture.cancel.cancel();
  fixture.running.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn scenario_duplicate_delivery_enqueues_once() {
  let fixture = start_adapter(Duration::from_secs(30));
  let mut results = fixture.bus.subscribe("/dispenser_results");
  settle().await;

  deliver(&fixture.bus, "r1", GUID).await;
  deliver(&fixture.bus, "r1", GUID).await;
  settle().await;

  // Exactly one queue entry and exactly one acknowledgment.
  let snapshot = fixture.coordinator.snapshot().await.unwrap();
  assert_eq!(snapshot.request_guid_queue, vec!["r1".to_string()]);

  let ack = next_result(&mut results).await;
  assert_eq!(ack.status, ResultStatus::Acknowledged);

  fixture.panel.acknowledge();
  let done = next_result(&mut results).await;
  assert_eq!(done.status, ResultStatus::Success);
  assert_eq!(done.request_guid, "r1");

  fixture.cancel.cancel();
  fixture.running.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn requests_for_other_workcells_are_ignored() {
  let fixture = start_adapter(Duration::from_secs(30));
  let mut results = fixture.bus.subscribe("/dispenser_results");
  settle().await;

  deliver(&fixture.bus, "r9", "some_other_cell").await;
  settle().await;

  let snapshot = fixture.coordinator.snapshot().await.unwrap();
  assert!(snapshot.request_guid_queue.is_empty());

  // No reply of any kind for a mismatched target.
  let quiet = tokio::time::timeout(Duration::from_secs(3), results.recv()).await;
  assert!(quiet.is_err());

  fixture.cancel.cancel();
  fixture.running.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn terminal_results_follow_arrival_order() {
  let fixture = start_adapter(Duration::from_secs(30));
  let mut results = fixture.bus.subscribe("/dispenser_results");
  settle().await;

  deliver(&fixture.bus, "a", GUID).await;
  deliver(&fixture.bus, "b", GUID).await;

  let mut terminal = Vec::new();
  while terminal.len() < 2 {
    tokio::time::sleep(Duration::from_secs(1)).await;
    fixture.panel.acknowledge();
    let result = next_result(&mut results).await;
    if result.status != ResultStatus::Acknowledged {
      terminal.push(result.request_guid);
    }
  }

  assert_eq!(terminal, vec!["a".to_string(), "b".to_string()]);

  fixture.cancel.cancel();
  fixture.running.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn state_topic_reflects_mode_and_queue() {
  let fixture = start_adapter(Duration::from_secs(30));
  let mut states = fixture.bus.subscribe("/dispenser_states");
  settle().await;

  let idle = next_state(&mut states).await;
  assert_eq!(idle.guid, GUID);
  assert_eq!(idle.mode, Mode::Idle);
  assert!(idle.request_guid_queue.is_empty());

  deliver(&fixture.bus, "r1", GUID).await;
  settle().await;

  let busy = next_state(&mut states).await;
  assert_eq!(busy.mode, Mode::Busy);
  assert_eq!(busy.request_guid_queue, vec!["r1".to_string()]);

  fixture.panel.acknowledge();
  tokio::time::sleep(Duration::from_secs(2)).await;

  let idle_again = next_state(&mut states).await;
  assert_eq!(idle_again.mode, Mode::Idle);
  assert!(idle_again.request_guid_queue.is_empty());

  fixture.cancel.cancel();
  fixture.running.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn no_state_publishes_after_shutdown_completes() {
  let fixture = start_adapter(Duration::from_secs(30));
  let mut states = fixture.bus.subscribe("/dispenser_states");
  settle().await;

  // At least one publish per interval while running.
  tokio::time::sleep(Duration::from_secs(3)).await;
  let mut observed = 0;
  while tokio::time::timeout(Duration::from_millis(10), states.recv())
    .await
    .is_ok()
  {
    observed += 1;
  }
  assert!(observed >= 3, "expected >=3 snapshots, saw {}", observed);

  fixture.cancel.cancel();
  fixture.running.await.unwrap().unwrap();

  // Drain anything published before shutdown finished, then verify silence.
  while tokio::time::timeout(Duration::from_millis(10), states.recv())
    .await
    .is_ok()
  {}
  let quiet = tokio::time::timeout(Duration::from_secs(5), states.recv()).await;
  assert!(quiet.is_err());
}

//! The coordinator actor.
//!
//! One task owns the workcell's mode, the pending request queue, and the
//! completion ledger. Every other loop talks to it through a command channel
//! with oneshot replies, so each command executes atomically with respect to
//! all the others.
//!
//! The advertised `request_guid_queue` is derived from the queue itself at
//! snapshot time, which makes "state mirrors queue membership and order" hold
//! by construction.

use std::collections::{HashSet, VecDeque};

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use workcell_messages::{Mode, WorkcellRequest, WorkcellState, now_secs};

use crate::error::CoreError;

/// How the coordinator classified a submitted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
  /// New request, appended to the queue.
  Accepted,
  /// Same guid is already queued; drop silently.
  DuplicateInFlight,
  /// Guid already reached success; reply success again, touch nothing.
  AlreadyDone,
}

/// Terminal outcome of one processing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
  Succeeded,
  Failed,
}

enum Command {
  Submit {
    request: WorkcellRequest,
    reply: oneshot::Sender<Disposition>,
  },
  Checkout {
    reply: oneshot::Sender<WorkcellRequest>,
  },
  Resolve {
    request_guid: String,
    outcome: Outcome,
  },
  Release {
    request_guid: String,
  },
  Snapshot {
    reply: oneshot::Sender<WorkcellState>,
  },
}

/// Handle for sending commands to a running [`Coordinator`].
#[derive(Clone)]
pub struct CoordinatorHandle {
  sender: mpsc::UnboundedSender<Command>,
}

impl CoordinatorHandle {
  /// Submit a request. Idempotent replays and in-flight duplicates are
  /// classified, not enqueued twice.
  pub async fn submit(&self, request: WorkcellRequest) -> Result<Disposition, CoreError> {
    let (reply, rx) = oneshot::channel();
    self
      .sender
      .send(Command::Submit { request, reply })
      .map_err(|_| CoreError::CoordinatorClosed)?;
    rx.await.map_err(|_| CoreError::CoordinatorClosed)
  }

  /// Check out the queue head for processing. Waits until a request exists;
  /// the head stays in the queue until the lease is resolved.
  pub async fn checkout(&self) -> Result<CheckoutLease, CoreError> {
    let (reply, rx) = oneshot::channel();
    self
      .sender
      .send(Command::Checkout { reply })
      .map_err(|_| CoreError::CoordinatorClosed)?;
    let request = rx.await.map_err(|_| CoreError::CoordinatorClosed)?;
    Ok(CheckoutLease {
      sender: self.sender.clone(),
      request,
      resolved: false,
    })
  }

  /// Take a time-stamped snapshot of the advertised state.
  pub async fn snapshot(&self) -> Result<WorkcellState, CoreError> {
    let (reply, rx) = oneshot::channel();
    self
      .sender
      .send(Command::Snapshot { reply })
      .map_err(|_| CoreError::CoordinatorClosed)?;
    rx.await.map_err(|_| CoreError::CoordinatorClosed)
  }
}

/// A checked-out request.
///
/// Holding the lease is what makes the workcell BUSY. Dropping it without
/// calling [`resolve`](CheckoutLease::resolve) releases the request back to
/// the head of the queue and restores IDLE, so an aborted processing cycle
/// can never wedge the mode.
pub struct CheckoutLease {
  sender: mpsc::UnboundedSender<Command>,
  request: WorkcellRequest,
  resolved: bool,
}

impl CheckoutLease {
  pub fn request(&self) -> &WorkcellRequest {
    &self.request
  }

  /// Resolve the leased request. Success moves the guid into the ledger;
  /// either way the request leaves the queue and the mode returns to IDLE.
  pub fn resolve(mut self, outcome: Outcome) {
    self.resolved = true;
    let _ = self.sender.send(Command::Resolve {
      request_guid: self.request.request_guid.clone(),
      outcome,
    });
  }
}

impl Drop for CheckoutLease {
  fn drop(&mut self) {
    if !self.resolved {
      let _ = self.sender.send(Command::Release {
        request_guid: self.request.request_guid.clone(),
      });
    }
  }
}

/// The actor owning all coordinator state.
pub struct Coordinator {
  guid: String,
  mode: Mode,
  queue: VecDeque<WorkcellRequest>,
  ledger: HashSet<String>,
  /// Guid currently checked out by the processor, if any.
  in_flight: Option<String>,
  /// A parked checkout waiting for the queue to become non-empty.
  waiter: Option<oneshot::Sender<WorkcellRequest>>,
  receiver: mpsc::UnboundedReceiver<Command>,
}

impl Coordinator {
  /// Create a coordinator and its command handle. The returned actor must be
  /// driven with [`run`](Coordinator::run).
  pub fn new(guid: impl Into<String>) -> (Self, CoordinatorHandle) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let coordinator = Self {
      guid: guid.into(),
      mode: Mode::Idle,
      queue: VecDeque::new(),
      ledger: HashSet::new(),
      in_flight: None,
      waiter: None,
      receiver,
    };
    (coordinator, CoordinatorHandle { sender })
  }

  /// Serve commands until cancelled or all handles are dropped.
  pub async fn run(mut self, cancel: CancellationToken) {
    info!(guid = %self.guid, "coordinator started");
    loop {
      tokio::select! {
        _ = cancel.cancelled() => break,
        command = self.receiver.recv() => match command {
          Some(command) => self.handle(command),
          None => break,
        }
      }
    }
    info!(guid = %self.guid, "coordinator stopped");
  }

  fn handle(&mut self, command: Command) {
    match command {
      Command::Submit { request, reply } => {
        let disposition = self.submit(request);
        let _ = reply.send(disposition);
      }
      Command::Checkout { reply } => self.checkout(reply),
      Command::Resolve {
        request_guid,
        outcome,
      } => self.resolve(&request_guid, outcome),
      Command::Release { request_guid } => self.release(&request_guid),
      Command::Snapshot { reply } => {
        let _ = reply.send(self.snapshot());
      }
    }
  }

  fn submit(&mut self, request: WorkcellRequest) -> Disposition {
    let guid = request.request_guid.clone();
    if self.ledger.contains(&guid) {
      info!(request_guid = %guid, "request already succeeded, replaying result");
      return Disposition::AlreadyDone;
    }
    if self.queue.iter().any(|r| r.request_guid == guid) {
      warn!(request_guid = %guid, "request already in queue");
      return Disposition::DuplicateInFlight;
    }

    info!(request_guid = %guid, "request enqueued");
    self.queue.push_back(request);
    self.fulfill_waiter();
    Disposition::Accepted
  }

  fn checkout(&mut self, reply: oneshot::Sender<WorkcellRequest>) {
    if self.waiter.is_some() || self.in_flight.is_some() {
      // Single-consumer contract: a second concurrent checkout is a bug in
      // the caller. Drop the reply so the caller sees a closed channel.
      warn!("checkout requested while another is outstanding");
      return;
    }
    self.waiter = Some(reply);
    self.fulfill_waiter();
  }

  /// Hand the queue head to a parked checkout, if both exist.
  fn fulfill_waiter(&mut self) {
    if self.in_flight.is_some() {
      return;
    }
    let Some(head) = self.queue.front() else {
      return;
    };
    let Some(waiter) = self.waiter.take() else {
      return;
    };
    let head = head.clone();
    // The checkout may have been abandoned (processor cancelled while
    // waiting); only go BUSY if the lease actually landed.
    if waiter.send(head.clone()).is_ok() {
      self.in_flight = Some(head.request_guid);
      self.mode = Mode::Busy;
    }
  }

  fn resolve(&mut self, request_guid: &str, outcome: Outcome) {
    if self.in_flight.as_deref() != Some(request_guid) {
      warn!(request_guid = %request_guid, "resolve for a request that is not checked out");
      return;
    }

    // Failed requests are dropped as well: no retry, and no ledger entry, so
    // a later redelivery starts the request over.
    self.queue.retain(|r| r.request_guid != request_guid);
    if outcome == Outcome::Succeeded {
      self.ledger.insert(request_guid.to_string());
    }
    info!(request_guid = %request_guid, ?outcome, "request resolved");

    self.in_flight = None;
    self.mode = Mode::Idle;
  }

  fn release(&mut self, request_guid: &str) {
    if self.in_flight.as_deref() == Some(request_guid) {
      debug!(request_guid = %request_guid, "lease released without resolution");
      self.in_flight = None;
      self.mode = Mode::Idle;
    }
  }

  fn snapshot(&self) -> WorkcellState {
    WorkcellState {
      time: now_secs(),
      guid: self.guid.clone(),
      mode: self.mode,
      request_guid_queue: self.queue.iter().map(|r| r.request_guid.clone()).collect(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn request(guid: &str) -> WorkcellRequest {
    WorkcellRequest {
      request_guid: guid.to_string(),
      target_guid: "cell_a".to_string(),
      payload: serde_json::Map::new(),
    }
  }

  fn spawn_coordinator() -> (CoordinatorHandle, CancellationToken) {
    let (coordinator, handle) = Coordinator::new("cell_a");
    let cancel = CancellationToken::new();
    tokio::spawn(coordinator.run(cancel.clone()));
    (handle, cancel)
  }

  #[tokio::test]
  async fn submit_deduplicates_in_flight_requests() {
    let (handle, _cancel) = spawn_coordinator();

    assert_eq!(
      handle.submit(request("r1")).await.unwrap(),
      Disposition::Accepted
    );
    assert_eq!(
      handle.submit(request("r1")).await.unwrap(),
      Disposition::DuplicateInFlight
    );

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.request_guid_queue, vec!["r1".to_string()]);
  }

  #[tokio::test]
  async fn resolved_success_moves_guid_to_ledger() {
    let (handle, _cancel) = spawn_coordinator();

    handle.submit(request("r1")).await.unwrap();
    let lease = handle.checkout().await.unwrap();
    assert_eq!(lease.request().request_guid, "r1");

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.mode, Mode::Busy);

    lease.resolve(Outcome::Succeeded);

    // Replay after success is classified AlreadyDone and nothing re-enters
    // the queue.
    assert_eq!(
      handle.submit(request("r1")).await.unwrap(),
      Disposition::AlreadyDone
    );
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.mode, Mode::Idle);
    assert!(snapshot.request_guid_queue.is_empty());
  }

  #[tokio::test]
  async fn failed_request_is_dropped_and_may_be_resubmitted() {
    let (handle, _cancel) = spawn_coordinator();

    handle.submit(request("r1")).await.unwrap();
    let lease = handle.checkout().await.unwrap();
    lease.resolve(Outcome::Failed);

    let snapshot = handle.snapshot().await.unwrap();
    assert!(snapshot.request_guid_queue.is_empty());
    assert_eq!(snapshot.mode, Mode::Idle);

    // No ledger entry for a failure: redelivery starts over.
    assert_eq!(
      handle.submit(request("r1")).await.unwrap(),
      Disposition::Accepted
    );
  }

  #[tokio::test]
  async fn checkout_waits_for_a_request() {
    let (handle, _cancel) = spawn_coordinator();

    let waiter = {
      let handle = handle.clone();
      tokio::spawn(async move { handle.checkout().await.unwrap().request().request_guid.clone() })
    };

    // Give the checkout time to park.
    tokio::task::yield_now().await;
    handle.submit(request("r1")).await.unwrap();

    assert_eq!(waiter.await.unwrap(), "r1");
  }

  #[tokio::test]
  async fn dropped_lease_restores_idle_and_keeps_the_head() {
    let (handle, _cancel) = spawn_coordinator();

    handle.submit(request("r1")).await.unwrap();
    let lease = handle.checkout().await.unwrap();
    drop(lease);

    // Actor processes the release asynchronously.
    tokio::task::yield_now().await;

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.mode, Mode::Idle);
    assert_eq!(snapshot.request_guid_queue, vec!["r1".to_string()]);

    // The request can be checked out again.
    let lease = handle.checkout().await.unwrap();
    assert_eq!(lease.request().request_guid, "r1");
  }

  #[tokio::test]
  async fn queue_preserves_arrival_order() {
    let (handle, _cancel) = spawn_coordinator();

    handle.submit(request("r1")).await.unwrap();
    handle.submit(request("r2")).await.unwrap();
    handle.submit(request("r3")).await.unwrap();

    for expected in ["r1", "r2", "r3"] {
      let lease = handle.checkout().await.unwrap();
      assert_eq!(lease.request().request_guid, expected);
      lease.resolve(Outcome::Succeeded);
    }
  }
}

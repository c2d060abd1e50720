//! Workcell Core
//!
//! The request/state coordinator for one workcell device. Three loops run
//! concurrently and meet at a single actor that owns all shared data:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        IntakeLoop                           │
//! │  - subscribes to the request topic                          │
//! │  - validates target, deduplicates, submits, acknowledges    │
//! └─────────────────────────────────────────────────────────────┘
//!                               │ Submit
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Coordinator (actor task)                  │
//! │  - owns mode, request queue, completion ledger              │
//! │  - command channel, oneshot replies                         │
//! └─────────────────────────────────────────────────────────────┘
//!          Checkout/Resolve │              │ Snapshot
//!                           ▼              ▼
//! ┌───────────────────────────────┐ ┌─────────────────────────┐
//! │       RequestProcessor        │ │     StatePublisher      │
//! │  - one request in flight      │ │  - 1 Hz state snapshots │
//! │  - confirmation poll + budget │ │                         │
//! └───────────────────────────────┘ └─────────────────────────┘
//! ```
//!
//! Because a single task owns the state, queue, and ledger, intake and
//! processing are serialized through its mailbox and need no locks or
//! lock-ordering discipline.

mod adapter;
mod confirm;
mod coordinator;
mod error;
mod intake;
mod processor;
mod publisher;
mod results;

pub use adapter::{AdapterSettings, WorkcellAdapter};
pub use confirm::{ConfirmationPanel, ConfirmationSource};
pub use coordinator::{CheckoutLease, Coordinator, CoordinatorHandle, Disposition, Outcome};
pub use error::CoreError;
pub use intake::IntakeLoop;
pub use processor::RequestProcessor;
pub use publisher::StatePublisher;

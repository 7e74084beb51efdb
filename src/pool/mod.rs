//! Worker pool subsystem.
//!
//! # Data Flow
//! ```text
//! Handler
//!     → dispatch.rs (Dispatcher: build WorkItem + oneshot, bounded submit)
//!     → queue.rs (SharedQueue: bounded MPMC, competing consumers)
//!     → worker.rs (Worker: one item at a time on its own connection)
//!     → work.rs (WorkResult sent back on the item's oneshot)
//!     → Dispatcher returns BackendResponse or DispatchError
//!
//! manager.rs (WorkerPool):
//!     start N workers → expose SharedQueue → close + drain on shutdown
//! ```
//!
//! # Design Decisions
//! - Pool size is fixed for the process lifetime
//! - No per-worker addressing; the first idle worker takes the next item
//! - Every wait visible to callers has an explicit bound
//! - The queue is an owned object passed around, never a global

pub mod dispatch;
pub mod manager;
pub mod queue;
pub mod work;
pub mod worker;

pub use dispatch::Dispatcher;
pub use manager::WorkerPool;
pub use queue::SharedQueue;
pub use work::{PendingReply, WorkItem, WorkResult};
pub use worker::Worker;

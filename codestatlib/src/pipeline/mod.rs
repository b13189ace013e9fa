//! Concurrent scan-dispatch-collect pipeline.
//!
//! ```text
//!   roots ──► Producer (ScanFrontier) ──submit──► WorkerPool ──► completion channel
//!                  │       (caller-runs when saturated) ─────────────┘      │
//!                  └── Completion::End after the pool is joined ───────────►│
//!                                                                           ▼
//!                                       Collector ──post──► Delivery ──► Listener
//! ```
//!
//! One producer thread, a bounded pool of workers, and one collector thread
//! per run. A [`CancellationToken`] ties them together.

pub mod cancel;
pub mod collector;
pub mod delivery;
pub mod listener;
pub mod pool;
pub mod producer;

pub use cancel::CancellationToken;
pub use collector::{Collector, Completion};
pub use delivery::{Delivery, EventLoop, EventLoopHandle, ImmediateDelivery, Job};
pub use listener::{RunOutcome, StatisticsListener};
pub use pool::{PoolStats, WorkerPool};
pub use producer::Producer;

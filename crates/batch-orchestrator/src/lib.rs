//! # batch-orchestrator
//!
//! Drives each message of a queue batch through the pipeline:
//!
//! ```text
//! RawMessage ─▶ EnvelopeBuilder ─▶ TransportClient (RetryPolicy) ─▶ Delivered
//!                     │                    │
//!                     └──── failure ───────┴─▶ QuarantineArchiver ─▶ Archived
//!                                                      │
//!                                                      └─ write failed ─▶ BatchResult
//! ```
//!
//! Only messages that were neither delivered nor archived end up in the
//! [`BatchResult`]; the queue redelivers exactly those. One message's failure
//! never stops the rest of the batch.

mod message;
mod orchestrator;
mod outcome;

pub use message::{BatchItemFailure, BatchItemFailures, QueueEvent, QueueRecord, RawMessage};
pub use orchestrator::BatchOrchestrator;
pub use outcome::{BatchResult, BatchSummary, DeliveryOutcome, MessageReport};

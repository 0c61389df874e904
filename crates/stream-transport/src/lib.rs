//! # stream-transport
//!
//! Delivers encoded envelopes to the durable streaming sink.
//!
//! - [`TransportClient`]: size check, then up to `max_attempts` sink calls
//!   paced by the [`RetryPolicy`].
//! - [`RecordSink`]: one delivery attempt. [`HttpRecordSink`] speaks the
//!   Firehose JSON protocol; [`MemoryRecordSink`] is a scripted in-process
//!   sink for tests and dry runs.
//! - [`classify`]: maps a sink error to a [`FailureCause`] that the retry
//!   policy consumes as plain data.

mod client;
mod error;
mod http;
mod memory;
mod retry;
mod sink;

pub use client::{Delivered, TransportClient};
pub use error::{TransportError, TransportResult};
pub use http::{HttpRecordSink, HttpSinkConfig};
pub use memory::MemoryRecordSink;
pub use retry::{classify, classify_code, FailureCause, RetryDecision, RetryPolicy};
pub use sink::{PutRecordOutput, RecordSink, SinkError};

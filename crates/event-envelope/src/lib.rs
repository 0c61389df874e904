//! # event-envelope
//!
//! Turns a raw queue message body into the canonical event envelope that is
//! delivered to the streaming sink.
//!
//! The body must be JSON whose top level is an object carrying an array
//! under `payload`. Everything else in the body is dropped; the payload
//! array is carried through unchanged as `detail.payload`.
//!
//! ```ignore
//! let builder = EnvelopeBuilder::new(EnvelopeConfig {
//!     event_type: "order.created".into(),
//!     source: "cpp-api-streamhook".into(),
//!     region: "us-east-1".into(),
//! });
//! let envelope = builder.build(r#"{"payload":[{"sku":"A1"}]}"#)?;
//! ```

mod builder;
mod envelope;
mod error;
mod reason;

pub use builder::{Clock, EnvelopeBuilder, EnvelopeConfig, SystemClock};
pub use envelope::{Envelope, EnvelopeDetail, SCHEMA_VERSION};
pub use error::{EnvelopeError, EnvelopeResult};
pub use reason::FailureReason;

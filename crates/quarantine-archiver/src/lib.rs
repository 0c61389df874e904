//! # quarantine-archiver
//!
//! Persists messages that could not be delivered, together with the reason,
//! so they can be inspected and replayed later.
//!
//! Objects are keyed `{prefix}/{reason}/{message_id}.json` and contain
//! `{"reason": ..., "raw": <original body>}`. When no store is configured
//! archival is a successful no-op.

mod archiver;
mod error;
mod http;
mod store;

pub use archiver::{quarantine_key, Archived, QuarantineArchiver, QuarantineRecord};
pub use error::{ArchiveError, ArchiveResult, StoreError};
pub use http::{HttpObjectStore, HttpStoreConfig};
pub use store::{MemoryObjectStore, ObjectStore, StoredObject};

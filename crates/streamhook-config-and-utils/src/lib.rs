//! Configuration, core error type, and logging bootstrap for streamhook.

mod config;
mod error;
mod logging;

pub use config::{
    Config, DEFAULT_BACKOFF_BASE_MS, DEFAULT_ERROR_EVENTS_PREFIX, DEFAULT_EVENT_SOURCE,
    DEFAULT_EVENT_TYPE, DEFAULT_LOG_LEVEL, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_RECORD_BYTES,
    DEFAULT_REGION,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, LogFormat};

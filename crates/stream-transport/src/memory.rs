//! In-process record sink.

use crate::{PutRecordOutput, RecordSink, SinkError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::time::Instant;

type Response = Result<PutRecordOutput, SinkError>;

#[derive(Default)]
struct State {
    script: VecDeque<Response>,
    records: Vec<Vec<u8>>,
    call_times: Vec<Instant>,
}

/// A sink that records every attempt and answers from a script.
///
/// Scripted responses are consumed in order. Once the script runs out the
/// sink answers with the fallback: an acknowledgment with a sequential
/// record id, unless built with [`MemoryRecordSink::failing`].
#[derive(Default)]
pub struct MemoryRecordSink {
    state: Mutex<State>,
    fallback_error: Option<SinkError>,
}

impl MemoryRecordSink {
    /// A sink that acknowledges everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that answers with `responses` first, then acknowledges.
    pub fn scripted(responses: Vec<Response>) -> Self {
        Self {
            state: Mutex::new(State {
                script: responses.into(),
                ..State::default()
            }),
            fallback_error: None,
        }
    }

    /// A sink that rejects every attempt with `error`.
    pub fn failing(error: SinkError) -> Self {
        Self {
            state: Mutex::default(),
            fallback_error: Some(error),
        }
    }

    /// Number of attempts received.
    pub fn calls(&self) -> usize {
        self.state.lock().expect("lock poisoned").records.len()
    }

    /// Payload of every attempt, in arrival order.
    pub fn records(&self) -> Vec<Vec<u8>> {
        self.state.lock().expect("lock poisoned").records.clone()
    }

    /// Arrival time of every attempt.
    pub fn call_times(&self) -> Vec<Instant> {
        self.state.lock().expect("lock poisoned").call_times.clone()
    }
}

#[async_trait]
impl RecordSink for MemoryRecordSink {
    async fn put_record(&self, data: &[u8]) -> Result<PutRecordOutput, SinkError> {
        let mut state = self.state.lock().expect("lock poisoned");
        state.records.push(data.to_vec());
        state.call_times.push(Instant::now());

        if let Some(response) = state.script.pop_front() {
            return response;
        }
        match &self.fallback_error {
            Some(error) => Err(error.clone()),
            None => Ok(PutRecordOutput::acknowledged(format!(
                "record-{}",
                state.records.len()
            ))),
        }
    }
}

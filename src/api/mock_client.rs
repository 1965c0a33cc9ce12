use crate::api::client::{ByteStream, MockStreamProducer};
use anyhow::Result;
use bytes::Bytes;
use futures::stream;
use std::sync::{Arc, Mutex};

/// Scripted backend for tests: each submission pops the next vector of raw
/// SSE chunks. Chunks are passed through verbatim so tests control frame
/// boundaries exactly.
#[derive(Clone)]
pub struct MockBackend {
    responses: Arc<Mutex<Vec<Vec<String>>>>,
}

impl MockBackend {
    pub fn new(responses: Vec<Vec<String>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
        }
    }
}

impl MockStreamProducer for MockBackend {
    fn create_mock_stream(&self, _query: &str) -> Result<ByteStream> {
        let mut responses_guard = self.responses.lock().unwrap();
        if responses_guard.is_empty() {
            return Err(anyhow::anyhow!("MockBackend: no more responses configured"));
        }
        let chunks = responses_guard.remove(0);

        let byte_chunks: Vec<Result<Bytes>> =
            chunks.into_iter().map(|s| Ok(Bytes::from(s))).collect();
        Ok(Box::pin(stream::iter(byte_chunks)))
    }
}

//! Request body accumulation.
//!
//! There is no size cap at this layer: a body is buffered in full before any
//! decoding happens, and the upload policy only sees the decoded file part.

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};

/// Upper bound on the buffer pre-allocated from a `Content-Length` hint.
pub const MAX_PREALLOCATION_BYTES: usize = 8 * 1024 * 1024;

/// Collects the chunks of a single request body into one contiguous buffer.
///
/// Owned by exactly one request; never shared.
#[derive(Debug, Default)]
pub struct BodyAccumulator {
    buf: BytesMut,
    chunks: usize,
}

impl BodyAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size the buffer from a declared length. The hint is capped so a
    /// bogus header cannot force a huge allocation.
    pub fn with_size_hint(hint: Option<u64>) -> Self {
        let capacity = hint
            .map(|h| usize::try_from(h).unwrap_or(usize::MAX))
            .unwrap_or(0)
            .min(MAX_PREALLOCATION_BYTES);
        Self {
            buf: BytesMut::with_capacity(capacity),
            chunks: 0,
        }
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
        self.chunks += 1;
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    /// End of input: hand out the full body.
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }

    /// Drain `stream` to completion. The first transport error aborts
    /// accumulation and is returned as-is.
    pub async fn collect<S, E>(stream: S, size_hint: Option<u64>) -> Result<Bytes, E>
    where
        S: Stream<Item = Result<Bytes, E>>,
    {
        let mut stream = std::pin::pin!(stream);
        let mut acc = Self::with_size_hint(size_hint);
        while let Some(chunk) = stream.next().await {
            acc.push(&chunk?);
        }
        tracing::trace!(
            size_bytes = acc.len(),
            chunks = acc.chunk_count(),
            "Request body received"
        );
        Ok(acc.finish())
    }
}

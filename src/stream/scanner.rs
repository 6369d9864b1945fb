//! Forward-only byte cursor over a chunked source

use std::future::Future;

use bytes::Bytes;
use tracing::warn;

/// A producer of body chunks, consumed strictly in order.
pub trait ByteSource {
    type Chunk: AsRef<[u8]>;

    /// Next chunk, or `None` once the source is exhausted.
    fn next_chunk(&mut self) -> impl Future<Output = Option<Self::Chunk>>;
}

/// A fully buffered payload is a source with a single chunk.
impl<'a> ByteSource for &'a [u8] {
    type Chunk = &'a [u8];

    fn next_chunk(&mut self) -> impl Future<Output = Option<Self::Chunk>> {
        let chunk = std::mem::take(self);
        async move { (!chunk.is_empty()).then_some(chunk) }
    }
}

/// An HTTP body read incrementally, without buffering the whole response.
impl ByteSource for reqwest::Response {
    type Chunk = Bytes;

    async fn next_chunk(&mut self) -> Option<Bytes> {
        match self.chunk().await {
            Ok(chunk) => chunk,
            Err(e) => {
                // a broken body reads as a truncated one
                warn!(error = %e, url = %self.url(), "Failed to read response body chunk");
                None
            },
        }
    }
}

/// Cursor that only moves forward. Memory use is one chunk regardless of
/// payload size.
pub struct StreamScanner<S: ByteSource> {
    source: S,
    chunk: Option<S::Chunk>,
    pos: usize,
    consumed: usize,
    exhausted: bool,
}

impl<S: ByteSource> StreamScanner<S> {
    pub fn new(source: S) -> Self {
        Self { source, chunk: None, pos: 0, consumed: 0, exhausted: false }
    }

    /// Total number of bytes consumed so far
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    async fn next_byte(&mut self) -> Option<u8> {
        loop {
            if let Some(&byte) = self
                .chunk
                .as_ref()
                .and_then(|chunk| chunk.as_ref().get(self.pos))
            {
                self.pos += 1;
                self.consumed += 1;
                return Some(byte);
            }

            if self.exhausted {
                return None;
            }

            self.pos = 0;
            self.chunk = self.source.next_chunk().await;
            if self.chunk.is_none() {
                self.exhausted = true;
            }
        }
    }

    /// Advances just past the first occurrence of `pattern`.
    ///
    /// Matching is Knuth-Morris-Pratt, so a partial match that fails never
    /// needs to revisit bytes already consumed. Returns false when the source
    /// runs out first.
    pub async fn find(&mut self, pattern: &[u8]) -> bool {
        if pattern.is_empty() {
            return true;
        }

        let fallback = failure_table(pattern);
        let mut matched = 0;

        while let Some(byte) = self.next_byte().await {
            while matched > 0 && pattern[matched] != byte {
                matched = fallback[matched - 1];
            }
            if pattern[matched] == byte {
                matched += 1;
            }
            if matched == pattern.len() {
                return true;
            }
        }

        false
    }

    /// Consumes one byte.
    pub async fn read_byte(&mut self) -> Option<u8> {
        self.next_byte().await
    }

    /// Consumes through `delim` without keeping anything. False if the
    /// source ends first.
    pub async fn skip_until(&mut self, delim: u8) -> bool {
        while let Some(byte) = self.next_byte().await {
            if byte == delim {
                return true;
            }
        }
        false
    }

    /// Consumes through the first `delim` not preceded by a backslash escape
    /// and returns the bytes before it, escape sequences kept verbatim.
    ///
    /// `None` if the source ends first, or once more than `max_len` bytes
    /// would have to be kept. In that case the cursor stops right there.
    pub async fn read_until_unescaped(&mut self, delim: u8, max_len: usize) -> Option<Vec<u8>> {
        let mut captured = Vec::new();
        let mut escaped = false;
        while let Some(byte) = self.next_byte().await {
            if byte == delim && !escaped {
                return Some(captured);
            }
            if captured.len() == max_len {
                return None;
            }
            escaped = byte == b'\\' && !escaped;
            captured.push(byte);
        }
        None
    }
}

/// KMP failure function: for each prefix, the length of its longest proper
/// prefix that is also a suffix.
fn failure_table(pattern: &[u8]) -> Vec<usize> {
    let mut table = vec![0; pattern.len()];
    let mut k = 0;
    for i in 1..pattern.len() {
        while k > 0 && pattern[i] != pattern[k] {
            k = table[k - 1];
        }
        if pattern[i] == pattern[k] {
            k += 1;
        }
        table[i] = k;
    }
    table
}

//! Accumulated, not-yet-consumed session output.
//!
//! Bytes arrive in arbitrary chunks, so a multi-byte UTF-8 sequence may be
//! split across reads. Incomplete trailing sequences are held back until the
//! rest arrives; invalid sequences are replaced with U+FFFD.

use std::fmt;

/// Default buffer capacity (1 MiB).
pub const DEFAULT_CAPACITY: usize = 1024 * 1024;

/// A bounded text buffer that discards the oldest output when full.
#[derive(Clone)]
pub struct OutputBuffer {
    text: String,
    /// Tail bytes of an incomplete UTF-8 sequence.
    pending: Vec<u8>,
    max_size: usize,
    total_received: usize,
    bytes_discarded: usize,
}

impl OutputBuffer {
    /// Create a buffer holding at most `max_size` bytes of text.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            text: String::with_capacity(max_size.min(64 * 1024)),
            pending: Vec::new(),
            max_size: max_size.max(1),
            total_received: 0,
            bytes_discarded: 0,
        }
    }

    /// Append raw output.
    pub fn append(&mut self, data: &[u8]) {
        self.total_received += data.len();
        self.pending.extend_from_slice(data);

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(valid) => {
                    self.text.push_str(valid);
                    self.pending.clear();
                    break;
                }
                Err(err) => {
                    let valid_up_to = err.valid_up_to();
                    if let Ok(valid) = std::str::from_utf8(&self.pending[..valid_up_to]) {
                        self.text.push_str(valid);
                    }
                    if let Some(invalid_len) = err.error_len() {
                        self.text.push(char::REPLACEMENT_CHARACTER);
                        self.pending.drain(..valid_up_to + invalid_len);
                    } else {
                        self.pending.drain(..valid_up_to);
                        break;
                    }
                }
            }
        }

        self.enforce_limit();
    }

    fn enforce_limit(&mut self) {
        if self.text.len() <= self.max_size {
            return;
        }
        let mut cut = self.text.len() - self.max_size;
        while !self.text.is_char_boundary(cut) {
            cut += 1;
        }
        self.text.drain(..cut);
        self.bytes_discarded += cut;
    }

    /// The decoded text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Remove and return the first `end` bytes of text.
    ///
    /// `end` is clamped to the buffer length and must fall on a character
    /// boundary, which every [`super::MatchSpan`] produced against this
    /// buffer does.
    pub fn consume(&mut self, end: usize) -> String {
        let end = end.min(self.text.len());
        self.text.drain(..end).collect()
    }

    /// Length of the decoded text in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Check if there is no decoded text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Maximum number of bytes retained.
    #[must_use]
    pub const fn max_size(&self) -> usize {
        self.max_size
    }

    /// Total raw bytes ever appended.
    #[must_use]
    pub const fn total_received(&self) -> usize {
        self.total_received
    }

    /// Bytes dropped because the buffer was full.
    #[must_use]
    pub const fn bytes_discarded(&self) -> usize {
        self.bytes_discarded
    }

    /// Drop all text, keeping any incomplete trailing sequence.
    pub fn clear(&mut self) {
        self.text.clear();
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl fmt::Debug for OutputBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputBuffer")
            .field("len", &self.text.len())
            .field("pending", &self.pending.len())
            .field("max_size", &self.max_size)
            .field("bytes_discarded", &self.bytes_discarded)
            .finish()
    }
}

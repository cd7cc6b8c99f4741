//! Session transcripts.
//!
//! Every byte sent to and received from the child is recorded with the time
//! elapsed since the session started. Received output can additionally be
//! mirrored to a live sink (stdout when tracing is enabled) so a human can
//! follow a run as it happens.

use std::fmt;
use std::io::Write;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{ExpectError, Result};

/// Kind of transcript event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Input written to the child.
    Sent,
    /// Output read from the child.
    Received,
    /// Annotation added by the engine (step boundaries, teardown).
    Marker,
}

/// A single transcript event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEvent {
    /// Time since the transcript started.
    pub elapsed: Duration,
    /// Event kind.
    pub kind: EventKind,
    /// Lossily decoded payload.
    pub text: String,
}

/// Recorded session history.
pub struct Transcript {
    start: Instant,
    events: Vec<TranscriptEvent>,
    mirror: Option<Box<dyn Write + Send>>,
}

impl Transcript {
    /// Start an empty transcript.
    #[must_use]
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            events: Vec::new(),
            mirror: None,
        }
    }

    /// Copy received output to `sink` as it arrives.
    pub fn mirror_to(&mut self, sink: impl Write + Send + 'static) {
        self.mirror = Some(Box::new(sink));
    }

    /// Stop mirroring.
    pub fn stop_mirror(&mut self) {
        self.mirror = None;
    }

    /// Check if output is being mirrored.
    #[must_use]
    pub const fn is_mirroring(&self) -> bool {
        self.mirror.is_some()
    }

    fn push(&mut self, kind: EventKind, text: String) {
        self.events.push(TranscriptEvent {
            elapsed: self.start.elapsed(),
            kind,
            text,
        });
    }

    /// Record input.
    pub fn record_sent(&mut self, data: &[u8]) {
        self.push(EventKind::Sent, String::from_utf8_lossy(data).into_owned());
    }

    /// Record output and mirror it.
    pub fn record_received(&mut self, data: &[u8]) {
        if let Some(sink) = self.mirror.as_mut() {
            if let Err(e) = sink.write_all(data).and_then(|()| sink.flush()) {
                tracing::warn!(error = %e, "transcript mirror failed; disabling it");
                self.mirror = None;
            }
        }
        self.push(EventKind::Received, String::from_utf8_lossy(data).into_owned());
    }

    /// Add an annotation.
    pub fn marker(&mut self, label: impl Into<String>) {
        self.push(EventKind::Marker, label.into());
    }

    /// All events in order.
    #[must_use]
    pub fn events(&self) -> &[TranscriptEvent] {
        &self.events
    }

    /// Concatenation of all received output.
    #[must_use]
    pub fn received_text(&self) -> String {
        self.text_of(EventKind::Received)
    }

    /// Concatenation of all sent input.
    #[must_use]
    pub fn sent_text(&self) -> String {
        self.text_of(EventKind::Sent)
    }

    fn text_of(&self, kind: EventKind) -> String {
        self.events
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.text.as_str())
            .collect()
    }

    /// Serialize the events as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ExpectError::Io`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.events)
            .map_err(|e| ExpectError::io("serializing transcript", e.into()))
    }

    /// Write the JSON form to `writer`.
    ///
    /// # Errors
    ///
    /// Returns [`ExpectError::Io`] if serialization or writing fails.
    pub fn write_json(&self, writer: impl Write) -> Result<()> {
        serde_json::to_writer_pretty(writer, &self.events)
            .map_err(|e| ExpectError::io("writing transcript", e.into()))
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transcript")
            .field("events", &self.events.len())
            .field("mirroring", &self.mirror.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn records_in_order() {
        let mut transcript = Transcript::new();
        transcript.record_sent(b"script\n");
        transcript.record_received(b">>> ");
        transcript.marker("step 3");

        let kinds: Vec<_> = transcript.events().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EventKind::Sent, EventKind::Received, EventKind::Marker]);
        assert_eq!(transcript.sent_text(), "script\n");
        assert_eq!(transcript.received_text(), ">>> ");
        assert!(transcript.events().windows(2).all(|w| w[0].elapsed <= w[1].elapsed));
    }

    #[test]
    fn mirror_receives_output_only() {
        let sink = SharedSink::default();
        let mut transcript = Transcript::new();
        transcript.mirror_to(sink.clone());

        transcript.record_sent(b"run\n");
        transcript.record_received(b"Process 42 stopped\n");

        assert_eq!(&*sink.0.lock().unwrap(), b"Process 42 stopped\n");
    }

    #[test]
    fn json_export_round_trips() {
        let mut transcript = Transcript::new();
        transcript.record_received(b"(lldb) ");
        let json = transcript.to_json().unwrap();
        assert!(json.contains("\"received\""));

        let events: Vec<TranscriptEvent> = serde_json::from_str(&json).unwrap();
        assert_eq!(events, transcript.events());
    }
}

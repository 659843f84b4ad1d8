// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Output-sink implementations for the chat transports.
//!
//! [`ChannelSink`] feeds an HTTP response body through an mpsc channel,
//! [`StdoutSink`] prints to the terminal for the one-shot CLI, and
//! [`CollectSink`] captures the stream for tests.

use std::io::Write;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use kantoro_core::{KantoroError, MetadataTag, OutputSink};

/// Streams chunks into an mpsc channel whose receiver backs an HTTP
/// response body.
///
/// A dropped receiver means the client disconnected. That must not fail
/// the chat cycle, so later writes are discarded and the cycle runs to
/// completion; persisted messages are never rolled back. Writing after
/// `close` is an error.
pub struct ChannelSink {
    tx: Option<mpsc::Sender<String>>,
    receiver_gone: bool,
}

impl ChannelSink {
    /// Create a sink together with the receiver that drains it.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        let sink = Self {
            tx: Some(tx),
            receiver_gone: false,
        };
        (sink, rx)
    }

    async fn send(&mut self, chunk: String) -> Result<(), KantoroError> {
        let Some(tx) = &self.tx else {
            return Err(KantoroError::Channel {
                message: "write after close".to_string(),
                source: None,
            });
        };
        if self.receiver_gone {
            return Ok(());
        }
        if tx.send(chunk).await.is_err() {
            debug!("output receiver dropped, discarding remaining chunks");
            self.receiver_gone = true;
        }
        Ok(())
    }
}

#[async_trait]
impl OutputSink for ChannelSink {
    async fn write_content(&mut self, text: &str) -> Result<(), KantoroError> {
        self.send(text.to_string()).await
    }

    async fn write_tag(&mut self, tag: MetadataTag, value: &str) -> Result<(), KantoroError> {
        self.send(tag.render(value)).await
    }

    async fn close(&mut self) -> Result<(), KantoroError> {
        self.tx = None;
        Ok(())
    }
}

/// Prints the stream to stdout, flushing per fragment so partial answers
/// appear as they arrive.
pub struct StdoutSink;

impl StdoutSink {
    fn emit(&self, chunk: &str) -> Result<(), KantoroError> {
        let mut stdout = std::io::stdout();
        stdout
            .write_all(chunk.as_bytes())
            .and_then(|()| stdout.flush())
            .map_err(|e| KantoroError::Channel {
                message: "failed to write to stdout".to_string(),
                source: Some(Box::new(e)),
            })
    }
}

#[async_trait]
impl OutputSink for StdoutSink {
    async fn write_content(&mut self, text: &str) -> Result<(), KantoroError> {
        self.emit(text)
    }

    async fn write_tag(&mut self, tag: MetadataTag, value: &str) -> Result<(), KantoroError> {
        self.emit(&tag.render(value))
    }

    async fn close(&mut self) -> Result<(), KantoroError> {
        self.emit("\n")
    }
}

/// One recorded sink event, in stream order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Content(String),
    Tag(MetadataTag, String),
}

/// Captures every event for ordering assertions in tests.
#[derive(Debug, Default)]
pub struct CollectSink {
    pub events: Vec<SinkEvent>,
    closed: bool,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn closed(&self) -> bool {
        self.closed
    }

    /// The concatenated content fragments, tags excluded.
    pub fn content(&self) -> String {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Content(text) => Some(text.as_str()),
                SinkEvent::Tag(..) => None,
            })
            .collect()
    }

    /// The full stream as the wire would carry it, tags rendered inline.
    pub fn transcript(&self) -> String {
        self.events
            .iter()
            .map(|e| match e {
                SinkEvent::Content(text) => text.clone(),
                SinkEvent::Tag(tag, value) => tag.render(value),
            })
            .collect()
    }

    fn push(&mut self, event: SinkEvent) -> Result<(), KantoroError> {
        if self.closed {
            return Err(KantoroError::Channel {
                message: "write after close".to_string(),
                source: None,
            });
        }
        self.events.push(event);
        Ok(())
    }
}

#[async_trait]
impl OutputSink for CollectSink {
    async fn write_content(&mut self, text: &str) -> Result<(), KantoroError> {
        self.push(SinkEvent::Content(text.to_string()))
    }

    async fn write_tag(&mut self, tag: MetadataTag, value: &str) -> Result<(), KantoroError> {
        self.push(SinkEvent::Tag(tag, value.to_string()))
    }

    async fn close(&mut self) -> Result<(), KantoroError> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_sink_delivers_in_order() {
        let (mut sink, mut rx) = ChannelSink::new(16);
        sink.write_tag(MetadataTag::ThreadId, "t-1").await.unwrap();
        sink.write_content("hello ").await.unwrap();
        sink.write_content("world").await.unwrap();
        sink.close().await.unwrap();

        let mut chunks = Vec::new();
        while let Some(chunk) = rx.recv().await {
            chunks.push(chunk);
        }
        assert_eq!(chunks, vec!["[[threadId=t-1]]", "hello ", "world"]);
    }

    #[tokio::test]
    async fn channel_sink_write_after_close_fails() {
        let (mut sink, _rx) = ChannelSink::new(4);
        sink.close().await.unwrap();
        assert!(sink.write_content("late").await.is_err());
    }

    #[tokio::test]
    async fn channel_sink_survives_dropped_receiver() {
        let (mut sink, rx) = ChannelSink::new(4);
        sink.write_content("first").await.unwrap();
        drop(rx);
        // Disconnect is not an error; the cycle must keep running.
        sink.write_content("second").await.unwrap();
        sink.write_tag(MetadataTag::AiMessageId, "42").await.unwrap();
        sink.close().await.unwrap();
    }

    #[tokio::test]
    async fn collect_sink_records_transcript() {
        let mut sink = CollectSink::new();
        sink.write_tag(MetadataTag::Role, "assistant").await.unwrap();
        sink.write_content("an answer").await.unwrap();
        sink.write_tag(MetadataTag::AiMessageId, "7").await.unwrap();
        sink.close().await.unwrap();

        assert_eq!(sink.content(), "an answer");
        assert_eq!(
            sink.transcript(),
            "[[role=assistant]]an answer[[aiMessageId=7]]"
        );
        assert!(sink.closed());
        assert!(sink.write_content("late").await.is_err());
    }
}

//! Downstream message protocol.
//!
//! One JSON document per line, tagged by `type`:
//! `SCHEMA`, `RECORD` or `STATE`. The sink flushes after every message so
//! a crash never leaves a STATE line ahead of the records it covers.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{self, Write};

/// Stream name for every message this tap writes.
pub const STREAM_NAME: &str = "exchange_rate";

/// Key property of the stream.
pub const KEY_PROPERTIES: [&str; 1] = ["date"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    Schema {
        stream: String,
        schema: Value,
        key_properties: Vec<String>,
    },
    Record {
        stream: String,
        record: Value,
    },
    State {
        value: Value,
    },
}

impl Message {
    pub fn schema(schema: Value) -> Self {
        Message::Schema {
            stream: STREAM_NAME.to_string(),
            schema,
            key_properties: KEY_PROPERTIES.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn record(record: Value) -> Self {
        Message::Record {
            stream: STREAM_NAME.to_string(),
            record,
        }
    }

    pub fn state(value: Value) -> Self {
        Message::State { value }
    }
}

/// An ordered, append-only destination for messages.
pub trait MessageSink {
    fn write_message(&mut self, message: &Message) -> io::Result<()>;
}

/// Writes messages as JSON lines to any writer (stdout in production).
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> MessageSink for JsonLinesSink<W> {
    fn write_message(&mut self, message: &Message) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, message)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

/// Collects messages in memory.
impl MessageSink for Vec<Message> {
    fn write_message(&mut self, message: &Message) -> io::Result<()> {
        self.push(message.clone());
        Ok(())
    }
}

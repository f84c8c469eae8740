//! Newline-delimited JSON event writer.
//!
//! | Event | Payload |
//! |-------|---------|
//! | `start` | run metadata |
//! | `record` | one normalized record |
//! | `failure` | one failed upstream call |
//! | `end` | counts and per-branch reports |

use std::io::{self, Write};

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamEventType {
    Start,
    Record,
    Failure,
    End,
}

#[derive(Debug, Serialize)]
struct StreamEvent<'a> {
    event: StreamEventType,
    seq: u64,
    data: &'a Value,
}

/// Writes one event per line, flushing after each.
pub struct NdjsonStreamWriter<W: Write> {
    writer: W,
    next_seq: u64,
}

impl<W: Write> NdjsonStreamWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            next_seq: 1,
        }
    }

    pub fn emit(&mut self, event: StreamEventType, data: &Value) -> io::Result<()> {
        let line = serde_json::to_string(&StreamEvent {
            event,
            seq: self.next_seq,
            data,
        })?;
        self.next_seq += 1;

        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn events_are_sequenced_one_per_line() {
        let mut writer = NdjsonStreamWriter::new(Vec::new());
        writer
            .emit(StreamEventType::Start, &json!({"command": "agencies"}))
            .expect("write start");
        writer
            .emit(StreamEventType::End, &json!({"count": 0}))
            .expect("write end");

        let output = String::from_utf8(writer.into_inner()).expect("utf-8 output");
        let lines = output.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);

        let first: Value = serde_json::from_str(lines[0]).expect("valid json line");
        let second: Value = serde_json::from_str(lines[1]).expect("valid json line");
        assert_eq!(first["event"], "start");
        assert_eq!(first["seq"], 1);
        assert_eq!(second["event"], "end");
        assert_eq!(second["seq"], 2);
    }
}

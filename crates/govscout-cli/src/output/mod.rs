pub mod stream_writer;

use std::io::Write;

use govscout_core::{BranchReport, FetchEvent};
use serde::Serialize;
use serde_json::{json, Value};

use self::stream_writer::{NdjsonStreamWriter, StreamEventType};
use crate::cli::OutputFormat;
use crate::commands::CommandResult;
use crate::error::CliError;
use crate::metadata::Metadata;

/// Everything one invocation prints.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub meta: Metadata,
    pub data: Value,
    pub count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<BranchReport>,
    pub events: Vec<FetchEvent>,
}

impl Envelope {
    pub fn new(mut meta: Metadata, result: CommandResult, events: Vec<FetchEvent>) -> Self {
        let mut sources = Vec::new();
        for event in &events {
            if !sources.contains(&event.source) {
                sources.push(event.source);
            }
        }
        meta.sources = sources;
        meta.failure_count = events
            .iter()
            .filter(|event| event.outcome.is_failure())
            .count();

        Self {
            meta,
            data: result.data,
            count: result.count,
            branches: result.branches,
            events,
        }
    }
}

pub fn render<W: Write>(
    writer: W,
    envelope: &Envelope,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => render_json(writer, envelope, pretty),
        OutputFormat::Ndjson => render_ndjson(writer, envelope),
    }
}

fn render_json<W: Write>(mut writer: W, envelope: &Envelope, pretty: bool) -> Result<(), CliError> {
    let payload = if pretty {
        serde_json::to_string_pretty(envelope)?
    } else {
        serde_json::to_string(envelope)?
    };
    writeln!(writer, "{payload}")?;
    Ok(())
}

fn render_ndjson<W: Write>(writer: W, envelope: &Envelope) -> Result<(), CliError> {
    let mut stream = NdjsonStreamWriter::new(writer);

    stream.emit(StreamEventType::Start, &serde_json::to_value(&envelope.meta)?)?;

    match &envelope.data {
        Value::Array(records) => {
            for record in records {
                stream.emit(StreamEventType::Record, record)?;
            }
        }
        Value::Null => {}
        record => stream.emit(StreamEventType::Record, record)?,
    }

    for event in envelope.events.iter().filter(|event| event.outcome.is_failure()) {
        stream.emit(StreamEventType::Failure, &serde_json::to_value(event)?)?;
    }

    stream.emit(
        StreamEventType::End,
        &json!({
            "count": envelope.count,
            "failure_count": envelope.meta.failure_count,
            "branches": envelope.branches,
        }),
    )?;
    Ok(())
}

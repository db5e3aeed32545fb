use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_json::Value;

use crate::models::Status;

/// One lifecycle callback forwarded by the reporter shim as an NDJSON line.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ReporterEvent {
    #[serde(rename_all = "camelCase")]
    RunBegin {
        #[serde(default)]
        root_dir: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    TestBegin {
        execution_id: String,
        title: String,
        #[serde(default)]
        title_path: Vec<String>,
        start_time: Option<i64>,
    },
    #[serde(rename_all = "camelCase")]
    StepBegin {
        execution_id: String,
        title: String,
        time: u64,
    },
    #[serde(rename_all = "camelCase")]
    StepEnd {
        execution_id: String,
        title: String,
        status: Status,
        time: u64,
    },
    #[serde(rename_all = "camelCase")]
    StdOut {
        execution_id: String,
        chunk: OutputChunk,
    },
    #[serde(rename_all = "camelCase")]
    TestEnd {
        execution_id: String,
        title: String,
        status: Status,
        duration: Option<f64>,
        /// Wall clock at test end, epoch milliseconds.
        time: Option<i64>,
        #[serde(default)]
        attachments: Vec<AttachmentPayload>,
        #[serde(default)]
        stdout: Vec<OutputChunk>,
        #[serde(default)]
        error: Option<Value>,
    },
    RunEnd {
        #[serde(default)]
        status: Option<String>,
    },
}

impl ReporterEvent {
    /// Parse one line of shim output. `None` for anything that is not an event
    /// (runner banners, blank lines, other reporters' output).
    pub fn parse(line: &str) -> Option<Self> {
        match ParsedLine::from_line(line) {
            ParsedLine::Event(event) => Some(event),
            ParsedLine::Malformed(_) | ParsedLine::Output => None,
        }
    }
}

/// What one line of host output turned out to be.
#[derive(Debug)]
pub enum ParsedLine {
    Event(ReporterEvent),
    /// A JSON object that matches no event shape, e.g. a `step-end` without `time`.
    Malformed(serde_json::Error),
    /// Plain host output.
    Output,
}

impl ParsedLine {
    pub fn from_line(line: &str) -> Self {
        match serde_json::from_str::<Value>(line.trim()) {
            Ok(value @ Value::Object(_)) => match serde_json::from_value(value) {
                Ok(event) => ParsedLine::Event(event),
                Err(e) => ParsedLine::Malformed(e),
            },
            _ => ParsedLine::Output,
        }
    }
}

/// Attachment as reported by the host: inline base64 bytes or a file on disk.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentPayload {
    pub name: String,
    #[serde(default)]
    pub content_type: Option<String>,
    /// Base64-encoded body.
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// A captured output chunk, either text or raw bytes (base64 on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OutputChunk {
    Text { text: String },
    Bytes { bytes: String },
}

impl OutputChunk {
    /// Decode to text. Undecodable bytes are kept as the wire text.
    pub fn into_text(self) -> String {
        match self {
            OutputChunk::Text { text } => text,
            OutputChunk::Bytes { bytes } => match STANDARD.decode(bytes.as_bytes()) {
                Ok(raw) => String::from_utf8_lossy(&raw).into_owned(),
                Err(_) => bytes,
            },
        }
    }
}

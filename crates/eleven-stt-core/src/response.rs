use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fields::first_present;
use crate::job::Job;
use crate::request::ResponseFormat;

/// Places the transcript text has been found in, most preferred first.
const TEXT_FIELDS: &[&str] = &["text", "transcription.text", "transcript", "output.text"];

/// Headline fields plus the untouched payload under `meta`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlatTranscript {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    pub meta: Value,
}

/// What a transcription call hands back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TranscriptOutput {
    Text(FlatTranscript),
    Structured(Value),
}

impl TranscriptOutput {
    /// Best-effort transcript text regardless of shape.
    pub fn text(&self) -> &str {
        match self {
            Self::Text(flat) => &flat.text,
            Self::Structured(payload) => extract_text(payload),
        }
    }
}

fn extract_text(payload: &Value) -> &str {
    first_present(payload, TEXT_FIELDS)
        .and_then(Value::as_str)
        .unwrap_or("")
}

/// Shape a completed job for the caller.
pub fn normalize(job: Job, format: ResponseFormat) -> TranscriptOutput {
    match format {
        ResponseFormat::Structured => TranscriptOutput::Structured(job.payload),
        ResponseFormat::FlattenedText => {
            let payload = job.payload;
            TranscriptOutput::Text(FlatTranscript {
                text: extract_text(&payload).to_string(),
                confidence: payload.get("confidence").and_then(Value::as_f64),
                language_code: payload
                    .get("language_code")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                meta: payload,
            })
        }
    }
}

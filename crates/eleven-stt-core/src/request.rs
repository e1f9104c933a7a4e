use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SttError};

pub const DEFAULT_MODEL_ID: &str = "scribe_v2";
/// Filename sent for uploads that did not come from a path.
pub const BUFFER_FILENAME: &str = "transcript.bin";
pub const MIN_POLL_INTERVAL_MS: u64 = 250;
pub const MIN_POLL_ATTEMPTS: u32 = 1;
pub const MAX_SPEAKERS: u32 = 32;

#[derive(Debug, Clone, Copy, ValueEnum, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimestampGranularity {
    #[default]
    Word,
    Character,
    None,
}

impl TimestampGranularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Word => "word",
            Self::Character => "character",
            Self::None => "none",
        }
    }
}

/// Shape of the value returned to the caller.
#[derive(Debug, Clone, Copy, ValueEnum, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    /// The provider payload, untouched.
    #[default]
    #[serde(rename = "json")]
    #[value(name = "json")]
    Structured,
    /// Just the transcript text plus a few headline fields.
    #[serde(rename = "text")]
    #[value(name = "text")]
    FlattenedText,
}

impl ResponseFormat {
    /// Value of the `response_format` multipart field.
    pub fn wire_value(&self) -> &'static str {
        match self {
            Self::Structured => "json",
            Self::FlattenedText => "text",
        }
    }
}

/// Audio supplied by the caller before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioInput {
    /// Local file, opened only when the submission is sent.
    Path(PathBuf),
    /// Content already in memory.
    Bytes(Vec<u8>),
}

/// Where the provider should read audio from. Exactly one, by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    Upload { input: AudioInput, filename: String },
    Remote(String),
}

/// Per-call defaults. Deserializes from the `[defaults]` table of the config
/// file; any key left out keeps its built-in value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RequestDefaults {
    pub model_id: String,
    pub language_code: Option<String>,
    pub diarize: bool,
    pub num_speakers: Option<u32>,
    pub tag_audio_events: bool,
    pub timestamps_granularity: TimestampGranularity,
    pub response_format: ResponseFormat,
    pub additional_formats: Vec<String>,
    pub keyterm_prompts: Vec<String>,
    pub metadata: BTreeMap<String, String>,
    pub retain_transcript: bool,
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
            language_code: None,
            diarize: false,
            num_speakers: None,
            tag_audio_events: true,
            timestamps_granularity: TimestampGranularity::Word,
            response_format: ResponseFormat::Structured,
            additional_formats: Vec::new(),
            keyterm_prompts: Vec::new(),
            metadata: BTreeMap::new(),
            retain_transcript: false,
            poll_interval_ms: 2000,
            max_poll_attempts: 30,
        }
    }
}

/// Caller input. `None` means "use the default".
#[derive(Debug, Clone, Default)]
pub struct RawRequest {
    pub file: Option<AudioInput>,
    pub cloud_storage_url: Option<String>,
    pub model_id: Option<String>,
    pub language_code: Option<String>,
    pub diarize: Option<bool>,
    pub num_speakers: Option<u32>,
    pub tag_audio_events: Option<bool>,
    pub timestamps_granularity: Option<TimestampGranularity>,
    pub response_format: Option<ResponseFormat>,
    /// Replaces the default list when set.
    pub additional_formats: Option<Vec<String>>,
    /// Replaces the default list when set.
    pub keyterm_prompts: Option<Vec<String>>,
    /// Merged over the default metadata; caller keys win.
    pub metadata: BTreeMap<String, String>,
    pub retain_transcript: Option<bool>,
    pub poll_interval_ms: Option<u64>,
    pub max_poll_attempts: Option<u32>,
}

/// A fully resolved request. Only [`TranscriptionRequest::normalize`] builds one.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionRequest {
    pub source: AudioSource,
    pub model_id: String,
    pub language_code: Option<String>,
    pub diarize: bool,
    pub num_speakers: Option<u32>,
    pub tag_audio_events: bool,
    pub timestamps_granularity: TimestampGranularity,
    pub response_format: ResponseFormat,
    pub additional_formats: Vec<String>,
    pub keyterm_prompts: Vec<String>,
    pub metadata: BTreeMap<String, String>,
    pub retain_transcript: bool,
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
}

impl TranscriptionRequest {
    /// Merge `raw` over `defaults` and check the request contract.
    pub fn normalize(raw: RawRequest, defaults: &RequestDefaults) -> Result<Self> {
        let source = resolve_source(raw.file, raw.cloud_storage_url)?;

        let num_speakers = raw.num_speakers.or(defaults.num_speakers);
        if let Some(count) = num_speakers {
            if !(1..=MAX_SPEAKERS).contains(&count) {
                return Err(SttError::InvalidRequest(format!(
                    "speaker count must be between 1 and {MAX_SPEAKERS}, got {count}"
                )));
            }
        }

        let mut metadata = defaults.metadata.clone();
        metadata.extend(raw.metadata);

        Ok(Self {
            source,
            model_id: non_blank(raw.model_id).unwrap_or_else(|| defaults.model_id.clone()),
            language_code: non_blank(raw.language_code)
                .or_else(|| non_blank(defaults.language_code.clone())),
            diarize: raw.diarize.unwrap_or(defaults.diarize),
            num_speakers,
            tag_audio_events: raw.tag_audio_events.unwrap_or(defaults.tag_audio_events),
            timestamps_granularity: raw
                .timestamps_granularity
                .unwrap_or(defaults.timestamps_granularity),
            response_format: raw.response_format.unwrap_or(defaults.response_format),
            additional_formats: dedup_non_empty(
                raw.additional_formats
                    .unwrap_or_else(|| defaults.additional_formats.clone()),
            ),
            keyterm_prompts: dedup_non_empty(
                raw.keyterm_prompts
                    .unwrap_or_else(|| defaults.keyterm_prompts.clone()),
            ),
            metadata,
            retain_transcript: raw.retain_transcript.unwrap_or(defaults.retain_transcript),
            poll_interval_ms: raw
                .poll_interval_ms
                .unwrap_or(defaults.poll_interval_ms)
                .max(MIN_POLL_INTERVAL_MS),
            max_poll_attempts: raw
                .max_poll_attempts
                .unwrap_or(defaults.max_poll_attempts)
                .max(MIN_POLL_ATTEMPTS),
        })
    }
}

fn resolve_source(file: Option<AudioInput>, url: Option<String>) -> Result<AudioSource> {
    match (file, non_blank(url)) {
        (Some(_), Some(_)) => Err(SttError::InvalidRequest(
            "provide either a file or a cloud_storage_url, not both".into(),
        )),
        (None, None) => Err(SttError::InvalidRequest(
            "provide either a file or a cloud_storage_url to transcribe".into(),
        )),
        (None, Some(url)) => Ok(AudioSource::Remote(url)),
        (Some(AudioInput::Bytes(bytes)), None) => Ok(AudioSource::Upload {
            input: AudioInput::Bytes(bytes),
            filename: BUFFER_FILENAME.to_string(),
        }),
        (Some(AudioInput::Path(path)), None) => {
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    SttError::InvalidRequest(format!(
                        "`{}` does not name a file",
                        path.display()
                    ))
                })?;
            Ok(AudioSource::Upload {
                input: AudioInput::Path(path),
                filename,
            })
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trim, drop blanks and drop repeats, keeping first-seen order.
fn dedup_non_empty(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && seen.insert(v.clone()))
        .collect()
}

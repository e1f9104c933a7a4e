use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Args;
use eleven_stt_core::errors::Result;
use eleven_stt_core::output::{self, stdout::StdoutSink, OutputSink};
use eleven_stt_core::request::{AudioInput, RawRequest, ResponseFormat, TimestampGranularity};
use eleven_stt_core::{ElevenLabsProvider, TranscriptionProvider};

#[derive(Debug, Args)]
pub struct TranscribeArgs {
    /// ElevenLabs API key (overrides ELEVENLABS_STT_API_KEY and the config file)
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Local audio/video file to transcribe (MP3, WAV, M4A, ...)
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Remote audio URL (HTTPS or signed URL)
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Model id, e.g. `scribe_v2`
    #[arg(long, value_name = "ID")]
    pub model: Option<String>,

    /// ISO-639 language code; omit to auto-detect
    #[arg(long, value_name = "CODE")]
    pub language: Option<String>,

    /// Enable speaker diarization
    #[arg(long)]
    pub diarize: bool,

    /// Expected speaker count
    #[arg(long, value_name = "COUNT", value_parser = clap::value_parser!(u32).range(1..=32))]
    pub speakers: Option<u32>,

    /// Tag audio events such as laughter (on by default)
    #[arg(long)]
    pub events: bool,

    /// Do not tag audio events
    #[arg(long, conflicts_with = "events")]
    pub no_events: bool,

    /// Timestamp granularity
    #[arg(long, value_name = "LEVEL")]
    pub timestamps: Option<TimestampGranularity>,

    /// Comma-separated extra formats (srt,vtt,txt,...)
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    pub formats: Option<Vec<String>>,

    /// Add a keyterm prompt (repeatable)
    #[arg(long = "prompt", value_name = "TERM")]
    pub prompts: Vec<String>,

    /// Attach a metadata entry (repeatable)
    #[arg(long, value_name = "KEY=VAL", value_parser = parse_key_val)]
    pub metadata: Vec<(String, String)>,

    /// Keep the transcript stored on ElevenLabs
    #[arg(long)]
    pub retain: bool,

    /// Output format
    #[arg(long, value_name = "FORMAT")]
    pub output: Option<ResponseFormat>,

    /// Delay between status checks, in milliseconds (minimum 250)
    #[arg(long, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Status checks before giving up
    #[arg(long, value_name = "N")]
    pub max_poll_attempts: Option<u32>,
}

fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{s}`"))?;
    if key.trim().is_empty() {
        return Err(format!("metadata key is empty in `{s}`"));
    }
    Ok((key.trim().to_string(), value.to_string()))
}

impl TranscribeArgs {
    /// Flags the user did not pass stay `None` so config defaults apply.
    pub fn to_raw_request(&self) -> RawRequest {
        let tag_audio_events = if self.no_events {
            Some(false)
        } else if self.events {
            Some(true)
        } else {
            None
        };

        RawRequest {
            file: self.file.clone().map(AudioInput::Path),
            cloud_storage_url: self.url.clone(),
            model_id: self.model.clone(),
            language_code: self.language.clone(),
            diarize: self.diarize.then_some(true),
            num_speakers: self.speakers,
            tag_audio_events,
            timestamps_granularity: self.timestamps,
            response_format: self.output,
            additional_formats: self.formats.clone(),
            keyterm_prompts: (!self.prompts.is_empty()).then(|| self.prompts.clone()),
            metadata: self.metadata.iter().cloned().collect::<BTreeMap<_, _>>(),
            retain_transcript: self.retain.then_some(true),
            poll_interval_ms: self.poll_interval_ms,
            max_poll_attempts: self.max_poll_attempts,
        }
    }
}

pub async fn run(args: &TranscribeArgs) -> Result<()> {
    let provider = ElevenLabsProvider::from_env(args.api_key.clone())?;
    let request = args.to_raw_request();
    let format = request
        .response_format
        .unwrap_or(provider.defaults().response_format);

    eprintln!("Transcribing…");
    tracing::debug!(provider = provider.name(), ?format, "Starting transcription");
    let transcript = provider.transcribe(request).await?;

    StdoutSink.write(&output::render(&transcript, format)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::error::ErrorKind;
    use clap::Parser;

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("eleven-stt").chain(args.iter().copied()))
    }

    #[test]
    fn full_flag_set_maps_to_request() {
        let cli = parse(&[
            "--file",
            "talk.wav",
            "--model",
            "scribe_v2",
            "--language",
            "en",
            "--diarize",
            "--speakers",
            "2",
            "--timestamps",
            "character",
            "--formats",
            "srt, vtt",
            "--prompt",
            "Rust",
            "--prompt",
            "tokio",
            "--metadata",
            "team=core",
            "--metadata",
            "query=a=b",
            "--retain",
            "--output",
            "text",
        ])
        .expect("flags should parse");

        let raw = cli.transcribe.to_raw_request();
        assert_eq!(raw.file, Some(AudioInput::Path("talk.wav".into())));
        assert_eq!(raw.language_code.as_deref(), Some("en"));
        assert_eq!(raw.diarize, Some(true));
        assert_eq!(raw.num_speakers, Some(2));
        assert_eq!(raw.timestamps_granularity, Some(TimestampGranularity::Character));
        assert_eq!(
            raw.additional_formats,
            Some(vec!["srt".to_string(), " vtt".to_string()])
        );
        assert_eq!(
            raw.keyterm_prompts,
            Some(vec!["Rust".to_string(), "tokio".to_string()])
        );
        assert_eq!(raw.metadata.get("team").map(String::as_str), Some("core"));
        assert_eq!(raw.metadata.get("query").map(String::as_str), Some("a=b"));
        assert_eq!(raw.retain_transcript, Some(true));
        assert_eq!(raw.response_format, Some(ResponseFormat::FlattenedText));
    }

    #[test]
    fn unset_flags_defer_to_defaults() {
        let raw = parse(&["--url", "https://cdn.example.com/a.mp3"])
            .unwrap()
            .transcribe
            .to_raw_request();
        assert_eq!(raw.diarize, None);
        assert_eq!(raw.tag_audio_events, None);
        assert_eq!(raw.keyterm_prompts, None);
        assert_eq!(raw.retain_transcript, None);
        assert!(raw.metadata.is_empty());
    }

    #[test]
    fn no_events_disables_tagging() {
        let raw = parse(&["--url", "https://x/a.mp3", "--no-events"])
            .unwrap()
            .transcribe
            .to_raw_request();
        assert_eq!(raw.tag_audio_events, Some(false));
    }

    #[test]
    fn source_is_required() {
        let err = parse(&["--diarize"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn file_and_url_conflict() {
        let err = parse(&["--file", "a.wav", "--url", "https://x/a.mp3"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn speaker_count_is_range_checked() {
        assert!(parse(&["--url", "https://x/a.mp3", "--speakers", "33"]).is_err());
        assert!(parse(&["--url", "https://x/a.mp3", "--speakers", "two"]).is_err());
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let err = parse(&["--url", "https://x/a.mp3", "--bogus"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn metadata_requires_equals_sign() {
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=x").is_err());
        assert_eq!(parse_key_val("k=").unwrap(), ("k".to_string(), String::new()));
    }

    #[test]
    fn output_accepts_json_and_text_only() {
        let cli = parse(&["--url", "https://x/a.mp3", "--output", "json"]).unwrap();
        assert_eq!(cli.transcribe.output, Some(ResponseFormat::Structured));
        assert!(parse(&["--url", "https://x/a.mp3", "--output", "xml"]).is_err());
    }

    #[test]
    fn no_arguments_shows_help() {
        let err = parse(&[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand);
    }
}

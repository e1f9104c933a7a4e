pub mod stdout;

use crate::errors::{Result, SttError};
use crate::request::ResponseFormat;
use crate::response::TranscriptOutput;

pub trait OutputSink: Send + Sync {
    fn write(&self, text: &str) -> Result<()>;
}

/// Text format prints only the transcript; JSON pretty-prints whatever shape
/// the call returned.
pub fn render(output: &TranscriptOutput, format: ResponseFormat) -> Result<String> {
    match format {
        ResponseFormat::FlattenedText => Ok(output.text().to_string()),
        ResponseFormat::Structured => serde_json::to_string_pretty(output)
            .map_err(|e| SttError::Output(format!("Failed to render transcript: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::FlatTranscript;
    use serde_json::json;

    #[test]
    fn stdout_sink_does_not_error() {
        stdout::StdoutSink.write("test").expect("stdout sink should not error");
    }

    #[test]
    fn text_format_prints_only_transcript() {
        let out = TranscriptOutput::Text(FlatTranscript {
            text: "hello there".into(),
            confidence: Some(0.5),
            language_code: None,
            meta: json!({}),
        });
        assert_eq!(render(&out, ResponseFormat::FlattenedText).unwrap(), "hello there");
    }

    #[test]
    fn json_format_pretty_prints_payload() {
        let out = TranscriptOutput::Structured(json!({"text": "hi"}));
        let rendered = render(&out, ResponseFormat::Structured).unwrap();
        assert_eq!(rendered, "{\n  \"text\": \"hi\"\n}");
    }
}

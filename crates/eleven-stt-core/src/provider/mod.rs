pub mod elevenlabs;

use crate::errors::Result;
use crate::request::RawRequest;
use crate::response::TranscriptOutput;
use async_trait::async_trait;

#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    /// Run one transcription from caller input to finished transcript.
    async fn transcribe(&self, request: RawRequest) -> Result<TranscriptOutput>;
    fn name(&self) -> &str;
}

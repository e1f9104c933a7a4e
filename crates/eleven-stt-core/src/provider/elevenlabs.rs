use std::time::Duration;

use async_trait::async_trait;

use crate::config::{self, ClientConfig};
use crate::errors::{Result, SttError};
use crate::job::{poll, retention, submit};
use crate::provider::TranscriptionProvider;
use crate::request::{RawRequest, RequestDefaults, TranscriptionRequest};
use crate::response::{self, TranscriptOutput};
use crate::transport::Transport;

/// ElevenLabs speech-to-text: submit, poll, optionally delete, normalize.
///
/// Holds no mutable state, so one provider can serve many concurrent
/// `transcribe` calls.
#[derive(Debug, Clone)]
pub struct ElevenLabsProvider {
    transport: Transport,
    defaults: RequestDefaults,
}

impl ElevenLabsProvider {
    /// Fails immediately when the config carries no API key.
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(SttError::MissingApiKey {
                env_var: config.api_key_env,
            });
        }
        Ok(Self {
            transport: Transport::new(&config)?,
            defaults: config.defaults,
        })
    }

    /// Build from the config file and environment; `api_key` overrides both.
    pub fn from_env(api_key: Option<String>) -> Result<Self> {
        let resolved = config::load_config()?;
        Self::new(ClientConfig::from_resolved(&resolved, api_key)?)
    }

    pub fn defaults(&self) -> &RequestDefaults {
        &self.defaults
    }

    /// Run the lifecycle for an already normalized request.
    pub async fn transcribe_request(
        &self,
        request: &TranscriptionRequest,
    ) -> Result<TranscriptOutput> {
        let submitted_id = submit::submit(&self.transport, request).await?;

        let job = poll::poll(
            &self.transport,
            &submitted_id,
            Duration::from_millis(request.poll_interval_ms),
            request.max_poll_attempts,
        )
        .await?;

        if !request.retain_transcript {
            // `job.id` already falls back to the submitted id.
            retention::release(&self.transport, &job.id).await?;
        }

        Ok(response::normalize(job, request.response_format))
    }
}

#[async_trait]
impl TranscriptionProvider for ElevenLabsProvider {
    fn name(&self) -> &str {
        "elevenlabs"
    }

    async fn transcribe(&self, raw: RawRequest) -> Result<TranscriptOutput> {
        let request = TranscriptionRequest::normalize(raw, &self.defaults)?;
        self.transcribe_request(&request).await
    }
}

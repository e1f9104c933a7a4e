use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum SttError {
    #[error("Invalid request: {0}")]
    #[diagnostic(
        code(eleven_stt::invalid_request),
        help("Provide exactly one of a local file or a cloud storage URL")
    )]
    InvalidRequest(String),

    #[error("Transport error: {0}")]
    #[diagnostic(code(eleven_stt::transport))]
    Transport(#[from] TransportError),

    #[error("ElevenLabs reported transcription failure: {0}")]
    #[diagnostic(code(eleven_stt::job_failed))]
    JobFailed(String),

    #[error("Timed out waiting for the ElevenLabs transcript after {attempts} status checks")]
    #[diagnostic(
        code(eleven_stt::job_timeout),
        help("Raise max_poll_attempts or poll_interval_ms and try again")
    )]
    JobTimeout { attempts: u32 },

    #[error("API key not found: pass --api-key, set {env_var}, or add it to ~/.config/eleven-stt/config.toml")]
    #[diagnostic(code(eleven_stt::missing_api_key))]
    MissingApiKey { env_var: String },

    #[error("Configuration error: {0}")]
    #[diagnostic(code(eleven_stt::config))]
    Config(String),

    #[error("Output error: {0}")]
    #[diagnostic(code(eleven_stt::output))]
    Output(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Failures of a single call through the transport, after retries.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}

const RETRYABLE_STATUS: [u16; 5] = [429, 500, 502, 503, 504];

impl TransportError {
    /// Rate limiting, transient server errors and anything that never got a
    /// response are worth repeating. Everything else is final.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => RETRYABLE_STATUS.contains(status),
            Self::Network(e) => e.status().map_or(true, |s| RETRYABLE_STATUS.contains(&s.as_u16())),
            Self::MalformedResponse(_) => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            Self::MalformedResponse(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SttError>;

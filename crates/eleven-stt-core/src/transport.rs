//! The one place that talks HTTP to the provider.
//!
//! Every call goes through [`Transport::execute`], which repeats transient
//! failures with exponential backoff and jitter. Multipart bodies are rebuilt
//! for each attempt, so a local upload file is opened per attempt and closed
//! as soon as that attempt's request finishes.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, Url};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::errors::{Result, SttError, TransportError};
use crate::request::AudioInput;

/// Exponential backoff with a cap and additive jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts is one more.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Upper bound (exclusive) of the random delay added to each backoff.
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 4,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
            jitter: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    /// Retries without sleeping in between.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }

    /// Deterministic part of the delay before retry `n` (1-indexed).
    pub fn backoff_floor(&self, n: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(n))
            .min(self.max_delay)
    }

    /// Delay before retry `n`: the floor plus uniform jitter in `[0, jitter)`.
    pub fn backoff_delay(&self, n: u32) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::thread_rng().gen_range(0..jitter_ms))
        };
        self.backoff_floor(n) + jitter
    }
}

/// One multipart field.
#[derive(Debug, Clone, PartialEq)]
pub enum FormField {
    Text {
        name: &'static str,
        value: String,
    },
    File {
        name: &'static str,
        input: AudioInput,
        filename: String,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Multipart(Vec<FormField>),
}

/// Everything needed to issue (and re-issue) a request.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    /// Unencoded path segments under the base URL.
    pub segments: Vec<String>,
    pub body: RequestBody,
}

impl RequestSpec {
    fn new<I, S>(method: Method, segments: I, body: RequestBody) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method,
            segments: segments.into_iter().map(Into::into).collect(),
            body,
        }
    }

    pub fn get<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::GET, segments, RequestBody::Empty)
    }

    pub fn delete<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::DELETE, segments, RequestBody::Empty)
    }

    pub fn post_multipart<I, S>(segments: I, fields: Vec<FormField>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::POST, segments, RequestBody::Multipart(fields))
    }

    /// Readable path for logs and error messages; not percent-encoded.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

/// HTTP access to the provider. Cheap to share; the underlying
/// `reqwest::Client` pools connections and is safe for concurrent use.
#[derive(Debug, Clone)]
pub struct Transport {
    client: reqwest::Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl Transport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| SttError::Config(format!("Invalid base URL `{}`", config.base_url)))?;

        let mut key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| SttError::Config("API key contains invalid header characters".into()))?;
        key.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert("xi-api-key", key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(|e| SttError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            retry: config.retry,
        })
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Issue `spec`, retrying transient failures. Returns the first
    /// successful response or the last error.
    pub async fn execute(&self, spec: &RequestSpec) -> Result<reqwest::Response> {
        with_backoff(&self.retry, spec, move || self.attempt(spec)).await
    }

    /// [`execute`](Self::execute) and decode the body as JSON.
    pub async fn execute_json(&self, spec: &RequestSpec) -> Result<Value> {
        let resp = self.execute(spec).await?;
        let body = resp.text().await.map_err(TransportError::Network)?;
        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            SttError::from(TransportError::MalformedResponse(format!(
                "{} {} returned non-JSON body ({e}): {preview}",
                spec.method,
                spec.path()
            )))
        })
    }

    /// Base URL plus `spec`'s segments, each one percent-encoded so ids with
    /// `/`, `?` or `#` stay a single segment.
    fn url(&self, spec: &RequestSpec) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(&spec.segments);
        }
        url
    }

    async fn attempt(&self, spec: &RequestSpec) -> Result<reqwest::Response> {
        let url = self.url(spec);
        tracing::debug!(method = %spec.method, %url, "Sending provider request");

        let mut builder = self.client.request(spec.method.clone(), url);
        if let RequestBody::Multipart(fields) = &spec.body {
            builder = builder.multipart(build_form(fields).await?);
        }

        let resp = builder.send().await.map_err(TransportError::Network)?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        Err(TransportError::Status {
            status: status.as_u16(),
            body,
        }
        .into())
    }
}

/// Run `attempt` until it succeeds, fails for good, or `policy` runs out of
/// retries. The backoff delay is slept before every retry, never before the
/// first attempt.
async fn with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    spec: &RequestSpec,
    mut attempt: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut retries = 0;
    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(SttError::Transport(err)) if err.is_retryable() && retries < policy.max_retries => {
                retries += 1;
                let delay = policy.backoff_delay(retries);
                tracing::warn!(
                    method = %spec.method,
                    path = %spec.path(),
                    retry = retries,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "Provider request failed, retrying: {err}"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

async fn build_form(fields: &[FormField]) -> Result<Form> {
    let mut form = Form::new();
    for field in fields {
        form = match field {
            FormField::Text { name, value } => form.text(*name, value.clone()),
            FormField::File {
                name,
                input,
                filename,
            } => form.part(*name, file_part(input, filename).await?),
        };
    }
    Ok(form)
}

async fn file_part(input: &AudioInput, filename: &str) -> Result<Part> {
    let part = match input {
        AudioInput::Bytes(bytes) => Part::bytes(bytes.clone()),
        AudioInput::Path(path) => {
            let file = tokio::fs::File::open(path).await.map_err(|e| {
                SttError::InvalidRequest(format!("cannot open {}: {e}", path.display()))
            })?;
            let len = file.metadata().await?.len();
            Part::stream_with_length(file, len)
        }
    };
    Ok(part.file_name(filename.to_string()))
}

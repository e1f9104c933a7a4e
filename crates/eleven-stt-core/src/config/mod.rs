pub mod schema;

use std::path::PathBuf;
use std::time::Duration;

use crate::errors::{Result, SttError};
use crate::request::RequestDefaults;
use crate::transport::RetryPolicy;
use schema::FileConfig;

pub const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io/v1";
pub const DEFAULT_API_KEY_ENV: &str = "ELEVENLABS_STT_API_KEY";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
pub const USER_AGENT: &str = concat!(
    "eleven-stt/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/xHUNx/eleven-stt)"
);

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Name of the env var that holds the API key.
    pub api_key_env: String,
    /// Pre-resolved API key (from file or env var).
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
    pub defaults: RequestDefaults,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            defaults: RequestDefaults::default(),
        }
    }
}

impl ResolvedConfig {
    /// Return the API key, checking the pre-resolved field then the env var.
    pub fn api_key(&self) -> Result<String> {
        if let Some(ref key) = self.api_key {
            return Ok(key.clone());
        }
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| SttError::MissingApiKey {
                env_var: self.api_key_env.clone(),
            })
    }
}

/// Everything a client needs, fixed at construction and never mutated.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: String,
    /// Where the key was expected to come from; named in missing-key errors.
    pub api_key_env: String,
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
    pub retry: RetryPolicy,
    pub defaults: RequestDefaults,
}

impl ClientConfig {
    /// Built-in settings with the given key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: USER_AGENT.to_string(),
            retry: RetryPolicy::default(),
            defaults: RequestDefaults::default(),
        }
    }

    /// An explicit key wins over whatever the config layers found.
    pub fn from_resolved(resolved: &ResolvedConfig, api_key: Option<String>) -> Result<Self> {
        let api_key = match api_key.filter(|key| !key.is_empty()) {
            Some(key) => key,
            None => resolved.api_key()?,
        };
        Ok(Self {
            api_key_env: resolved.api_key_env.clone(),
            base_url: resolved.base_url.clone(),
            timeout: resolved.timeout,
            defaults: resolved.defaults.clone(),
            ..Self::new(api_key)
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_defaults(mut self, defaults: RequestDefaults) -> Self {
        self.defaults = defaults;
        self
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("eleven-stt").join("config.toml"))
}

/// Load configuration: defaults → file → env vars.
pub fn load_config() -> Result<ResolvedConfig> {
    let mut resolved = ResolvedConfig::default();

    // Layer 2: file config
    if let Some(path) = config_path() {
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            match FileConfig::from_toml(&contents) {
                Ok(file) => apply_file_config(&mut resolved, file),
                Err(e) => {
                    return Err(SttError::Config(format!(
                        "Failed to parse {}: {e}",
                        path.display()
                    )))
                }
            }
        }
    }

    // Layer 3: env var overrides
    if let Ok(key) = std::env::var(&resolved.api_key_env) {
        if !key.is_empty() {
            resolved.api_key = Some(key);
        }
    }
    if let Ok(model) = std::env::var("ELEVEN_STT_MODEL") {
        if !model.is_empty() {
            resolved.defaults.model_id = model;
        }
    }
    if let Ok(url) = std::env::var("ELEVEN_STT_BASE_URL") {
        if !url.is_empty() {
            resolved.base_url = url;
        }
    }

    tracing::debug!(base_url = %resolved.base_url, "configuration loaded");
    Ok(resolved)
}

fn apply_file_config(r: &mut ResolvedConfig, f: FileConfig) {
    if let Some(env) = f.api.api_key_env {
        r.api_key_env = env;
    }
    if let Some(key) = f.api.api_key {
        if !key.is_empty() {
            r.api_key = Some(key);
        }
    }
    if let Some(url) = f.api.base_url {
        r.base_url = url;
    }
    if let Some(secs) = f.api.timeout_secs {
        r.timeout = Duration::from_secs(secs);
    }
    r.defaults = f.defaults;
}

use serde::Deserialize;

use crate::request::RequestDefaults;

/// TOML-deserializable config file format.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub api: ApiConfig,

    /// Request defaults applied to every transcription.
    #[serde(default)]
    pub defaults: RequestDefaults,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ApiConfig {
    /// Name of the env var that holds the API key (default: "ELEVENLABS_STT_API_KEY").
    pub api_key_env: Option<String>,
    /// Directly embedded API key (not recommended; prefer env var).
    pub api_key: Option<String>,
    /// API root, e.g. "https://api.elevenlabs.io/v1".
    pub base_url: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

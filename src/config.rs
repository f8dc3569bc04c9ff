use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::booking::CustomerIdentity;

/// Environment prefix for overrides, e.g. `DROPTRUCK__LLM__MODEL`
pub const ENV_PREFIX: &str = "DROPTRUCK";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub llm: LlmConfig,
    pub tts: TtsConfig,
    pub transcription: TranscriptionConfig,
    pub booking_api: BookingApiConfig,
    pub logs: LogsConfig,
    pub customer: CustomerIdentity,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Session directories are created under this path
    pub output_dir: PathBuf,
    pub sample_rate: u32,
    pub channels: u16,
    /// Capacity of the bounded capture channel, in chunks
    pub capture_capacity: usize,
    pub frame_duration_ms: u32,
    /// Keep synthesized replies in memory instead of writing reply files
    pub replies_in_memory: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("audio_output"),
            sample_rate: 16000,
            channels: 1,
            capture_capacity: 256,
            frame_duration_ms: 100,
            replies_in_memory: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// User/assistant exchanges kept besides the system prompt
    pub history_window: usize,
    pub timeout_secs: u64,
    /// Falls back to `OPENAI_API_KEY`; empty means echo mode
    pub api_key: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 256,
            history_window: 10,
            timeout_secs: 30,
            api_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    pub base_url: String,
    pub model: String,
    /// Falls back to `DEEPGRAM_API_KEY`
    pub api_key: String,
    /// Extension of the synthesized audio
    pub reply_format: String,
    /// External player invoked with the reply path, e.g. `mpg123`
    pub playback_command: Option<String>,
    /// Loose audio files older than this are removed at shutdown
    pub cleanup_max_age_secs: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.deepgram.com".to_string(),
            model: "aura-asteria-en".to_string(),
            api_key: String::new(),
            reply_format: "mp3".to_string(),
            playback_command: None,
            cleanup_max_age_secs: 3600,
        }
    }
}

impl TtsConfig {
    pub fn cleanup_max_age(&self) -> Duration {
        Duration::from_secs(self.cleanup_max_age_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub nats_url: String,
    /// Subject transcripts are received on
    pub subject: String,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            nats_url: "nats://localhost:4222".to_string(),
            subject: "stt.text.>".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BookingApiConfig {
    pub enabled: bool,
    pub base_url: String,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for BookingApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://127.0.0.1:8000".to_string(),
            endpoint: "agent-newindent".to_string(),
            timeout_secs: 10,
        }
    }
}

impl BookingApiConfig {
    pub fn url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.endpoint.trim_start_matches('/')
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogsConfig {
    pub dir: PathBuf,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
        }
    }
}

impl Config {
    /// Load from an optional config file plus `DROPTRUCK__*` environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to load config from {}", path))?;

        let mut cfg: Config = settings
            .try_deserialize()
            .context("Invalid configuration")?;
        cfg.apply_credential_env();

        Ok(cfg)
    }

    /// Fill empty API keys from the providers' conventional variables
    pub fn apply_credential_env(&mut self) {
        if self.llm.api_key.is_empty() {
            if let Ok(key) = std::env::var("OPENAI_API_KEY") {
                self.llm.api_key = key;
            }
        }
        if self.tts.api_key.is_empty() {
            if let Ok(key) = std::env::var("DEEPGRAM_API_KEY") {
                self.tts.api_key = key;
            }
        }
    }
}

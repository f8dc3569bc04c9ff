use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tokio::process::Command;
use tracing::{info, warn};

use super::SpeechSynthesizer;
use crate::config::TtsConfig;

#[derive(Serialize)]
struct SpeakRequest<'a> {
    text: &'a str,
}

/// Deepgram-style speech synthesis over HTTP
pub struct SpeechClient {
    client: Client,
    config: TtsConfig,
}

impl SpeechClient {
    pub fn new(config: TtsConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            bail!("Speech synthesis needs an API key (tts.api_key or DEEPGRAM_API_KEY)");
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, config })
    }

    fn speak_url(&self) -> String {
        format!(
            "{}/v1/speak?model={}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl SpeechSynthesizer for SpeechClient {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        if text.trim().is_empty() {
            bail!("No text to synthesize");
        }

        info!("Synthesizing speech ({} chars)", text.len());

        let response = self
            .client
            .post(self.speak_url())
            .header("Authorization", format!("Token {}", self.config.api_key))
            .json(&SpeakRequest { text })
            .send()
            .await
            .context("Speech request failed")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Speech API returned {}", status));
        }

        let bytes = response.bytes().await.context("Failed to read speech audio")?;
        Ok(bytes.to_vec())
    }
}

/// Play a reply file through an external player and wait for it to finish
pub async fn play_reply(command: &str, path: &Path) -> Result<()> {
    let mut parts = command.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| anyhow!("Empty playback command"))?;

    let status = Command::new(program)
        .args(parts)
        .arg(path)
        .status()
        .await
        .with_context(|| format!("Failed to run {}", program))?;

    if !status.success() {
        warn!("{} exited with {}", program, status);
    }

    Ok(())
}

/// Remove loose files in `dir` last modified more than `max_age` ago
///
/// Session directories are left alone. Returns how many files were removed;
/// failures are logged and never abort shutdown.
pub fn cleanup_old_files(dir: &Path, max_age: Duration) -> usize {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cleanup of {} failed: {}", dir.display(), e);
            return 0;
        }
    };

    let now = SystemTime::now();
    let mut removed = 0;

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }

        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .unwrap_or_default();
        if age <= max_age {
            continue;
        }

        match fs::remove_file(&path) {
            Ok(()) => {
                info!("Removed old audio file: {}", path.display());
                removed += 1;
            }
            Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
        }
    }

    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn age_file(path: &Path, age: Duration) {
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    #[test]
    fn test_cleanup_removes_only_stale_files() {
        let dir = TempDir::new().unwrap();
        let stale = dir.path().join("reply_old.mp3");
        let fresh = dir.path().join("reply_new.mp3");
        let session_dir = dir.path().join("session_2025-11-27_10-00-00");
        fs::write(&stale, b"old").unwrap();
        fs::write(&fresh, b"new").unwrap();
        fs::create_dir(&session_dir).unwrap();
        age_file(&stale, Duration::from_secs(2 * 3600));

        let removed = cleanup_old_files(dir.path(), Duration::from_secs(3600));

        assert_eq!(removed, 1);
        assert!(!stale.exists());
        assert!(fresh.exists());
        assert!(session_dir.exists());
    }

    #[test]
    fn test_cleanup_of_missing_dir_is_harmless() {
        let dir = TempDir::new().unwrap();
        assert_eq!(cleanup_old_files(&dir.path().join("absent"), Duration::from_secs(1)), 0);
    }

    #[test]
    fn test_requires_api_key() {
        assert!(SpeechClient::new(TtsConfig::default()).is_err());
    }

    #[test]
    fn test_speak_url_carries_model() {
        let client = SpeechClient::new(TtsConfig {
            api_key: "key".to_string(),
            base_url: "https://tts.example/".to_string(),
            ..TtsConfig::default()
        })
        .unwrap();

        assert_eq!(
            client.speak_url(),
            "https://tts.example/v1/speak?model=aura-asteria-en"
        );
    }

    #[tokio::test]
    async fn test_play_reply_rejects_empty_command() {
        assert!(play_reply("  ", Path::new("reply.mp3")).await.is_err());
    }
}

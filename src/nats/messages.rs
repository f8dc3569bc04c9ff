//! Wire format between the agent and the transcription service

use anyhow::{Context, Result};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::providers::TranscriptEvent;

/// One captured caller frame, published on `audio.frame.<session>`
///
/// The last frame of a call has `final` set and no PCM so the service can
/// flush its pending transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioFrameMessage {
    pub session_id: String,
    pub sequence: u32,
    /// Base64 of 16-bit little-endian PCM
    pub pcm: String,
    pub sample_rate: u32,
    pub channels: u16,
    #[serde(default)]
    pub duration_ms: u32,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "final")]
    pub final_frame: bool,
}

impl AudioFrameMessage {
    pub fn encode(
        session_id: &str,
        pcm_bytes: &[u8],
        sample_rate: u32,
        channels: u16,
        sequence: u32,
        is_final: bool,
    ) -> Self {
        Self {
            session_id: session_id.to_string(),
            sequence,
            pcm: base64::engine::general_purpose::STANDARD.encode(pcm_bytes),
            sample_rate,
            channels,
            duration_ms: pcm_duration_ms(pcm_bytes.len(), sample_rate, channels),
            timestamp: Utc::now(),
            final_frame: is_final,
        }
    }

    pub fn decode_pcm(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.pcm)
            .context("Frame PCM is not valid base64")
    }
}

fn pcm_duration_ms(bytes: usize, sample_rate: u32, channels: u16) -> u32 {
    let bytes_per_second = sample_rate as u64 * channels.max(1) as u64 * 2;
    if bytes_per_second == 0 {
        return 0;
    }
    (bytes as u64 * 1000 / bytes_per_second) as u32
}

/// Transcript published by the transcription service on `stt.text.*`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub session_id: String,
    pub text: String,
    /// More text for the same utterance will follow
    pub partial: bool,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub confidence: Option<f32>,
}

impl TranscriptMessage {
    pub fn is_for(&self, session_id: &str) -> bool {
        self.session_id == session_id
    }

    pub fn into_event(self) -> TranscriptEvent {
        TranscriptEvent {
            text: self.text,
            is_final: !self.partial,
        }
    }
}

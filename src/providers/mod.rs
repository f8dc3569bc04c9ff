//! External collaborators of a call
//!
//! Each seam is a trait so the call loop can run against HTTP services,
//! NATS, stdin, or test doubles.

pub mod booking_api;
pub mod llm;
pub mod stdin;
pub mod tts;

use anyhow::Result;
use async_trait::async_trait;

use crate::booking::BookingSubmission;

pub use booking_api::HttpBookingSubmitter;
pub use llm::{ChatClient, ChatMessage, ChatRole};
pub use stdin::StdinTranscriber;
pub use tts::{cleanup_old_files, play_reply, SpeechClient};

/// One transcription result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEvent {
    pub text: String,
    /// Marks an utterance boundary
    pub is_final: bool,
}

impl TranscriptEvent {
    pub fn partial(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }

    pub fn final_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }
}

/// Source of transcription events for the caller's speech
#[async_trait]
pub trait Transcriber: Send {
    /// Next event, or `None` once the stream has ended
    async fn next_event(&mut self) -> Result<Option<TranscriptEvent>>;
}

/// Generates the assistant's reply to a caller utterance
#[async_trait]
pub trait LanguageModel: Send {
    /// Always yields a reply; provider failures become a fallback line
    async fn respond(&mut self, user_text: &str) -> String;
}

/// Turns reply text into encoded audio (MP3 or WAV bytes)
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}

/// Receives the booking once the customer has confirmed
#[async_trait]
pub trait BookingSubmitter: Send + Sync {
    async fn submit(&self, booking: &BookingSubmission) -> Result<()>;
}

/// Forwards captured PCM to a transcription service
#[async_trait]
pub trait FramePublisher: Send + Sync {
    async fn publish_frame(
        &self,
        pcm_bytes: &[u8],
        sample_rate: u32,
        channels: u16,
        sequence: u32,
        is_final: bool,
    ) -> Result<()>;
}

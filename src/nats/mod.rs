//! Transcription bridge over NATS: PCM frames out, transcripts in

pub mod client;
pub mod messages;

pub use client::{NatsClient, NatsTranscriber};
pub use messages::{AudioFrameMessage, TranscriptMessage};

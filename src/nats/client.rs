use anyhow::{Context, Result};
use async_nats::{Client, Subscriber};
use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, info, warn};

use super::messages::{AudioFrameMessage, TranscriptMessage};
use crate::providers::{FramePublisher, TranscriptEvent, Transcriber};

pub struct NatsClient {
    client: Client,
    session_id: String,
}

impl NatsClient {
    /// Connect to NATS server
    pub async fn connect(url: &str, session_id: String) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client, session_id })
    }

    pub fn frame_subject(&self) -> String {
        frame_subject(&self.session_id)
    }

    /// Subscribe to transcript messages for this session
    pub async fn subscribe_transcripts(&self, subject: &str) -> Result<NatsTranscriber> {
        // Partial and final transcripts share the subject tree; the
        // session is filtered on the payload.
        info!("Subscribing to transcripts on {}", subject);

        let subscriber = self
            .client
            .subscribe(subject.to_string())
            .await
            .context("Failed to subscribe to transcripts")?;

        Ok(NatsTranscriber {
            subscriber,
            session_id: self.session_id.clone(),
        })
    }
}

pub fn frame_subject(session_id: &str) -> String {
    format!("audio.frame.{}", session_id)
}

#[async_trait]
impl FramePublisher for NatsClient {
    async fn publish_frame(
        &self,
        pcm_bytes: &[u8],
        sample_rate: u32,
        channels: u16,
        sequence: u32,
        is_final: bool,
    ) -> Result<()> {
        let subject = self.frame_subject();
        let message = AudioFrameMessage::encode(
            &self.session_id,
            pcm_bytes,
            sample_rate,
            channels,
            sequence,
            is_final,
        );

        let payload = serde_json::to_vec(&message)?;

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .context("Failed to publish audio frame")?;

        debug!(
            "Published audio frame to {} (seq={}, bytes={}, final={})",
            subject,
            sequence,
            pcm_bytes.len(),
            is_final
        );

        Ok(())
    }
}

/// Transcripts for one session, read from a NATS subscription
pub struct NatsTranscriber {
    subscriber: Subscriber,
    session_id: String,
}

impl NatsTranscriber {
    /// Map a raw payload to an event for this session, if it is one
    pub fn parse(session_id: &str, payload: &[u8]) -> Option<TranscriptEvent> {
        match serde_json::from_slice::<TranscriptMessage>(payload) {
            Ok(transcript) if transcript.is_for(session_id) => Some(transcript.into_event()),
            Ok(_) => None,
            Err(e) => {
                warn!("Failed to parse transcript message: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl Transcriber for NatsTranscriber {
    async fn next_event(&mut self) -> Result<Option<TranscriptEvent>> {
        while let Some(message) = self.subscriber.next().await {
            if let Some(event) = Self::parse(&self.session_id, &message.payload) {
                return Ok(Some(event));
            }
        }

        info!("Transcript subscription closed");
        Ok(None)
    }
}

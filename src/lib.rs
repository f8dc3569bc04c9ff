pub mod audio;
pub mod booking;
pub mod call;
pub mod config;
pub mod logging;
pub mod nats;
pub mod providers;
pub mod recording;

pub use audio::{
    capture_channel, AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioBuffer,
    AudioFile, AudioFrame, AudioSource, AudioWriter, CaptureDrain, CaptureSink,
};
pub use booking::{
    BookingEvent, BookingField, BookingRecord, BookingSession, ConfirmationPolicy,
    ConfirmationStatus, ExtractionContext, FieldExtractor, Speaker,
};
pub use call::{CallAgent, CallOutcome};
pub use config::Config;
pub use nats::{AudioFrameMessage, NatsClient, TranscriptMessage};
pub use recording::{ConversationRecorder, RecordingStats, ReplyAudio};

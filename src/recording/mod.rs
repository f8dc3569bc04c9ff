//! Call recording
//!
//! `ConversationRecorder` owns the caller's capture buffer and the ordered
//! list of assistant replies, and produces the single merged WAV at the end
//! of the call.

mod recorder;
mod stats;

pub use recorder::{silence, ConversationRecorder, ReplyAudio, EDGE_SILENCE_MS, REPLY_PAUSE_MS};
pub use stats::RecordingStats;

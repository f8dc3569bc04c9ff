use serde::{Deserialize, Serialize};

/// Snapshot of a call's recording artifacts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingStats {
    /// Call session identifier
    pub session_id: String,

    /// Whether the flushed user capture is on disk
    pub user_audio_exists: bool,

    /// Size of the user capture in bytes, if present
    pub user_audio_size_bytes: Option<u64>,

    /// Whether the merged conversation is on disk
    pub conversation_exists: bool,

    /// Size of the merged conversation in bytes, if present
    pub conversation_size_bytes: Option<u64>,

    /// Number of assistant replies registered for the merge
    pub assistant_responses: usize,
}

impl RecordingStats {
    pub fn conversation_size_mb(&self) -> Option<f64> {
        self.conversation_size_bytes
            .map(|bytes| bytes as f64 / (1024.0 * 1024.0))
    }
}

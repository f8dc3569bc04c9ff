use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use super::stats::RecordingStats;
use crate::audio::{decode_bytes, decode_file, AudioBuffer, AudioFile, AudioWriter};

/// Lead-in and trailing silence around the merged call
pub const EDGE_SILENCE_MS: u32 = 500;
/// Pause inserted before each assistant reply
pub const REPLY_PAUSE_MS: u32 = 300;

/// Reference to one synthesized reply, in generation order
#[derive(Debug, Clone)]
pub enum ReplyAudio {
    /// Reply written to disk (MP3 from the synthesis provider, or any decodable format)
    File(PathBuf),
    /// Reply kept in memory
    Memory(Vec<u8>),
}

impl ReplyAudio {
    fn describe(&self) -> String {
        match self {
            ReplyAudio::File(path) => path.display().to_string(),
            ReplyAudio::Memory(bytes) => format!("<in-memory, {} bytes>", bytes.len()),
        }
    }
}

/// Records a whole call: the caller's capture plus every assistant reply
///
/// One recorder per call. [`merge`](Self::merge) is one-shot: on success it
/// deletes the inputs it consumed, so a second call has nothing to merge.
pub struct ConversationRecorder {
    session_id: String,
    session_dir: PathBuf,
    user_audio_path: PathBuf,
    conversation_path: PathBuf,
    buffer: AudioBuffer,
    writer: AudioWriter,
    assistant_replies: Vec<ReplyAudio>,
}

impl ConversationRecorder {
    /// Create the session directory `<output_dir>/session_<id>`
    pub fn new(session_id: &str, output_dir: impl AsRef<Path>, writer: AudioWriter) -> Result<Self> {
        let session_dir = output_dir.as_ref().join(format!("session_{}", session_id));
        fs::create_dir_all(&session_dir)
            .with_context(|| format!("Failed to create session directory: {}", session_dir.display()))?;

        info!("Audio recording to: {}", session_dir.display());

        Ok(Self {
            session_id: session_id.to_string(),
            user_audio_path: session_dir.join("user_input.wav"),
            conversation_path: session_dir.join("full_conversation.wav"),
            session_dir,
            buffer: AudioBuffer::new(),
            writer,
            assistant_replies: Vec::new(),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn session_dir(&self) -> &Path {
        &self.session_dir
    }

    pub fn user_audio_path(&self) -> &Path {
        &self.user_audio_path
    }

    pub fn conversation_path(&self) -> &Path {
        &self.conversation_path
    }

    /// Handle to the capture buffer, for the drain task
    pub fn buffer(&self) -> AudioBuffer {
        self.buffer.clone()
    }

    pub fn start_recording(&self) {
        self.buffer.start();
        info!("Recording started");
    }

    /// Stop capture and flush the caller's audio to `user_input.wav`.
    ///
    /// Returns whether a file was written (nothing is written for an empty capture).
    pub fn stop_recording(&self) -> Result<bool> {
        self.buffer.stop();

        let written = self.writer.flush(&self.buffer, &self.user_audio_path)?;
        if written {
            self.buffer.clear();
        } else {
            info!("No user audio captured");
        }

        Ok(written)
    }

    /// Path for the next reply written to disk
    pub fn next_reply_path(&self, extension: &str) -> PathBuf {
        self.session_dir.join(format!(
            "assistant_reply_{:03}.{}",
            self.assistant_replies.len() + 1,
            extension
        ))
    }

    /// Register a reply; the call order here is the merge order
    pub fn add_assistant_reply(&mut self, reply: ReplyAudio) -> usize {
        self.assistant_replies.push(reply);
        let count = self.assistant_replies.len();
        info!("Assistant response {} recorded", count);
        count
    }

    pub fn assistant_replies(&self) -> &[ReplyAudio] {
        &self.assistant_replies
    }

    /// Merge the user capture and the replies into `full_conversation.wav`.
    ///
    /// Timeline: 500ms silence, user audio, then 300ms pause + reply for
    /// each readable reply, then 500ms silence. Missing or undecodable
    /// replies are skipped. Returns `None` when there is no user audio or
    /// the export fails.
    pub fn merge(&self) -> Option<PathBuf> {
        info!(
            "Merging conversation audio ({} assistant responses)",
            self.assistant_replies.len()
        );

        if !self.user_audio_path.exists() {
            warn!("No user audio found, skipping merge");
            return None;
        }

        let rate = self.writer.sample_rate;

        let user = match AudioFile::open(&self.user_audio_path) {
            Ok(audio) => audio.to_mono(rate),
            Err(e) => {
                error!("Error merging conversation: {:#}", e);
                return None;
            }
        };

        let mut timeline = silence(rate, EDGE_SILENCE_MS);
        timeline.extend_from_slice(&user);
        info!("Added user audio ({:.1}s)", user.len() as f64 / rate as f64);

        let mut consumed: Vec<&Path> = Vec::new();
        let total = self.assistant_replies.len();

        for (i, reply) in self.assistant_replies.iter().enumerate() {
            let decoded = match reply {
                ReplyAudio::File(path) if !path.exists() => {
                    warn!("Reply {}/{} not found: {}", i + 1, total, path.display());
                    continue;
                }
                ReplyAudio::File(path) => decode_file(path),
                ReplyAudio::Memory(bytes) => decode_bytes(bytes.clone()),
            };

            let audio = match decoded {
                Ok(audio) => audio,
                Err(e) => {
                    warn!("Skipping reply {}/{} ({}): {:#}", i + 1, total, reply.describe(), e);
                    continue;
                }
            };

            let samples = audio.into_mono(rate);
            timeline.extend(silence(rate, REPLY_PAUSE_MS));
            timeline.extend_from_slice(&samples);
            info!(
                "Merged assistant response {}/{} ({:.1}s)",
                i + 1,
                total,
                samples.len() as f64 / rate as f64
            );

            if let ReplyAudio::File(path) = reply {
                consumed.push(path);
            }
        }

        timeline.extend(silence(rate, EDGE_SILENCE_MS));

        if let Err(e) = self.writer.write_samples(&self.conversation_path, &timeline) {
            error!("Error merging conversation: {:#}", e);
            return None;
        }

        info!(
            "Full conversation saved: {} ({:.1}s)",
            self.conversation_path.display(),
            timeline.len() as f64 / rate as f64
        );

        self.cleanup_intermediate_files(&consumed);

        Some(self.conversation_path.clone())
    }

    /// Delete the user capture and the reply files that went into the merge
    fn cleanup_intermediate_files(&self, replies: &[&Path]) {
        let targets = std::iter::once(self.user_audio_path.as_path()).chain(replies.iter().copied());

        for path in targets {
            match fs::remove_file(path) {
                Ok(()) => info!("Removed: {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Error removing {}: {}", path.display(), e),
            }
        }
    }

    /// Report artifact presence and sizes; no side effects
    pub fn stats(&self) -> RecordingStats {
        let user_audio_size_bytes = file_size(&self.user_audio_path);
        let conversation_size_bytes = file_size(&self.conversation_path);

        RecordingStats {
            session_id: self.session_id.clone(),
            user_audio_exists: user_audio_size_bytes.is_some(),
            user_audio_size_bytes,
            conversation_exists: conversation_size_bytes.is_some(),
            conversation_size_bytes,
            assistant_responses: self.assistant_replies.len(),
        }
    }
}

/// Mono silence of the given length at `sample_rate`
pub fn silence(sample_rate: u32, duration_ms: u32) -> Vec<i16> {
    vec![0; (sample_rate as u64 * duration_ms as u64 / 1000) as usize]
}

fn file_size(path: &Path) -> Option<u64> {
    fs::metadata(path).ok().filter(|m| m.is_file()).map(|m| m.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_length() {
        assert_eq!(silence(16000, 500).len(), 8000);
        assert_eq!(silence(16000, 300).len(), 4800);
        assert!(silence(16000, 0).is_empty());
    }

    #[test]
    fn test_next_reply_path_numbers_in_order() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut recorder =
            ConversationRecorder::new("test", dir.path(), AudioWriter::default()).unwrap();

        let first = recorder.next_reply_path("mp3");
        assert!(first.ends_with("session_test/assistant_reply_001.mp3"));

        recorder.add_assistant_reply(ReplyAudio::File(first));
        let second = recorder.next_reply_path("mp3");
        assert!(second.ends_with("session_test/assistant_reply_002.mp3"));
    }
}

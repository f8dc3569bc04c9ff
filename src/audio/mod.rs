pub mod backend;
pub mod buffer;
pub mod decode;
pub mod file;
pub mod file_backend;
pub mod writer;

#[cfg(feature = "microphone")]
pub mod microphone;

pub use backend::{AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFrame, AudioSource};
pub use buffer::{capture_channel, AudioBuffer, CaptureDrain, CaptureSink};
pub use decode::{decode_bytes, decode_file, DecodedAudio};
pub use file::AudioFile;
pub use file_backend::FileBackend;
pub use writer::AudioWriter;

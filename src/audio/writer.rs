use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use tracing::{info, warn};

use super::buffer::AudioBuffer;

/// Writes PCM into WAV containers at the session's fixed format
#[derive(Debug, Clone, Copy)]
pub struct AudioWriter {
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for AudioWriter {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
        }
    }
}

impl AudioWriter {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self { sample_rate, channels }
    }

    fn spec(&self) -> hound::WavSpec {
        hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        }
    }

    /// Concatenate the buffered chunks and write them as one WAV file.
    ///
    /// The chunks are taken to be little-endian 16-bit PCM in the writer's
    /// format. Returns `Ok(false)` without touching the filesystem when the
    /// buffer holds nothing.
    pub fn flush(&self, buffer: &AudioBuffer, destination: &Path) -> Result<bool> {
        if buffer.is_empty() {
            return Ok(false);
        }

        let bytes = buffer.concat();
        if bytes.len() % 2 != 0 {
            warn!(
                "Captured audio has an odd byte count ({}); trailing byte ignored",
                bytes.len()
            );
        }

        let samples: Vec<i16> = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        self.write_samples(destination, &samples)?;

        info!(
            "User audio saved: {} ({} chunks, {} bytes)",
            destination.display(),
            buffer.len(),
            bytes.len()
        );

        Ok(true)
    }

    /// Write interleaved samples to a new WAV file
    pub fn write_samples(&self, destination: &Path, samples: &[i16]) -> Result<()> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let mut writer: hound::WavWriter<BufWriter<File>> =
            hound::WavWriter::create(destination, self.spec())
                .with_context(|| format!("Failed to create WAV file: {:?}", destination))?;

        for &sample in samples {
            writer
                .write_sample(sample)
                .context("Failed to write sample to WAV")?;
        }

        writer.finalize().context("Failed to finalize WAV file")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_flush_empty_buffer_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("user_input.wav");

        let buffer = AudioBuffer::new();
        buffer.start();
        buffer.stop();

        let written = AudioWriter::default().flush(&buffer, &path).unwrap();
        assert!(!written);
        assert!(!path.exists());
    }

    #[test]
    fn test_flush_writes_16khz_mono_pcm() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("user_input.wav");

        let buffer = AudioBuffer::new();
        buffer.start();
        buffer.push(vec![0x10, 0x00, 0x20, 0x00]);
        buffer.push(vec![0xFF, 0xFF]);
        buffer.stop();

        assert!(AudioWriter::default().flush(&buffer, &path).unwrap());

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, 16000);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.bits_per_sample, 16);

        let samples: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![16, 32, -1]);
    }
}

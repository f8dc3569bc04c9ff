use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

use super::{TranscriptEvent, Transcriber};

/// Text-mode transcriber: every input line is one final utterance
pub struct StdinTranscriber<R = BufReader<Stdin>> {
    lines: Lines<R>,
}

impl StdinTranscriber {
    pub fn new() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }
}

impl Default for StdinTranscriber {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: AsyncBufRead + Unpin> StdinTranscriber<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> Transcriber for StdinTranscriber<R> {
    async fn next_event(&mut self) -> Result<Option<TranscriptEvent>> {
        let line = self
            .lines
            .next_line()
            .await
            .context("Failed to read utterance")?;

        Ok(line.map(|text| TranscriptEvent::final_text(text.trim())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_each_line_is_final() {
        let input: &[u8] = b"from Chennai to Bangalore\n  yes  \n";
        let mut transcriber = StdinTranscriber::from_reader(BufReader::new(input));

        assert_eq!(
            transcriber.next_event().await.unwrap(),
            Some(TranscriptEvent::final_text("from Chennai to Bangalore"))
        );
        assert_eq!(
            transcriber.next_event().await.unwrap(),
            Some(TranscriptEvent::final_text("yes"))
        );
        assert_eq!(transcriber.next_event().await.unwrap(), None);
    }
}

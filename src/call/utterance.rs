use crate::providers::TranscriptEvent;

/// Joins transcript fragments into whole utterances
///
/// Fragments accumulate until a final event marks the boundary.
#[derive(Debug, Default)]
pub struct UtteranceAssembler {
    fragments: Vec<String>,
}

impl UtteranceAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one event; returns the utterance when `event` closes one
    pub fn push(&mut self, event: TranscriptEvent) -> Option<String> {
        let text = event.text.trim();
        if !text.is_empty() {
            self.fragments.push(text.to_string());
        }

        if !event.is_final {
            return None;
        }

        let utterance = self.fragments.join(" ");
        self.fragments.clear();

        (!utterance.is_empty()).then_some(utterance)
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragments_join_at_boundary() {
        let mut assembler = UtteranceAssembler::new();

        assert_eq!(assembler.push(TranscriptEvent::partial("I need a truck")), None);
        assert_eq!(assembler.push(TranscriptEvent::partial("  ")), None);
        assert_eq!(
            assembler.push(TranscriptEvent::final_text("from Chennai")),
            Some("I need a truck from Chennai".to_string())
        );
        assert!(assembler.is_empty());
    }

    #[test]
    fn test_empty_boundary_yields_nothing() {
        let mut assembler = UtteranceAssembler::new();
        assert_eq!(assembler.push(TranscriptEvent::final_text("")), None);
    }
}

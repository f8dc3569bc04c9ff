use once_cell::sync::Lazy;
use regex::Regex;

use super::record::{BookingRecord, ConfirmationStatus};

/// Token the language model appends once the customer has confirmed
pub const CONFIRMATION_MARKER: &str = "[BOOKING_CONFIRMED]";

/// Reply phrases that close the call
pub const CLOSING_PHRASES: &[&str] = &[
    "have a great day",
    "have a nice day",
    "goodbye",
    "good bye",
    "our sales person will contact you soon",
    "our salesperson will contact you soon",
    "you can contact droptruck anytime",
    "thank you for your time",
];

const CONFIRM_KEYWORDS: &[&str] = &[
    "yes", "yeah", "yep", "yup", "ok", "okay", "correct", "sure", "confirm", "confirmed",
    "right", "perfect", "go ahead", "sounds good", "done",
];

const REJECT_KEYWORDS: &[&str] = &[
    "no", "nope", "cancel", "not interested", "not correct", "don't want", "do not want",
    "not now", "wrong",
];

fn keyword_pattern(keywords: &[&str]) -> Regex {
    let alternatives: Vec<String> = keywords
        .iter()
        .map(|k| regex::escape(k).replace(' ', r"\s+"))
        .collect();
    Regex::new(&format!(r"\b(?:{})\b", alternatives.join("|"))).expect("keyword pattern")
}

static CONFIRM: Lazy<Regex> = Lazy::new(|| keyword_pattern(CONFIRM_KEYWORDS));
static REJECT: Lazy<Regex> = Lazy::new(|| keyword_pattern(REJECT_KEYWORDS));

/// Tracks the customer's decision and whether the call is over
#[derive(Debug, Clone, Default)]
pub struct ConfirmationPolicy {
    call_complete: bool,
}

impl ConfirmationPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keyword decision for one caller utterance, if any
    pub fn classify(text: &str) -> Option<ConfirmationStatus> {
        let lower = text.to_lowercase();
        if REJECT.is_match(&lower) {
            Some(ConfirmationStatus::NotInterested)
        } else if CONFIRM.is_match(&lower) {
            Some(ConfirmationStatus::Confirmed)
        } else {
            None
        }
    }

    /// Settle a pending status from a caller utterance.
    ///
    /// Returns the new status when it changed.
    pub fn observe_user(&self, record: &mut BookingRecord, text: &str) -> Option<ConfirmationStatus> {
        if record.confirmation_status() != ConfirmationStatus::Pending {
            return None;
        }

        let status = Self::classify(text)?;
        record.settle_status(status).then_some(status)
    }

    /// Check a generated reply for the marker and for closing phrases.
    ///
    /// Returns the new status when the marker changed it.
    pub fn observe_reply(&mut self, record: &mut BookingRecord, reply: &str) -> Option<ConfirmationStatus> {
        let has_marker = contains_marker(reply);
        let changed = has_marker && record.force_confirmed();

        if has_marker || is_closing(reply) {
            self.call_complete = true;
        }

        changed.then_some(ConfirmationStatus::Confirmed)
    }

    pub fn is_call_complete(&self) -> bool {
        self.call_complete
    }
}

pub fn contains_marker(reply: &str) -> bool {
    reply.contains(CONFIRMATION_MARKER)
}

pub fn is_closing(reply: &str) -> bool {
    let lower = reply.to_lowercase();
    CLOSING_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

/// Reply text with the marker removed, ready to be spoken
pub fn strip_marker(reply: &str) -> String {
    reply
        .replace(CONFIRMATION_MARKER, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_keywords() {
        assert_eq!(
            ConfirmationPolicy::classify("Yes, that's correct"),
            Some(ConfirmationStatus::Confirmed)
        );
        assert_eq!(
            ConfirmationPolicy::classify("No, I'm not interested"),
            Some(ConfirmationStatus::NotInterested)
        );
        assert_eq!(ConfirmationPolicy::classify("From Chennai to Bangalore"), None);
    }

    #[test]
    fn test_keywords_need_word_boundaries() {
        // "know" and "nothing" must not read as "no"; "okra" not as "ok"
        assert_eq!(ConfirmationPolicy::classify("I know nothing about okra"), None);
    }

    #[test]
    fn test_multi_word_rejection() {
        assert_eq!(
            ConfirmationPolicy::classify("that is not   correct"),
            Some(ConfirmationStatus::NotInterested)
        );
    }

    #[test]
    fn test_closing_phrase_completes_call() {
        let mut policy = ConfirmationPolicy::new();
        let mut record = BookingRecord::new();

        assert_eq!(policy.observe_reply(&mut record, "Thank you. Have a great day!"), None);
        assert!(policy.is_call_complete());
        assert_eq!(record.confirmation_status(), ConfirmationStatus::Pending);
    }

    #[test]
    fn test_marker_forces_confirmation() {
        let mut policy = ConfirmationPolicy::new();
        let mut record = BookingRecord::new();
        policy.observe_user(&mut record, "no thanks");
        assert_eq!(record.confirmation_status(), ConfirmationStatus::NotInterested);

        let changed = policy.observe_reply(&mut record, "Great, booking noted. [BOOKING_CONFIRMED]");
        assert_eq!(changed, Some(ConfirmationStatus::Confirmed));
        assert_eq!(record.confirmation_status(), ConfirmationStatus::Confirmed);
        assert!(policy.is_call_complete());
    }

    #[test]
    fn test_strip_marker() {
        assert_eq!(
            strip_marker("Thank you. [BOOKING_CONFIRMED] Our sales person will contact you soon."),
            "Thank you. Our sales person will contact you soon."
        );
    }
}

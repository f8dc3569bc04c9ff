use tracing::{debug, info};

use super::confirmation::ConfirmationPolicy;
use super::extractor::{ExtractionContext, FieldExtractor, Speaker};
use super::record::{BookingField, BookingRecord, ConfirmationStatus};

/// Something that changed while processing one utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingEvent {
    FieldUpdated { field: BookingField, value: String },
    StatusChanged(ConfirmationStatus),
    CallCompleted,
}

/// Booking state for one call, fed by both sides of the conversation
#[derive(Default)]
pub struct BookingSession {
    record: BookingRecord,
    extractor: FieldExtractor,
    policy: ConfirmationPolicy,
}

impl BookingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extractor(extractor: FieldExtractor) -> Self {
        Self {
            extractor,
            ..Self::default()
        }
    }

    /// Process a transcribed caller utterance
    pub fn ingest_user(&mut self, text: &str, ctx: &ExtractionContext) -> Vec<BookingEvent> {
        let mut events = self.extract(text, Speaker::Caller, ctx);

        if let Some(status) = self.policy.observe_user(&mut self.record, text) {
            info!("Confirmation status: {}", status);
            events.push(BookingEvent::StatusChanged(status));
        }

        events
    }

    /// Process a generated reply before it is spoken
    pub fn ingest_reply(&mut self, text: &str, ctx: &ExtractionContext) -> Vec<BookingEvent> {
        let mut events = self.extract(text, Speaker::Assistant, ctx);
        let was_complete = self.policy.is_call_complete();

        if let Some(status) = self.policy.observe_reply(&mut self.record, text) {
            info!("Booking confirmed by assistant");
            events.push(BookingEvent::StatusChanged(status));
        }

        if !was_complete && self.policy.is_call_complete() {
            info!("Call completion detected");
            events.push(BookingEvent::CallCompleted);
        }

        events
    }

    fn extract(&mut self, text: &str, speaker: Speaker, ctx: &ExtractionContext) -> Vec<BookingEvent> {
        self.extractor
            .apply_from(&mut self.record, text, speaker, ctx)
            .into_iter()
            .map(|update| {
                debug!("{} -> {} ({:?})", update.field, update.value, update.source);
                BookingEvent::FieldUpdated {
                    field: update.field,
                    value: update.value,
                }
            })
            .collect()
    }

    pub fn record(&self) -> &BookingRecord {
        &self.record
    }

    pub fn is_call_complete(&self) -> bool {
        self.policy.is_call_complete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ctx() -> ExtractionContext {
        ExtractionContext::on(NaiveDate::from_ymd_opt(2025, 11, 27).unwrap())
    }

    #[test]
    fn test_user_utterance_emits_field_events() {
        let mut session = BookingSession::new();
        let events = session.ingest_user("I need a trip from Chennai to Bangalore", &ctx());

        assert!(events.contains(&BookingEvent::FieldUpdated {
            field: BookingField::PickupLocation,
            value: "Chennai".to_string(),
        }));
        assert!(events.contains(&BookingEvent::FieldUpdated {
            field: BookingField::DropLocation,
            value: "Bangalore".to_string(),
        }));
        assert!(!session.is_call_complete());
    }

    #[test]
    fn test_greeting_leaves_trip_date_unset() {
        let mut session = BookingSession::new();
        let events = session.ingest_reply(
            "Hello, this is DropTruck AI sales agent calling about your enquiry. How can I assist you today?",
            &ctx(),
        );

        assert!(events.is_empty());
        assert_eq!(session.record().trip_date(), None);

        session.ingest_user("I need it today", &ctx());
        assert_eq!(session.record().trip_date(), Some("2025-11-27"));
    }

    #[test]
    fn test_closing_reply_completes_once() {
        let mut session = BookingSession::new();
        let first = session.ingest_reply("Thank you for your time. Goodbye!", &ctx());
        let second = session.ingest_reply("Goodbye!", &ctx());

        assert_eq!(first, vec![BookingEvent::CallCompleted]);
        assert!(second.is_empty());
        assert!(session.is_call_complete());
    }
}

// Integration tests for the per-call booking aggregate

use chrono::NaiveDate;
use droptruck_agent::booking::{
    BookingEvent, BookingField, BookingSession, ConfirmationStatus, CustomerIdentity,
    ExtractionContext,
};

fn ctx() -> ExtractionContext {
    ExtractionContext::on(NaiveDate::from_ymd_opt(2025, 11, 27).unwrap())
}

#[test]
fn test_status_is_one_shot() {
    let mut session = BookingSession::new();

    let events = session.ingest_user("Yes, that's correct", &ctx());
    assert!(events.contains(&BookingEvent::StatusChanged(ConfirmationStatus::Confirmed)));

    let events = session.ingest_user("No, cancel it", &ctx());
    assert!(events.is_empty());
    assert_eq!(session.record().confirmation_status(), ConfirmationStatus::Confirmed);
}

#[test]
fn test_rejection_wins_over_confirmation_in_same_utterance() {
    let mut session = BookingSession::new();
    session.ingest_user("okay but no, I'm not interested", &ctx());
    assert_eq!(
        session.record().confirmation_status(),
        ConfirmationStatus::NotInterested
    );
}

#[test]
fn test_marker_in_reply_confirms_and_completes() {
    let mut session = BookingSession::new();
    session.ingest_user("not interested", &ctx());

    let events = session.ingest_reply(
        "Thank you. Our sales person will contact you soon. [BOOKING_CONFIRMED]",
        &ctx(),
    );

    assert_eq!(
        events,
        vec![
            BookingEvent::StatusChanged(ConfirmationStatus::Confirmed),
            BookingEvent::CallCompleted,
        ]
    );
    assert!(session.is_call_complete());
}

#[test]
fn test_reply_without_closing_keeps_call_open() {
    let mut session = BookingSession::new();
    session.ingest_reply("Could you tell me the pickup and drop-off cities?", &ctx());
    assert!(!session.is_call_complete());
}

#[test]
fn test_assistant_echo_fills_fields() {
    let mut session = BookingSession::new();
    let events = session.ingest_reply(
        "Let me confirm. Pickup from Chennai, drop to Bangalore, truck type Tata IC.",
        &ctx(),
    );

    assert!(events.contains(&BookingEvent::FieldUpdated {
        field: BookingField::VehicleType,
        value: "Tata Ace".to_string(),
    }));
    assert_eq!(session.record().pickup_location(), Some("Chennai"));
    assert_eq!(session.record().drop_location(), Some("Bangalore"));
}

#[test]
fn test_full_call_produces_submission() {
    let mut session = BookingSession::new();
    let script = [
        ("I need a trip from Chennai to Bangalore", "Great! Which vehicle and body type do you need?"),
        ("I need a Tata AC open truck", "What material will you be transporting?"),
        ("We are carrying steel pipes", "When do you need the truck?"),
        ("tomorrow", "Let me confirm your requirement. Is this correct?"),
        ("yes", "Thank you. Our sales person will contact you soon. [BOOKING_CONFIRMED]"),
    ];

    for (user, reply) in script {
        session.ingest_user(user, &ctx());
        session.ingest_reply(reply, &ctx());
    }

    let record = session.record();
    assert!(record.is_complete());
    assert_eq!(record.confirmation_status(), ConfirmationStatus::Confirmed);
    assert!(session.is_call_complete());

    let submission = record.to_submission(&CustomerIdentity::default());
    assert_eq!(submission.pickup_location, "Chennai");
    assert_eq!(submission.drop_location, "Bangalore");
    assert_eq!(submission.truck_type, "Tata Ace");
    assert_eq!(submission.body_type, "Open");
    assert_eq!(submission.material, "Steel");
    assert_eq!(submission.required_date, "2025-11-28");
    assert_eq!(submission.contact, "9066542031");
}

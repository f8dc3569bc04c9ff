// Wire format and session filtering of the transcription bridge

use droptruck_agent::nats::client::frame_subject;
use droptruck_agent::nats::messages::{AudioFrameMessage, TranscriptMessage};
use droptruck_agent::nats::NatsTranscriber;
use droptruck_agent::providers::TranscriptEvent;

fn pcm(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

#[test]
fn test_caller_frame_wire_format() {
    // 1600 mono samples at 16 kHz is one 100 ms frame
    let bytes = pcm(&vec![250; 1600]);
    let msg = AudioFrameMessage::encode("2025-11-27_10-00-00", &bytes, 16000, 1, 3, false);

    let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
    assert_eq!(json["session_id"], "2025-11-27_10-00-00");
    assert_eq!(json["sequence"], 3);
    assert_eq!(json["sample_rate"], 16000);
    assert_eq!(json["duration_ms"], 100);
    assert_eq!(json["final"], false);
    assert!(chrono::DateTime::parse_from_rfc3339(json["timestamp"].as_str().unwrap()).is_ok());

    let back: AudioFrameMessage = serde_json::from_value(json).unwrap();
    assert_eq!(back.decode_pcm().unwrap(), bytes);
}

#[test]
fn test_final_frame_is_empty() {
    let msg = AudioFrameMessage::encode("call-1", &[], 16000, 1, 42, true);

    assert!(msg.final_frame);
    assert!(msg.pcm.is_empty());
    assert_eq!(msg.duration_ms, 0);
    assert!(serde_json::to_string(&msg).unwrap().contains("\"final\":true"));
}

#[test]
fn test_frame_from_older_publisher_without_duration() {
    let json = r#"{
        "session_id": "call-1",
        "sequence": 0,
        "pcm": "AQD//w==",
        "sample_rate": 8000,
        "channels": 2,
        "timestamp": "2025-11-27T10:00:00Z",
        "final": false
    }"#;

    let msg: AudioFrameMessage = serde_json::from_str(json).unwrap();
    assert_eq!(msg.duration_ms, 0);
    assert_eq!(msg.decode_pcm().unwrap(), vec![1, 0, 255, 255]);
}

#[test]
fn test_invalid_pcm_is_an_error() {
    let mut msg = AudioFrameMessage::encode("call-1", &[1, 2], 16000, 1, 0, false);
    msg.pcm = "***".to_string();
    assert!(msg.decode_pcm().is_err());
}

#[test]
fn test_transcript_optional_fields() {
    let full = r#"{
        "session_id": "2025-11-27_10-00-00",
        "text": "I need a Tata Ace",
        "partial": false,
        "timestamp": "2025-11-27T10:00:05Z",
        "confidence": 0.95
    }"#;
    let bare = r#"{"session_id": "2025-11-27_10-00-00", "text": "from", "partial": true}"#;

    let msg: TranscriptMessage = serde_json::from_str(full).unwrap();
    assert_eq!(msg.confidence, Some(0.95));
    assert!(msg.is_for("2025-11-27_10-00-00"));
    assert_eq!(msg.into_event(), TranscriptEvent::final_text("I need a Tata Ace"));

    let msg: TranscriptMessage = serde_json::from_str(bare).unwrap();
    assert_eq!(msg.timestamp, None);
    assert_eq!(msg.confidence, None);
    assert_eq!(msg.into_event(), TranscriptEvent::partial("from"));
}

#[test]
fn test_frame_subject_per_session() {
    assert_eq!(frame_subject("call-1"), "audio.frame.call-1");
}

#[test]
fn test_transcripts_filtered_by_session() {
    let ours = br#"{"session_id":"call-1","text":"from Chennai","partial":true,"timestamp":"t"}"#;
    let theirs = br#"{"session_id":"call-2","text":"hello","partial":false,"timestamp":"t"}"#;
    let final_text = br#"{"session_id":"call-1","text":"to Bangalore","partial":false}"#;

    assert_eq!(
        NatsTranscriber::parse("call-1", ours),
        Some(TranscriptEvent::partial("from Chennai"))
    );
    assert_eq!(NatsTranscriber::parse("call-1", theirs), None);
    assert_eq!(
        NatsTranscriber::parse("call-1", final_text),
        Some(TranscriptEvent::final_text("to Bangalore"))
    );
    assert_eq!(NatsTranscriber::parse("call-1", b"not json"), None);
}

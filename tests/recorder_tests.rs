// Integration tests for call recording and the conversation merge

use anyhow::Result;
use droptruck_agent::audio::AudioWriter;
use droptruck_agent::recording::{ConversationRecorder, ReplyAudio};
use std::io::Cursor;
use std::path::Path;
use tempfile::TempDir;

const EDGE: usize = 8000; // 500ms at 16kHz
const PAUSE: usize = 4800; // 300ms at 16kHz

fn wav_spec(sample_rate: u32, channels: u16) -> hound::WavSpec {
    hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

fn write_reply(path: &Path, sample_rate: u32, samples: &[i16]) {
    let mut writer = hound::WavWriter::create(path, wav_spec(sample_rate, 1)).unwrap();
    for &s in samples {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();
}

fn reply_bytes(samples: &[i16]) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, wav_spec(16000, 1)).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn pcm_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

fn read_samples(path: &Path) -> Vec<i16> {
    hound::WavReader::open(path)
        .unwrap()
        .into_samples::<i16>()
        .map(|s| s.unwrap())
        .collect()
}

/// Recorder with `samples` captured and flushed as the caller's audio
fn recorder_with_user_audio(dir: &Path, samples: &[i16]) -> ConversationRecorder {
    let recorder = ConversationRecorder::new("test", dir, AudioWriter::default()).unwrap();
    recorder.start_recording();
    for chunk in samples.chunks(1600) {
        recorder.buffer().push(pcm_bytes(chunk));
    }
    assert!(recorder.stop_recording().unwrap());
    recorder
}

#[test]
fn test_merge_without_replies_pads_user_audio() -> Result<()> {
    let dir = TempDir::new()?;
    let user: Vec<i16> = (1..=3200).map(|i| i as i16).collect();
    let recorder = recorder_with_user_audio(dir.path(), &user);

    let merged = recorder.merge().expect("merged file");
    let samples = read_samples(&merged);

    assert_eq!(samples.len(), EDGE + user.len() + EDGE);
    assert!(samples[..EDGE].iter().all(|&s| s == 0));
    assert_eq!(&samples[EDGE..EDGE + user.len()], &user[..]);
    assert!(samples[EDGE + user.len()..].iter().all(|&s| s == 0));
    Ok(())
}

#[test]
fn test_merge_skips_missing_reply_and_keeps_order() -> Result<()> {
    let dir = TempDir::new()?;
    let user = vec![1000i16; 1600];
    let mut recorder = recorder_with_user_audio(dir.path(), &user);

    let first = recorder.next_reply_path("wav");
    write_reply(&first, 16000, &vec![2000; 800]);
    recorder.add_assistant_reply(ReplyAudio::File(first.clone()));

    let missing = recorder.next_reply_path("wav");
    recorder.add_assistant_reply(ReplyAudio::File(missing));

    let third = recorder.next_reply_path("wav");
    write_reply(&third, 16000, &vec![3000; 400]);
    recorder.add_assistant_reply(ReplyAudio::File(third.clone()));

    let merged = recorder.merge().expect("merged file");
    let samples = read_samples(&merged);

    assert_eq!(samples.len(), EDGE + 1600 + PAUSE + 800 + PAUSE + 400 + EDGE);

    let first_start = EDGE + 1600 + PAUSE;
    assert!(samples[first_start..first_start + 800].iter().all(|&s| s == 2000));
    let third_start = first_start + 800 + PAUSE;
    assert!(samples[third_start..third_start + 400].iter().all(|&s| s == 3000));

    // consumed inputs are removed, the merged file stays
    assert!(!recorder.user_audio_path().exists());
    assert!(!first.exists());
    assert!(!third.exists());
    assert!(merged.exists());
    Ok(())
}

#[test]
fn test_merge_resamples_replies_to_session_rate() -> Result<()> {
    let dir = TempDir::new()?;
    let mut recorder = recorder_with_user_audio(dir.path(), &[0; 160]);

    let reply = recorder.next_reply_path("wav");
    write_reply(&reply, 8000, &vec![500; 400]);
    recorder.add_assistant_reply(ReplyAudio::File(reply));

    let merged = recorder.merge().expect("merged file");
    assert_eq!(read_samples(&merged).len(), EDGE + 160 + PAUSE + 800 + EDGE);
    Ok(())
}

#[test]
fn test_merge_accepts_in_memory_replies() -> Result<()> {
    let dir = TempDir::new()?;
    let mut recorder = recorder_with_user_audio(dir.path(), &[7; 320]);

    recorder.add_assistant_reply(ReplyAudio::Memory(reply_bytes(&[9; 640])));
    recorder.add_assistant_reply(ReplyAudio::Memory(b"not audio".to_vec()));

    let merged = recorder.merge().expect("merged file");
    let samples = read_samples(&merged);
    assert_eq!(samples.len(), EDGE + 320 + PAUSE + 640 + EDGE);
    Ok(())
}

#[test]
fn test_merge_without_user_audio_is_none() -> Result<()> {
    let dir = TempDir::new()?;
    let mut recorder = ConversationRecorder::new("test", dir.path(), AudioWriter::default())?;
    recorder.start_recording();
    assert!(!recorder.stop_recording()?);

    let reply = recorder.next_reply_path("wav");
    write_reply(&reply, 16000, &[1; 100]);
    recorder.add_assistant_reply(ReplyAudio::File(reply.clone()));

    assert!(recorder.merge().is_none());
    assert!(!recorder.conversation_path().exists());
    assert!(reply.exists(), "reply files survive a failed merge");
    Ok(())
}

#[test]
fn test_stats_before_and_after_merge() -> Result<()> {
    let dir = TempDir::new()?;
    let mut recorder = recorder_with_user_audio(dir.path(), &[1; 1600]);
    recorder.add_assistant_reply(ReplyAudio::Memory(reply_bytes(&[2; 160])));

    let before = recorder.stats();
    assert_eq!(before.session_id, "test");
    assert!(before.user_audio_exists);
    assert_eq!(before.user_audio_size_bytes, Some(44 + 3200));
    assert!(!before.conversation_exists);
    assert_eq!(before.conversation_size_mb(), None);
    assert_eq!(before.assistant_responses, 1);

    recorder.merge().expect("merged file");

    let after = recorder.stats();
    assert!(!after.user_audio_exists);
    assert!(after.conversation_exists);
    let expected = 44 + 2 * (EDGE + 1600 + PAUSE + 160 + EDGE) as u64;
    assert_eq!(after.conversation_size_bytes, Some(expected));
    Ok(())
}

#[test]
fn test_session_directory_layout() -> Result<()> {
    let dir = TempDir::new()?;
    let recorder = ConversationRecorder::new("2025-11-27_10-00-00", dir.path(), AudioWriter::default())?;

    let session_dir = dir.path().join("session_2025-11-27_10-00-00");
    assert!(session_dir.is_dir());
    assert_eq!(recorder.user_audio_path(), session_dir.join("user_input.wav"));
    assert_eq!(recorder.conversation_path(), session_dir.join("full_conversation.wav"));
    Ok(())
}

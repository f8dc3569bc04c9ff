use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::session_log::SessionLog;
use super::utterance::UtteranceAssembler;
use crate::audio::{capture_channel, AudioBackend, AudioFrame, AudioWriter, CaptureSink};
use crate::booking::{
    strip_marker, BookingEvent, BookingRecord, BookingSession, ConfirmationStatus,
    ExtractionContext,
};
use crate::config::Config;
use crate::providers::{
    cleanup_old_files, play_reply, BookingSubmitter, FramePublisher, LanguageModel, SpeechSynthesizer, Transcriber,
};
use crate::recording::{ConversationRecorder, RecordingStats, ReplyAudio};

/// What a finished call left behind
#[derive(Debug)]
pub struct CallOutcome {
    pub session_id: String,
    pub record: BookingRecord,
    pub conversation_path: Option<PathBuf>,
    pub stats: RecordingStats,
    pub log_path: Option<PathBuf>,
    pub text_log_path: Option<PathBuf>,
    pub submitted: bool,
    pub dropped_chunks: u64,
}

struct CaptureTask {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<u64>,
}

/// Runs one sales call end to end
///
/// Capture runs in its own task and only shares the recorder's buffer
/// with the call loop. Everything else is owned by the call loop.
pub struct CallAgent {
    config: Config,
    session_id: String,
    booking: BookingSession,
    recorder: ConversationRecorder,
    log: SessionLog,
    model: Box<dyn LanguageModel>,
    synthesizer: Option<Box<dyn SpeechSynthesizer>>,
    submitter: Option<Box<dyn BookingSubmitter>>,
    audio: Option<Box<dyn AudioBackend>>,
    publisher: Option<Arc<dyn FramePublisher>>,
}

impl CallAgent {
    pub fn new(config: Config, session_id: &str, model: Box<dyn LanguageModel>) -> Result<Self> {
        let writer = AudioWriter::new(config.audio.sample_rate, config.audio.channels);
        let recorder = ConversationRecorder::new(session_id, &config.audio.output_dir, writer)
            .context("Failed to set up call recording")?;
        let log = SessionLog::new(session_id, config.customer.clone());

        Ok(Self {
            config,
            session_id: session_id.to_string(),
            booking: BookingSession::new(),
            recorder,
            log,
            model,
            synthesizer: None,
            submitter: None,
            audio: None,
            publisher: None,
        })
    }

    pub fn with_synthesizer(mut self, synthesizer: Box<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    pub fn with_submitter(mut self, submitter: Box<dyn BookingSubmitter>) -> Self {
        self.submitter = Some(submitter);
        self
    }

    pub fn with_audio(mut self, backend: Box<dyn AudioBackend>) -> Self {
        self.audio = Some(backend);
        self
    }

    pub fn with_frame_publisher(mut self, publisher: Arc<dyn FramePublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Run the call until it completes, the transcript stream ends, or Ctrl-C
    ///
    /// Everything logged during the call, spawned tasks included, is
    /// inside a `session{id=...}` span.
    pub async fn run(self, transcriber: Box<dyn Transcriber>) -> Result<CallOutcome> {
        let span = info_span!("session", id = %self.session_id);
        self.run_call(transcriber).instrument(span).await
    }

    async fn run_call(mut self, mut transcriber: Box<dyn Transcriber>) -> Result<CallOutcome> {
        info!("Starting call session {}", self.session_id);

        match self.log.open_text_log(&self.config.logs.dir) {
            Ok(path) => info!("Conversation log: {}", path.display()),
            Err(e) => warn!("Conversation text log unavailable: {:#}", e),
        }

        self.recorder.start_recording();
        let (sink, drain) = capture_channel(self.config.audio.capture_capacity);
        let drain_task = tokio::spawn(drain.run(self.recorder.buffer()).in_current_span());

        let capture = match self.audio.take() {
            Some(backend) => Some(self.start_capture(backend, sink).await?),
            None => {
                info!("No audio source, recording replies only");
                drop(sink);
                None
            }
        };

        let mut assembler = UtteranceAssembler::new();
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    info!("Call ended by user (Ctrl-C)");
                    break;
                }
                event = transcriber.next_event() => match event {
                    Ok(Some(event)) => {
                        let Some(utterance) = assembler.push(event) else {
                            continue;
                        };

                        self.handle_utterance(&utterance).await;

                        if self.booking.is_call_complete() {
                            info!("Call completed, closing conversation");
                            break;
                        }
                    }
                    Ok(None) => {
                        info!("Transcript stream ended");
                        break;
                    }
                    Err(e) => error!("Transcription error: {:#}", e),
                }
            }
        }

        self.shutdown(capture, drain_task).await
    }

    async fn start_capture(
        &self,
        mut backend: Box<dyn AudioBackend>,
        sink: CaptureSink,
    ) -> Result<CaptureTask> {
        info!("Starting audio capture from {}", backend.name());

        let frames = backend
            .start()
            .await
            .context("Failed to start audio capture")?;

        let (stop, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(
            capture_loop(backend, frames, sink, self.publisher.clone(), stop_rx).in_current_span(),
        );

        Ok(CaptureTask { stop, handle })
    }

    /// One caller turn: extract, reply, check the reply, speak
    async fn handle_utterance(&mut self, text: &str) {
        let ctx = ExtractionContext::now();
        debug!("Handling utterance ({} chars)", text.len());

        let events = self.booking.ingest_user(text, &ctx);
        self.record_events(&events);

        let reply = self.model.respond(text).await;

        let events = self.booking.ingest_reply(&reply, &ctx);
        self.record_events(&events);

        let spoken = strip_marker(&reply);
        self.log.record_turn(text, &spoken);

        self.speak(&spoken).await;
    }

    fn record_events(&mut self, events: &[BookingEvent]) {
        for event in events {
            match event {
                BookingEvent::FieldUpdated { field, value } => {
                    self.log.record_update(*field, value);
                }
                BookingEvent::StatusChanged(status) => self.log.record_status(*status),
                BookingEvent::CallCompleted => info!("Closing phrase detected"),
            }
        }
    }

    async fn speak(&mut self, text: &str) {
        let Some(synthesizer) = &self.synthesizer else {
            return;
        };

        let audio = match synthesizer.synthesize(text).await {
            Ok(audio) => audio,
            Err(e) => {
                warn!("Speech synthesis failed: {:#}", e);
                return;
            }
        };

        if self.config.audio.replies_in_memory {
            self.recorder.add_assistant_reply(ReplyAudio::Memory(audio));
            return;
        }

        let path = self.recorder.next_reply_path(&self.config.tts.reply_format);
        if let Err(e) = tokio::fs::write(&path, &audio).await {
            error!("Failed to save reply audio {}: {}", path.display(), e);
            return;
        }
        self.recorder.add_assistant_reply(ReplyAudio::File(path.clone()));

        if let Some(command) = &self.config.tts.playback_command {
            if let Err(e) = play_reply(command, &path).await {
                warn!("Playback failed: {:#}", e);
            }
        }
    }

    /// Stop capture, flush, log, merge, report, clean up, then submit
    async fn shutdown(
        mut self,
        capture: Option<CaptureTask>,
        drain_task: JoinHandle<usize>,
    ) -> Result<CallOutcome> {
        info!("Shutting down call {}", self.session_id);

        let mut dropped_chunks = 0;
        if let Some(capture) = capture {
            let _ = capture.stop.send(());
            match capture.handle.await {
                Ok(dropped) => dropped_chunks = dropped,
                Err(e) => error!("Capture task failed: {}", e),
            }
        }

        if let Err(e) = drain_task.await {
            error!("Capture drain failed: {}", e);
        }

        match self.recorder.stop_recording() {
            Ok(true) => info!("User audio saved: {}", self.recorder.user_audio_path().display()),
            Ok(false) => {}
            Err(e) => error!("Failed to save user audio: {:#}", e),
        }

        let record = self.booking.record().clone();
        println!("{}", record);

        self.log.finish(&record);
        let log_path = match self.log.save(&self.config.logs.dir) {
            Ok(path) => Some(path),
            Err(e) => {
                error!("Failed to write session log: {:#}", e);
                None
            }
        };

        let conversation_path = self.recorder.merge();
        let stats = self.recorder.stats();
        info!(
            "Recording stats: {} assistant responses, conversation {}",
            stats.assistant_responses,
            stats
                .conversation_size_mb()
                .map(|mb| format!("{:.2} MB", mb))
                .unwrap_or_else(|| "not written".to_string())
        );

        let removed = cleanup_old_files(&self.config.audio.output_dir, self.config.tts.cleanup_max_age());
        if removed > 0 {
            info!("Removed {} old audio file(s)", removed);
        }

        let submitted = self.submit(&record).await;

        Ok(CallOutcome {
            session_id: self.session_id,
            record,
            conversation_path,
            stats,
            log_path,
            text_log_path: self.log.text_log_path().map(Path::to_path_buf),
            submitted,
            dropped_chunks,
        })
    }

    async fn submit(&self, record: &BookingRecord) -> bool {
        if record.confirmation_status() != ConfirmationStatus::Confirmed {
            info!(
                "Booking not confirmed (status: {}), skipping submission",
                record.confirmation_status()
            );
            return false;
        }

        let Some(submitter) = &self.submitter else {
            info!("Booking submission disabled");
            return false;
        };

        match submitter.submit(&record.to_submission(&self.config.customer)).await {
            Ok(()) => true,
            Err(e) => {
                error!("Booking submission failed: {:#}", e);
                false
            }
        }
    }
}

/// Forward backend frames to the capture buffer and the transcription bridge
async fn capture_loop(
    mut backend: Box<dyn AudioBackend>,
    mut frames: mpsc::Receiver<AudioFrame>,
    sink: CaptureSink,
    publisher: Option<Arc<dyn FramePublisher>>,
    mut stop: oneshot::Receiver<()>,
) -> u64 {
    info!("Audio capture task started");

    let mut sequence: u32 = 0;
    let mut frame_format = None;

    loop {
        let frame = tokio::select! {
            _ = &mut stop => break,
            frame = frames.recv() => match frame {
                Some(frame) => frame,
                None => break,
            },
        };

        let pcm = frame.to_pcm_bytes();
        frame_format = Some((frame.sample_rate, frame.channels));

        if let Some(publisher) = &publisher {
            sink.send(pcm.clone());
            if let Err(e) = publisher
                .publish_frame(&pcm, frame.sample_rate, frame.channels, sequence, false)
                .await
            {
                error!("Failed to publish audio frame: {:#}", e);
            }
        } else {
            sink.send(pcm);
        }

        sequence = sequence.wrapping_add(1);
    }

    info!("Audio capture task stopped after {} frames", sequence);

    if let (Some(publisher), Some((sample_rate, channels))) = (&publisher, frame_format) {
        if let Err(e) = publisher
            .publish_frame(&[], sample_rate, channels, sequence, true)
            .await
        {
            error!("Failed to send final frame: {:#}", e);
        }
    }

    if let Err(e) = backend.stop().await {
        error!("Failed to stop audio backend: {:#}", e);
    }

    sink.dropped_chunks()
}

use anyhow::{Context, Result};
use clap::Parser;
use droptruck_agent::audio::{AudioBackendConfig, AudioBackendFactory, AudioSource};
use droptruck_agent::call::{new_session_id, CallAgent};
use droptruck_agent::nats::NatsClient;
use droptruck_agent::providers::{
    ChatClient, HttpBookingSubmitter, SpeechClient, StdinTranscriber, Transcriber,
};
use droptruck_agent::{logging, Config};
use std::sync::Arc;
use tracing::{info, warn};

/// DropTruck voice sales agent
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (any format the config crate reads), optional
    #[arg(short, long, default_value = "config/droptruck-agent")]
    config: String,

    /// Caller audio: "microphone" or "file:PATH"
    #[arg(short, long)]
    source: Option<AudioSource>,

    /// Read caller utterances from stdin instead of the transcription service
    #[arg(long)]
    text: bool,

    /// Never post the booking, even when confirmed
    #[arg(long)]
    no_submit: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;
    let log_files = logging::init(&cfg.logs.dir)?;
    let session_id = new_session_id();

    info!("DropTruck AI Sales Agent v{}", env!("CARGO_PKG_VERSION"));
    info!("Session: {}", session_id);

    let model = ChatClient::new(cfg.llm.clone())?;
    let mut agent = CallAgent::new(cfg.clone(), &session_id, Box::new(model))?;

    if cfg.tts.api_key.is_empty() {
        warn!("No speech synthesis key configured, replies will not be spoken or recorded");
    } else {
        agent = agent.with_synthesizer(Box::new(SpeechClient::new(cfg.tts.clone())?));
    }

    if cfg.booking_api.enabled && !cli.no_submit {
        let submitter = HttpBookingSubmitter::new(&cfg.booking_api)?;
        info!("Confirmed bookings go to {}", submitter.url());
        agent = agent.with_submitter(Box::new(submitter));
    }

    let transcriber: Box<dyn Transcriber> = if cli.text {
        info!("Text mode: type the caller's lines, Ctrl-D or Ctrl-C to end the call");
        Box::new(StdinTranscriber::new())
    } else {
        let nats = Arc::new(
            NatsClient::connect(&cfg.transcription.nats_url, session_id.clone())
                .await
                .context("Transcription bridge unavailable")?,
        );
        let transcripts = nats.subscribe_transcripts(&cfg.transcription.subject).await?;
        agent = agent.with_frame_publisher(nats);
        Box::new(transcripts)
    };

    let source = match (cli.source, cli.text) {
        (Some(source), _) => Some(source),
        (None, false) => Some(AudioSource::Microphone),
        (None, true) => None,
    };

    if let Some(source) = source {
        let backend_config = AudioBackendConfig {
            target_sample_rate: cfg.audio.sample_rate,
            target_channels: cfg.audio.channels,
            buffer_duration_ms: cfg.audio.frame_duration_ms as u64,
            realtime: true,
        };
        let backend = AudioBackendFactory::create(source, backend_config)
            .context("Failed to create audio backend")?;
        agent = agent.with_audio(backend);
    }

    let outcome = agent.run(transcriber).await?;

    info!("Call {} finished", outcome.session_id);
    if let Some(path) = &outcome.conversation_path {
        info!("Full conversation: {}", path.display());
    }
    if let Some(path) = &outcome.text_log_path {
        info!("Session (text): {}", path.display());
    }
    if let Some(path) = &outcome.log_path {
        info!("Session (JSON): {}", path.display());
    }
    info!("Runtime log: {}", log_files.runtime.display());
    info!("Sessions log: {}", log_files.sessions.display());
    if outcome.dropped_chunks > 0 {
        warn!("{} capture chunks were dropped", outcome.dropped_chunks);
    }
    info!(
        "Booking {}",
        if outcome.submitted { "submitted" } else { "not submitted" }
    );

    Ok(())
}

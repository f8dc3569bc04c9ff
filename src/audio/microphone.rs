// Live microphone capture through cpal
//
// cpal streams are not Send, so the stream is built and owned by a dedicated
// thread. The driver callback only converts samples and hands frames to a
// bounded channel with try_send; it never blocks.

use anyhow::{anyhow, bail, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

use super::backend::{AudioBackend, AudioBackendConfig, AudioFrame};
use super::file::{downmix_to_mono, resample_linear};

pub struct MicrophoneBackend {
    config: AudioBackendConfig,
    capturing: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl MicrophoneBackend {
    pub fn new(config: AudioBackendConfig) -> Self {
        Self {
            config,
            capturing: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }
}

#[async_trait::async_trait]
impl AudioBackend for MicrophoneBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.capturing.load(Ordering::SeqCst) {
            bail!("Already capturing");
        }

        let (tx, rx) = mpsc::channel(100);
        let (ready_tx, ready_rx) = oneshot::channel::<Result<()>>();
        let capturing = Arc::clone(&self.capturing);
        let target_rate = self.config.target_sample_rate;
        capturing.store(true, Ordering::SeqCst);

        let thread = std::thread::spawn(move || {
            let stream = match build_stream(tx, target_rate) {
                Ok(stream) => stream,
                Err(e) => {
                    capturing.store(false, Ordering::SeqCst);
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            if let Err(e) = stream.play() {
                capturing.store(false, Ordering::SeqCst);
                let _ = ready_tx.send(Err(anyhow!("Failed to start input stream: {}", e)));
                return;
            }
            let _ = ready_tx.send(Ok(()));

            while capturing.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(50));
            }

            drop(stream);
            info!("Microphone stream closed");
        });

        self.thread = Some(thread);

        ready_rx
            .await
            .map_err(|_| anyhow!("Microphone thread exited before starting"))??;

        info!("Microphone capture started ({}Hz mono)", target_rate);

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.capturing.store(false, Ordering::SeqCst);

        if let Some(thread) = self.thread.take() {
            tokio::task::spawn_blocking(move || {
                if thread.join().is_err() {
                    error!("Microphone thread panicked");
                }
            })
            .await?;
        }

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "cpal microphone"
    }
}

fn build_stream(tx: mpsc::Sender<AudioFrame>, target_rate: u32) -> Result<cpal::Stream> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    info!("Audio Input Device: {}", device.name().unwrap_or_default());

    let default_config = device.default_input_config()?;
    let device_rate = default_config.sample_rate().0;
    let device_channels = default_config.channels();
    let sample_format = default_config.sample_format();
    let stream_config: cpal::StreamConfig = default_config.into();

    info!(
        "Audio Config Selected: Rate={}Hz, Channels={}",
        device_rate, device_channels
    );

    let err_fn = |err| error!("an error occurred on stream: {}", err);
    let emitter = FrameEmitter::new(tx, device_rate, device_channels, target_rate);

    let stream = match sample_format {
        cpal::SampleFormat::I16 => device.build_input_stream(
            &stream_config,
            move |data: &[i16], _: &_| emitter.emit(data.to_vec()),
            err_fn,
            None,
        )?,
        cpal::SampleFormat::F32 => {
            device.build_input_stream(
                &stream_config,
                move |data: &[f32], _: &_| {
                    let samples = data
                        .iter()
                        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                        .collect();
                    emitter.emit(samples)
                },
                err_fn,
                None,
            )?
        }
        other => return Err(anyhow!("Unsupported sample format: {:?}", other)),
    };

    Ok(stream)
}

struct FrameEmitter {
    tx: mpsc::Sender<AudioFrame>,
    device_rate: u32,
    device_channels: u16,
    target_rate: u32,
    emitted_samples: AtomicU64,
}

impl FrameEmitter {
    fn new(tx: mpsc::Sender<AudioFrame>, device_rate: u32, device_channels: u16, target_rate: u32) -> Self {
        Self {
            tx,
            device_rate,
            device_channels,
            target_rate,
            emitted_samples: AtomicU64::new(0),
        }
    }

    fn emit(&self, interleaved: Vec<i16>) {
        let mono = downmix_to_mono(&interleaved, self.device_channels);
        let samples = resample_linear(&mono, self.device_rate, self.target_rate);

        let offset = self.emitted_samples.fetch_add(samples.len() as u64, Ordering::Relaxed);
        let frame = AudioFrame {
            samples,
            sample_rate: self.target_rate,
            channels: 1,
            timestamp_ms: offset * 1000 / self.target_rate as u64,
        };

        // If the consumer is behind we drop input (lossy)
        if self.tx.try_send(frame).is_err() {
            warn!("Microphone frame dropped (consumer behind)");
        }
    }
}

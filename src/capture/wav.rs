use anyhow::{Context, Result};
use hound::WavReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::device::{AudioChunk, CaptureDevice, CaptureError, CaptureEvent};

/// Capture device backed by a WAV file
///
/// Replays a pre-recorded 16 kHz mono file at real-time pace, emitting one
/// chunk per frame interval. Speech boundaries are emitted at the edges of
/// the stream (start of first unmuted chunk, end of file) rather than from
/// a voice-activity detector, which keeps this device suitable for
/// development and integration tests without any DSP.
pub struct WavCaptureDevice {
    path: PathBuf,
    frame_duration_ms: u64,
    muted: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl WavCaptureDevice {
    pub fn new(path: impl AsRef<Path>, frame_duration_ms: u64) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            frame_duration_ms,
            muted: Arc::new(AtomicBool::new(false)),
            running: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    fn load_samples(&self) -> Result<(Vec<i16>, u32)> {
        let reader = WavReader::open(&self.path)
            .with_context(|| format!("Failed to open WAV file: {}", self.path.display()))?;

        let spec = reader.spec();
        if spec.channels != 1 {
            anyhow::bail!("Expected mono WAV, got {} channels", spec.channels);
        }

        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        Ok((samples, spec.sample_rate))
    }
}

#[async_trait::async_trait]
impl CaptureDevice for WavCaptureDevice {
    async fn start(&mut self) -> Result<mpsc::Receiver<CaptureEvent>, CaptureError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(CaptureError::Device(anyhow::anyhow!(
                "capture already active"
            )));
        }

        let (samples, sample_rate) = self.load_samples()?;
        let samples_per_frame = (sample_rate as u64 * self.frame_duration_ms / 1000) as usize;

        info!(
            "Starting WAV capture: {} ({} samples @ {}Hz, {}ms frames)",
            self.path.display(),
            samples.len(),
            sample_rate,
            self.frame_duration_ms
        );

        let (tx, rx) = mpsc::channel(32);
        let muted = Arc::clone(&self.muted);
        let running = Arc::clone(&self.running);
        let frame_duration = Duration::from_millis(self.frame_duration_ms);

        running.store(true, Ordering::SeqCst);
        self.muted.store(false, Ordering::SeqCst);

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(frame_duration);
            let mut in_speech = false;

            for frame in samples.chunks(samples_per_frame.max(1)) {
                interval.tick().await;

                if !running.load(Ordering::SeqCst) {
                    break;
                }

                // Muted: suppress emission but keep pacing through the file,
                // mirroring a live microphone that keeps running silently.
                if muted.load(Ordering::SeqCst) {
                    if in_speech {
                        in_speech = false;
                        if tx.send(CaptureEvent::SpeechEnd).await.is_err() {
                            break;
                        }
                    }
                    continue;
                }

                if !in_speech {
                    in_speech = true;
                    if tx.send(CaptureEvent::SpeechStart).await.is_err() {
                        break;
                    }
                }

                let chunk = AudioChunk::from_samples(frame);
                if tx.send(CaptureEvent::Data(chunk)).await.is_err() {
                    break;
                }
            }

            if in_speech {
                let _ = tx.send(CaptureEvent::SpeechEnd).await;
            }

            running.store(false, Ordering::SeqCst);
            info!("WAV capture drained");
        });

        self.task = Some(task);

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        // Safe to call when never started.
        self.running.store(false, Ordering::SeqCst);

        if let Some(task) = self.task.take() {
            task.abort();
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!("WAV capture task failed: {}", e);
                }
            }
        }

        Ok(())
    }

    fn mute(&mut self) {
        self.muted.store(true, Ordering::SeqCst);
    }

    fn unmute(&mut self) {
        self.muted.store(false, Ordering::SeqCst);
    }

    fn is_capturing(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "wav-file"
    }
}

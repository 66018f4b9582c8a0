use anyhow::Result;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// MIME type attached to every outbound realtime audio chunk.
/// The live session expects 16 kHz little-endian PCM.
pub const PCM_MIME_TYPE: &str = "audio/pcm;rate=16000";

/// A single encoded audio chunk ready to be pushed to the live session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioChunk {
    /// Always `audio/pcm;rate=16000`
    pub mime_type: String,

    /// Base64-encoded PCM bytes
    pub data: String,
}

impl AudioChunk {
    /// Build a chunk from raw PCM bytes (little-endian i16, interleaved).
    pub fn from_pcm_bytes(bytes: &[u8]) -> Self {
        Self {
            mime_type: PCM_MIME_TYPE.to_string(),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    /// Build a chunk from i16 samples.
    pub fn from_samples(samples: &[i16]) -> Self {
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        Self::from_pcm_bytes(&bytes)
    }

    /// Decode the payload back to raw PCM bytes.
    pub fn pcm_bytes(&self) -> Result<Vec<u8>> {
        Ok(base64::engine::general_purpose::STANDARD.decode(&self.data)?)
    }
}

/// Events emitted by an active capture device.
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// A chunk of captured audio; emitted continuously while unmuted
    Data(AudioChunk),
    /// The voice-activity detector observed the start of speech
    SpeechStart,
    /// The voice-activity detector observed the end of speech
    SpeechEnd,
}

/// Errors from capture acquisition.
///
/// `PermissionDenied` is the one case the controller treats as recoverable:
/// it surfaces a user-facing prompt instead of a generic failure log.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("capture device error: {0}")]
    Device(#[from] anyhow::Error),
}

/// Audio capture device contract
///
/// Implementations own the underlying audio resource exclusively. The
/// session controller holds at most one device and is its only caller.
///
/// - `start` acquires the device (this is where a real microphone prompts
///   for permission) and returns the event channel
/// - `stop` releases the device; must be safe to call when never started
/// - `mute`/`unmute` suspend/resume emission without releasing the device,
///   so a later unmute avoids re-acquisition latency
#[async_trait::async_trait]
pub trait CaptureDevice: Send {
    /// Acquire the device and begin emitting events.
    ///
    /// Returns a channel receiver carrying data chunks and speech
    /// boundaries. Emission stops on `stop()` and pauses on `mute()`.
    async fn start(&mut self) -> Result<mpsc::Receiver<CaptureEvent>, CaptureError>;

    /// Release the device. No-op when not started.
    async fn stop(&mut self) -> Result<()>;

    /// Suspend emission of data chunks without releasing the device.
    fn mute(&mut self);

    /// Resume emission of data chunks.
    fn unmute(&mut self);

    /// Whether the device is currently capturing
    fn is_capturing(&self) -> bool;

    /// Device name for logging
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_carries_fixed_mime_type() {
        let chunk = AudioChunk::from_samples(&[0, 1, -1, 100]);
        assert_eq!(chunk.mime_type, "audio/pcm;rate=16000");
    }

    #[test]
    fn chunk_round_trips_pcm_bytes() {
        let samples: Vec<i16> = vec![0, 256, -256, i16::MAX, i16::MIN];
        let chunk = AudioChunk::from_samples(&samples);

        let bytes = chunk.pcm_bytes().unwrap();
        let decoded: Vec<i16> = bytes
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();

        assert_eq!(decoded, samples);
    }

    #[test]
    fn permission_denied_is_distinguishable() {
        let err = CaptureError::PermissionDenied;
        assert!(matches!(err, CaptureError::PermissionDenied));
        assert_eq!(err.to_string(), "microphone permission denied");
    }
}

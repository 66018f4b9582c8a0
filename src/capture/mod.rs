//! Microphone capture abstraction
//!
//! This module defines the capture-device contract consumed by the session
//! controller plus a WAV-file-backed implementation used for development
//! and batch testing. A capture device owns the underlying audio resource
//! and reports audio data and speech boundaries over a channel.

pub mod device;
pub mod wav;

pub use device::{AudioChunk, CaptureDevice, CaptureError, CaptureEvent, PCM_MIME_TYPE};
pub use wav::WavCaptureDevice;

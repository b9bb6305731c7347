//! Capture Module - Mikrofon-Zugriff
//!
//! Dieses Modul bildet die Media-Capture Capability ab:
//! - Constraint- und Settings-Typen (Anfrage vs. gemeldete Werte)
//! - Track- und Stream-Abstraktion mit Frame-Broadcast
//! - Natives cpal-Backend

mod constraints;
mod devices;
mod track;

pub use constraints::{AudioConstraints, AudioSettings, DeviceInfo, SupportedConstraints};
pub use devices::{CaptureError, CpalMediaDevices, MediaDevices, FRAME_SIZE, SAMPLE_RATE};
pub use track::{AudioFrame, AudioTrack, MediaStream, FRAME_CHANNEL_CAPACITY};

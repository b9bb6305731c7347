//! Track- und Stream-Typen
//!
//! Ein `AudioTrack` ist die kleinste Einheit von Live-Audio: er meldet
//! seine Settings, kann gestoppt werden und verteilt PCM-Frames über
//! einen Broadcast-Kanal an beliebig viele Konsumenten (Peer-Backend,
//! Analyser, Playback).

use super::constraints::AudioSettings;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Kapazität des Frame-Broadcasts pro Track
pub const FRAME_CHANNEL_CAPACITY: usize = 64;

// ============================================================================
// AUDIO FRAME
// ============================================================================

/// Ein Block PCM-Samples (mono, f32)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub samples: Arc<Vec<f32>>,
    pub sample_rate: u32,
}

impl AudioFrame {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples: Arc::new(samples),
            sample_rate,
        }
    }
}

// ============================================================================
// AUDIO TRACK
// ============================================================================

/// Ein lebender Audio-Track
///
/// Implementierungen: cpal-Capture (nativ), Remote-Track (webrtc) und
/// der Fake-Track der Testbackends. `stop()` ist idempotent und synchron;
/// nach `stop()` werden keine Frames mehr gesendet.
pub trait AudioTrack: Send + Sync {
    /// Eindeutige Track-Id
    fn id(&self) -> String;

    /// Menschenlesbarer Gerätename (entspricht `track.label` im Browser)
    fn label(&self) -> String;

    /// Aktuell gemeldete Settings, direkt vom lebenden Track
    fn settings(&self) -> AudioSettings;

    /// Stoppt den Track und gibt das Gerät frei
    fn stop(&self);

    /// `true` sobald der Track gestoppt wurde
    fn ended(&self) -> bool;

    /// Abonniert die PCM-Frames dieses Tracks
    fn subscribe_frames(&self) -> broadcast::Receiver<AudioFrame>;
}

// ============================================================================
// MEDIA STREAM
// ============================================================================

/// Ein Bündel von Audio-Tracks, wie es die Capture-Schicht liefert
#[derive(Clone)]
pub struct MediaStream {
    id: String,
    tracks: Vec<Arc<dyn AudioTrack>>,
}

impl MediaStream {
    pub fn new(tracks: Vec<Arc<dyn AudioTrack>>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tracks,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn audio_tracks(&self) -> &[Arc<dyn AudioTrack>] {
        &self.tracks
    }

    /// Erster Audio-Track, falls vorhanden
    pub fn first_audio_track(&self) -> Option<Arc<dyn AudioTrack>> {
        self.tracks.first().cloned()
    }
}

impl std::fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStream")
            .field("id", &self.id)
            .field("tracks", &self.tracks.len())
            .finish()
    }
}

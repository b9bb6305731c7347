//! Fake-Capture-Backend
//!
//! Wendet angefragte Constraints exakt an (anders als echte Hardware)
//! und protokolliert jede Aufnahme und jeden Track-Stop chronologisch,
//! damit Tests Reihenfolge-Eigenschaften prüfen können.

use super::BackendCall;
use super::BackendLog;
use crate::capture::{
    AudioConstraints, AudioFrame, AudioSettings, AudioTrack, CaptureError, DeviceInfo,
    MediaDevices, MediaStream, SupportedConstraints, FRAME_CHANNEL_CAPACITY,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

// ============================================================================
// FAKE TRACK
// ============================================================================

/// Ein Fake-Mikrofon-Track
pub struct FakeAudioTrack {
    id: String,
    label: String,
    settings: AudioSettings,
    ended: AtomicBool,
    frame_tx: broadcast::Sender<AudioFrame>,
    log: Arc<BackendLog>,
}

impl FakeAudioTrack {
    pub fn new(label: String, settings: AudioSettings, log: Arc<BackendLog>) -> Arc<Self> {
        let (frame_tx, _) = broadcast::channel(FRAME_CHANNEL_CAPACITY);

        Arc::new(Self {
            id: Uuid::new_v4().to_string(),
            label,
            settings,
            ended: AtomicBool::new(false),
            frame_tx,
            log,
        })
    }

    /// Speist ein Test-Frame in den Broadcast ein
    pub fn push_frame(&self, samples: Vec<f32>, sample_rate: u32) {
        let _ = self.frame_tx.send(AudioFrame::new(samples, sample_rate));
    }
}

impl AudioTrack for FakeAudioTrack {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn label(&self) -> String {
        self.label.clone()
    }

    fn settings(&self) -> AudioSettings {
        self.settings.clone()
    }

    fn stop(&self) {
        if self.ended.swap(true, Ordering::SeqCst) {
            return;
        }
        self.log.record(BackendCall::TrackStopped {
            track: self.id.clone(),
        });
    }

    fn ended(&self) -> bool {
        self.ended.load(Ordering::SeqCst)
    }

    fn subscribe_frames(&self) -> broadcast::Receiver<AudioFrame> {
        self.frame_tx.subscribe()
    }
}

// ============================================================================
// FAKE MEDIA DEVICES
// ============================================================================

/// Fake-Backend für `MediaDevices`
///
/// Defaults wie im Browser: `echoCancellation` und `noiseSuppression`
/// sind an, solange nichts anderes angefragt wird.
pub struct FakeMediaDevices {
    devices: Vec<DeviceInfo>,
    log: Arc<BackendLog>,
    fail_next: AtomicBool,
    acquired: Mutex<Vec<Arc<FakeAudioTrack>>>,
}

impl FakeMediaDevices {
    pub fn new(log: Arc<BackendLog>) -> Self {
        Self {
            devices: vec![DeviceInfo {
                device_id: "fake-mic".to_string(),
                label: "Fake Microphone".to_string(),
            }],
            log,
            fail_next: AtomicBool::new(false),
            acquired: Mutex::new(Vec::new()),
        }
    }

    pub fn with_devices(log: Arc<BackendLog>, devices: Vec<DeviceInfo>) -> Self {
        Self {
            devices,
            log,
            fail_next: AtomicBool::new(false),
            acquired: Mutex::new(Vec::new()),
        }
    }

    /// Lässt die nächste Aufnahme fehlschlagen (Gerät belegt o.ä.)
    pub fn fail_next_acquisition(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Alle bisher erzeugten Tracks, in Erzeugungsreihenfolge
    pub fn acquired_tracks(&self) -> Vec<Arc<FakeAudioTrack>> {
        self.acquired.lock().clone()
    }
}

#[async_trait]
impl MediaDevices for FakeMediaDevices {
    async fn get_user_media(
        &self,
        constraints: Option<AudioConstraints>,
    ) -> Result<MediaStream, CaptureError> {
        self.log.record(BackendCall::GetUserMedia {
            constraints: constraints.clone(),
        });

        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(CaptureError::NoInputDevice);
        }

        let constraints = constraints.unwrap_or_default();

        let device = match constraints.device_id.as_deref() {
            None | Some("") => self.devices.first().ok_or(CaptureError::NoInputDevice)?,
            Some(id) => self
                .devices
                .iter()
                .find(|d| d.device_id == id)
                .ok_or_else(|| CaptureError::DeviceNotFound(id.to_string()))?,
        };

        // Fake-Hardware übernimmt angefragte Werte exakt
        let settings = AudioSettings {
            echo_cancellation: constraints.echo_cancellation.unwrap_or(true),
            noise_suppression: constraints.noise_suppression.unwrap_or(true),
            device_id: device.device_id.clone(),
        };

        let track = FakeAudioTrack::new(device.label.clone(), settings, self.log.clone());
        self.acquired.lock().push(track.clone());

        Ok(MediaStream::new(vec![track]))
    }

    async fn enumerate_devices(&self) -> Result<Vec<DeviceInfo>, CaptureError> {
        Ok(self.devices.clone())
    }

    fn supported_constraints(&self) -> SupportedConstraints {
        SupportedConstraints {
            echo_cancellation: true,
            noise_suppression: true,
        }
    }
}

//! Media-Capture Backend auf cpal-Basis
//!
//! Verwendet cpal für Cross-Platform Audio-Input. Die Capture-Callbacks
//! schreiben in einen Ring-Buffer und verteilen vollständige 20ms-Frames
//! über den Frame-Broadcast des Tracks.
//!
//! Hinweis: cpal hat keine eigene Echo- oder Rauschunterdrückung. Die
//! angefragten Flags werden deshalb unverändert als "honored" Settings
//! zurückgemeldet; Aufrufer lesen Settings ohnehin immer vom lebenden
//! Track statt aus den angefragten Constraints.

use super::constraints::{AudioConstraints, AudioSettings, DeviceInfo, SupportedConstraints};
use super::track::{AudioFrame, AudioTrack, MediaStream, FRAME_CHANNEL_CAPACITY};
use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig, SupportedStreamConfigRange};
use parking_lot::Mutex;
use ringbuf::{traits::*, HeapRb};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Sample Rate (48kHz ist der Standard für beste Qualität)
pub const SAMPLE_RATE: u32 = 48000;

/// Frame Size in Samples (20ms @ 48kHz = 960 samples)
pub const FRAME_SIZE: usize = 960;

/// Buffer Size für den Capture-Ring-Buffer
const RING_BUFFER_SIZE: usize = FRAME_SIZE * 10;

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("No audio input device found")]
    NoInputDevice,

    #[error("Audio input device not found: {0}")]
    DeviceNotFound(String),

    #[error("Unsupported audio configuration: {0}")]
    UnsupportedConfig(String),

    #[error("Failed to build audio stream: {0}")]
    StreamBuild(String),

    #[error("Failed to start audio stream: {0}")]
    StreamPlay(String),

    #[error("Failed to enumerate audio devices: {0}")]
    Enumerate(String),

    #[error("Captured stream contains no audio track")]
    NoAudioTrack,
}

// ============================================================================
// MEDIA DEVICES TRAIT
// ============================================================================

/// Media-Capture Capability
///
/// Entspricht `navigator.mediaDevices` im Browser: Streams anfordern,
/// Eingabegeräte auflisten, unterstützte Constraints abfragen. Nativ von
/// [`CpalMediaDevices`] implementiert, in Tests von einem Fake-Backend.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Fordert einen Audio-Stream an (`None` = Plattform-Defaults)
    async fn get_user_media(
        &self,
        constraints: Option<AudioConstraints>,
    ) -> Result<MediaStream, CaptureError>;

    /// Listet alle Audio-Eingabegeräte auf
    async fn enumerate_devices(&self) -> Result<Vec<DeviceInfo>, CaptureError>;

    /// Welche Constraints dieses Backend kennt
    fn supported_constraints(&self) -> SupportedConstraints;
}

// ============================================================================
// CAPTURED TRACK
// ============================================================================

/// Ein von cpal aufgenommener Mikrofon-Track
///
/// Note: `cpal::Stream` ist nicht Send, daher wrappen wir ihn in einen
/// Mutex und verwalten ihn ausschließlich darüber.
pub struct CapturedTrack {
    id: String,
    label: String,
    settings: AudioSettings,
    stream: Mutex<Option<Stream>>,
    ended: AtomicBool,
    frame_tx: broadcast::Sender<AudioFrame>,
}

// Der Stream wird nur hinter dem Mutex angefasst
unsafe impl Send for CapturedTrack {}
unsafe impl Sync for CapturedTrack {}

impl CapturedTrack {
    fn new(
        label: String,
        settings: AudioSettings,
        stream: Stream,
        frame_tx: broadcast::Sender<AudioFrame>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            label,
            settings,
            stream: Mutex::new(Some(stream)),
            ended: AtomicBool::new(false),
            frame_tx,
        }
    }
}

impl AudioTrack for CapturedTrack {
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

        // Stream droppen beendet die Aufnahme und gibt das Gerät frei
        *self.stream.lock() = None;
        tracing::info!("Capture track stopped: {}", self.label);
    }

    fn ended(&self) -> bool {
        self.ended.load(Ordering::SeqCst)
    }

    fn subscribe_frames(&self) -> broadcast::Receiver<AudioFrame> {
        self.frame_tx.subscribe()
    }
}

// ============================================================================
// CPAL MEDIA DEVICES
// ============================================================================

/// Natives Capture-Backend auf cpal-Basis
pub struct CpalMediaDevices;

impl CpalMediaDevices {
    pub fn new() -> Self {
        Self
    }

    /// Sucht das Gerät zur angefragten Device-Id (cpal: der Gerätename)
    fn find_device(device_id: Option<&str>) -> Result<Device, CaptureError> {
        let host = cpal::default_host();

        match device_id {
            None => host.default_input_device().ok_or(CaptureError::NoInputDevice),
            Some("") => host.default_input_device().ok_or(CaptureError::NoInputDevice),
            Some(id) => {
                let devices = host
                    .input_devices()
                    .map_err(|e| CaptureError::Enumerate(e.to_string()))?;

                for device in devices {
                    if device.name().map(|n| n == id).unwrap_or(false) {
                        return Ok(device);
                    }
                }
                Err(CaptureError::DeviceNotFound(id.to_string()))
            }
        }
    }

    /// Findet die beste Input-Konfiguration
    fn find_best_input_config(device: &Device) -> Result<StreamConfig, CaptureError> {
        let configs = device
            .supported_input_configs()
            .map_err(|e| CaptureError::UnsupportedConfig(e.to_string()))?;

        Self::select_best_config(configs.collect())
    }

    /// Wählt die beste Konfiguration aus einer Liste
    fn select_best_config(
        configs: Vec<SupportedStreamConfigRange>,
    ) -> Result<StreamConfig, CaptureError> {
        // Priorität: 48kHz > andere, F32 > andere
        let target_rate = cpal::SampleRate(SAMPLE_RATE);

        // Versuche exakt 48kHz zu finden
        for config in &configs {
            if config.min_sample_rate() <= target_rate
                && config.max_sample_rate() >= target_rate
                && config.sample_format() == SampleFormat::F32
            {
                return Ok(config.with_sample_rate(target_rate).into());
            }
        }

        // Fallback auf beste verfügbare F32-Konfiguration
        for config in &configs {
            if config.sample_format() == SampleFormat::F32 {
                let rate = if config.min_sample_rate() <= target_rate
                    && config.max_sample_rate() >= target_rate
                {
                    target_rate
                } else {
                    config.max_sample_rate()
                };
                return Ok(config.with_sample_rate(rate).into());
            }
        }

        // Nehme erste verfügbare Konfiguration
        if let Some(config) = configs.first() {
            return Ok(config.with_max_sample_rate().into());
        }

        Err(CaptureError::UnsupportedConfig(
            "No suitable audio configuration found".to_string(),
        ))
    }

    /// Baut den Input-Stream, der Frames in den Broadcast schiebt
    fn build_input_stream(
        device: &Device,
        config: &StreamConfig,
        frame_tx: broadcast::Sender<AudioFrame>,
    ) -> Result<Stream, CaptureError> {
        let channels = config.channels as usize;
        let source_sample_rate = config.sample_rate.0;
        let target_sample_rate = SAMPLE_RATE;
        let ring = Arc::new(Mutex::new(HeapRb::<f32>::new(RING_BUFFER_SIZE)));

        let stream = device
            .build_input_stream(
                config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // Auf Mono mischen
                    let mono: Vec<f32> = if channels > 1 {
                        data.chunks(channels)
                            .map(|c| c.iter().sum::<f32>() / channels as f32)
                            .collect()
                    } else {
                        data.to_vec()
                    };

                    // Resampling falls nötig (zu 48kHz, linear)
                    let samples: Vec<f32> = if source_sample_rate != target_sample_rate {
                        let ratio = target_sample_rate as f32 / source_sample_rate as f32;
                        let new_len = (mono.len() as f32 * ratio) as usize;
                        (0..new_len)
                            .map(|i| {
                                let src_idx = i as f32 / ratio;
                                let idx = src_idx as usize;
                                let frac = src_idx - idx as f32;
                                let s1 = mono.get(idx).copied().unwrap_or(0.0);
                                let s2 = mono.get(idx + 1).copied().unwrap_or(s1);
                                s1 + (s2 - s1) * frac
                            })
                            .collect()
                    } else {
                        mono
                    };

                    // In Ring-Buffer schreiben, vollständige Frames verschicken
                    let mut buffer = ring.lock();
                    for sample in samples {
                        let _ = buffer.try_push(sample);
                    }

                    while buffer.occupied_len() >= FRAME_SIZE {
                        let mut frame = Vec::with_capacity(FRAME_SIZE);
                        for _ in 0..FRAME_SIZE {
                            if let Some(sample) = buffer.try_pop() {
                                frame.push(sample);
                            }
                        }
                        let _ = frame_tx.send(AudioFrame::new(frame, target_sample_rate));
                    }
                },
                |err| {
                    tracing::error!("Audio capture error: {}", err);
                },
                None,
            )
            .map_err(|e| CaptureError::StreamBuild(e.to_string()))?;

        Ok(stream)
    }
}

impl Default for CpalMediaDevices {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaDevices for CpalMediaDevices {
    async fn get_user_media(
        &self,
        constraints: Option<AudioConstraints>,
    ) -> Result<MediaStream, CaptureError> {
        let constraints = constraints.unwrap_or_default();

        let device = Self::find_device(constraints.device_id.as_deref())?;
        let label = device.name().unwrap_or_else(|_| "Unknown Microphone".to_string());
        let config = Self::find_best_input_config(&device)?;

        tracing::info!(
            "Starting audio capture: '{}', {} Hz, {} channels",
            label,
            config.sample_rate.0,
            config.channels
        );

        // cpal hat keine EC/NS-Verarbeitung, angefragte Werte gelten als
        // angewendet; Browser-Default ist jeweils `true`.
        let settings = AudioSettings {
            echo_cancellation: constraints.echo_cancellation.unwrap_or(true),
            noise_suppression: constraints.noise_suppression.unwrap_or(true),
            device_id: label.clone(),
        };

        let (frame_tx, _) = broadcast::channel::<AudioFrame>(FRAME_CHANNEL_CAPACITY);
        let stream = Self::build_input_stream(&device, &config, frame_tx.clone())?;

        stream
            .play()
            .map_err(|e| CaptureError::StreamPlay(e.to_string()))?;

        let track = CapturedTrack::new(label, settings, stream, frame_tx);

        Ok(MediaStream::new(vec![Arc::new(track)]))
    }

    async fn enumerate_devices(&self) -> Result<Vec<DeviceInfo>, CaptureError> {
        let host = cpal::default_host();
        let devices = host
            .input_devices()
            .map_err(|e| CaptureError::Enumerate(e.to_string()))?;

        Ok(devices
            .filter_map(|d| d.name().ok())
            .map(|name| DeviceInfo {
                device_id: name.clone(),
                label: name,
            })
            .collect())
    }

    fn supported_constraints(&self) -> SupportedConstraints {
        SupportedConstraints {
            echo_cancellation: true,
            noise_suppression: true,
        }
    }
}

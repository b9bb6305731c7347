//! Signal-Typen des Connectors
//!
//! Der Connector meldet vier Signal-Arten an seinen Aufrufer: Log-Einträge,
//! eingehende Tracks, Settings-Snapshots und Gerätenamen. Statt eines
//! untypisierten Event-Emitters gibt es pro Signal-Art einen eigenen
//! Broadcast-Kanal mit fester Payload.

use crate::capture::{AudioSettings, AudioTrack};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Kapazität der Signal-Kanäle
const SIGNAL_CHANNEL_CAPACITY: usize = 100;

// ============================================================================
// LOG ENTRY
// ============================================================================

/// Ein Verhandlungsschritt als beobachtbarer Log-Eintrag
///
/// Rein observational; der Kern liest Log-Einträge nie zurück.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Zeitstempel im Format `HH:mm:ss.SSS`
    pub timestamp: String,
    /// Endpunkt-Label (`pc-a`, `pc-b`) oder `error`
    pub label: String,
    pub message: String,
}

impl LogEntry {
    pub fn now(label: &str, message: &str) -> Self {
        Self {
            timestamp: Local::now().format("%H:%M:%S%.3f").to_string(),
            label: label.to_string(),
            message: message.to_string(),
        }
    }
}

// ============================================================================
// SETTINGS SNAPSHOT
// ============================================================================

/// Momentaufnahme der Settings des aktiven Sende-Tracks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsSnapshot {
    #[serde(rename = "echoCancellation")]
    pub echo_cancellation: bool,

    #[serde(rename = "noiseSuppression")]
    pub noise_suppression: bool,

    #[serde(rename = "deviceId")]
    pub device_id: String,
}

impl From<AudioSettings> for SettingsSnapshot {
    fn from(settings: AudioSettings) -> Self {
        Self {
            echo_cancellation: settings.echo_cancellation,
            noise_suppression: settings.noise_suppression,
            device_id: settings.device_id,
        }
    }
}

// ============================================================================
// SIGNALS
// ============================================================================

/// Die vier Signal-Kanäle des Connectors
///
/// Jeder Kanal hat eine feste Payload-Form; Senden ohne Abonnenten
/// wird stillschweigend ignoriert.
pub struct ConnectorSignals {
    log_tx: broadcast::Sender<LogEntry>,
    track_tx: broadcast::Sender<Arc<dyn AudioTrack>>,
    settings_tx: broadcast::Sender<SettingsSnapshot>,
    device_name_tx: broadcast::Sender<String>,
}

impl ConnectorSignals {
    pub fn new() -> Self {
        let (log_tx, _) = broadcast::channel(SIGNAL_CHANNEL_CAPACITY);
        let (track_tx, _) = broadcast::channel(SIGNAL_CHANNEL_CAPACITY);
        let (settings_tx, _) = broadcast::channel(SIGNAL_CHANNEL_CAPACITY);
        let (device_name_tx, _) = broadcast::channel(SIGNAL_CHANNEL_CAPACITY);

        Self {
            log_tx,
            track_tx,
            settings_tx,
            device_name_tx,
        }
    }

    pub fn subscribe_logs(&self) -> broadcast::Receiver<LogEntry> {
        self.log_tx.subscribe()
    }

    pub fn subscribe_tracks(&self) -> broadcast::Receiver<Arc<dyn AudioTrack>> {
        self.track_tx.subscribe()
    }

    pub fn subscribe_settings(&self) -> broadcast::Receiver<SettingsSnapshot> {
        self.settings_tx.subscribe()
    }

    pub fn subscribe_device_names(&self) -> broadcast::Receiver<String> {
        self.device_name_tx.subscribe()
    }

    pub(crate) fn emit_log(&self, label: &str, message: &str) {
        let entry = LogEntry::now(label, message);
        tracing::debug!("[{}] {}", entry.label, entry.message);
        let _ = self.log_tx.send(entry);
    }

    pub(crate) fn emit_track(&self, track: Arc<dyn AudioTrack>) {
        let _ = self.track_tx.send(track);
    }

    pub(crate) fn emit_settings(&self, snapshot: SettingsSnapshot) {
        let _ = self.settings_tx.send(snapshot);
    }

    pub(crate) fn emit_device_name(&self, name: String) {
        let _ = self.device_name_tx.send(name);
    }
}

impl Default for ConnectorSignals {
    fn default() -> Self {
        Self::new()
    }
}

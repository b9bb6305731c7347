//! Constraint- und Settings-Typen für Audio-Capture
//!
//! `AudioConstraints` ist eine *Anfrage* an die Plattform, `AudioSettings`
//! ist das, was der aktive Track tatsächlich meldet. Die Plattform darf
//! Constraints ignorieren, daher werden Settings immer vom lebenden Track
//! gelesen und nie separat gecached.

use serde::{Deserialize, Serialize};

// ============================================================================
// CONSTRAINTS (Anfrage)
// ============================================================================

/// Angefragte Audio-Constraints
///
/// Nicht gesetzte Felder bedeuten "aktuellen Wert behalten" (bei einem
/// Settings-Wechsel) bzw. "Plattform-Default" (beim ersten Capture).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioConstraints {
    #[serde(rename = "echoCancellation", skip_serializing_if = "Option::is_none")]
    pub echo_cancellation: Option<bool>,

    #[serde(rename = "noiseSuppression", skip_serializing_if = "Option::is_none")]
    pub noise_suppression: Option<bool>,

    #[serde(rename = "deviceId", skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
}

impl AudioConstraints {
    /// Füllt alle nicht gesetzten Felder aus den Settings des aktuell
    /// aktiven Tracks auf.
    ///
    /// Das ist der Merge-Schritt eines Settings-Wechsels: angefragte Felder
    /// gewinnen, alles andere bleibt wie vom Gerät gemeldet.
    pub fn merged_over(&self, current: &AudioSettings) -> AudioConstraints {
        AudioConstraints {
            echo_cancellation: Some(
                self.echo_cancellation
                    .unwrap_or(current.echo_cancellation),
            ),
            noise_suppression: Some(
                self.noise_suppression
                    .unwrap_or(current.noise_suppression),
            ),
            device_id: self
                .device_id
                .clone()
                .or_else(|| Some(current.device_id.clone())),
        }
    }
}

// ============================================================================
// SETTINGS (gemeldet)
// ============================================================================

/// Vom aktiven Track gemeldete Audio-Settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioSettings {
    #[serde(rename = "echoCancellation")]
    pub echo_cancellation: bool,

    #[serde(rename = "noiseSuppression")]
    pub noise_suppression: bool,

    #[serde(rename = "deviceId")]
    pub device_id: String,
}

impl Default for AudioSettings {
    fn default() -> Self {
        // Browser-Defaults: beide Verarbeitungsstufen an
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            device_id: String::new(),
        }
    }
}

// ============================================================================
// DEVICES
// ============================================================================

/// Beschreibung eines Audio-Eingabegeräts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(rename = "deviceId")]
    pub device_id: String,
    pub label: String,
}

/// Welche Constraints die Plattform überhaupt kennt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedConstraints {
    #[serde(rename = "echoCancellation")]
    pub echo_cancellation: bool,

    #[serde(rename = "noiseSuppression")]
    pub noise_suppression: bool,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn current() -> AudioSettings {
        AudioSettings {
            echo_cancellation: true,
            noise_suppression: true,
            device_id: "mic-1".to_string(),
        }
    }

    #[test]
    fn test_merge_keeps_unspecified_fields() {
        let partial = AudioConstraints {
            noise_suppression: Some(false),
            ..Default::default()
        };

        let merged = partial.merged_over(&current());

        // Nicht angefragte Felder kommen vom aktiven Track
        assert_eq!(merged.echo_cancellation, Some(true));
        assert_eq!(merged.noise_suppression, Some(false));
        assert_eq!(merged.device_id, Some("mic-1".to_string()));
    }

    #[test]
    fn test_merge_with_empty_request_mirrors_current() {
        let merged = AudioConstraints::default().merged_over(&current());

        assert_eq!(merged.echo_cancellation, Some(true));
        assert_eq!(merged.noise_suppression, Some(true));
        assert_eq!(merged.device_id, Some("mic-1".to_string()));
    }

    #[test]
    fn test_merge_device_switch() {
        let partial = AudioConstraints {
            device_id: Some("mic-2".to_string()),
            ..Default::default()
        };

        let merged = partial.merged_over(&current());

        assert_eq!(merged.device_id, Some("mic-2".to_string()));
        assert_eq!(merged.echo_cancellation, Some(true));
    }

    #[test]
    fn test_constraints_serialize_skips_unset() {
        let partial = AudioConstraints {
            echo_cancellation: Some(false),
            ..Default::default()
        };

        let json = serde_json::to_string(&partial).unwrap();
        assert_eq!(json, r#"{"echoCancellation":false}"#);
    }
}

//! Wire-Typen für die Peer-Verbindung
//!
//! Typsichere Gegenstücke zu SDP-Beschreibung, ICE-Kandidat und
//! Transceiver-Richtung, unabhängig vom konkreten Backend.

use serde::{Deserialize, Serialize};

// ============================================================================
// SESSION DESCRIPTION
// ============================================================================

/// Art einer Session-Beschreibung
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Answer,
}

impl std::fmt::Display for SdpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SdpKind::Offer => write!(f, "offer"),
            SdpKind::Answer => write!(f, "answer"),
        }
    }
}

/// Eine SDP-Beschreibung (Offer oder Answer)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpKind,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: String) -> Self {
        Self {
            kind: SdpKind::Offer,
            sdp,
        }
    }

    pub fn answer(sdp: String) -> Self {
        Self {
            kind: SdpKind::Answer,
            sdp,
        }
    }
}

// ============================================================================
// ICE CANDIDATE
// ============================================================================

/// Ein ICE-Kandidat im Init-Format
///
/// Bei der Loopback-Topologie sind das ausschließlich Host-Kandidaten;
/// der Austausch findet trotzdem statt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceCandidate {
    pub candidate: String,

    #[serde(rename = "sdpMid", skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,

    #[serde(rename = "sdpMLineIndex", skip_serializing_if = "Option::is_none")]
    pub sdp_mline_index: Option<u16>,
}

// ============================================================================
// TRANSCEIVER
// ============================================================================

/// Richtung eines Audio-Transceivers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransceiverDirection {
    SendOnly,
    RecvOnly,
}

impl std::fmt::Display for TransceiverDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransceiverDirection::SendOnly => write!(f, "sendonly"),
            TransceiverDirection::RecvOnly => write!(f, "recvonly"),
        }
    }
}

//! Testing Module - Fake-Backends
//!
//! Fakes für Capture, Peer-Verbindung und Zeichenfläche. Das Fake-Capture
//! wendet angefragte Constraints exakt an; das Fake-Peer-Paar setzt die
//! Offer/Answer-Legalität durch. Alle Backend-Aufrufe landen chronologisch
//! in einem gemeinsamen [`BackendLog`], damit Tests Reihenfolgen prüfen
//! können (z.B. Track-Stop strikt vor Neuaufnahme).

mod media;
mod peer;
mod surface;

pub use media::{FakeAudioTrack, FakeMediaDevices};
pub use peer::{FakeEndpoint, FakePeerFactory, FakeSender};
pub use surface::{DrawOp, RecordingSurface};

use crate::capture::AudioConstraints;
use crate::peer::SdpKind;
use parking_lot::Mutex;

// ============================================================================
// BACKEND LOG
// ============================================================================

/// Ein protokollierter Backend-Aufruf
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    GetUserMedia {
        constraints: Option<AudioConstraints>,
    },
    TrackStopped {
        track: String,
    },
    AddTrack {
        endpoint: String,
    },
    CreateOffer {
        endpoint: String,
    },
    CreateAnswer {
        endpoint: String,
    },
    SetLocalDescription {
        endpoint: String,
        kind: SdpKind,
    },
    SetRemoteDescription {
        endpoint: String,
        kind: SdpKind,
    },
    AddIceCandidate {
        endpoint: String,
    },
    ReplaceTrack {
        endpoint: String,
    },
    Close {
        endpoint: String,
    },
}

/// Chronologisches Protokoll aller Fake-Backend-Aufrufe
#[derive(Default)]
pub struct BackendLog {
    calls: Mutex<Vec<BackendCall>>,
}

impl BackendLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, call: BackendCall) {
        self.calls.lock().push(call);
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().clone()
    }

    /// Index des ersten Aufrufs, auf den das Prädikat passt
    pub fn position<F>(&self, predicate: F) -> Option<usize>
    where
        F: Fn(&BackendCall) -> bool,
    {
        self.calls.lock().iter().position(predicate)
    }

    /// Anzahl der Aufrufe, auf die das Prädikat passt
    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&BackendCall) -> bool,
    {
        self.calls.lock().iter().filter(|c| predicate(c)).count()
    }
}

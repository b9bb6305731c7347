//! Peer-Connection Capability
//!
//! Die Traits in diesem Modul sind die Naht zwischen Connector-Kern und
//! WebRTC-Backend. Der Kern kennt nur diese Traits; produktiv steckt
//! dahinter webrtc-rs, in den Tests ein Fake-Paar.

use super::types::{IceCandidate, SessionDescription, TransceiverDirection};
use crate::capture::AudioTrack;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Error, Debug)]
pub enum PeerError {
    #[error("WebRTC error: {0}")]
    Backend(String),

    #[error("Invalid SDP: {0}")]
    InvalidSdp(String),

    #[error("Endpoint is closed")]
    Closed,
}

// ============================================================================
// CALLBACK TYPES
// ============================================================================

/// Handler für generierte ICE-Kandidaten
pub type IceCandidateHandler = Box<dyn Fn(IceCandidate) + Send + Sync>;

/// Handler für eingehende Media-Tracks
pub type TrackHandler = Box<dyn Fn(Arc<dyn AudioTrack>) + Send + Sync>;

// ============================================================================
// PEER TRAITS
// ============================================================================

/// Ein Peer-Connection Endpunkt
///
/// Alle Beschreibungs-Operationen sind asynchron; die Callbacks werden
/// aus Backend-Tasks heraus gefeuert, in unbestimmter Reihenfolge relativ
/// zum Beschreibungs-Austausch.
#[async_trait]
pub trait PeerEndpoint: Send + Sync {
    /// Legt einen Audio-Transceiver mit expliziter Richtung an
    async fn add_transceiver(&self, direction: TransceiverDirection) -> Result<(), PeerError>;

    /// Hängt einen ausgehenden Track an diesen Endpunkt
    async fn add_track(&self, track: Arc<dyn AudioTrack>) -> Result<(), PeerError>;

    /// Aktuelle Sender dieses Endpunkts
    fn senders(&self) -> Vec<Arc<dyn TrackSender>>;

    async fn create_offer(&self) -> Result<SessionDescription, PeerError>;

    async fn create_answer(&self) -> Result<SessionDescription, PeerError>;

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), PeerError>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), PeerError>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), PeerError>;

    /// Registriert den Handler für generierte ICE-Kandidaten
    fn on_ice_candidate(&self, handler: IceCandidateHandler);

    /// Registriert den Handler für eingehende Tracks
    fn on_track(&self, handler: TrackHandler);

    /// Schließt den Endpunkt und gibt alle Ressourcen frei
    async fn close(&self) -> Result<(), PeerError>;
}

/// Ein Sender für einen ausgehenden Track
#[async_trait]
pub trait TrackSender: Send + Sync {
    /// Der aktuell gesendete Track
    fn track(&self) -> Arc<dyn AudioTrack>;

    /// Tauscht den ausgehenden Track ohne Renegotiation aus
    async fn replace_track(&self, track: Arc<dyn AudioTrack>) -> Result<(), PeerError>;
}

/// Fabrik für Peer-Endpunkte
///
/// Der Connector erzeugt pro Session genau zwei Endpunkte (A sendet,
/// B empfängt); das Label taucht nur in Logs auf.
#[async_trait]
pub trait PeerFactory: Send + Sync {
    async fn create_endpoint(&self, label: &str) -> Result<Arc<dyn PeerEndpoint>, PeerError>;
}

//! Peer Module - Peer-Connection Capability
//!
//! Dieses Modul verwaltet:
//! - Wire-Typen (SDP-Beschreibung, ICE-Kandidat, Transceiver-Richtung)
//! - die Backend-Naht (`PeerEndpoint`, `TrackSender`, `PeerFactory`)
//! - das native webrtc-rs Backend mit G.711-Medienbrücke

mod endpoint;
pub mod g711;
mod types;
mod webrtc;

pub use endpoint::{
    IceCandidateHandler, PeerEndpoint, PeerError, PeerFactory, TrackHandler, TrackSender,
};
pub use types::{IceCandidate, SdpKind, SessionDescription, TransceiverDirection};
pub use webrtc::{RemoteAudioTrack, WebRtcEndpoint, WebRtcPeerFactory};

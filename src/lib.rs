//! echolab - Lokales WebRTC-Loopback-Labor für Audio-Constraints
//!
//! Baut ein Paar lokaler Peer-Verbindungen innerhalb eines Prozesses auf,
//! schleift das Mikrofon über die Verbindung und erlaubt:
//! - `echoCancellation` / `noiseSuppression` am lebenden Track umzuschalten
//!   (per Track-Tausch, ohne Renegotiation)
//! - die Verhandlungsschritte als Log-Signale zu beobachten
//! - Wellenform und Spektrum des Audios zu visualisieren
//!
//! Die Plattform-Capabilities (Capture, Peer-Verbindung, Zeichenfläche)
//! hängen hinter Traits; produktiv stecken cpal und webrtc-rs dahinter,
//! in den Tests die Fakes aus [`testing`].

pub mod analyser;
pub mod capture;
pub mod connector;
pub mod peer;
pub mod testing;

use std::sync::Arc;

pub use analyser::{AudioAnalyser, DrawSurface, Rgb};
pub use capture::{AudioConstraints, AudioSettings, CpalMediaDevices, MediaDevices, MediaStream};
pub use connector::{Connector, ConnectorError, LogEntry, SessionStatus, SettingsSnapshot};
pub use peer::WebRtcPeerFactory;

/// Initialisiert das Logging
///
/// Muss genau einmal beim Programmstart gerufen werden.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("echolab=debug".parse().unwrap())
                .add_directive("webrtc=warn".parse().unwrap()),
        )
        .init();
}

/// Erstellt einen Connector über den nativen Backends (webrtc-rs + cpal)
pub fn native_connector() -> Connector {
    Connector::new(
        Arc::new(WebRtcPeerFactory::new()),
        Arc::new(CpalMediaDevices::new()),
    )
}

//! Connector Module - der Kern
//!
//! Dieses Modul verwaltet:
//! - die Session-Zustandsmaschine (Idle -> Connecting -> Connected | Error)
//! - den einmaligen Offer/Answer-Austausch zwischen beiden Endpunkten
//! - den Track-Tausch bei Constraint-Änderungen (ohne Renegotiation)
//! - die vier typisierten Signal-Kanäle an den Aufrufer

mod engine;
mod signals;

pub use engine::{Connector, ConnectorError, SessionStatus};
pub use signals::{ConnectorSignals, LogEntry, SettingsSnapshot};

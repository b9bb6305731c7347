//! Fake-Peer-Backend
//!
//! Zwei nacheinander erzeugte Endpunkte bilden ein Paar. Das Fake setzt
//! die Offer/Answer-Legalität durch (Answer nur mit Remote-Offer, Remote-
//! Answer nur mit lokalem Offer) und stellt Tracks der Sendeseite zu,
//! sobald beide Beschreibungen stabil sind. Jeder Aufruf landet
//! chronologisch im [`BackendLog`].

use super::{BackendCall, BackendLog};
use crate::capture::AudioTrack;
use crate::peer::{
    IceCandidate, IceCandidateHandler, PeerEndpoint, PeerError, PeerFactory, SdpKind,
    SessionDescription, TrackHandler, TrackSender, TransceiverDirection,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

// ============================================================================
// FAKE SENDER
// ============================================================================

pub struct FakeSender {
    endpoint: String,
    current: Mutex<Arc<dyn AudioTrack>>,
    log: Arc<BackendLog>,
}

#[async_trait]
impl TrackSender for FakeSender {
    fn track(&self) -> Arc<dyn AudioTrack> {
        self.current.lock().clone()
    }

    async fn replace_track(&self, track: Arc<dyn AudioTrack>) -> Result<(), PeerError> {
        self.log.record(BackendCall::ReplaceTrack {
            endpoint: self.endpoint.clone(),
        });
        *self.current.lock() = track;
        Ok(())
    }
}

// ============================================================================
// FAKE ENDPOINT
// ============================================================================

pub struct FakeEndpoint {
    label: String,
    log: Arc<BackendLog>,
    fail_answer: bool,

    local_desc: Mutex<Option<SessionDescription>>,
    remote_desc: Mutex<Option<SessionDescription>>,
    transceivers: Mutex<Vec<TransceiverDirection>>,
    senders: Mutex<Vec<Arc<FakeSender>>>,

    ice_handler: Mutex<Option<IceCandidateHandler>>,
    track_handler: Mutex<Option<TrackHandler>>,

    peer: Mutex<Option<Arc<FakeEndpoint>>>,
    closed: AtomicBool,
    close_calls: AtomicUsize,
}

impl FakeEndpoint {
    fn new(label: String, log: Arc<BackendLog>, fail_answer: bool) -> Arc<Self> {
        Arc::new(Self {
            label,
            log,
            fail_answer,
            local_desc: Mutex::new(None),
            remote_desc: Mutex::new(None),
            transceivers: Mutex::new(Vec::new()),
            senders: Mutex::new(Vec::new()),
            ice_handler: Mutex::new(None),
            track_handler: Mutex::new(None),
            peer: Mutex::new(None),
            closed: AtomicBool::new(false),
            close_calls: AtomicUsize::new(0),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Wie oft `close()` gerufen wurde
    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    pub fn transceivers(&self) -> Vec<TransceiverDirection> {
        self.transceivers.lock().clone()
    }

    fn ensure_open(&self) -> Result<(), PeerError> {
        if self.is_closed() {
            Err(PeerError::Closed)
        } else {
            Ok(())
        }
    }

    /// Stellt einen Track der Gegenseite zu (feuert deren on_track)
    fn deliver_track_to_peer(&self, track: Arc<dyn AudioTrack>) {
        let peer = self.peer.lock().clone();
        if let Some(peer) = peer {
            let handler = peer.track_handler.lock();
            if let Some(handler) = handler.as_ref() {
                handler(track);
            }
        }
    }
}

#[async_trait]
impl PeerEndpoint for FakeEndpoint {
    async fn add_transceiver(&self, direction: TransceiverDirection) -> Result<(), PeerError> {
        self.ensure_open()?;
        self.transceivers.lock().push(direction);
        Ok(())
    }

    async fn add_track(&self, track: Arc<dyn AudioTrack>) -> Result<(), PeerError> {
        self.ensure_open()?;
        self.log.record(BackendCall::AddTrack {
            endpoint: self.label.clone(),
        });
        self.senders.lock().push(Arc::new(FakeSender {
            endpoint: self.label.clone(),
            current: Mutex::new(track),
            log: self.log.clone(),
        }));
        Ok(())
    }

    fn senders(&self) -> Vec<Arc<dyn TrackSender>> {
        self.senders
            .lock()
            .iter()
            .map(|s| Arc::clone(s) as Arc<dyn TrackSender>)
            .collect()
    }

    async fn create_offer(&self) -> Result<SessionDescription, PeerError> {
        self.ensure_open()?;
        self.log.record(BackendCall::CreateOffer {
            endpoint: self.label.clone(),
        });
        Ok(SessionDescription::offer(format!(
            "v=0 fake offer from {}",
            self.label
        )))
    }

    async fn create_answer(&self) -> Result<SessionDescription, PeerError> {
        self.ensure_open()?;
        self.log.record(BackendCall::CreateAnswer {
            endpoint: self.label.clone(),
        });

        if self.fail_answer {
            return Err(PeerError::Backend("injected answer failure".to_string()));
        }

        // Ohne Remote-Offer gibt es nichts zu beantworten
        let has_remote_offer = self
            .remote_desc
            .lock()
            .as_ref()
            .map(|d| d.kind == SdpKind::Offer)
            .unwrap_or(false);
        if !has_remote_offer {
            return Err(PeerError::InvalidSdp(
                "create_answer without remote offer".to_string(),
            ));
        }

        Ok(SessionDescription::answer(format!(
            "v=0 fake answer from {}",
            self.label
        )))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), PeerError> {
        self.ensure_open()?;
        self.log.record(BackendCall::SetLocalDescription {
            endpoint: self.label.clone(),
            kind: desc.kind,
        });
        *self.local_desc.lock() = Some(desc);

        // Nach setLocalDescription beginnt das Kandidaten-Sammeln
        let handler = self.ice_handler.lock();
        if let Some(handler) = handler.as_ref() {
            handler(IceCandidate {
                candidate: format!("candidate:1 1 udp 2122260223 127.0.0.1 50000 typ host ({})", self.label),
                sdp_mid: Some("0".to_string()),
                sdp_mline_index: Some(0),
            });
        }

        Ok(())
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), PeerError> {
        self.ensure_open()?;

        // Eine Remote-Answer setzt ein eigenes lokales Offer voraus
        if desc.kind == SdpKind::Answer {
            let has_local_offer = self
                .local_desc
                .lock()
                .as_ref()
                .map(|d| d.kind == SdpKind::Offer)
                .unwrap_or(false);
            if !has_local_offer {
                return Err(PeerError::InvalidSdp(
                    "remote answer without local offer".to_string(),
                ));
            }
        }

        self.log.record(BackendCall::SetRemoteDescription {
            endpoint: self.label.clone(),
            kind: desc.kind,
        });

        let stable = desc.kind == SdpKind::Answer;
        *self.remote_desc.lock() = Some(desc);

        // Beide Seiten stabil: ab jetzt fließen Medien zur Gegenseite
        if stable {
            let tracks: Vec<Arc<dyn AudioTrack>> = self
                .senders
                .lock()
                .iter()
                .map(|s| s.track())
                .collect();
            for track in tracks {
                self.deliver_track_to_peer(track);
            }
        }

        Ok(())
    }

    async fn add_ice_candidate(&self, _candidate: IceCandidate) -> Result<(), PeerError> {
        self.ensure_open()?;
        self.log.record(BackendCall::AddIceCandidate {
            endpoint: self.label.clone(),
        });
        Ok(())
    }

    fn on_ice_candidate(&self, handler: IceCandidateHandler) {
        *self.ice_handler.lock() = Some(handler);
    }

    fn on_track(&self, handler: TrackHandler) {
        *self.track_handler.lock() = Some(handler);
    }

    async fn close(&self) -> Result<(), PeerError> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
        self.log.record(BackendCall::Close {
            endpoint: self.label.clone(),
        });
        Ok(())
    }
}

// ============================================================================
// FAKE FACTORY
// ============================================================================

/// Fabrik, die nacheinander erzeugte Endpunkte zu Paaren verbindet
pub struct FakePeerFactory {
    log: Arc<BackendLog>,
    fail_answer: AtomicBool,
    pending: Mutex<Option<Arc<FakeEndpoint>>>,
    created: Mutex<Vec<Arc<FakeEndpoint>>>,
}

impl FakePeerFactory {
    pub fn new(log: Arc<BackendLog>) -> Self {
        Self {
            log,
            fail_answer: AtomicBool::new(false),
            pending: Mutex::new(None),
            created: Mutex::new(Vec::new()),
        }
    }

    /// Erzeugte Endpunkte liefern künftig Fehler bei `create_answer`
    pub fn fail_answer(&self) {
        self.fail_answer.store(true, Ordering::SeqCst);
    }

    /// Hebt die Fehler-Injektion für künftige Endpunkte wieder auf
    pub fn clear_answer_failure(&self) {
        self.fail_answer.store(false, Ordering::SeqCst);
    }

    /// Alle bisher erzeugten Endpunkte, in Erzeugungsreihenfolge
    pub fn endpoints(&self) -> Vec<Arc<FakeEndpoint>> {
        self.created.lock().clone()
    }
}

#[async_trait]
impl PeerFactory for FakePeerFactory {
    async fn create_endpoint(&self, label: &str) -> Result<Arc<dyn PeerEndpoint>, PeerError> {
        let endpoint = FakeEndpoint::new(
            label.to_string(),
            self.log.clone(),
            self.fail_answer.load(Ordering::SeqCst),
        );

        // Paarbildung: erster wartet, zweiter schließt das Paar
        let mut pending = self.pending.lock();
        if let Some(first) = pending.take() {
            *first.peer.lock() = Some(endpoint.clone());
            *endpoint.peer.lock() = Some(first);
        } else {
            *pending = Some(endpoint.clone());
        }

        self.created.lock().push(endpoint.clone());
        Ok(endpoint)
    }
}

//! Natives Peer-Backend auf webrtc-rs Basis
//!
//! Setzt die [`PeerEndpoint`]-Naht mit echten `RTCPeerConnection`-Objekten
//! um. Die Medienbrücke läuft über G.711 µ-law bei 8kHz: ein
//! Forwarding-Task liest die PCM-Frames des lokalen Tracks, kodiert sie
//! und schreibt sie als Samples in den ausgehenden Track; eingehende
//! RTP-Payloads werden dekodiert und wieder als Frames verteilt.

use super::endpoint::{IceCandidateHandler, PeerEndpoint, PeerError, PeerFactory, TrackHandler, TrackSender};
use super::g711;
use super::types::{IceCandidate, SdpKind, SessionDescription, TransceiverDirection};
use crate::capture::{AudioFrame, AudioSettings, AudioTrack, FRAME_CHANNEL_CAPACITY};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MediaEngine, MIME_TYPE_PCMU};
use webrtc::api::APIBuilder;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::interceptor::registry::Registry;
use webrtc::media::Sample;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

/// Framedauer der Medienbrücke (20ms, wie beim Capture)
const SAMPLE_DURATION: Duration = Duration::from_millis(20);

// ============================================================================
// REMOTE TRACK
// ============================================================================

/// Eingehender Track der Gegenseite
///
/// Liest RTP-Payloads, dekodiert G.711 und verteilt die Frames an
/// Analyser/Playback. Constraints gibt es auf der Empfangsseite nicht;
/// `settings()` liefert Defaults.
pub struct RemoteAudioTrack {
    id: String,
    ended: AtomicBool,
    frame_tx: broadcast::Sender<AudioFrame>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl RemoteAudioTrack {
    fn start(remote: Arc<TrackRemote>) -> Arc<Self> {
        let (frame_tx, _) = broadcast::channel(FRAME_CHANNEL_CAPACITY);

        let track = Arc::new(Self {
            id: remote.id(),
            ended: AtomicBool::new(false),
            frame_tx: frame_tx.clone(),
            reader: Mutex::new(None),
        });

        let handle = tokio::spawn(async move {
            loop {
                match remote.read_rtp().await {
                    Ok((packet, _)) => {
                        let samples = g711::decode_payload(&packet.payload);
                        let _ = frame_tx.send(AudioFrame::new(samples, g711::G711_SAMPLE_RATE));
                    }
                    Err(e) => {
                        tracing::debug!("Remote track read loop ended: {}", e);
                        break;
                    }
                }
            }
        });

        *track.reader.lock() = Some(handle);
        track
    }
}

impl AudioTrack for RemoteAudioTrack {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn label(&self) -> String {
        "remote-audio".to_string()
    }

    fn settings(&self) -> AudioSettings {
        AudioSettings::default()
    }

    fn stop(&self) {
        if self.ended.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(handle) = self.reader.lock().take() {
            handle.abort();
        }
    }

    fn ended(&self) -> bool {
        self.ended.load(Ordering::SeqCst)
    }

    fn subscribe_frames(&self) -> broadcast::Receiver<AudioFrame> {
        self.frame_tx.subscribe()
    }
}

// ============================================================================
// SENDER
// ============================================================================

/// Sender über einen `TrackLocalStaticSample`
///
/// Der lokale webrtc-Track bleibt über die gesamte Session derselbe;
/// ein Track-Tausch hängt nur den Forwarding-Task an die neue Quelle um.
/// Genau dadurch kommt der Tausch ohne Renegotiation aus.
struct WebRtcSender {
    local: Arc<TrackLocalStaticSample>,
    current: Mutex<Arc<dyn AudioTrack>>,
    forwarder: Mutex<Option<JoinHandle<()>>>,
}

impl WebRtcSender {
    fn new(local: Arc<TrackLocalStaticSample>, source: Arc<dyn AudioTrack>) -> Arc<Self> {
        let sender = Arc::new(Self {
            local,
            current: Mutex::new(source.clone()),
            forwarder: Mutex::new(None),
        });
        sender.spawn_forwarder(source);
        sender
    }

    /// Startet den Forwarding-Task für die angegebene Quelle neu
    fn spawn_forwarder(&self, source: Arc<dyn AudioTrack>) {
        let mut slot = self.forwarder.lock();
        if let Some(handle) = slot.take() {
            handle.abort();
        }

        let local = Arc::clone(&self.local);
        let mut frames = source.subscribe_frames();

        *slot = Some(tokio::spawn(async move {
            loop {
                match frames.recv().await {
                    Ok(frame) => {
                        let payload = g711::encode_frame(&frame.samples);
                        let sample = Sample {
                            data: payload.into(),
                            duration: SAMPLE_DURATION,
                            ..Default::default()
                        };
                        if let Err(e) = local.write_sample(&sample).await {
                            tracing::debug!("Outbound sample write failed: {}", e);
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!("Outbound forwarder lagged, skipped {} frames", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));
    }

    fn shutdown(&self) {
        if let Some(handle) = self.forwarder.lock().take() {
            handle.abort();
        }
    }
}

#[async_trait]
impl TrackSender for WebRtcSender {
    fn track(&self) -> Arc<dyn AudioTrack> {
        self.current.lock().clone()
    }

    async fn replace_track(&self, track: Arc<dyn AudioTrack>) -> Result<(), PeerError> {
        self.spawn_forwarder(track.clone());
        *self.current.lock() = track;
        Ok(())
    }
}

// ============================================================================
// ENDPOINT
// ============================================================================

/// Peer-Endpunkt über eine echte `RTCPeerConnection`
pub struct WebRtcEndpoint {
    label: String,
    pc: Arc<RTCPeerConnection>,
    senders: Mutex<Vec<Arc<WebRtcSender>>>,
}

impl WebRtcEndpoint {
    fn map_err(e: webrtc::Error) -> PeerError {
        PeerError::Backend(e.to_string())
    }

    fn to_rtc_description(desc: &SessionDescription) -> Result<RTCSessionDescription, PeerError> {
        match desc.kind {
            SdpKind::Offer => RTCSessionDescription::offer(desc.sdp.clone()),
            SdpKind::Answer => RTCSessionDescription::answer(desc.sdp.clone()),
        }
        .map_err(|e| PeerError::InvalidSdp(e.to_string()))
    }
}

#[async_trait]
impl PeerEndpoint for WebRtcEndpoint {
    async fn add_transceiver(&self, direction: TransceiverDirection) -> Result<(), PeerError> {
        let init = RTCRtpTransceiverInit {
            direction: match direction {
                TransceiverDirection::SendOnly => RTCRtpTransceiverDirection::Sendonly,
                TransceiverDirection::RecvOnly => RTCRtpTransceiverDirection::Recvonly,
            },
            send_encodings: vec![],
        };

        self.pc
            .add_transceiver_from_kind(RTPCodecType::Audio, Some(init))
            .await
            .map_err(Self::map_err)?;

        Ok(())
    }

    async fn add_track(&self, track: Arc<dyn AudioTrack>) -> Result<(), PeerError> {
        let local = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_PCMU.to_string(),
                clock_rate: g711::G711_SAMPLE_RATE,
                channels: 1,
                ..Default::default()
            },
            Uuid::new_v4().to_string(),
            "echolab".to_string(),
        ));

        self.pc
            .add_track(Arc::clone(&local) as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .map_err(Self::map_err)?;

        self.senders.lock().push(WebRtcSender::new(local, track));
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
        let offer = self.pc.create_offer(None).await.map_err(Self::map_err)?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription, PeerError> {
        let answer = self.pc.create_answer(None).await.map_err(Self::map_err)?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), PeerError> {
        let rtc_desc = Self::to_rtc_description(&desc)?;
        self.pc
            .set_local_description(rtc_desc)
            .await
            .map_err(Self::map_err)
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), PeerError> {
        let rtc_desc = Self::to_rtc_description(&desc)?;
        self.pc
            .set_remote_description(rtc_desc)
            .await
            .map_err(Self::map_err)
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), PeerError> {
        self.pc
            .add_ice_candidate(RTCIceCandidateInit {
                candidate: candidate.candidate,
                sdp_mid: candidate.sdp_mid,
                sdp_mline_index: candidate.sdp_mline_index,
                ..Default::default()
            })
            .await
            .map_err(Self::map_err)
    }

    fn on_ice_candidate(&self, handler: IceCandidateHandler) {
        self.pc
            .on_ice_candidate(Box::new(move |candidate: Option<RTCIceCandidate>| {
                if let Some(c) = candidate {
                    if let Ok(init) = c.to_json() {
                        handler(IceCandidate {
                            candidate: init.candidate,
                            sdp_mid: init.sdp_mid,
                            sdp_mline_index: init.sdp_mline_index,
                        });
                    }
                }
                Box::pin(async {})
            }));
    }

    fn on_track(&self, handler: TrackHandler) {
        let label = self.label.clone();
        self.pc.on_track(Box::new(move |track, _, _| {
            tracing::info!("[{}] received track: {:?}", label, track.codec());
            let remote = RemoteAudioTrack::start(track);
            handler(remote as Arc<dyn AudioTrack>);
            Box::pin(async {})
        }));
    }

    async fn close(&self) -> Result<(), PeerError> {
        for sender in self.senders.lock().iter() {
            sender.shutdown();
        }
        self.pc.close().await.map_err(Self::map_err)
    }
}

// ============================================================================
// FACTORY
// ============================================================================

/// Fabrik für webrtc-rs Endpunkte
///
/// Loopback-Topologie: keine STUN/TURN-Server nötig, es entstehen nur
/// Host-Kandidaten.
pub struct WebRtcPeerFactory;

impl WebRtcPeerFactory {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WebRtcPeerFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PeerFactory for WebRtcPeerFactory {
    async fn create_endpoint(&self, label: &str) -> Result<Arc<dyn PeerEndpoint>, PeerError> {
        // Media Engine mit Default-Codecs (enthält PCMU)
        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(|e| PeerError::Backend(e.to_string()))?;

        // Interceptors für RTCP, NACK etc.
        let mut registry = Registry::new();
        registry = register_default_interceptors(registry, &mut media_engine)
            .map_err(|e| PeerError::Backend(e.to_string()))?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let config = RTCConfiguration {
            ice_servers: vec![],
            ..Default::default()
        };

        let pc = Arc::new(
            api.new_peer_connection(config)
                .await
                .map_err(|e| PeerError::Backend(e.to_string()))?,
        );

        Ok(Arc::new(WebRtcEndpoint {
            label: label.to_string(),
            pc,
            senders: Mutex::new(Vec::new()),
        }))
    }
}

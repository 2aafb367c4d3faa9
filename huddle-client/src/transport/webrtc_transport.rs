use crate::error::TransportError;
use crate::media::{MediaTrack, TrackKind};
use crate::transform::TransformPipeline;
use crate::transport::frame_forwarder::spawn_forwarder;
use crate::transport::peer_transport::{DataChannel, PeerTransport, TransportFactory};
use crate::transport::transport_config::TransportConfig;
use crate::transport::transport_event::{PeerConnectionState, TransportEvent};
use async_trait::async_trait;
use huddle_core::{IceCandidate, ParticipantId, SdpType, SessionDescription};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MediaEngine};
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::data_channel::data_channel_state::RTCDataChannelState;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

const STREAM_ID: &str = "huddle";

#[derive(Debug, Default, Clone, Copy)]
pub struct WebRtcTransportFactory;

#[async_trait]
impl TransportFactory for WebRtcTransportFactory {
    async fn create(
        &self,
        peer_id: &ParticipantId,
        config: &TransportConfig,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn PeerTransport>, TransportError> {
        let transport = WebRtcTransport::new(peer_id.clone(), config, events).await?;
        Ok(Arc::new(transport))
    }
}

/// An outgoing sender: the sample track registered with the peer connection
/// and the task currently feeding it from a local source.
struct Outgoing {
    sample_track: Arc<TrackLocalStaticSample>,
    forwarder: JoinHandle<()>,
}

pub struct WebRtcTransport {
    peer_id: ParticipantId,
    peer_connection: Arc<RTCPeerConnection>,
    outgoing: Mutex<HashMap<TrackKind, Outgoing>>,
    event_tx: mpsc::Sender<TransportEvent>,
}

impl WebRtcTransport {
    pub async fn new(
        peer_id: ParticipantId,
        config: &TransportConfig,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> anyhow::Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        let state_tx = event_tx.clone();
        let pid_state = peer_id.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                let pid = pid_state.clone();

                Box::pin(async move {
                    info!("Peer connection state for {}: {}", pid, s);
                    let state = match s {
                        RTCPeerConnectionState::Connecting => PeerConnectionState::Connecting,
                        RTCPeerConnectionState::Connected => PeerConnectionState::Connected,
                        RTCPeerConnectionState::Disconnected => PeerConnectionState::Disconnected,
                        RTCPeerConnectionState::Failed => PeerConnectionState::Failed,
                        RTCPeerConnectionState::Closed => PeerConnectionState::Closed,
                        _ => PeerConnectionState::New,
                    };
                    let _ = tx.send(TransportEvent::StateChanged(state)).await;
                })
            },
        ));

        let ice_tx = event_tx.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let candidate = IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_mline_index: init.sdp_mline_index,
                    username_fragment: init.username_fragment,
                };
                let _ = tx.send(TransportEvent::CandidateGenerated(candidate)).await;
            })
        }));

        let dc_tx = event_tx.clone();
        let pid_dc = peer_id.clone();
        peer_connection.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
            let tx = dc_tx.clone();
            let pid = pid_dc.clone();

            Box::pin(async move {
                debug!("Remote data channel '{}' from {}", dc.label(), pid);
                wire_data_channel(&dc, tx);
            })
        }));

        let track_tx = event_tx.clone();
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();

                Box::pin(async move {
                    let kind = match track.kind() {
                        RTPCodecType::Audio => TrackKind::Audio,
                        _ => TrackKind::Video,
                    };
                    let _ = tx
                        .send(TransportEvent::TrackReceived {
                            track_id: track.id(),
                            kind,
                        })
                        .await;
                    // Nothing renders remote media here; keep the receive buffers moving.
                    tokio::spawn(async move { while track.read_rtp().await.is_ok() {} });
                })
            },
        ));

        Ok(Self {
            peer_id,
            peer_connection,
            outgoing: Mutex::new(HashMap::new()),
            event_tx,
        })
    }

    pub fn peer_id(&self) -> &ParticipantId {
        &self.peer_id
    }
}

#[async_trait]
impl PeerTransport for WebRtcTransport {
    async fn add_track(
        &self,
        track: Arc<MediaTrack>,
        pipeline: Option<TransformPipeline>,
    ) -> Result<(), TransportError> {
        let kind = track.kind();
        let sample_track = Arc::new(TrackLocalStaticSample::new(
            codec_for(kind),
            track.id().to_owned(),
            STREAM_ID.to_owned(),
        ));
        let sender = self
            .peer_connection
            .add_track(sample_track.clone() as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .map_err(|e| TransportError::Track(e.to_string()))?;

        // RTCP has to be read for interceptors to work.
        tokio::spawn(async move {
            let mut rtcp_buf = vec![0u8; 1500];
            while sender.read(&mut rtcp_buf).await.is_ok() {}
        });

        let forwarder = spawn_forwarder(track, sample_track.clone(), pipeline);
        let previous = self.outgoing.lock().await.insert(
            kind,
            Outgoing {
                sample_track,
                forwarder,
            },
        );
        if let Some(previous) = previous {
            previous.forwarder.abort();
        }
        Ok(())
    }

    async fn replace_track(
        &self,
        track: Arc<MediaTrack>,
        pipeline: Option<TransformPipeline>,
    ) -> Result<(), TransportError> {
        let mut outgoing = self.outgoing.lock().await;
        let Some(slot) = outgoing.get_mut(&track.kind()) else {
            return Err(TransportError::Track(format!(
                "no outgoing {} sender to {}",
                track.kind(),
                self.peer_id
            )));
        };
        slot.forwarder.abort();
        debug!("Sender to {} now fed by {}", self.peer_id, track.id());
        slot.forwarder = spawn_forwarder(track, slot.sample_track.clone(), pipeline);
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription, TransportError> {
        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .map_err(|e| TransportError::LocalDescription(e.to_string()))?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription, TransportError> {
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .map_err(|e| TransportError::LocalDescription(e.to_string()))?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_local_description(
        &self,
        desc: SessionDescription,
    ) -> Result<(), TransportError> {
        let desc = to_rtc(desc).map_err(TransportError::LocalDescription)?;
        self.peer_connection
            .set_local_description(desc)
            .await
            .map_err(|e| TransportError::LocalDescription(e.to_string()))
    }

    async fn set_remote_description(
        &self,
        desc: SessionDescription,
    ) -> Result<(), TransportError> {
        let desc = to_rtc(desc).map_err(TransportError::RemoteDescription)?;
        self.peer_connection
            .set_remote_description(desc)
            .await
            .map_err(|e| TransportError::RemoteDescription(e.to_string()))
    }

    async fn add_candidate(&self, candidate: IceCandidate) -> Result<(), TransportError> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_mline_index,
            username_fragment: candidate.username_fragment,
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .map_err(|e| TransportError::Candidate(e.to_string()))
    }

    async fn create_data_channel(
        &self,
        label: &str,
    ) -> Result<Arc<dyn DataChannel>, TransportError> {
        let dc = self
            .peer_connection
            .create_data_channel(label, None)
            .await
            .map_err(|e| TransportError::DataChannel(e.to_string()))?;
        wire_data_channel(&dc, self.event_tx.clone());
        Ok(Arc::new(WebRtcDataChannel(dc)))
    }

    async fn close(&self) -> Result<(), TransportError> {
        for (_, outgoing) in self.outgoing.lock().await.drain() {
            outgoing.forwarder.abort();
        }
        self.peer_connection
            .close()
            .await
            .map_err(|e| TransportError::Other(e.into()))
    }
}

pub struct WebRtcDataChannel(Arc<RTCDataChannel>);

#[async_trait]
impl DataChannel for WebRtcDataChannel {
    fn label(&self) -> String {
        self.0.label().to_owned()
    }

    fn is_open(&self) -> bool {
        self.0.ready_state() == RTCDataChannelState::Open
    }

    async fn send_text(&self, text: &str) -> Result<(), TransportError> {
        self.0
            .send_text(text.to_owned())
            .await
            .map(|_| ())
            .map_err(|e| TransportError::DataChannel(e.to_string()))
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.0
            .close()
            .await
            .map_err(|e| TransportError::DataChannel(e.to_string()))
    }
}

fn wire_data_channel(dc: &Arc<RTCDataChannel>, tx: mpsc::Sender<TransportEvent>) {
    let dc_on_open = dc.clone();
    let tx_open = tx.clone();
    dc.on_open(Box::new(move || {
        let tx = tx_open.clone();
        let channel: Arc<dyn DataChannel> = Arc::new(WebRtcDataChannel(dc_on_open.clone()));

        Box::pin(async move {
            info!("Data channel '{}' open", channel.label());
            let _ = tx.send(TransportEvent::DataChannelOpen(channel)).await;
        })
    }));

    let tx_msg = tx.clone();
    let label_msg = dc.label().to_owned();
    dc.on_message(Box::new(move |msg: DataChannelMessage| {
        let tx = tx_msg.clone();
        let label = label_msg.clone();

        Box::pin(async move {
            let text = String::from_utf8_lossy(&msg.data).into_owned();
            let _ = tx
                .send(TransportEvent::DataChannelMessage { label, text })
                .await;
        })
    }));

    let tx_close = tx;
    let label_close = dc.label().to_owned();
    dc.on_close(Box::new(move || {
        let tx = tx_close.clone();
        let label = label_close.clone();

        Box::pin(async move {
            let _ = tx.send(TransportEvent::DataChannelClosed { label }).await;
        })
    }));
}

fn codec_for(kind: TrackKind) -> RTCRtpCodecCapability {
    let mime_type = match kind {
        TrackKind::Audio => MIME_TYPE_OPUS,
        TrackKind::Video => MIME_TYPE_VP8,
    };
    RTCRtpCodecCapability {
        mime_type: mime_type.to_owned(),
        ..Default::default()
    }
}

fn to_rtc(desc: SessionDescription) -> Result<RTCSessionDescription, String> {
    let result = match desc.sdp_type {
        SdpType::Offer => RTCSessionDescription::offer(desc.sdp),
        SdpType::Answer => RTCSessionDescription::answer(desc.sdp),
        SdpType::Pranswer => RTCSessionDescription::pranswer(desc.sdp),
        SdpType::Rollback => return Err("rollback is not supported".to_owned()),
    };
    result.map_err(|e| e.to_string())
}

use crate::speaking::EnergyMeter;
use crate::transport::{
    ConnectionFactory, ConnectionId, ConnectionRequest, DecoderFactory, LinkState, LocalAudio,
    MediaConnection, TransportEvent,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use meshcall_core::utils::{DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2};
use meshcall_core::{IceCandidate, IceServerConfig, MemberId, SdpKind, SessionDescription};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::track::track_local::TrackLocal;

/// Builds webrtc-rs connections that all carry the same local audio track.
pub struct RtcConnectionFactory {
    local_audio: LocalAudio,
    decoder: Option<DecoderFactory>,
}

impl RtcConnectionFactory {
    pub fn new(local_audio: LocalAudio) -> Self {
        Self {
            local_audio,
            decoder: None,
        }
    }

    /// Decode remote audio so the speaking detector can analyse it.
    pub fn with_decoder(mut self, decoder: DecoderFactory) -> Self {
        self.decoder = Some(decoder);
        self
    }

    pub fn local_audio(&self) -> &LocalAudio {
        &self.local_audio
    }
}

#[async_trait]
impl ConnectionFactory for RtcConnectionFactory {
    async fn create(&self, request: ConnectionRequest) -> Result<Box<dyn MediaConnection>> {
        let connection =
            RtcConnection::new(request, self.local_audio.clone(), self.decoder.clone()).await?;
        Ok(Box::new(connection))
    }

    fn set_muted(&self, muted: bool) {
        self.local_audio.set_muted(muted);
    }

    fn local_meter(&self) -> Option<EnergyMeter> {
        Some(self.local_audio.meter())
    }
}

pub struct RtcConnection {
    pub peer_id: MemberId,
    pub connection_id: ConnectionId,
    pub peer_connection: Arc<RTCPeerConnection>,
    local_audio: LocalAudio,
    sender: Mutex<Option<Arc<RTCRtpSender>>>,
}

impl RtcConnection {
    /// Create the peer connection and hook its callbacks to `request.events`.
    pub async fn new(
        request: ConnectionRequest,
        local_audio: LocalAudio,
        decoder: Option<DecoderFactory>,
    ) -> Result<Self> {
        let ConnectionRequest {
            peer_id,
            connection_id,
            ice_servers,
            events,
        } = request;

        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: rtc_ice_servers(&ice_servers),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .context("Failed to create peer connection")?,
        );

        let state_tx = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();

                Box::pin(async move {
                    info!("Connection to peer {} is now {}", peer_id, s);
                    let _ = tx.send(TransportEvent::StateChanged {
                        peer_id,
                        connection_id,
                        state: link_state(s),
                    });
                })
            },
        ));

        let ice_tx = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let init = match candidate.to_json() {
                    Ok(init) => init,
                    Err(e) => {
                        warn!("Could not serialize local candidate for {}: {}", peer_id, e);
                        return;
                    }
                };
                let _ = tx.send(TransportEvent::CandidateGenerated {
                    peer_id,
                    connection_id,
                    candidate: IceCandidate {
                        candidate: init.candidate,
                        sdp_mid: init.sdp_mid,
                        sdp_m_line_index: init.sdp_mline_index,
                        username_fragment: init.username_fragment,
                    },
                });
            })
        }));

        let track_tx = events;
        peer_connection.on_track(Box::new(move |track, _receiver, _transceiver| {
            let tx = track_tx.clone();
            let decoder = decoder.clone();

            Box::pin(async move {
                if track.kind() != RTPCodecType::Audio {
                    debug!("Ignoring non-audio track from {}", peer_id);
                    return;
                }

                let mut decoder = decoder.as_ref().and_then(|make| match make() {
                    Ok(decoder) => Some(decoder),
                    Err(e) => {
                        warn!("No decoder for audio from {}: {:?}", peer_id, e);
                        None
                    }
                });
                let meter = decoder.as_ref().map(|_| EnergyMeter::new());
                let _ = tx.send(TransportEvent::RemoteTrack {
                    peer_id,
                    connection_id,
                    meter: meter.clone(),
                });

                tokio::spawn(async move {
                    while let Ok((packet, _)) = track.read_rtp().await {
                        let (Some(decoder), Some(meter)) = (decoder.as_mut(), meter.as_ref())
                        else {
                            continue;
                        };
                        match decoder.decode(&packet.payload) {
                            Ok(pcm) => meter.feed(&pcm),
                            Err(e) => debug!("Dropping undecodable frame from {}: {}", peer_id, e),
                        }
                    }
                    debug!("Remote audio from {} ended", peer_id);
                });
            })
        }));

        Ok(Self {
            peer_id,
            connection_id,
            peer_connection,
            local_audio,
            sender: Mutex::new(None),
        })
    }
}

#[async_trait]
impl MediaConnection for RtcConnection {
    async fn attach_local_audio(&self) -> Result<()> {
        let mut slot = self.sender.lock().await;
        if slot.is_some() {
            return Ok(());
        }

        let track = self.local_audio.track() as Arc<dyn TrackLocal + Send + Sync>;
        let sender = self
            .peer_connection
            .add_track(track)
            .await
            .context("Failed to attach local audio")?;

        // RTCP has to be read for the interceptors to run
        let rtcp_sender = Arc::clone(&sender);
        tokio::spawn(async move {
            let mut buf = vec![0u8; 1500];
            while rtcp_sender.read(&mut buf).await.is_ok() {}
        });

        *slot = Some(sender);
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        let desc = match desc.kind {
            SdpKind::Offer => RTCSessionDescription::offer(desc.sdp)?,
            SdpKind::Answer => RTCSessionDescription::answer(desc.sdp)?,
        };
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: candidate.username_fragment,
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .context("Failed to add ICE candidate")?;
        Ok(())
    }

    async fn release_local_tracks(&self) -> Result<()> {
        if let Some(sender) = self.sender.lock().await.take() {
            self.peer_connection.remove_track(&sender).await?;
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

fn link_state(s: RTCPeerConnectionState) -> LinkState {
    match s {
        RTCPeerConnectionState::Connecting => LinkState::Connecting,
        RTCPeerConnectionState::Connected => LinkState::Connected,
        RTCPeerConnectionState::Disconnected => LinkState::Disconnected,
        RTCPeerConnectionState::Failed => LinkState::Failed,
        RTCPeerConnectionState::Closed => LinkState::Closed,
        _ => LinkState::New,
    }
}

/// Server-provided ICE servers, or public STUN when none were given.
fn rtc_ice_servers(servers: &[IceServerConfig]) -> Vec<RTCIceServer> {
    if servers.is_empty() {
        return vec![RTCIceServer {
            urls: vec![DEFAULT_STUN_ADDR.to_owned(), DEFAULT_STUN_ADDR_2.to_owned()],
            ..Default::default()
        }];
    }

    servers
        .iter()
        .map(|s| RTCIceServer {
            urls: s.urls.clone(),
            username: s.username.clone().unwrap_or_default(),
            credential: s.credential.clone().unwrap_or_default(),
            ..Default::default()
        })
        .collect()
}

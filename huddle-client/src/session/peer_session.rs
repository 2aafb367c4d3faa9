use crate::error::TransportError;
use crate::media::{LocalTracks, MediaTrack, TrackKind};
use crate::session::negotiation_state::{NegotiationState, Role};
use crate::session::session_command::SessionCommand;
use crate::session::session_event::{SessionEvent, SessionEventKind};
use crate::transform::{TransformPipeline, TransformSettings};
use crate::transport::{
    DataChannel, PeerConnectionState, PeerTransport, TransportConfig, TransportEvent,
    TransportFactory,
};
use huddle_core::{Envelope, ParticipantId, SessionDescription};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Everything a session shares with the client that spawned it.
#[derive(Clone)]
pub struct SessionContext {
    pub local_id: ParticipantId,
    pub signaling: mpsc::UnboundedSender<Envelope>,
    pub events: mpsc::UnboundedSender<SessionEvent>,
    pub factory: Arc<dyn TransportFactory>,
    pub transport_config: TransportConfig,
    pub transforms: Arc<TransformSettings>,
    pub chat_label: String,
}

pub enum SessionStart {
    Initiate,
    Respond(SessionDescription),
}

/// The client's grip on a running session.
pub struct SessionHandle {
    generation: u64,
    role: Role,
    commands: mpsc::UnboundedSender<SessionCommand>,
    closing: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Queues a command. `false` if the session already finished.
    pub fn send(&self, command: SessionCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    /// Asks the session to close and waits until its transport is released.
    /// Interrupts a negotiation step that is still in flight.
    pub async fn close(self) {
        self.closing.send_replace(true);
        if let Err(e) = self.task.await {
            error!("Session task failed: {}", e);
        }
    }
}

/// Negotiation with one remote participant.
///
/// Runs as its own task. Commands from the client and events from the
/// transport are handled one at a time, so offer/answer/candidate steps for a
/// peer are strictly ordered. A close request wins over whatever step is
/// running; the transport is closed on every exit path. Outgoing candidates are only produced after the
/// local description went out, so they always trail the offer or answer.
pub struct PeerSession {
    peer_id: ParticipantId,
    generation: u64,
    state: NegotiationState,
    ctx: SessionContext,
    transport: Arc<dyn PeerTransport>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    command_rx: mpsc::UnboundedReceiver<SessionCommand>,
    data_channel: Option<Arc<dyn DataChannel>>,
}

impl PeerSession {
    pub fn spawn(
        peer_id: ParticipantId,
        generation: u64,
        start: SessionStart,
        tracks: LocalTracks,
        ctx: SessionContext,
    ) -> SessionHandle {
        let role = match start {
            SessionStart::Initiate => Role::Initiator,
            SessionStart::Respond(_) => Role::Responder,
        };
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (closing, closing_rx) = watch::channel(false);
        let task = tokio::spawn(Self::run(
            peer_id, generation, start, tracks, ctx, command_rx, closing_rx,
        ));

        SessionHandle {
            generation,
            role,
            commands,
            closing,
            task,
        }
    }

    async fn run(
        peer_id: ParticipantId,
        generation: u64,
        start: SessionStart,
        tracks: LocalTracks,
        ctx: SessionContext,
        command_rx: mpsc::UnboundedReceiver<SessionCommand>,
        mut closing: watch::Receiver<bool>,
    ) {
        let (transport_tx, transport_rx) = mpsc::channel(256);
        let created = tokio::select! {
            created = ctx.factory.create(&peer_id, &ctx.transport_config, transport_tx) => created,
            _ = closed(&mut closing) => {
                debug!("Session with {} closed before its transport existed", peer_id);
                return;
            }
        };
        let transport = match created {
            Ok(transport) => transport,
            Err(e) => {
                error!("Failed to create transport for {}: {}", peer_id, e);
                let _ = ctx.events.send(SessionEvent {
                    peer_id,
                    generation,
                    kind: SessionEventKind::Failed(e.to_string()),
                });
                return;
            }
        };

        let mut session = PeerSession {
            peer_id,
            generation,
            state: NegotiationState::Idle,
            ctx,
            transport,
            transport_rx,
            command_rx,
            data_channel: None,
        };

        let started = tokio::select! {
            result = session.start(start, &tracks) => Some(result),
            _ = closed(&mut closing) => None,
        };
        match started {
            Some(Ok(())) => session.event_loop(&mut closing).await,
            Some(Err(e)) => session.fail(e),
            None => info!("Negotiation with {} abandoned", session.peer_id),
        }
        session.shutdown().await;
    }

    async fn start(
        &mut self,
        start: SessionStart,
        tracks: &LocalTracks,
    ) -> Result<(), TransportError> {
        for track in tracks.iter() {
            let pipeline = self.pipeline_for(track);
            self.transport.add_track(track.clone(), pipeline).await?;
        }

        match start {
            SessionStart::Initiate => {
                let channel = self
                    .transport
                    .create_data_channel(&self.ctx.chat_label)
                    .await?;
                self.data_channel = Some(channel);

                let offer = self.transport.create_offer().await?;
                self.transport.set_local_description(offer.clone()).await?;
                self.signal(Envelope::offer(
                    self.peer_id.clone(),
                    self.ctx.local_id.clone(),
                    offer,
                ));
                self.set_state(NegotiationState::OfferSent);
            }
            SessionStart::Respond(offer) => {
                self.set_state(NegotiationState::OfferReceived);
                self.transport.set_remote_description(offer).await?;

                let answer = self.transport.create_answer().await?;
                self.transport.set_local_description(answer.clone()).await?;
                self.signal(Envelope::answer(
                    self.peer_id.clone(),
                    self.ctx.local_id.clone(),
                    answer,
                ));
                self.set_state(NegotiationState::Connecting);
            }
        }
        Ok(())
    }

    async fn event_loop(&mut self, closing: &mut watch::Receiver<bool>) {
        while !self.state.is_closed() {
            tokio::select! {
                _ = closed(closing) => break,

                cmd = self.command_rx.recv() => {
                    match cmd {
                        None => break,
                        Some(c) => {
                            if let Err(e) = self.handle_command(c).await {
                                self.fail(e);
                            }
                        }
                    }
                }

                evt = self.transport_rx.recv() => {
                    match evt {
                        Some(e) => self.handle_transport_event(e).await,
                        None => {
                            warn!("Transport channel for {} closed unexpectedly", self.peer_id);
                            break;
                        }
                    }
                }
            }
        }
    }

    async fn handle_command(&mut self, cmd: SessionCommand) -> Result<(), TransportError> {
        match cmd {
            SessionCommand::RemoteAnswer(answer) => {
                if !self.state.awaits_answer() {
                    warn!(
                        "Ignoring answer from {} in state {}",
                        self.peer_id, self.state
                    );
                    return Ok(());
                }
                self.transport.set_remote_description(answer).await?;
                self.set_state(NegotiationState::Connecting);
            }

            SessionCommand::RemoteCandidate(candidate) => {
                let Err(e) = self.transport.add_candidate(candidate).await else {
                    return Ok(());
                };
                warn!("Failed to add candidate from {}: {}", self.peer_id, e);
            }

            SessionCommand::ReplaceVideo { track, ack } => {
                let pipeline = self.pipeline_for(&track);
                if let Err(e) = self.transport.replace_track(track, pipeline).await {
                    warn!("Failed to replace video towards {}: {}", self.peer_id, e);
                }
                let _ = ack.send(());
            }
        }
        Ok(())
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::CandidateGenerated(candidate) => {
                self.signal(Envelope::candidate(
                    self.peer_id.clone(),
                    self.ctx.local_id.clone(),
                    candidate,
                ));
            }

            TransportEvent::TrackReceived { track_id, kind } => {
                debug!("Remote {} track {} from {}", kind, track_id, self.peer_id);
                self.emit(SessionEventKind::RemoteTrack { track_id, kind });
            }

            TransportEvent::DataChannelOpen(channel) => {
                if channel.label() != self.ctx.chat_label {
                    debug!(
                        "Ignoring data channel '{}' from {}",
                        channel.label(),
                        self.peer_id
                    );
                    return;
                }
                info!("Chat with {} open", self.peer_id);
                self.data_channel = Some(channel.clone());
                self.emit(SessionEventKind::ChatOpened(channel));
            }

            TransportEvent::DataChannelMessage { label, text } => {
                if label == self.ctx.chat_label {
                    self.emit(SessionEventKind::ChatMessage(text));
                }
            }

            TransportEvent::DataChannelClosed { label } => {
                debug!("Data channel '{}' to {} closed", label, self.peer_id);
                if label == self.ctx.chat_label {
                    self.emit(SessionEventKind::ChatClosed);
                }
            }

            TransportEvent::StateChanged(state) => match state {
                PeerConnectionState::Connected => self.set_state(NegotiationState::Connected),
                PeerConnectionState::Failed => {
                    warn!("Connection to {} failed", self.peer_id);
                    self.emit(SessionEventKind::Failed("connection failed".to_owned()));
                    self.set_state(NegotiationState::Closed);
                }
                PeerConnectionState::Closed => self.set_state(NegotiationState::Closed),
                PeerConnectionState::Disconnected => {
                    info!("Connection to {} interrupted, waiting for ICE", self.peer_id);
                }
                PeerConnectionState::New | PeerConnectionState::Connecting => {}
            },
        }
    }

    fn fail(&mut self, e: TransportError) {
        error!("Negotiation with {} failed: {}", self.peer_id, e);
        self.emit(SessionEventKind::Failed(e.to_string()));
        self.set_state(NegotiationState::Closed);
    }

    async fn shutdown(&mut self) {
        if let Some(channel) = self.data_channel.take()
            && let Err(e) = channel.close().await
        {
            debug!("Closing chat with {}: {}", self.peer_id, e);
        }
        if let Err(e) = self.transport.close().await {
            warn!("Failed to close transport to {}: {}", self.peer_id, e);
        }
        self.set_state(NegotiationState::Closed);
        info!("Session with {} finished", self.peer_id);
    }

    fn pipeline_for(&self, track: &Arc<MediaTrack>) -> Option<TransformPipeline> {
        if track.kind() != TrackKind::Video {
            return None;
        }
        let pipeline = TransformPipeline::install(&self.ctx.transforms);
        if let Some(p) = &pipeline {
            debug!("Installing {} on video towards {}", p.name(), self.peer_id);
        }
        pipeline
    }

    fn set_state(&mut self, state: NegotiationState) {
        if self.state == state || self.state.is_closed() {
            return;
        }
        info!("Session with {}: {} -> {}", self.peer_id, self.state, state);
        self.state = state;
        self.emit(SessionEventKind::StateChanged(state));
    }

    fn signal(&self, envelope: Envelope) {
        if self.ctx.signaling.send(envelope).is_err() {
            warn!("Signaling channel closed, dropping message to {}", self.peer_id);
        }
    }

    fn emit(&self, kind: SessionEventKind) {
        let _ = self.ctx.events.send(SessionEvent {
            peer_id: self.peer_id.clone(),
            generation: self.generation,
            kind,
        });
    }
}

/// Resolves once a close was requested or the handle is gone.
async fn closed(closing: &mut watch::Receiver<bool>) {
    let _ = closing.wait_for(|closing| *closing).await;
}

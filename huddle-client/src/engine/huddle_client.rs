use crate::config::ClientConfig;
use crate::engine::chat_channels::ChatChannels;
use crate::engine::client_command::{ClientCommand, PeerSummary, Reply};
use crate::engine::client_event::ClientEvent;
use crate::engine::client_handle::ClientHandle;
use crate::error::{CaptureError, ClientError};
use crate::media::{LocalTracks, MediaCapture, MediaTrack, TrackKind};
use crate::session::{
    NegotiationState, PeerSession, SessionCommand, SessionContext, SessionEvent,
    SessionEventKind, SessionHandle, SessionStart,
};
use crate::transform::{TransformSettings, TransformSnapshot};
use crate::transport::TransportFactory;
use futures::future::join_all;
use huddle_core::{Envelope, ParticipantId, RoomId, SessionDescription};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// One participant's side of a call.
///
/// Owns a [`PeerSession`] per remote participant and routes signaling to
/// them. Runs as a single task: envelopes from the relay, commands from the
/// [`ClientHandle`] and session events are handled one at a time. Nothing in
/// that loop waits on a peer or on a capture device: sessions close in the
/// background and captures report back as internal commands.
pub struct HuddleClient {
    capture: Arc<dyn MediaCapture>,
    ctx: SessionContext,
    sessions: HashMap<ParticipantId, SessionHandle>,
    peer_states: HashMap<ParticipantId, NegotiationState>,
    rendered: HashMap<ParticipantId, String>,
    next_generation: u64,
    room: Option<RoomId>,
    local: LocalTracks,
    screen: Option<Arc<MediaTrack>>,
    capturing: bool,
    chat: ChatChannels,
    command_tx: mpsc::UnboundedSender<ClientCommand>,
    command_rx: mpsc::UnboundedReceiver<ClientCommand>,
    session_rx: mpsc::UnboundedReceiver<SessionEvent>,
    events: mpsc::UnboundedSender<ClientEvent>,
}

impl HuddleClient {
    /// `signaling` carries envelopes to the relay.
    pub fn new(
        config: ClientConfig,
        capture: Arc<dyn MediaCapture>,
        factory: Arc<dyn TransportFactory>,
        signaling: mpsc::UnboundedSender<Envelope>,
    ) -> (Self, ClientHandle, mpsc::UnboundedReceiver<ClientEvent>) {
        let (session_tx, session_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (events, events_rx) = mpsc::unbounded_channel();

        let ctx = SessionContext {
            local_id: config.participant_id,
            signaling,
            events: session_tx,
            factory,
            transport_config: config.transport,
            transforms: Arc::new(TransformSettings::new(config.pixelation_level)),
            chat_label: config.chat_label,
        };

        let client = Self {
            capture,
            ctx,
            sessions: HashMap::new(),
            peer_states: HashMap::new(),
            rendered: HashMap::new(),
            next_generation: 0,
            room: None,
            local: LocalTracks::default(),
            screen: None,
            capturing: false,
            chat: ChatChannels::new(),
            command_tx: command_tx.clone(),
            command_rx,
            session_rx,
            events,
        };
        (client, ClientHandle::new(command_tx), events_rx)
    }

    pub fn local_id(&self) -> &ParticipantId {
        &self.ctx.local_id
    }

    pub fn transforms(&self) -> &Arc<TransformSettings> {
        &self.ctx.transforms
    }

    /// Runs until hangup or until `inbound` (envelopes from the relay) closes.
    pub async fn run(mut self, mut inbound: mpsc::UnboundedReceiver<Envelope>) {
        info!("Client {} started", self.ctx.local_id);

        loop {
            tokio::select! {
                envelope = inbound.recv() => {
                    match envelope {
                        Some(e) => self.handle_envelope(e),
                        None => {
                            info!("Signaling channel closed. Leaving.");
                            break;
                        }
                    }
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => {
                            if !self.handle_command(c).await {
                                return;
                            }
                        }
                        None => break,
                    }
                }

                Some(event) = self.session_rx.recv() => {
                    self.handle_session_event(event);
                }
            }
        }

        self.shutdown().await;
    }

    fn handle_envelope(&mut self, envelope: Envelope) {
        match envelope {
            Envelope::UserJoined(p) => self.on_user_joined(p.user_id),

            Envelope::Offer(p) => {
                if p.target_id != self.ctx.local_id {
                    warn!("Offer from {} addressed to {}, ignored", p.from, p.target_id);
                    return;
                }
                self.on_offer(p.from, p.offer);
            }

            Envelope::Answer(p) => {
                self.forward_to_session(&p.from, SessionCommand::RemoteAnswer(p.answer));
            }

            Envelope::Candidate(p) => {
                self.forward_to_session(&p.from, SessionCommand::RemoteCandidate(p.candidate));
            }

            Envelope::UserLeft(p) => {
                info!("User {} left", p.user_id);
                self.teardown(&p.user_id);
            }

            Envelope::Join(p) => debug!("Ignoring join for {} from relay", p.user_id),
        }
    }

    fn on_user_joined(&mut self, peer_id: ParticipantId) {
        if peer_id == self.ctx.local_id {
            return;
        }
        if self.room.is_none() {
            warn!("User {} joined before we did, ignored", peer_id);
            return;
        }
        if self.sessions.contains_key(&peer_id) {
            info!("User {} rejoined, replacing session", peer_id);
            self.teardown(&peer_id);
        }
        self.spawn_session(peer_id, SessionStart::Initiate);
    }

    fn on_offer(&mut self, from: ParticipantId, offer: SessionDescription) {
        if self.room.is_none() {
            warn!("Offer from {} before joining, ignored", from);
            return;
        }
        if self.sessions.contains_key(&from) {
            info!("New offer from {}, replacing session", from);
            self.teardown(&from);
        }
        self.spawn_session(from, SessionStart::Respond(offer));
    }

    fn forward_to_session(&self, from: &ParticipantId, command: SessionCommand) {
        let Some(handle) = self.sessions.get(from) else {
            let kind = match command {
                SessionCommand::RemoteAnswer(_) => "answer",
                SessionCommand::RemoteCandidate(_) => "candidate",
                _ => "command",
            };
            debug!("Dropping {} from {}: no session", kind, from);
            return;
        };
        if !handle.send(command) {
            debug!("Session with {} already finished", from);
        }
    }

    fn spawn_session(&mut self, peer_id: ParticipantId, start: SessionStart) {
        self.next_generation += 1;
        let handle = PeerSession::spawn(
            peer_id.clone(),
            self.next_generation,
            start,
            self.local.clone(),
            self.ctx.clone(),
        );
        info!("Session with {} started as {:?}", peer_id, handle.role());
        self.peer_states.insert(peer_id.clone(), NegotiationState::Idle);
        self.sessions.insert(peer_id, handle);
    }

    /// Forgets the session with `peer_id` and drops everything attached to
    /// it. The session releases its transport in the background; the returned
    /// task finishes once it has. `None` when there is no session.
    fn teardown(&mut self, peer_id: &ParticipantId) -> Option<JoinHandle<()>> {
        let Some(handle) = self.sessions.remove(peer_id) else {
            debug!("No session with {}, nothing to tear down", peer_id);
            return None;
        };
        let closing = tokio::spawn(handle.close());

        self.chat.remove(peer_id);
        if self.rendered.remove(peer_id).is_some() {
            self.emit(ClientEvent::RemoteMediaDetached {
                peer_id: peer_id.clone(),
            });
        }
        if self.peer_states.remove(peer_id) != Some(NegotiationState::Closed) {
            self.emit(ClientEvent::PeerState {
                peer_id: peer_id.clone(),
                state: NegotiationState::Closed,
            });
        }
        info!("Session with {} released", peer_id);
        Some(closing)
    }

    fn handle_session_event(&mut self, event: SessionEvent) {
        let SessionEvent {
            peer_id,
            generation,
            kind,
        } = event;
        let current = self
            .sessions
            .get(&peer_id)
            .is_some_and(|h| h.generation() == generation);
        if !current {
            debug!("Stale event from {} (generation {})", peer_id, generation);
            return;
        }

        match kind {
            SessionEventKind::StateChanged(state) => {
                self.peer_states.insert(peer_id.clone(), state);
                self.emit(ClientEvent::PeerState {
                    peer_id: peer_id.clone(),
                    state,
                });
                if state.is_closed() {
                    self.teardown(&peer_id);
                }
            }

            SessionEventKind::RemoteTrack { track_id, .. } => {
                if self.rendered.contains_key(&peer_id) {
                    return;
                }
                self.rendered.insert(peer_id.clone(), track_id.clone());
                self.emit(ClientEvent::RemoteMediaAttached { peer_id, track_id });
            }

            SessionEventKind::ChatOpened(channel) => {
                self.chat.register(peer_id.clone(), channel);
                self.emit(ClientEvent::ChatOpened { peer_id });
            }

            SessionEventKind::ChatMessage(text) => {
                self.emit(ClientEvent::Chat {
                    from: peer_id,
                    text,
                });
            }

            SessionEventKind::ChatClosed => {
                self.chat.remove(&peer_id);
            }

            SessionEventKind::Failed(reason) => {
                warn!("Session with {} failed: {}", peer_id, reason);
                self.teardown(&peer_id);
            }
        }
    }

    /// Returns `false` once the client has shut down.
    async fn handle_command(&mut self, cmd: ClientCommand) -> bool {
        match cmd {
            ClientCommand::Join { room_id, reply } => self.join(room_id, reply),

            ClientCommand::JoinMedia {
                room_id,
                tracks,
                reply,
            } => {
                self.capturing = false;
                let _ = reply.send(self.enter_room(room_id, tracks));
            }

            ClientCommand::SendChat { text, reply } => {
                let delivered = self.chat.broadcast(&text).await;
                debug!("Chat delivered to {} peers", delivered);
                let _ = reply.send(Ok(delivered));
            }

            ClientCommand::ToggleMic { reply } => {
                let _ = reply.send(self.toggle_enabled(TrackKind::Audio));
            }

            ClientCommand::ToggleCamera { reply } => {
                let _ = reply.send(self.toggle_enabled(TrackKind::Video));
            }

            ClientCommand::ToggleScreenShare { reply } => self.toggle_screen_share(reply),

            ClientCommand::DisplayMedia { track, reply } => {
                self.capturing = false;
                let _ = reply.send(self.start_screen_share(track));
            }

            ClientCommand::CameraMedia { track, reply } => {
                self.capturing = false;
                let restored = self.restore_camera(track);
                match reply {
                    Some(reply) => {
                        let _ = reply.send(restored.map(|()| false));
                    }
                    None => {
                        if let Err(e) = restored {
                            warn!("Failed to restore camera: {}", e);
                        }
                    }
                }
            }

            ClientCommand::TogglePixelation { reply } => {
                self.ctx.transforms.toggle_pixelation();
                let _ = reply.send(Ok(self.reapply_transforms()));
            }

            ClientCommand::ToggleGlitch { reply } => {
                self.ctx.transforms.toggle_glitch();
                let _ = reply.send(Ok(self.reapply_transforms()));
            }

            ClientCommand::SetPixelationLevel { level, reply } => {
                let level = self.ctx.transforms.set_pixelation_level(level);
                self.emit(ClientEvent::TransformChanged(self.ctx.transforms.snapshot()));
                let _ = reply.send(Ok(level));
            }

            ClientCommand::Peers { reply } => {
                let _ = reply.send(Ok(self.peers()));
            }

            ClientCommand::ScreenShareEnded { track_id } => {
                let current = self.screen.as_ref().is_some_and(|s| s.id() == track_id);
                if !current {
                    return true;
                }
                if self.capturing {
                    debug!("Screen share {} ended while video is switching", track_id);
                } else {
                    info!("Screen share {} ended, back to camera", track_id);
                    self.capture_camera(None);
                }
            }

            ClientCommand::Hangup { reply } => {
                self.shutdown().await;
                let _ = reply.send(Ok(()));
                return false;
            }
        }
        true
    }

    /// Acquires camera and microphone off the loop; the room is entered once
    /// they arrive as [`ClientCommand::JoinMedia`].
    fn join(&mut self, room_id: RoomId, reply: Reply<()>) {
        if let Some(room) = &self.room {
            let _ = reply.send(Err(ClientError::AlreadyJoined(room.clone())));
            return;
        }
        if self.capturing {
            let _ = reply.send(Err(ClientError::CaptureBusy));
            return;
        }

        let capture = self.capture.clone();
        self.spawn_capture(async move {
            let tracks = capture.acquire(true, true).await;
            ClientCommand::JoinMedia {
                room_id,
                tracks,
                reply,
            }
        });
    }

    fn enter_room(
        &mut self,
        room_id: RoomId,
        tracks: Result<LocalTracks, CaptureError>,
    ) -> Result<(), ClientError> {
        let tracks = tracks?;
        let envelope = Envelope::join(room_id.clone(), self.ctx.local_id.clone());
        if self.ctx.signaling.send(envelope).is_err() {
            tracks.stop_all();
            return Err(ClientError::SignalingClosed);
        }

        self.local = tracks;
        self.emit(ClientEvent::LocalPreview {
            track_id: self.local.video.as_ref().map(|t| t.id().to_owned()),
            screen_share: false,
        });
        info!("Joined room {} as {}", room_id, self.ctx.local_id);
        self.room = Some(room_id.clone());
        self.emit(ClientEvent::Joined { room_id });
        Ok(())
    }

    fn toggle_enabled(&self, kind: TrackKind) -> Result<bool, ClientError> {
        let track = match kind {
            TrackKind::Audio => self.local.audio.as_ref(),
            TrackKind::Video => self.local.video.as_ref(),
        }
        .ok_or(ClientError::NoLocalTrack(kind))?;

        let enabled = track.toggle_enabled();
        info!("Local {} {}", kind, if enabled { "on" } else { "off" });
        Ok(enabled)
    }

    fn toggle_screen_share(&mut self, reply: Reply<bool>) {
        if self.capturing {
            let _ = reply.send(Err(ClientError::CaptureBusy));
            return;
        }
        if self.screen.is_some() {
            self.capture_camera(Some(reply));
            return;
        }

        let capture = self.capture.clone();
        self.spawn_capture(async move {
            let track = capture.acquire_display().await;
            ClientCommand::DisplayMedia { track, reply }
        });
    }

    fn start_screen_share(
        &mut self,
        track: Result<Arc<MediaTrack>, CaptureError>,
    ) -> Result<bool, ClientError> {
        let screen = track?;
        self.watch_screen_end(&screen);
        self.screen = Some(screen.clone());
        self.replace_video(screen);
        Ok(true)
    }

    fn capture_camera(&mut self, reply: Option<Reply<bool>>) {
        let capture = self.capture.clone();
        self.spawn_capture(async move {
            let track = match capture.acquire(true, false).await {
                Ok(tracks) => tracks.video.ok_or(CaptureError::NoDevice(TrackKind::Video)),
                Err(e) => Err(e),
            };
            ClientCommand::CameraMedia { track, reply }
        });
    }

    fn restore_camera(
        &mut self,
        track: Result<Arc<MediaTrack>, CaptureError>,
    ) -> Result<(), ClientError> {
        let camera = track?;
        self.screen = None;
        self.replace_video(camera);
        Ok(())
    }

    /// Runs a capture on its own task and feeds the resulting command back
    /// into the loop. One capture at a time.
    fn spawn_capture<F>(&mut self, capture: F)
    where
        F: Future<Output = ClientCommand> + Send + 'static,
    {
        self.capturing = true;
        let commands = self.command_tx.clone();
        tokio::spawn(async move {
            if let Err(mpsc::error::SendError(unclaimed)) = commands.send(capture.await) {
                release_unclaimed(unclaimed);
            }
        });
    }

    fn watch_screen_end(&self, screen: &Arc<MediaTrack>) {
        let screen = screen.clone();
        let commands = self.command_tx.clone();
        tokio::spawn(async move {
            screen.ended().await;
            let _ = commands.send(ClientCommand::ScreenShareEnded {
                track_id: screen.id().to_owned(),
            });
        });
    }

    /// Makes `track` the outgoing video of every session and of sessions
    /// created from now on. The previous track is released once every
    /// session has switched.
    fn replace_video(&mut self, track: Arc<MediaTrack>) {
        let previous = self.local.video.replace(track.clone());
        let acks: Vec<oneshot::Receiver<()>> = self
            .sessions
            .values()
            .filter_map(|handle| {
                let (ack, done) = oneshot::channel();
                handle
                    .send(SessionCommand::ReplaceVideo {
                        track: track.clone(),
                        ack,
                    })
                    .then_some(done)
            })
            .collect();

        self.emit(ClientEvent::LocalPreview {
            track_id: Some(track.id().to_owned()),
            screen_share: self.screen.is_some(),
        });

        let Some(previous) = previous.filter(|p| p.id() != track.id()) else {
            return;
        };
        tokio::spawn(async move {
            for done in acks {
                let _ = done.await;
            }
            debug!("Releasing replaced track {}", previous.id());
            previous.stop();
        });
    }

    /// Reinstalls pipelines on the current video after a switch changed.
    fn reapply_transforms(&mut self) -> TransformSnapshot {
        let snapshot = self.ctx.transforms.snapshot();
        info!(
            "Transforms: pixelation={} glitch={}",
            snapshot.pixelation, snapshot.glitch
        );
        if let Some(video) = self.local.video.clone() {
            self.replace_video(video);
        }
        self.emit(ClientEvent::TransformChanged(snapshot));
        snapshot
    }

    fn peers(&self) -> Vec<PeerSummary> {
        let mut peers: Vec<PeerSummary> = self
            .sessions
            .iter()
            .map(|(peer_id, handle)| PeerSummary {
                peer_id: peer_id.clone(),
                role: handle.role(),
                state: self
                    .peer_states
                    .get(peer_id)
                    .copied()
                    .unwrap_or(NegotiationState::Idle),
                chat_open: self.chat.contains(peer_id),
            })
            .collect();
        peers.sort_by(|a, b| a.peer_id.cmp(&b.peer_id));
        peers
    }

    async fn shutdown(&mut self) {
        let peers: Vec<ParticipantId> = self.sessions.keys().cloned().collect();
        let closing: Vec<JoinHandle<()>> = peers
            .iter()
            .filter_map(|peer_id| self.teardown(peer_id))
            .collect();
        for result in join_all(closing).await {
            if let Err(e) = result {
                error!("Session close task failed: {}", e);
            }
        }
        self.local.stop_all();
        if let Some(screen) = self.screen.take() {
            screen.stop();
        }
        if let Some(room) = self.room.take() {
            info!("Left room {}", room);
            self.emit(ClientEvent::Left);
        }
    }

    fn emit(&self, event: ClientEvent) {
        let _ = self.events.send(event);
    }
}

/// Stops media that was captured for a client that is no longer running.
fn release_unclaimed(command: ClientCommand) {
    match command {
        ClientCommand::JoinMedia {
            tracks: Ok(tracks), ..
        } => tracks.stop_all(),
        ClientCommand::DisplayMedia {
            track: Ok(track), ..
        }
        | ClientCommand::CameraMedia {
            track: Ok(track), ..
        } => track.stop(),
        _ => {}
    }
}

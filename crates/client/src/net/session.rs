use rink::{
    ClientMessage, ControlAction, GameConfig, InputPayload, PaddleInput, ProtocolError, Role,
    Scores, ServerMessage, Side, Snapshot, normalize_room_code,
};

use super::clock::ClockSync;
use super::config::ClientConfig;
use super::input::InputPacer;
use super::interpolation::InterpolationBuffer;
use super::prediction::{PaddlePredictor, PendingInput};

/// Something a renderer, sound layer or bot may want to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Joined { role: Role, side: Side, room: String },
    RoomFull,
    GuestJoined,
    GuestLeft,
    HostLeft,
    GuestInput,
    RoomExpired { reason: String },
    Latency { rtt_ms: f64 },
    WallHit,
    PaddleHit,
    Goal,
    ScoreChanged(Scores),
    StatusChanged(String),
}

/// Client half of a room session, free of any I/O.
///
/// Feed it server messages and local input; it answers with messages to
/// send and a frame to draw.
pub struct ClientSession {
    config: ClientConfig,
    room: Option<String>,
    role: Option<Role>,
    seq: u32,
    predictor: PaddlePredictor,
    buffer: InterpolationBuffer,
    clock: ClockSync,
    pacer: InputPacer,
    running: bool,
    scores: Scores,
    status: String,
}

impl ClientSession {
    pub fn new(game: &GameConfig, config: ClientConfig, now: f64) -> Self {
        Self {
            predictor: PaddlePredictor::new(game, &config, Side::Left),
            buffer: InterpolationBuffer::new(config.snapshot_capacity),
            clock: ClockSync::new(config.clock_smoothing),
            pacer: InputPacer::new(config.keepalive_ms, now),
            config,
            room: None,
            role: None,
            seq: 0,
            running: false,
            scores: Scores::default(),
            status: String::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn room(&self) -> Option<&str> {
        self.room.as_deref()
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn side(&self) -> Option<Side> {
        self.role.map(Role::side)
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn scores(&self) -> Scores {
        self.scores
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn clock(&self) -> &ClockSync {
        &self.clock
    }

    pub fn predictor(&self) -> &PaddlePredictor {
        &self.predictor
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Validates `code` and remembers it as the room to play in.
    pub fn join(&mut self, code: &str) -> Result<ClientMessage, ProtocolError> {
        let room = normalize_room_code(code)?;
        self.room = Some(room.clone());
        Ok(ClientMessage::Join { room })
    }

    /// Message to re-send after reconnecting, if a room was chosen.
    pub fn rejoin(&self) -> Option<ClientMessage> {
        self.room.clone().map(|room| ClientMessage::Join { room })
    }

    pub fn ping(&self, now: f64) -> ClientMessage {
        ClientMessage::Ping { at: now }
    }

    /// Only the host controls the match.
    pub fn control(&self, action: ControlAction) -> Option<ClientMessage> {
        match (self.role, &self.room) {
            (Some(Role::Host), Some(room)) => Some(ClientMessage::Control {
                room: room.clone(),
                action,
            }),
            _ => None,
        }
    }

    pub fn set_input(&mut self, input: PaddleInput) {
        self.pacer.set(input);
    }

    /// Next `input` message when one is due. Sending also queues the input
    /// for replay and moves the local paddle while the match runs.
    pub fn poll_input(&mut self, now: f64) -> Option<ClientMessage> {
        self.role?;
        let room = self.room.clone()?;
        let (input, dt_ms) = self.pacer.poll(now)?;

        self.seq += 1;
        let entry = PendingInput {
            seq: self.seq,
            input,
            dt_ms,
        };
        self.predictor.record(entry, self.running);

        Some(ClientMessage::Input {
            room,
            payload: InputPayload {
                input,
                seq: self.seq,
                dt_ms,
            },
        })
    }

    pub fn handle(&mut self, message: ServerMessage, now: f64) -> Vec<SessionEvent> {
        match message {
            ServerMessage::Pong { at, server_time } => {
                self.clock.on_pong(at, server_time, now);
                self.clock
                    .rtt_ms()
                    .map(|rtt_ms| vec![SessionEvent::Latency { rtt_ms }])
                    .unwrap_or_default()
            }
            ServerMessage::Role { role, side, room } => {
                self.role = Some(role);
                self.room = Some(room.clone());
                self.seq = 0;
                self.predictor.reset(side);
                self.pacer.reset(now);
                vec![SessionEvent::Joined { role, side, room }]
            }
            ServerMessage::Full => vec![SessionEvent::RoomFull],
            ServerMessage::GuestJoined => vec![SessionEvent::GuestJoined],
            ServerMessage::GuestLeft => vec![SessionEvent::GuestLeft],
            ServerMessage::GuestInput => vec![SessionEvent::GuestInput],
            ServerMessage::HostLeft => {
                self.leave_room();
                vec![SessionEvent::HostLeft]
            }
            ServerMessage::RoomExpired { reason } => {
                self.leave_room();
                vec![SessionEvent::RoomExpired { reason }]
            }
            ServerMessage::State { payload } => self.apply_state(payload, now),
            ServerMessage::Unknown => Vec::new(),
        }
    }

    fn leave_room(&mut self) {
        self.role = None;
        self.room = None;
        self.running = false;
        self.buffer.clear();
    }

    fn apply_state(&mut self, snapshot: Snapshot, now: f64) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if snapshot.events.wall {
            events.push(SessionEvent::WallHit);
        }
        if snapshot.events.paddle {
            events.push(SessionEvent::PaddleHit);
        }
        if snapshot.events.goal {
            events.push(SessionEvent::Goal);
        }
        if snapshot.scores != self.scores {
            self.scores = snapshot.scores;
            events.push(SessionEvent::ScoreChanged(snapshot.scores));
        }
        if snapshot.status != self.status {
            self.status = snapshot.status.clone();
            events.push(SessionEvent::StatusChanged(snapshot.status.clone()));
        }
        self.running = snapshot.running;

        self.clock.on_snapshot(snapshot.time, now);
        if self.role.is_some() {
            self.predictor.reconcile(&snapshot);
        }
        self.buffer.push(snapshot);
        events
    }

    /// State to draw at local time `now`: remote bodies from the delayed
    /// buffer, this client's paddle from its prediction while running.
    pub fn frame(&mut self, now: f64) -> Option<Snapshot> {
        let render_time = self.clock.render_time(now, self.config.base_buffer_ms);
        let mut sampled = self.buffer.sample(render_time)?;

        let Some(side) = self.side() else {
            return Some(sampled);
        };
        let sampled_own = sampled.paddle(side).position();

        if sampled.running {
            let own = match self.predictor.position() {
                Some(position) => position,
                None => {
                    self.predictor.snap_to(sampled_own);
                    sampled_own
                }
            };
            let paddle = sampled.paddle_mut(side);
            paddle.x = own.x;
            paddle.y = own.y;
        } else {
            self.predictor.snap_to(sampled_own);
        }
        Some(sampled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UP: PaddleInput = PaddleInput {
        up: true,
        down: false,
        left: false,
        right: false,
    };

    fn session() -> ClientSession {
        ClientSession::new(&GameConfig::default(), ClientConfig::default(), 0.0)
    }

    fn role(session: &mut ClientSession, role: Role, now: f64) {
        session.handle(
            ServerMessage::Role {
                role,
                side: role.side(),
                room: "ABCD".to_string(),
            },
            now,
        );
    }

    fn state(time: u64, running: bool, right_y: f32, ack_right: u32) -> ServerMessage {
        let mut payload = Snapshot {
            time,
            running,
            status: "Game on!".to_string(),
            ..Snapshot::default()
        };
        payload.left.x = 140.0;
        payload.left.y = 260.0;
        payload.right.x = 760.0;
        payload.right.y = right_y;
        payload.acks.right = ack_right;
        ServerMessage::State { payload }
    }

    #[test]
    fn join_normalizes_the_code() {
        let mut session = session();
        assert_eq!(
            session.join(" abcd ").unwrap(),
            ClientMessage::Join {
                room: "ABCD".to_string()
            }
        );
        assert_eq!(session.room(), Some("ABCD"));
        assert!(session.join("a").is_err());
    }

    #[test]
    fn no_input_is_sent_before_a_role() {
        let mut session = session();
        session.join("ABCD").unwrap();
        session.set_input(UP);
        assert!(session.poll_input(10.0).is_none());
    }

    #[test]
    fn role_resets_sequence_and_prediction() {
        let mut session = session();
        role(&mut session, Role::Guest, 0.0);
        session.set_input(UP);
        let first = session.poll_input(20.0);
        assert!(matches!(
            first,
            Some(ClientMessage::Input { ref payload, .. }) if payload.seq == 1
        ));

        role(&mut session, Role::Guest, 30.0);
        assert_eq!(session.predictor().pending_len(), 0);
        session.set_input(UP);
        let again = session.poll_input(40.0);
        assert!(matches!(
            again,
            Some(ClientMessage::Input { ref payload, .. }) if payload.seq == 1
        ));
    }

    #[test]
    fn only_host_may_control() {
        let mut guest = session();
        role(&mut guest, Role::Guest, 0.0);
        assert!(guest.control(ControlAction::Toggle).is_none());

        let mut host = session();
        role(&mut host, Role::Host, 0.0);
        assert_eq!(
            host.control(ControlAction::Reset),
            Some(ClientMessage::Control {
                room: "ABCD".to_string(),
                action: ControlAction::Reset,
            })
        );
    }

    #[test]
    fn state_reports_events_and_changes() {
        let mut session = session();
        let mut message = state(1_000, true, 260.0, 0);
        if let ServerMessage::State { payload } = &mut message {
            payload.events.wall = true;
            payload.events.goal = true;
            payload.scores.right = 1;
        }

        let events = session.handle(message, 0.0);
        assert!(events.contains(&SessionEvent::WallHit));
        assert!(events.contains(&SessionEvent::Goal));
        assert!(!events.contains(&SessionEvent::PaddleHit));
        assert!(events.contains(&SessionEvent::ScoreChanged(Scores { left: 0, right: 1 })));
        assert!(events.contains(&SessionEvent::StatusChanged("Game on!".to_string())));

        // unchanged score and status are not repeated
        let mut message = state(1_033, true, 260.0, 0);
        if let ServerMessage::State { payload } = &mut message {
            payload.scores.right = 1;
        }
        let events = session.handle(message, 33.0);
        assert!(events.is_empty());
    }

    #[test]
    fn running_prediction_overrides_own_paddle_only() {
        let mut session = session();
        role(&mut session, Role::Guest, 0.0);
        session.handle(state(1_000, true, 260.0, 0), 1_000.0);
        session.handle(state(1_033, true, 260.0, 0), 1_033.0);

        // first frame seeds the prediction from the sampled paddle
        let frame = session.frame(1_200.0).unwrap();
        assert_eq!(frame.right.y, 260.0);

        session.set_input(UP);
        session.poll_input(1_210.0).unwrap();
        let frame = session.frame(1_220.0).unwrap();
        assert!(frame.right.y < 260.0);
        assert_eq!(frame.left.y, 260.0);
    }

    #[test]
    fn acknowledged_snapshot_rebases_prediction() {
        let mut session = session();
        role(&mut session, Role::Guest, 0.0);
        session.handle(state(1_000, true, 260.0, 0), 1_000.0);
        session.frame(1_200.0);

        session.set_input(UP);
        session.poll_input(1_216.0).unwrap();
        session.set_input(PaddleInput::NEUTRAL);
        session.poll_input(1_232.0).unwrap();
        assert_eq!(session.predictor().pending_len(), 2);

        session.handle(state(1_050, true, 250.0, 1), 1_250.0);
        assert_eq!(session.predictor().last_ack(), 1);
        assert_eq!(session.predictor().pending_len(), 1);
        assert_eq!(session.predictor().position().map(|p| p.y), Some(250.0));
    }

    #[test]
    fn paused_match_snaps_to_authority() {
        let mut session = session();
        role(&mut session, Role::Host, 0.0);
        let mut message = state(1_000, false, 260.0, 0);
        if let ServerMessage::State { payload } = &mut message {
            payload.left.y = 300.0;
        }
        session.handle(message, 1_000.0);

        let frame = session.frame(1_200.0).unwrap();
        assert_eq!(frame.left.y, 300.0);
        assert_eq!(session.predictor().position().map(|p| p.y), Some(300.0));
    }

    #[test]
    fn host_left_ends_the_session() {
        let mut session = session();
        role(&mut session, Role::Guest, 0.0);
        assert_eq!(
            session.handle(ServerMessage::HostLeft, 0.0),
            vec![SessionEvent::HostLeft]
        );
        assert!(session.role().is_none());
        session.set_input(UP);
        assert!(session.poll_input(500.0).is_none());
    }

    #[test]
    fn unknown_messages_are_ignored() {
        let mut session = session();
        assert!(session.handle(ServerMessage::Unknown, 0.0).is_empty());
    }
}

use std::collections::HashMap;

use glam::Vec2;
use rink::{ClientMessage, ControlAction, InputPayload, Role, ServerMessage, Side, StagedControl};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::channel::SharedChannel;
use crate::config::ServerConfig;
use crate::events::{ConnId, RoomEvent, unix_millis};
use crate::room::{RoomCommand, RoomTask};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    #[error("room {room} is full")]
    Full { room: String },
    #[error("connection {0} is not registered")]
    UnknownConnection(ConnId),
}

struct Member {
    conn_id: ConnId,
    channel: SharedChannel,
}

struct RoomHandle {
    id: u64,
    host: Member,
    guest: Option<Member>,
    staged: [watch::Sender<StagedControl>; 2],
    commands: mpsc::UnboundedSender<RoomCommand>,
    task: JoinHandle<()>,
}

impl RoomHandle {
    fn staged(&self, side: Side) -> &watch::Sender<StagedControl> {
        match side {
            Side::Left => &self.staged[0],
            Side::Right => &self.staged[1],
        }
    }

    /// The room task has stopped taking commands and is on its way out.
    fn is_closed(&self) -> bool {
        self.commands.is_closed() || self.task.is_finished()
    }

    fn teardown(self) {
        self.task.abort();
        if let Some(guest) = self.guest {
            guest.channel.close();
        }
    }
}

/// Owns every room and knows which connection plays where.
///
/// Driven from a single task; room simulations run in their own tasks and
/// only see staged controls and [`RoomCommand`]s.
pub struct SessionRegistry {
    config: ServerConfig,
    connections: HashMap<ConnId, SharedChannel>,
    rooms: HashMap<String, RoomHandle>,
    memberships: HashMap<ConnId, (String, Role)>,
    room_events: mpsc::UnboundedSender<RoomEvent>,
    next_room_id: u64,
}

impl SessionRegistry {
    pub fn new(config: ServerConfig) -> (Self, mpsc::UnboundedReceiver<RoomEvent>) {
        let (room_events, rx) = mpsc::unbounded_channel();
        let registry = Self {
            config,
            connections: HashMap::new(),
            rooms: HashMap::new(),
            memberships: HashMap::new(),
            room_events,
            next_room_id: 1,
        };
        (registry, rx)
    }

    pub fn connect(&mut self, conn_id: ConnId, channel: SharedChannel) {
        self.connections.insert(conn_id, channel);
    }

    pub fn disconnect(&mut self, conn_id: ConnId) {
        self.leave(conn_id);
        self.connections.remove(&conn_id);
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn membership(&self, conn_id: ConnId) -> Option<(&str, Role)> {
        self.memberships
            .get(&conn_id)
            .map(|(code, role)| (code.as_str(), *role))
    }

    /// Routes one validated client message.
    pub fn dispatch(&mut self, conn_id: ConnId, message: ClientMessage) {
        match message {
            ClientMessage::Ping { at } => {
                if let Some(channel) = self.connections.get(&conn_id) {
                    channel.send(ServerMessage::Pong {
                        at,
                        server_time: unix_millis(),
                    });
                }
            }
            ClientMessage::Join { room } => {
                if let Err(err) = self.join(&room, conn_id) {
                    log::info!("conn {conn_id} join rejected: {err}");
                }
            }
            ClientMessage::Input { room, payload } => self.stage_input(conn_id, &room, payload),
            ClientMessage::Control { room, action } => self.control(conn_id, &room, action),
            ClientMessage::Move { x, y } => {
                let target = match (x, y) {
                    (Some(x), Some(y)) => Some(Vec2::new(x as f32, y as f32)),
                    _ => None,
                };
                self.stage_target(conn_id, target);
            }
        }
    }

    /// Places `conn_id` in room `code`, creating the room when needed. The
    /// joiner is told its role; a host learns about an arriving guest.
    pub fn join(&mut self, code: &str, conn_id: ConnId) -> Result<Role, JoinError> {
        let channel = self
            .connections
            .get(&conn_id)
            .cloned()
            .ok_or(JoinError::UnknownConnection(conn_id))?;

        self.prune_closed(code);

        if let Some((current, role)) = self.memberships.get(&conn_id).cloned() {
            if current == code {
                channel.send(role_message(role, code));
                return Ok(role);
            }
            self.leave(conn_id);
        }

        let Some(room) = self.rooms.get_mut(code) else {
            self.create_room(code, conn_id, channel);
            return Ok(Role::Host);
        };

        if room.guest.is_some() {
            channel.send(ServerMessage::Full);
            return Err(JoinError::Full {
                room: code.to_string(),
            });
        }

        room.staged(Side::Right).send_replace(StagedControl::default());
        let attach = RoomCommand::Attach {
            side: Side::Right,
            channel: channel.clone(),
        };
        if room.commands.send(attach).is_err() {
            let room_id = room.id;
            log::info!("room {code} ended before conn {conn_id} joined, reopening");
            self.room_closed(code, room_id);
            self.create_room(code, conn_id, channel);
            return Ok(Role::Host);
        }
        channel.send(role_message(Role::Guest, code));
        room.host.channel.send(ServerMessage::GuestJoined);
        room.guest = Some(Member { conn_id, channel });
        self.memberships.insert(conn_id, (code.to_string(), Role::Guest));
        log::info!("room {code}: guest joined (conn {conn_id})");
        Ok(Role::Guest)
    }

    /// Forgets `code` if its task already ended but the expiry has not been
    /// handled yet.
    fn prune_closed(&mut self, code: &str) {
        let Some(room_id) = self
            .rooms
            .get(code)
            .filter(|room| room.is_closed())
            .map(|room| room.id)
        else {
            return;
        };
        log::debug!("room {code} already ended, dropping it");
        self.room_closed(code, room_id);
    }

    fn create_room(&mut self, code: &str, conn_id: ConnId, channel: SharedChannel) {
        let id = self.next_room_id;
        self.next_room_id += 1;

        channel.send(role_message(Role::Host, code));

        let (left_tx, left_rx) = watch::channel(StagedControl::default());
        let (right_tx, right_rx) = watch::channel(StagedControl::default());
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let task = RoomTask::spawn(
            code.to_string(),
            id,
            &self.config,
            channel.clone(),
            [left_rx, right_rx],
            commands_rx,
            self.room_events.clone(),
        );

        self.rooms.insert(
            code.to_string(),
            RoomHandle {
                id,
                host: Member { conn_id, channel },
                guest: None,
                staged: [left_tx, right_tx],
                commands,
                task,
            },
        );
        self.memberships.insert(conn_id, (code.to_string(), Role::Host));
        log::info!(
            "room {code} created by conn {conn_id} ({} rooms)",
            self.rooms.len()
        );
    }

    /// Removes `conn_id` from its room. A departing host ends the room; a
    /// departing guest frees the right side.
    pub fn leave(&mut self, conn_id: ConnId) {
        let Some((code, role)) = self.memberships.remove(&conn_id) else {
            return;
        };

        match role {
            Role::Host => {
                let Some(room) = self.rooms.remove(&code) else {
                    return;
                };
                if let Some(guest) = &room.guest {
                    guest.channel.send(ServerMessage::HostLeft);
                    self.memberships.remove(&guest.conn_id);
                }
                room.teardown();
                log::info!("room {code}: host left, room closed");
            }
            Role::Guest => {
                let Some(room) = self.rooms.get_mut(&code) else {
                    return;
                };
                room.guest = None;
                room.staged(Side::Right).send_replace(StagedControl::default());
                if room.commands.send(RoomCommand::Detach { side: Side::Right }).is_err() {
                    let room_id = room.id;
                    self.room_closed(&code, room_id);
                    return;
                }
                room.host.channel.send(ServerMessage::GuestLeft);
                log::info!("room {code}: guest left (conn {conn_id})");
            }
        }
    }

    fn member_side(&self, conn_id: ConnId, room: &str) -> Option<(Role, &RoomHandle)> {
        let (code, role) = self.memberships.get(&conn_id)?;
        if code != room {
            log::debug!("conn {conn_id} addressed room {room} but is in {code}");
            return None;
        }
        self.rooms.get(code).map(|handle| (*role, handle))
    }

    /// Stages the latest directional input for the sender's side.
    pub fn stage_input(&mut self, conn_id: ConnId, room: &str, payload: InputPayload) {
        let Some((role, handle)) = self.member_side(conn_id, room) else {
            return;
        };
        handle
            .staged(role.side())
            .send_modify(|staged| *staged = staged.with_input(payload.input, payload.seq));
        if role == Role::Guest {
            handle.host.channel.send(ServerMessage::GuestInput);
        }
    }

    /// Stages an absolute paddle target, or clears it with `None`.
    pub fn stage_target(&mut self, conn_id: ConnId, target: Option<Vec2>) {
        let Some((code, role)) = self.memberships.get(&conn_id) else {
            return;
        };
        if let Some(handle) = self.rooms.get(code) {
            handle
                .staged(role.side())
                .send_modify(|staged| *staged = staged.with_target(target));
        }
    }

    /// Forwards a match control. Only the host may toggle or reset.
    pub fn control(&mut self, conn_id: ConnId, room: &str, action: ControlAction) {
        let Some((role, handle)) = self.member_side(conn_id, room) else {
            return;
        };
        if role != Role::Host {
            log::debug!("conn {conn_id} is not host of {room}, ignoring {action:?}");
            return;
        }
        if handle.commands.send(RoomCommand::Control(action)).is_err() {
            log::debug!("room {room} already ended, dropping {action:?}");
        }
    }

    /// Forgets a room whose task ended on its own. Stale ids for a code that
    /// has since been reused are ignored.
    pub fn room_closed(&mut self, code: &str, room_id: u64) {
        let matches = self.rooms.get(code).is_some_and(|room| room.id == room_id);
        if !matches {
            return;
        }
        if let Some(room) = self.rooms.remove(code) {
            self.memberships.remove(&room.host.conn_id);
            if let Some(guest) = &room.guest {
                self.memberships.remove(&guest.conn_id);
            }
            room.teardown();
        }
    }

    pub fn handle_room_event(&mut self, event: RoomEvent) {
        match event {
            RoomEvent::Expired {
                code,
                room_id,
                reason,
            } => {
                log::info!("room {code} removed after expiry ({reason})");
                self.room_closed(&code, room_id);
            }
        }
    }

    /// Stops every room and closes every connection.
    pub fn shutdown(&mut self) {
        for (_, room) in self.rooms.drain() {
            room.task.abort();
        }
        self.memberships.clear();
        for (_, channel) in self.connections.drain() {
            channel.close();
        }
    }
}

fn role_message(role: Role, code: &str) -> ServerMessage {
    ServerMessage::Role {
        role,
        side: role.side(),
        room: code.to_string(),
    }
}

//! Wire schema, version 1.
//!
//! Every frame is a UTF-8 JSON object carrying a `type` tag. The state
//! payload is the verbose form: `left`/`right` as `{x, y, r}`, `puck` as
//! `{x, y, r, vx, vy}`, `scores` and `acks` as `{left, right}`, `events` as
//! `{wall, paddle, goal}`, plus `running`, `status` and `time` (unix ms).
//! Positions are pixels; puck velocity is pixels per second.

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};

use crate::arena::{Role, Side};
use crate::simulation::PaddleInput;
use crate::snapshot::Snapshot;

pub const PROTOCOL_VERSION: u32 = 1;
pub const DEFAULT_PORT: u16 = 3000;
pub const WS_PATH: &str = "/ws";
pub const HEALTH_PATH: &str = "/health";

pub const ROOM_CODE_MIN: usize = 4;
pub const ROOM_CODE_MAX: usize = 6;
const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const GENERATED_CODE_LEN: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Json(#[source] serde_json::Error),
    #[error("invalid room code {0:?}")]
    InvalidRoomCode(String),
    #[error("non-finite value in `{0}`")]
    NonFinite(&'static str),
    #[error("value out of range in `{0}`")]
    OutOfRange(&'static str),
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlAction {
    Toggle,
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputPayload {
    pub input: PaddleInput,
    pub seq: u32,
    #[serde(rename = "dtMs")]
    pub dt_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    Ping {
        at: f64,
    },
    Join {
        room: String,
    },
    Input {
        room: String,
        payload: InputPayload,
    },
    Control {
        room: String,
        action: ControlAction,
    },
    /// Absolute paddle target; a missing or non-numeric coordinate clears
    /// the target.
    Move {
        #[serde(default, deserialize_with = "lenient_coordinate")]
        x: Option<f64>,
        #[serde(default, deserialize_with = "lenient_coordinate")]
        y: Option<f64>,
    },
}

fn lenient_coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| value.as_f64()))
}

impl ClientMessage {
    /// Decodes and schema-checks one inbound frame. Room codes come back
    /// normalized.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let message: Self = serde_json::from_str(text).map_err(ProtocolError::Json)?;
        message.validate()
    }

    fn validate(self) -> Result<Self, ProtocolError> {
        match self {
            ClientMessage::Ping { at } => {
                finite("at", at)?;
                Ok(ClientMessage::Ping { at })
            }
            ClientMessage::Join { room } => Ok(ClientMessage::Join {
                room: normalize_room_code(&room)?,
            }),
            ClientMessage::Input { room, payload } => {
                finite("payload.dtMs", payload.dt_ms)?;
                if payload.dt_ms < 0.0 {
                    return Err(ProtocolError::OutOfRange("payload.dtMs"));
                }
                Ok(ClientMessage::Input {
                    room: normalize_room_code(&room)?,
                    payload,
                })
            }
            ClientMessage::Control { room, action } => Ok(ClientMessage::Control {
                room: normalize_room_code(&room)?,
                action,
            }),
            ClientMessage::Move { x, y } => {
                if let Some(x) = x {
                    finite("x", x)?;
                }
                if let Some(y) = y {
                    finite("y", y)?;
                }
                Ok(ClientMessage::Move { x, y })
            }
        }
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::Ping { .. } => "ping",
            ClientMessage::Join { .. } => "join",
            ClientMessage::Input { .. } => "input",
            ClientMessage::Control { .. } => "control",
            ClientMessage::Move { .. } => "move",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    Pong {
        at: f64,
        #[serde(rename = "serverTime", default)]
        server_time: u64,
    },
    Role {
        role: Role,
        side: Side,
        room: String,
    },
    Full,
    GuestJoined,
    GuestLeft,
    HostLeft,
    GuestInput,
    RoomExpired {
        #[serde(default)]
        reason: String,
    },
    State {
        payload: Snapshot,
    },
    /// Any type this build does not know; clients ignore it.
    #[serde(other)]
    Unknown,
}

impl ServerMessage {
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let message: Self = serde_json::from_str(text).map_err(ProtocolError::Json)?;
        if let ServerMessage::Pong { at, .. } = &message {
            finite("at", *at)?;
        }
        Ok(message)
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Pong { .. } => "pong",
            ServerMessage::Role { .. } => "role",
            ServerMessage::Full => "full",
            ServerMessage::GuestJoined => "guest-joined",
            ServerMessage::GuestLeft => "guest-left",
            ServerMessage::HostLeft => "host-left",
            ServerMessage::GuestInput => "guest-input",
            ServerMessage::RoomExpired { .. } => "room-expired",
            ServerMessage::State { .. } => "state",
            ServerMessage::Unknown => "unknown",
        }
    }
}

fn finite(field: &'static str, value: f64) -> Result<(), ProtocolError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ProtocolError::NonFinite(field))
    }
}

/// Trims and upper-cases a room code, accepting 4 to 6 ASCII letters or
/// digits.
pub fn normalize_room_code(raw: &str) -> Result<String, ProtocolError> {
    let code = raw.trim().to_ascii_uppercase();
    let valid = (ROOM_CODE_MIN..=ROOM_CODE_MAX).contains(&code.len())
        && code.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());
    if valid {
        Ok(code)
    } else {
        Err(ProtocolError::InvalidRoomCode(raw.to_string()))
    }
}

/// Random four-character code without easily confused glyphs.
pub fn generate_room_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..GENERATED_CODE_LEN)
        .map(|_| ROOM_CODE_ALPHABET[rng.random_range(0..ROOM_CODE_ALPHABET.len())] as char)
        .collect()
}

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rink::{ClientMessage, ExpiryReason};

use crate::channel::SharedChannel;

pub type ConnId = u64;

static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(1);

pub fn next_conn_id() -> ConnId {
    NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed)
}

/// Events the transport layer feeds to the session loop.
pub enum InboundEvent {
    Connected {
        conn_id: ConnId,
        peer: SocketAddr,
        channel: SharedChannel,
    },
    Message {
        conn_id: ConnId,
        message: ClientMessage,
    },
    Disconnected {
        conn_id: ConnId,
        reason: DisconnectReason,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    Graceful,
    Error,
}

impl DisconnectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisconnectReason::Graceful => "disconnected",
            DisconnectReason::Error => "dropped",
        }
    }
}

/// Raised by a room task when it ends on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    Expired {
        code: String,
        room_id: u64,
        reason: ExpiryReason,
    },
}

/// Wall clock in unix milliseconds.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

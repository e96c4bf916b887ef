mod protocol;

pub use protocol::{
    ClientMessage, ControlAction, DEFAULT_PORT, HEALTH_PATH, InputPayload, PROTOCOL_VERSION,
    ProtocolError, ROOM_CODE_MAX, ROOM_CODE_MIN, ServerMessage, WS_PATH, generate_room_code,
    normalize_room_code,
};

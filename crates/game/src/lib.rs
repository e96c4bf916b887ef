pub mod arena;
pub mod net;
pub mod physics;
pub mod simulation;
pub mod snapshot;

pub use arena::{ArenaBounds, ConfigError, GameConfig, Role, Side};
pub use net::{
    ClientMessage, ControlAction, DEFAULT_PORT, InputPayload, ProtocolError, ServerMessage,
    generate_room_code, normalize_room_code,
};
pub use physics::{ArenaPhysics, ColliderTag};
pub use simulation::{
    ExpiryReason, PaddleInput, RoomLifecycle, RoomSimulation, StagedControl, TickClock,
};
pub use snapshot::{
    Acks, EventFlags, EventLatch, GameEvents, PaddleState, PuckState, Scores, Snapshot,
    SnapshotBroadcaster,
};

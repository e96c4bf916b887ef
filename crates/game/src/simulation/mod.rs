mod command;
mod lifecycle;
mod room;
mod tick;

pub use command::{PaddleInput, StagedControl, approach_target};
pub use lifecycle::{ExpiryReason, RoomLifecycle};
pub use room::{RoomSimulation, status};
pub use tick::TickClock;

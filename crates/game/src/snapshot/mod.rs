mod broadcaster;
mod events;
mod latch;
mod state;

pub use broadcaster::SnapshotBroadcaster;
pub use events::{EventFlags, GameEvents};
pub use latch::EventLatch;
pub use state::{Acks, PaddleState, PuckState, Scores, Snapshot};

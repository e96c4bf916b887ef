pub mod client;
pub mod clock;
pub mod config;
pub mod input;
pub mod interpolation;
pub mod prediction;
pub mod session;

pub use client::{Driver, NetworkClient, now_ms};
pub use clock::ClockSync;
pub use config::ClientConfig;
pub use input::InputPacer;
pub use interpolation::InterpolationBuffer;
pub use prediction::{PaddlePredictor, PendingInput};
pub use session::{ClientSession, SessionEvent};

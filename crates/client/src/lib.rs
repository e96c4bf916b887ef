pub mod bot;
pub mod net;

pub use bot::SweepBot;
pub use net::{
    ClientConfig, ClientSession, ClockSync, Driver, InputPacer, InterpolationBuffer, NetworkClient,
    PaddlePredictor, PendingInput, SessionEvent,
};

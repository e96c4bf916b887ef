use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Discrete collision and scoring events produced by one or more steps.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct GameEvents: u8 {
        /// Puck touched an arena wall.
        const WALL   = 0b001;
        /// Puck touched a paddle.
        const PADDLE = 0b010;
        const GOAL   = 0b100;
    }
}

/// Wire form of [`GameEvents`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventFlags {
    #[serde(default)]
    pub wall: bool,
    #[serde(default)]
    pub paddle: bool,
    #[serde(default)]
    pub goal: bool,
}

impl From<GameEvents> for EventFlags {
    fn from(events: GameEvents) -> Self {
        Self {
            wall: events.contains(GameEvents::WALL),
            paddle: events.contains(GameEvents::PADDLE),
            goal: events.contains(GameEvents::GOAL),
        }
    }
}

impl From<EventFlags> for GameEvents {
    fn from(flags: EventFlags) -> Self {
        let mut events = GameEvents::empty();
        events.set(GameEvents::WALL, flags.wall);
        events.set(GameEvents::PADDLE, flags.paddle);
        events.set(GameEvents::GOAL, flags.goal);
        events
    }
}

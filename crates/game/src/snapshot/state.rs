use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::arena::Side;

use super::EventFlags;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PaddleState {
    pub x: f32,
    pub y: f32,
    pub r: f32,
}

impl PaddleState {
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PuckState {
    pub x: f32,
    pub y: f32,
    pub r: f32,
    /// Pixels per second.
    pub vx: f32,
    pub vy: f32,
}

impl PuckState {
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn velocity(&self) -> Vec2 {
        Vec2::new(self.vx, self.vy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Scores {
    pub left: u32,
    pub right: u32,
}

impl Scores {
    pub fn get(&self, side: Side) -> u32 {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }
}

/// Highest input sequence consumed per side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Acks {
    pub left: u32,
    pub right: u32,
}

impl Acks {
    pub fn get(&self, side: Side) -> u32 {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut u32 {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

/// Immutable, timestamped copy of a room's authoritative state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub left: PaddleState,
    pub right: PaddleState,
    pub puck: PuckState,
    pub scores: Scores,
    pub running: bool,
    pub status: String,
    #[serde(default)]
    pub events: EventFlags,
    #[serde(default)]
    pub acks: Acks,
    /// Server wall clock, unix milliseconds.
    pub time: u64,
}

impl Snapshot {
    pub fn paddle(&self, side: Side) -> &PaddleState {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn paddle_mut(&mut self, side: Side) -> &mut PaddleState {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

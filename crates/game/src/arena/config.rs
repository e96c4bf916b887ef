use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read game config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid game config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Physical constants of one match, in pixels and pixels per frame.
///
/// The physics world runs in meters; `meters_per_pixel` converts between
/// the two and `tick_rate` converts per-frame speeds into per-second ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub width: f32,
    pub height: f32,
    pub wall: f32,
    pub goal_height: f32,

    pub paddle_radius: f32,
    pub puck_radius: f32,

    pub paddle_speed: f32,
    pub puck_serve_vx: f32,
    pub puck_serve_vy_min: f32,
    pub puck_serve_vy_spread: f32,
    pub max_puck_speed: f32,

    pub score_to_win: u32,

    pub left_start: Vec2,
    pub right_start: Vec2,
    pub puck_start: Vec2,

    pub wall_restitution: f32,
    pub paddle_restitution: f32,
    pub puck_restitution: f32,
    pub puck_damping: f32,

    pub tick_rate: u32,
    pub meters_per_pixel: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 900.0,
            height: 520.0,
            wall: 40.0,
            goal_height: 140.0,

            paddle_radius: 26.0,
            puck_radius: 16.0,

            paddle_speed: 6.8,
            puck_serve_vx: 6.2,
            puck_serve_vy_min: 2.2,
            puck_serve_vy_spread: 2.8,
            max_puck_speed: 20.0,

            score_to_win: 7,

            left_start: Vec2::new(140.0, 260.0),
            right_start: Vec2::new(760.0, 260.0),
            puck_start: Vec2::new(450.0, 260.0),

            wall_restitution: 0.98,
            paddle_restitution: 0.6,
            puck_restitution: 0.95,
            puck_damping: 0.01,

            tick_rate: 60,
            meters_per_pixel: 0.01,
        }
    }
}

impl GameConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn fixed_dt(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    /// Paddle travel per fixed step, in pixels.
    pub fn paddle_step(&self) -> f32 {
        self.paddle_speed * self.tick_rate as f32 * self.fixed_dt()
    }

    /// Converts a pixels-per-frame speed into pixels per second.
    pub fn per_second(&self, px_per_frame: f32) -> f32 {
        px_per_frame * self.tick_rate as f32
    }
}

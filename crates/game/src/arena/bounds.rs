use glam::Vec2;

use super::{GameConfig, Side};

/// Legal paddle rectangles and goal geometry derived from a [`GameConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
    pub mid_x: f32,
    pub wall: f32,
    pub goal_top: f32,
    pub goal_bottom: f32,
}

impl From<&GameConfig> for ArenaBounds {
    fn from(config: &GameConfig) -> Self {
        let mid_y = config.height / 2.0;
        Self {
            min_x: config.wall,
            max_x: config.width - config.wall,
            min_y: config.wall,
            max_y: config.height - config.wall,
            mid_x: config.width / 2.0,
            wall: config.wall,
            goal_top: mid_y - config.goal_height / 2.0,
            goal_bottom: mid_y + config.goal_height / 2.0,
        }
    }
}

impl ArenaBounds {
    /// Horizontal range a paddle of `side` may occupy.
    pub fn x_range(&self, side: Side) -> (f32, f32) {
        match side {
            Side::Left => (self.min_x, self.mid_x - self.wall),
            Side::Right => (self.mid_x + self.wall, self.max_x),
        }
    }

    pub fn clamp_paddle(&self, side: Side, pos: Vec2) -> Vec2 {
        let (lo, hi) = self.x_range(side);
        Vec2::new(pos.x.clamp(lo, hi), pos.y.clamp(self.min_y, self.max_y))
    }

    pub fn in_goal_mouth(&self, y: f32) -> bool {
        y > self.goal_top && y < self.goal_bottom
    }

    /// X coordinate of the goal line defended by `side`.
    pub fn goal_line(&self, side: Side) -> f32 {
        match side {
            Side::Left => self.min_x,
            Side::Right => self.max_x,
        }
    }

    /// Normalized distance of a paddle from its own goal line, in `[0, 1]`.
    pub fn goal_falloff(&self, side: Side, x: f32) -> f32 {
        let (lo, hi) = self.x_range(Side::Left);
        let max_dist = (hi - lo).max(0.0001);
        let dist = match side {
            Side::Left => x - self.min_x,
            Side::Right => self.max_x - x,
        };
        (dist / max_dist).clamp(0.0, 1.0)
    }
}

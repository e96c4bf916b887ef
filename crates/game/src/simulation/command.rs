use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::arena::{ArenaBounds, Side};

/// Directional intent for one paddle. Screen axes: `up` is negative y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaddleInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl PaddleInput {
    pub const NEUTRAL: Self = Self {
        up: false,
        down: false,
        left: false,
        right: false,
    };

    pub fn is_neutral(&self) -> bool {
        *self == Self::NEUTRAL
    }

    pub fn direction(&self) -> Vec2 {
        let axis = |neg: bool, pos: bool| (pos as i8 - neg as i8) as f32;
        Vec2::new(axis(self.left, self.right), axis(self.up, self.down))
    }

    /// Moves `position` by `step` along each pressed axis and clamps the
    /// result to `side`'s rectangle.
    pub fn apply(&self, position: Vec2, step: f32, bounds: &ArenaBounds, side: Side) -> Vec2 {
        bounds.clamp_paddle(side, position + self.direction() * step)
    }
}

/// Latest control a side has staged for the room's next tick.
///
/// Directional input persists until replaced. A target, when present,
/// takes precedence over the directional input.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StagedControl {
    pub input: PaddleInput,
    pub seq: u32,
    pub target: Option<Vec2>,
}

impl StagedControl {
    /// Stages a directional input; any pending target is dropped.
    pub fn with_input(self, input: PaddleInput, seq: u32) -> Self {
        Self {
            input,
            seq: self.seq.max(seq),
            target: None,
        }
    }

    pub fn with_target(self, target: Option<Vec2>) -> Self {
        Self { target, ..self }
    }
}

/// Steps a paddle toward `target`, slowing the approach as it leaves its
/// own goal line, then clamps to `side`'s rectangle.
pub fn approach_target(
    position: Vec2,
    target: Vec2,
    step: f32,
    bounds: &ArenaBounds,
    side: Side,
) -> Vec2 {
    let goal = bounds.clamp_paddle(side, target);
    let delta = goal - position;
    let dist = delta.length();

    let falloff = bounds.goal_falloff(side, position.x);
    let max_step = step * (1.0 - falloff * falloff).max(0.25);

    let next = if dist > max_step {
        position + delta * (max_step / dist)
    } else {
        goal
    };
    bounds.clamp_paddle(side, next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::GameConfig;

    fn bounds() -> ArenaBounds {
        ArenaBounds::from(&GameConfig::default())
    }

    #[test]
    fn opposing_keys_cancel() {
        let input = PaddleInput {
            up: true,
            down: true,
            left: true,
            right: false,
        };
        assert_eq!(input.direction(), Vec2::new(-1.0, 0.0));
        assert_eq!(PaddleInput::NEUTRAL.direction(), Vec2::ZERO);
    }

    #[test]
    fn apply_clamps_to_side() {
        let b = bounds();
        let right = PaddleInput {
            right: true,
            ..PaddleInput::NEUTRAL
        };
        let pos = right.apply(Vec2::new(408.0, 260.0), 6.8, &b, Side::Left);
        assert_eq!(pos.x, 410.0);

        let left = PaddleInput {
            left: true,
            ..PaddleInput::NEUTRAL
        };
        let pos = left.apply(Vec2::new(492.0, 260.0), 6.8, &b, Side::Right);
        assert_eq!(pos.x, 490.0);
    }

    #[test]
    fn input_clears_target_and_keeps_highest_seq() {
        let staged = StagedControl::default()
            .with_input(PaddleInput::NEUTRAL, 5)
            .with_target(Some(Vec2::new(100.0, 100.0)));
        assert!(staged.target.is_some());

        let staged = staged.with_input(PaddleInput::NEUTRAL, 3);
        assert_eq!(staged.seq, 5);
        assert!(staged.target.is_none());
    }

    #[test]
    fn target_approach_is_rate_limited() {
        let b = bounds();
        let start = Vec2::new(140.0, 260.0);
        let next = approach_target(start, Vec2::new(400.0, 260.0), 6.8, &b, Side::Left);
        assert!(next.x > start.x);
        assert!(next.x - start.x <= 6.8 + 1e-4);
    }

    #[test]
    fn target_approach_slows_far_from_goal() {
        let b = bounds();
        let near = Vec2::new(60.0, 260.0);
        let far = Vec2::new(400.0, 260.0);
        let near_step = approach_target(near, Vec2::new(60.0, 40.0), 6.8, &b, Side::Left);
        let far_step = approach_target(far, Vec2::new(400.0, 40.0), 6.8, &b, Side::Left);
        assert!((near - near_step).length() > (far - far_step).length());
        assert!((far - far_step).length() >= 6.8 * 0.25 - 1e-4);
    }

    #[test]
    fn target_across_midline_is_clamped_to_side() {
        let b = bounds();
        let mut pos = Vec2::new(380.0, 260.0);
        for _ in 0..200 {
            pos = approach_target(pos, Vec2::new(900.0, 262.0), 6.8, &b, Side::Left);
            assert!(pos.x <= 410.0);
        }
        assert!((pos - Vec2::new(410.0, 262.0)).length() < 1e-3);
    }
}

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::command::{StagedControl, approach_target};
use crate::arena::{ArenaBounds, GameConfig, Side};
use crate::physics::ArenaPhysics;
use crate::snapshot::{Acks, GameEvents, PaddleState, PuckState, Scores, Snapshot};

pub mod status {
    pub const IDLE: &str = "Press space to start!";
    pub const RUNNING: &str = "Game on!";
    pub const PAUSED: &str = "Paused";
    pub const LEFT_SCORES: &str = "Player 1 scores!";
    pub const RIGHT_SCORES: &str = "Player 2 scores!";
    pub const LEFT_WINS: &str = "Player 1 wins!";
    pub const RIGHT_WINS: &str = "Player 2 wins!";
}

/// One authoritative match: paddles, puck, scores and round flow.
///
/// The owner stages per-side control and calls [`step`](Self::step) once
/// per fixed tick; nothing else mutates the bodies.
pub struct RoomSimulation {
    config: GameConfig,
    bounds: ArenaBounds,
    physics: ArenaPhysics,
    controls: [StagedControl; 2],
    acks: Acks,
    scores: Scores,
    running: bool,
    status: String,
    rng: StdRng,
}

fn slot(side: Side) -> usize {
    match side {
        Side::Left => 0,
        Side::Right => 1,
    }
}

impl RoomSimulation {
    pub fn new(config: GameConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: GameConfig, rng: StdRng) -> Self {
        Self {
            bounds: ArenaBounds::from(&config),
            physics: ArenaPhysics::new(&config),
            config,
            controls: [StagedControl::default(); 2],
            acks: Acks::default(),
            scores: Scores::default(),
            running: false,
            status: status::IDLE.to_string(),
            rng,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn bounds(&self) -> &ArenaBounds {
        &self.bounds
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn scores(&self) -> Scores {
        self.scores
    }

    pub fn acks(&self) -> Acks {
        self.acks
    }

    pub fn physics(&self) -> &ArenaPhysics {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut ArenaPhysics {
        &mut self.physics
    }

    /// Takes the latest control for `side`. The staged sequence counts as
    /// consumed, so the side's ack advances even while paused.
    pub fn stage(&mut self, side: Side, control: StagedControl) {
        let ack = self.acks.get_mut(side);
        *ack = (*ack).max(control.seq);
        self.controls[slot(side)] = control;
    }

    /// Forgets a side's control and ack, e.g. when its player leaves. A new
    /// player on that side starts its sequence from zero.
    pub fn clear_side(&mut self, side: Side) {
        self.controls[slot(side)] = StagedControl::default();
        *self.acks.get_mut(side) = 0;
    }

    /// Advances one fixed step. Does nothing while the match is stopped.
    pub fn step(&mut self) -> GameEvents {
        if !self.running {
            return GameEvents::empty();
        }

        let step = self.config.paddle_step();
        for side in [Side::Left, Side::Right] {
            let control = self.controls[slot(side)];
            let current = self.physics.paddle_position(side);
            let next = match control.target {
                Some(target) => approach_target(current, target, step, &self.bounds, side),
                None => control.input.apply(current, step, &self.bounds, side),
            };
            self.physics.move_paddle(side, next);
        }

        let mut events = self.physics.step_once();

        let max_speed = self.config.per_second(self.config.max_puck_speed);
        self.physics.clamp_puck_speed(max_speed);

        if let Some(scorer) = self.goal_scorer() {
            self.score(scorer);
            events |= GameEvents::GOAL;
        }

        events
    }

    fn goal_scorer(&self) -> Option<Side> {
        let puck = self.physics.puck_position();
        let r = self.config.puck_radius;
        if !self.bounds.in_goal_mouth(puck.y) {
            return None;
        }

        if puck.x - r <= self.bounds.goal_line(Side::Left) {
            Some(Side::Right)
        } else if puck.x + r >= self.bounds.goal_line(Side::Right) {
            Some(Side::Left)
        } else {
            None
        }
    }

    fn score(&mut self, scorer: Side) {
        match scorer {
            Side::Left => {
                self.scores.left += 1;
                self.status = status::LEFT_SCORES.to_string();
            }
            Side::Right => {
                self.scores.right += 1;
                self.status = status::RIGHT_SCORES.to_string();
            }
        }
        log::debug!(
            "goal for {scorer}: {}-{}",
            self.scores.left,
            self.scores.right
        );

        // serve away from the side that conceded
        self.reset_round(scorer.toward());

        let target = self.config.score_to_win;
        if self.scores.left >= target || self.scores.right >= target {
            self.running = false;
            self.status = if self.scores.left > self.scores.right {
                status::LEFT_WINS
            } else {
                status::RIGHT_WINS
            }
            .to_string();
        }
    }

    /// Returns both paddles to their start positions and serves the puck
    /// from the center. `direction` is the sign of the serve's x velocity.
    pub fn reset_round(&mut self, direction: f32) {
        let config = &self.config;
        self.physics.place_paddle(Side::Left, config.left_start);
        self.physics.place_paddle(Side::Right, config.right_start);

        let vy = self.rng.random::<f32>() * config.puck_serve_vy_spread + config.puck_serve_vy_min;
        let vy = if self.rng.random_bool(0.5) { vy } else { -vy };
        let velocity = Vec2::new(
            config.per_second(config.puck_serve_vx) * direction.signum(),
            config.per_second(vy),
        );
        self.physics.place_puck(config.puck_start, velocity);
    }

    /// Starts or pauses the match. Starting serves in a random direction.
    pub fn toggle(&mut self) {
        self.running = !self.running;
        if self.running {
            let direction = if self.rng.random_bool(0.5) { 1.0 } else { -1.0 };
            self.reset_round(direction);
            self.status = status::RUNNING.to_string();
        } else {
            self.status = status::PAUSED.to_string();
        }
    }

    pub fn reset(&mut self) {
        self.scores = Scores::default();
        self.running = false;
        self.status = status::IDLE.to_string();
        self.reset_round(1.0);
    }

    pub fn snapshot(&self, time: u64, events: GameEvents) -> Snapshot {
        let paddle = |side: Side| {
            let p = self.physics.paddle_position(side);
            PaddleState {
                x: p.x,
                y: p.y,
                r: self.config.paddle_radius,
            }
        };
        let puck = self.physics.puck_position();
        let velocity = self.physics.puck_velocity();

        Snapshot {
            left: paddle(Side::Left),
            right: paddle(Side::Right),
            puck: PuckState {
                x: puck.x,
                y: puck.y,
                r: self.config.puck_radius,
                vx: velocity.x,
                vy: velocity.y,
            },
            scores: self.scores,
            running: self.running,
            status: self.status.clone(),
            events: events.into(),
            acks: self.acks,
            time,
        }
    }
}

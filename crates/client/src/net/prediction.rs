use std::collections::VecDeque;

use glam::Vec2;

use rink::{ArenaBounds, GameConfig, PaddleInput, Side, Snapshot};

use super::config::ClientConfig;

const MIN_DT_SCALE: f64 = 0.25;
const MAX_DT_SCALE: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingInput {
    pub seq: u32,
    pub input: PaddleInput,
    pub dt_ms: f64,
}

/// Local copy of this client's own paddle.
///
/// Every sent input moves the copy immediately and is kept until the room
/// acknowledges it. An acknowledgment rebases the copy on the
/// authoritative position and replays whatever is still pending.
#[derive(Debug)]
pub struct PaddlePredictor {
    side: Side,
    bounds: ArenaBounds,
    speed: f32,
    target_frame_ms: f64,
    capacity: usize,
    pending: VecDeque<PendingInput>,
    position: Option<Vec2>,
    last_ack: u32,
}

impl PaddlePredictor {
    pub fn new(game: &GameConfig, config: &ClientConfig, side: Side) -> Self {
        Self {
            side,
            bounds: ArenaBounds::from(game),
            speed: game.paddle_speed,
            target_frame_ms: config.target_frame_ms,
            capacity: config.pending_capacity.max(1),
            pending: VecDeque::with_capacity(config.pending_capacity),
            position: None,
            last_ack: 0,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Forgets everything, e.g. after (re)joining a room.
    pub fn reset(&mut self, side: Side) {
        self.side = side;
        self.pending.clear();
        self.position = None;
        self.last_ack = 0;
    }

    /// Queues a sent input. The local copy moves only when `apply` is set
    /// and a baseline exists.
    pub fn record(&mut self, entry: PendingInput, apply: bool) {
        self.pending.push_back(entry);
        while self.pending.len() > self.capacity {
            self.pending.pop_front();
        }
        if apply {
            if let Some(position) = self.position {
                self.position = Some(self.advance(position, &entry));
            }
        }
    }

    /// Rebases on `snapshot` when it acknowledges something new. Returns
    /// whether the prediction changed.
    pub fn reconcile(&mut self, snapshot: &Snapshot) -> bool {
        let ack = snapshot.acks.get(self.side);
        if ack <= self.last_ack {
            return false;
        }
        self.last_ack = ack;

        self.pending.retain(|entry| entry.seq > ack);
        let baseline = snapshot.paddle(self.side).position();
        let predicted = self
            .pending
            .iter()
            .fold(baseline, |position, entry| self.advance(position, entry));
        self.position = Some(predicted);
        true
    }

    /// Adopts `position` without touching the pending queue.
    pub fn snap_to(&mut self, position: Vec2) {
        self.position = Some(self.bounds.clamp_paddle(self.side, position));
    }

    pub fn position(&self) -> Option<Vec2> {
        self.position
    }

    pub fn last_ack(&self) -> u32 {
        self.last_ack
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn advance(&self, position: Vec2, entry: &PendingInput) -> Vec2 {
        let scale = (entry.dt_ms / self.target_frame_ms).clamp(MIN_DT_SCALE, MAX_DT_SCALE);
        let step = self.speed * scale as f32;
        entry.input.apply(position, step, &self.bounds, self.side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UP: PaddleInput = PaddleInput {
        up: true,
        down: false,
        left: false,
        right: false,
    };
    const RIGHT: PaddleInput = PaddleInput {
        up: false,
        down: false,
        left: false,
        right: true,
    };

    fn predictor(side: Side) -> PaddlePredictor {
        PaddlePredictor::new(&GameConfig::default(), &ClientConfig::default(), side)
    }

    fn entry(seq: u32, input: PaddleInput) -> PendingInput {
        PendingInput {
            seq,
            input,
            dt_ms: 16.6667,
        }
    }

    fn acked(left: Vec2, ack: u32) -> Snapshot {
        let mut snapshot = Snapshot::default();
        snapshot.left.x = left.x;
        snapshot.left.y = left.y;
        snapshot.acks.left = ack;
        snapshot
    }

    fn close(a: Vec2, b: Vec2) -> bool {
        a.distance(b) < 1e-3
    }

    #[test]
    fn input_moves_local_copy_immediately() {
        let mut p = predictor(Side::Left);
        p.snap_to(Vec2::new(140.0, 260.0));
        p.record(entry(1, UP), true);

        let position = p.position().unwrap();
        assert!(close(position, Vec2::new(140.0, 260.0 - 6.8)));
        assert_eq!(p.pending_len(), 1);
    }

    #[test]
    fn elapsed_time_scales_the_step_within_limits() {
        let mut p = predictor(Side::Left);
        p.snap_to(Vec2::new(140.0, 260.0));
        p.record(
            PendingInput {
                seq: 1,
                input: UP,
                dt_ms: 1000.0,
            },
            true,
        );
        // capped at three frames
        assert!(close(p.position().unwrap(), Vec2::new(140.0, 260.0 - 6.8 * 3.0)));

        p.record(
            PendingInput {
                seq: 2,
                input: UP,
                dt_ms: 1.0,
            },
            true,
        );
        assert!(close(
            p.position().unwrap(),
            Vec2::new(140.0, 260.0 - 6.8 * 3.25)
        ));
    }

    #[test]
    fn reconcile_replays_unacknowledged_suffix() {
        let mut p = predictor(Side::Left);
        p.snap_to(Vec2::new(140.0, 260.0));
        for seq in 1..=5 {
            p.record(entry(seq, UP), true);
        }

        let baseline = Vec2::new(150.0, 240.0);
        assert!(p.reconcile(&acked(baseline, 3)));

        assert_eq!(p.pending_len(), 2);
        assert_eq!(p.last_ack(), 3);
        assert!(close(p.position().unwrap(), Vec2::new(150.0, 240.0 - 2.0 * 6.8)));
    }

    #[test]
    fn repeated_snapshot_is_a_no_op() {
        let mut p = predictor(Side::Left);
        p.snap_to(Vec2::new(140.0, 260.0));
        for seq in 1..=4 {
            p.record(entry(seq, RIGHT), true);
        }
        let snapshot = acked(Vec2::new(145.0, 260.0), 2);

        assert!(p.reconcile(&snapshot));
        let once = p.position();
        let pending = p.pending_len();

        assert!(!p.reconcile(&snapshot));
        assert_eq!(p.position(), once);
        assert_eq!(p.pending_len(), pending);
    }

    #[test]
    fn stale_ack_never_mutates_state() {
        let mut p = predictor(Side::Left);
        p.snap_to(Vec2::new(140.0, 260.0));
        p.record(entry(1, UP), true);
        p.record(entry(2, UP), true);
        assert!(p.reconcile(&acked(Vec2::new(140.0, 250.0), 2)));
        let before = p.position();

        assert!(!p.reconcile(&acked(Vec2::new(100.0, 100.0), 1)));
        assert_eq!(p.position(), before);
        assert_eq!(p.last_ack(), 2);
    }

    #[test]
    fn replay_matches_direct_application() {
        let inputs = [UP, RIGHT, UP, RIGHT, RIGHT];
        let baseline = Vec2::new(120.0, 200.0);

        let mut p = predictor(Side::Left);
        p.snap_to(Vec2::new(140.0, 260.0));
        for (i, input) in inputs.iter().enumerate() {
            p.record(entry(i as u32 + 1, *input), true);
        }
        p.reconcile(&acked(baseline, 2));

        let mut direct = predictor(Side::Left);
        direct.snap_to(baseline);
        for (i, input) in inputs.iter().enumerate().skip(2) {
            direct.record(entry(i as u32 + 1, *input), true);
        }

        assert!(close(p.position().unwrap(), direct.position().unwrap()));
    }

    #[test]
    fn prediction_never_crosses_the_midline() {
        let mut p = predictor(Side::Left);
        p.snap_to(Vec2::new(400.0, 260.0));
        for seq in 1..=50 {
            p.record(entry(seq, RIGHT), true);
            assert!(p.position().unwrap().x <= 410.0);
        }

        p.reconcile(&acked(Vec2::new(405.0, 260.0), 10));
        assert!(p.position().unwrap().x <= 410.0);

        let mut right = predictor(Side::Right);
        right.snap_to(Vec2::new(300.0, 260.0));
        assert!(right.position().unwrap().x >= 490.0);
    }

    #[test]
    fn queue_drops_oldest_when_full() {
        let config = ClientConfig {
            pending_capacity: 3,
            ..ClientConfig::default()
        };
        let mut p = PaddlePredictor::new(&GameConfig::default(), &config, Side::Right);
        for seq in 1..=5 {
            p.record(entry(seq, UP), false);
        }
        assert_eq!(p.pending_len(), 3);
        assert!(p.position().is_none());
    }

    #[test]
    fn reset_clears_ack_and_queue() {
        let mut p = predictor(Side::Left);
        p.snap_to(Vec2::new(140.0, 260.0));
        p.record(entry(1, UP), true);
        p.reconcile(&acked(Vec2::new(140.0, 260.0), 1));

        p.reset(Side::Right);
        assert_eq!(p.side(), Side::Right);
        assert_eq!(p.last_ack(), 0);
        assert_eq!(p.pending_len(), 0);
        assert!(p.position().is_none());
    }
}

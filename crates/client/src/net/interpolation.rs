use std::collections::VecDeque;

use rink::{PaddleState, PuckState, Snapshot};

/// Recent snapshots ordered by server time, sampled at a render time that
/// trails the newest one.
#[derive(Debug)]
pub struct InterpolationBuffer {
    capacity: usize,
    snapshots: VecDeque<Snapshot>,
}

impl InterpolationBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(2),
            snapshots: VecDeque::with_capacity(capacity),
        }
    }

    /// Inserts in time order, so a slightly late snapshot still lands in
    /// the right slot. The oldest entry is evicted on overflow.
    pub fn push(&mut self, snapshot: Snapshot) {
        let insert_pos = self
            .snapshots
            .iter()
            .rposition(|s| s.time <= snapshot.time)
            .map_or(0, |i| i + 1);
        self.snapshots.insert(insert_pos, snapshot);

        while self.snapshots.len() > self.capacity {
            self.snapshots.pop_front();
        }
    }

    /// Blends the two snapshots around `render_time_ms`. Positions are
    /// interpolated; radii and discrete state come from the newer one.
    pub fn sample(&self, render_time_ms: f64) -> Option<Snapshot> {
        let (older, newer) = match self.snapshots.len() {
            0 => return None,
            1 => return self.snapshots.front().cloned(),
            len => {
                let older = self
                    .snapshots
                    .iter()
                    .rposition(|s| s.time as f64 <= render_time_ms)
                    .unwrap_or(0)
                    .min(len - 2);
                (&self.snapshots[older], &self.snapshots[older + 1])
            }
        };

        let span = (newer.time as f64 - older.time as f64).max(1.0);
        let t = ((render_time_ms - older.time as f64) / span).clamp(0.0, 1.0) as f32;
        Some(blend(older, newer, t))
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.snapshots.back()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn blend_paddle(a: &PaddleState, b: &PaddleState, t: f32) -> PaddleState {
    PaddleState {
        x: lerp(a.x, b.x, t),
        y: lerp(a.y, b.y, t),
        r: b.r,
    }
}

fn blend(older: &Snapshot, newer: &Snapshot, t: f32) -> Snapshot {
    Snapshot {
        left: blend_paddle(&older.left, &newer.left, t),
        right: blend_paddle(&older.right, &newer.right, t),
        puck: PuckState {
            x: lerp(older.puck.x, newer.puck.x, t),
            y: lerp(older.puck.y, newer.puck.y, t),
            ..newer.puck
        },
        ..newer.clone()
    }
}

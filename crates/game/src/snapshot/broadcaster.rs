use super::{EventLatch, GameEvents};

/// Decides when a room publishes a snapshot.
///
/// Every tick reports its step events through [`observe`](Self::observe).
/// Ticks that fall between two broadcasts feed the latch; the next
/// broadcast carries `step events | latch` and clears it. The cadence
/// follows the running flag, and emitted timestamps never go backwards.
#[derive(Debug)]
pub struct SnapshotBroadcaster {
    running_interval_ms: f64,
    idle_interval_ms: f64,
    next_due_ms: Option<f64>,
    last_time_ms: u64,
    latch: EventLatch,
}

impl SnapshotBroadcaster {
    // Absorbs whole-millisecond clock rounding against fractional intervals.
    const DUE_TOLERANCE_MS: f64 = 1.0;

    pub fn new(running_rate: u32, idle_rate: u32) -> Self {
        Self {
            running_interval_ms: 1000.0 / running_rate.max(1) as f64,
            idle_interval_ms: 1000.0 / idle_rate.max(1) as f64,
            next_due_ms: None,
            last_time_ms: 0,
            latch: EventLatch::new(),
        }
    }

    pub fn interval_ms(&self, running: bool) -> f64 {
        if running {
            self.running_interval_ms
        } else {
            self.idle_interval_ms
        }
    }

    pub fn latched(&self) -> GameEvents {
        self.latch.pending()
    }

    /// Returns `(timestamp, events)` when a snapshot is due at `now_ms`.
    pub fn observe(
        &mut self,
        events: GameEvents,
        now_ms: u64,
        running: bool,
    ) -> Option<(u64, GameEvents)> {
        let now = now_ms as f64;
        let interval = self.interval_ms(running);

        let due = self.next_due_ms.unwrap_or(now);
        if now + Self::DUE_TOLERANCE_MS < due {
            self.latch.record(events);
            return None;
        }

        let next = due + interval;
        self.next_due_ms = Some(if next > now { next } else { now + interval });

        let time = now_ms.max(self.last_time_ms);
        self.last_time_ms = time;

        Some((time, events | self.latch.take()))
    }

    /// Forces the next [`observe`](Self::observe) call to broadcast.
    pub fn expedite(&mut self) {
        self.next_due_ms = None;
    }
}

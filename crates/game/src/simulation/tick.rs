use std::time::Duration;

/// Fixed-step accumulator driving a room's timer.
///
/// Physics always advances by `1 / tick_rate`; the wall-clock period of the
/// timer switches between the running and idle rates.
pub struct TickClock {
    tick_rate: u32,
    idle_rate: u32,
    dt: f32,
    accumulator: f32,
}

impl TickClock {
    const MAX_FRAME: f32 = 0.25;

    pub fn new(tick_rate: u32, idle_rate: u32) -> Self {
        let tick_rate = tick_rate.max(1);
        Self {
            tick_rate,
            idle_rate: idle_rate.clamp(1, tick_rate),
            dt: 1.0 / tick_rate as f32,
            accumulator: 0.0,
        }
    }

    /// Timer period for the given run state.
    pub fn period(&self, running: bool) -> Duration {
        let rate = if running { self.tick_rate } else { self.idle_rate };
        Duration::from_secs_f64(1.0 / rate as f64)
    }

    pub fn accumulate(&mut self, delta: f32) {
        self.accumulator += delta.clamp(0.0, Self::MAX_FRAME);
    }

    pub fn consume_tick(&mut self) -> bool {
        if self.accumulator >= self.dt {
            self.accumulator -= self.dt;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_whole_ticks() {
        let mut clock = TickClock::new(60, 10);

        clock.accumulate(1.0 / 30.0);
        assert!(clock.consume_tick());
        assert!(clock.consume_tick());
        assert!(!clock.consume_tick());
    }

    #[test]
    fn long_frames_are_capped() {
        let mut clock = TickClock::new(60, 10);
        clock.accumulate(5.0);

        let mut ticks = 0;
        while clock.consume_tick() {
            ticks += 1;
        }
        assert!((14..=15).contains(&ticks), "ran {ticks} ticks");
    }

    #[test]
    fn period_follows_run_state() {
        let clock = TickClock::new(60, 10);
        assert_eq!(clock.period(false), Duration::from_millis(100));
        assert!(clock.period(true) < Duration::from_millis(17));
    }
}

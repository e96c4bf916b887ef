use rink::PaddleInput;

/// Decides when the current input goes out: on change, or as a keepalive
/// once `keepalive_ms` passed without a send.
#[derive(Debug, Clone)]
pub struct InputPacer {
    keepalive_ms: f64,
    current: PaddleInput,
    dirty: bool,
    last_sent_ms: f64,
}

impl InputPacer {
    pub fn new(keepalive_ms: f64, now: f64) -> Self {
        Self {
            keepalive_ms,
            current: PaddleInput::NEUTRAL,
            dirty: false,
            last_sent_ms: now,
        }
    }

    pub fn set(&mut self, input: PaddleInput) {
        if input != self.current {
            self.current = input;
            self.dirty = true;
        }
    }

    pub fn current(&self) -> PaddleInput {
        self.current
    }

    /// Returns the input to send and the milliseconds since the previous
    /// send (at least one), or `None` when nothing is due.
    pub fn poll(&mut self, now: f64) -> Option<(PaddleInput, f64)> {
        let elapsed = now - self.last_sent_ms;
        if !self.dirty && elapsed < self.keepalive_ms {
            return None;
        }
        self.dirty = false;
        self.last_sent_ms = now;
        Some((self.current, elapsed.max(1.0)))
    }

    pub fn reset(&mut self, now: f64) {
        self.current = PaddleInput::NEUTRAL;
        self.dirty = false;
        self.last_sent_ms = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOWN: PaddleInput = PaddleInput {
        up: false,
        down: true,
        left: false,
        right: false,
    };

    #[test]
    fn change_is_sent_right_away() {
        let mut pacer = InputPacer::new(120.0, 0.0);
        assert_eq!(pacer.poll(10.0), None);

        pacer.set(DOWN);
        assert_eq!(pacer.poll(20.0), Some((DOWN, 20.0)));
        assert_eq!(pacer.poll(30.0), None);
    }

    #[test]
    fn unchanged_input_is_repeated_as_keepalive() {
        let mut pacer = InputPacer::new(120.0, 0.0);
        pacer.set(DOWN);
        pacer.poll(0.0);

        assert_eq!(pacer.poll(100.0), None);
        assert_eq!(pacer.poll(150.0), Some((DOWN, 150.0)));
    }

    #[test]
    fn setting_the_same_input_is_not_a_change() {
        let mut pacer = InputPacer::new(120.0, 0.0);
        pacer.set(PaddleInput::NEUTRAL);
        assert_eq!(pacer.poll(50.0), None);
    }

    #[test]
    fn elapsed_is_at_least_one_millisecond() {
        let mut pacer = InputPacer::new(120.0, 0.0);
        pacer.set(DOWN);
        assert_eq!(pacer.poll(0.0), Some((DOWN, 1.0)));
    }
}

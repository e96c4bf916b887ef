/// Estimates the server's wall clock from timestamped round trips.
///
/// Offsets are `server - local` in milliseconds and smoothed with an
/// exponential moving average. Until the first pong arrives, snapshot
/// timestamps stand in as samples.
#[derive(Debug, Clone)]
pub struct ClockSync {
    smoothing: f64,
    offset_ms: Option<f64>,
    rtt_ms: Option<f64>,
    from_pong: bool,
}

impl ClockSync {
    pub fn new(smoothing: f64) -> Self {
        Self {
            smoothing: smoothing.clamp(0.0, 1.0),
            offset_ms: None,
            rtt_ms: None,
            from_pong: false,
        }
    }

    /// `sent_at` is the local time echoed back by the pong.
    pub fn on_pong(&mut self, sent_at: f64, server_time: u64, now: f64) {
        let rtt = (now - sent_at).max(0.0);
        self.rtt_ms = Some(match self.rtt_ms {
            Some(prev) => prev + (rtt - prev) * self.smoothing,
            None => rtt,
        });

        if server_time == 0 {
            return;
        }
        let sample = server_time as f64 + rtt / 2.0 - now;
        if !self.from_pong {
            // snapshot-based samples include one-way latency; start over
            self.offset_ms = None;
            self.from_pong = true;
        }
        self.mix(sample);
    }

    pub fn on_snapshot(&mut self, server_time: u64, now: f64) {
        if !self.from_pong {
            self.mix(server_time as f64 - now);
        }
    }

    fn mix(&mut self, sample: f64) {
        self.offset_ms = Some(match self.offset_ms {
            Some(prev) => prev + (sample - prev) * self.smoothing,
            None => sample,
        });
    }

    pub fn offset_ms(&self) -> Option<f64> {
        self.offset_ms
    }

    pub fn rtt_ms(&self) -> Option<f64> {
        self.rtt_ms
    }

    pub fn server_now(&self, now: f64) -> f64 {
        now + self.offset_ms.unwrap_or(0.0)
    }

    /// Render delay: the base floor, raised to the measured round trip.
    pub fn buffer_delay(&self, base_ms: f64) -> f64 {
        self.rtt_ms.map_or(base_ms, |rtt| rtt.max(base_ms))
    }

    pub fn render_time(&self, now: f64, base_ms: f64) -> f64 {
        self.server_now(now) - self.buffer_delay(base_ms)
    }
}

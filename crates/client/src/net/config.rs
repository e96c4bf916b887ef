#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Floor of the render delay behind estimated server time.
    pub base_buffer_ms: f64,
    pub snapshot_capacity: usize,
    pub pending_capacity: usize,
    /// Frame length the paddle speed is expressed in.
    pub target_frame_ms: f64,
    pub input_send_interval_ms: u64,
    pub keepalive_ms: f64,
    pub ping_interval_secs: f32,
    pub clock_smoothing: f64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_buffer_ms: 140.0,
            snapshot_capacity: 20,
            pending_capacity: 120,
            target_frame_ms: 16.6667,
            input_send_interval_ms: 50,
            keepalive_ms: 120.0,
            ping_interval_secs: 1.0,
            clock_smoothing: 0.1,
        }
    }
}

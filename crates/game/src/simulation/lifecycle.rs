use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryReason {
    Empty,
    Inactive,
}

impl ExpiryReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpiryReason::Empty => "empty",
            ExpiryReason::Inactive => "inactive",
        }
    }
}

impl fmt::Display for ExpiryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Activity and occupancy bookkeeping for timeout-based room expiry.
#[derive(Debug, Clone)]
pub struct RoomLifecycle {
    empty_ttl: Duration,
    inactive_ttl: Duration,
    last_activity: Instant,
    empty_since: Option<Instant>,
}

impl RoomLifecycle {
    pub fn new(now: Instant, empty_ttl: Duration, inactive_ttl: Duration) -> Self {
        Self {
            empty_ttl,
            inactive_ttl,
            last_activity: now,
            empty_since: None,
        }
    }

    pub fn touch(&mut self, now: Instant) {
        self.last_activity = now;
    }

    /// Records the current member count.
    pub fn set_occupancy(&mut self, members: usize, now: Instant) {
        if members == 0 {
            self.empty_since.get_or_insert(now);
        } else {
            self.empty_since = None;
        }
    }

    pub fn expiry(&self, now: Instant, running: bool) -> Option<ExpiryReason> {
        if let Some(since) = self.empty_since {
            if now.saturating_duration_since(since) >= self.empty_ttl {
                return Some(ExpiryReason::Empty);
            }
        }

        if !running && now.saturating_duration_since(self.last_activity) >= self.inactive_ttl {
            return Some(ExpiryReason::Inactive);
        }

        None
    }
}

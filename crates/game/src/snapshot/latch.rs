use super::GameEvents;

/// OR-accumulates events between two broadcasts.
#[derive(Debug, Default, Clone, Copy)]
pub struct EventLatch {
    pending: GameEvents,
}

impl EventLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, events: GameEvents) {
        self.pending |= events;
    }

    pub fn pending(&self) -> GameEvents {
        self.pending
    }

    /// Returns everything latched so far and clears the latch.
    pub fn take(&mut self) -> GameEvents {
        std::mem::take(&mut self.pending)
    }
}

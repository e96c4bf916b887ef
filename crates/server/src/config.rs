use std::time::Duration;

use rink::GameConfig;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub idle_tick_rate: u32,
    pub snapshot_rate: u32,
    pub idle_snapshot_rate: u32,
    pub empty_ttl: Duration,
    pub inactive_ttl: Duration,
    pub outbound_capacity: usize,
    /// Physics constants; `game.tick_rate` is the running tick rate.
    pub game: GameConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            idle_tick_rate: 10,
            snapshot_rate: 30,
            idle_snapshot_rate: 5,
            empty_ttl: Duration::from_secs(60),
            inactive_ttl: Duration::from_secs(15 * 60),
            outbound_capacity: 256,
            game: GameConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn tick_rate(&self) -> u32 {
        self.game.tick_rate
    }
}

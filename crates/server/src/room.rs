use std::time::Duration;

use rink::{
    ControlAction, ExpiryReason, GameEvents, RoomLifecycle, RoomSimulation, ServerMessage, Side,
    SnapshotBroadcaster, StagedControl, TickClock,
};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::channel::SharedChannel;
use crate::config::ServerConfig;
use crate::events::{RoomEvent, unix_millis};

/// Membership and control changes sent from the registry to a room task.
pub enum RoomCommand {
    Attach { side: Side, channel: SharedChannel },
    Detach { side: Side },
    Control(ControlAction),
}

fn slot(side: Side) -> usize {
    match side {
        Side::Left => 0,
        Side::Right => 1,
    }
}

/// Timer loop owning one room's simulation.
///
/// Connection handlers never touch the simulation: they replace the staged
/// control in a watch channel, and the loop reads the latest value once per
/// tick.
pub struct RoomTask {
    code: String,
    id: u64,
    sim: RoomSimulation,
    clock: TickClock,
    broadcaster: SnapshotBroadcaster,
    lifecycle: RoomLifecycle,
    members: [Option<SharedChannel>; 2],
    staged: [watch::Receiver<StagedControl>; 2],
    commands: mpsc::UnboundedReceiver<RoomCommand>,
    events: mpsc::UnboundedSender<RoomEvent>,
    last_tick: Instant,
}

impl RoomTask {
    pub fn spawn(
        code: String,
        id: u64,
        config: &ServerConfig,
        host: SharedChannel,
        staged: [watch::Receiver<StagedControl>; 2],
        commands: mpsc::UnboundedReceiver<RoomCommand>,
        events: mpsc::UnboundedSender<RoomEvent>,
    ) -> JoinHandle<()> {
        let now = Instant::now();
        let task = Self {
            code,
            id,
            sim: RoomSimulation::new(config.game.clone()),
            clock: TickClock::new(config.tick_rate(), config.idle_tick_rate),
            broadcaster: SnapshotBroadcaster::new(config.snapshot_rate, config.idle_snapshot_rate),
            lifecycle: RoomLifecycle::new(now.into_std(), config.empty_ttl, config.inactive_ttl),
            members: [Some(host), None],
            staged,
            commands,
            events,
            last_tick: now,
        };
        tokio::spawn(task.run())
    }

    async fn run(mut self) {
        let mut running = self.sim.running();
        let mut ticker = room_interval(self.clock.period(running));

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Some(reason) = self.tick(Instant::now()) {
                        self.expire(reason);
                        return;
                    }
                }
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        return;
                    };
                    self.apply(command, Instant::now());
                }
            }

            if self.sim.running() != running {
                running = self.sim.running();
                ticker = room_interval(self.clock.period(running));
                self.clock.reset();
                self.last_tick = Instant::now();
            }
        }
    }

    fn tick(&mut self, now: Instant) -> Option<ExpiryReason> {
        let elapsed = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;
        self.clock.accumulate(elapsed.as_secs_f32());

        self.consume_staged(now);

        let mut events = GameEvents::empty();
        while self.clock.consume_tick() {
            events |= self.sim.step();
        }

        let running = self.sim.running();
        if let Some((time, events)) = self.broadcaster.observe(events, unix_millis(), running) {
            let snapshot = self.sim.snapshot(time, events);
            self.broadcast(ServerMessage::State { payload: snapshot });
        }

        self.lifecycle.expiry(now.into_std(), running)
    }

    fn consume_staged(&mut self, now: Instant) {
        for side in [Side::Left, Side::Right] {
            let staged = &mut self.staged[slot(side)];
            if staged.has_changed().unwrap_or(false) {
                self.lifecycle.touch(now.into_std());
            }
            let control = *staged.borrow_and_update();
            self.sim.stage(side, control);
        }
    }

    fn apply(&mut self, command: RoomCommand, now: Instant) {
        self.lifecycle.touch(now.into_std());
        match command {
            RoomCommand::Attach { side, channel } => {
                self.members[slot(side)] = Some(channel);
                self.sim.clear_side(side);
                self.broadcaster.expedite();
            }
            RoomCommand::Detach { side } => {
                self.members[slot(side)] = None;
                self.sim.clear_side(side);
                if self.sim.running() {
                    self.sim.toggle();
                    log::info!("room {} paused: {side} left", self.code);
                }
                self.broadcaster.expedite();
            }
            RoomCommand::Control(ControlAction::Toggle) => {
                self.sim.toggle();
                log::info!("room {} {}", self.code, self.sim.status());
                self.broadcaster.expedite();
            }
            RoomCommand::Control(ControlAction::Reset) => {
                self.sim.reset();
                log::info!("room {} reset", self.code);
                self.broadcaster.expedite();
            }
        }

        let occupied = self.members.iter().flatten().count();
        self.lifecycle.set_occupancy(occupied, now.into_std());
    }

    fn broadcast(&self, message: ServerMessage) {
        for member in self.members.iter().flatten() {
            member.send(message.clone());
        }
    }

    fn expire(&mut self, reason: ExpiryReason) {
        // refuse further commands, but still notify a guest whose attach
        // was already queued
        self.commands.close();
        while let Ok(command) = self.commands.try_recv() {
            if let RoomCommand::Attach { side, channel } = command {
                self.members[slot(side)] = Some(channel);
            }
        }

        log::info!("room {} expired ({reason})", self.code);
        self.broadcast(ServerMessage::RoomExpired {
            reason: reason.as_str().to_string(),
        });
        for member in self.members.iter_mut().filter_map(Option::take) {
            member.close();
        }
        let _ = self.events.send(RoomEvent::Expired {
            code: self.code.clone(),
            room_id: self.id,
            reason,
        });
    }
}

fn room_interval(period: Duration) -> Interval {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

use std::sync::Mutex;

use rapier2d::prelude::*;

use crate::snapshot::GameEvents;

/// Tag stored in each collider's `user_data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ColliderTag {
    Wall = 1,
    Paddle = 2,
    Puck = 3,
}

impl ColliderTag {
    pub fn user_data(self) -> u128 {
        self as u128
    }

    pub fn from_user_data(data: u128) -> Option<Self> {
        match data {
            1 => Some(Self::Wall),
            2 => Some(Self::Paddle),
            3 => Some(Self::Puck),
            _ => None,
        }
    }
}

/// Collects started contact pairs during a pipeline step.
#[derive(Default)]
pub(crate) struct ContactCollector {
    started: Mutex<Vec<(ColliderHandle, ColliderHandle)>>,
}

impl ContactCollector {
    /// Drains the pairs gathered by the last step and classifies them.
    pub fn drain(&mut self, colliders: &ColliderSet) -> GameEvents {
        let pairs = match self.started.get_mut() {
            Ok(pairs) => std::mem::take(pairs),
            Err(poisoned) => std::mem::take(poisoned.into_inner()),
        };

        let tag = |handle: ColliderHandle| {
            colliders
                .get(handle)
                .and_then(|c| ColliderTag::from_user_data(c.user_data))
        };

        pairs
            .into_iter()
            .fold(GameEvents::empty(), |events, (a, b)| {
                events | classify(tag(a), tag(b))
            })
    }
}

fn classify(a: Option<ColliderTag>, b: Option<ColliderTag>) -> GameEvents {
    match (a, b) {
        (Some(ColliderTag::Puck), Some(ColliderTag::Wall))
        | (Some(ColliderTag::Wall), Some(ColliderTag::Puck)) => GameEvents::WALL,
        (Some(ColliderTag::Puck), Some(ColliderTag::Paddle))
        | (Some(ColliderTag::Paddle), Some(ColliderTag::Puck)) => GameEvents::PADDLE,
        _ => GameEvents::empty(),
    }
}

impl EventHandler for ContactCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        if !event.started() {
            return;
        }
        if let Ok(mut started) = self.started.lock() {
            started.push((event.collider1(), event.collider2()));
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

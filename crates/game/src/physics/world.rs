use glam::Vec2;
use rapier2d::prelude::*;

use super::ColliderTag;
use super::events::ContactCollector;
use crate::arena::{ArenaBounds, GameConfig, Side};
use crate::snapshot::GameEvents;

/// Rigid-body world of one arena: six wall segments, two kinematic paddles
/// and a CCD-enabled puck.
///
/// Callers work in pixels; bodies live in meters.
pub struct ArenaPhysics {
    pipeline: PhysicsPipeline,
    integration_parameters: IntegrationParameters,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    gravity: Vector,
    collector: ContactCollector,
    left: RigidBodyHandle,
    right: RigidBodyHandle,
    puck: RigidBodyHandle,
    scale: Real,
}

impl ArenaPhysics {
    pub fn new(config: &GameConfig) -> Self {
        let dt = config.fixed_dt();
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = dt;
        integration_parameters.min_ccd_dt = dt / 100.0;

        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();
        let scale = config.meters_per_pixel;

        add_walls(&mut colliders, config, scale);

        let left = add_paddle(&mut bodies, &mut colliders, config, config.left_start, scale);
        let right = add_paddle(&mut bodies, &mut colliders, config, config.right_start, scale);
        let puck = add_puck(&mut bodies, &mut colliders, config, scale);

        Self {
            pipeline: PhysicsPipeline::new(),
            integration_parameters,
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies,
            colliders,
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            gravity: Vector::new(0.0, 0.0),
            collector: ContactCollector::default(),
            left,
            right,
            puck,
            scale,
        }
    }

    /// Advances one fixed step and returns the puck contacts that started
    /// during it.
    pub fn step_once(&mut self) -> GameEvents {
        self.pipeline.step(
            self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &self.collector,
        );

        self.collector.drain(&self.colliders)
    }

    fn paddle_handle(&self, side: Side) -> RigidBodyHandle {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    fn to_world(&self, px: Vec2) -> Vector {
        Vector::new(px.x * self.scale, px.y * self.scale)
    }

    fn to_pixel(&self, x: Real, y: Real) -> Vec2 {
        Vec2::new(x / self.scale, y / self.scale)
    }

    pub fn paddle_position(&self, side: Side) -> Vec2 {
        self.bodies
            .get(self.paddle_handle(side))
            .map(|b| {
                let t = b.translation();
                self.to_pixel(t.x, t.y)
            })
            .unwrap_or_default()
    }

    /// Schedules the paddle to reach `target` at the end of the next step.
    pub fn move_paddle(&mut self, side: Side, target: Vec2) {
        let next = self.to_world(target);
        if let Some(body) = self.bodies.get_mut(self.paddle_handle(side)) {
            body.set_next_kinematic_translation(next);
        }
    }

    /// Teleports the paddle without sweeping through the space between.
    pub fn place_paddle(&mut self, side: Side, position: Vec2) {
        let translation = self.to_world(position);
        if let Some(body) = self.bodies.get_mut(self.paddle_handle(side)) {
            body.set_translation(translation, true);
            body.set_next_kinematic_translation(translation);
        }
    }

    pub fn puck_position(&self) -> Vec2 {
        self.bodies
            .get(self.puck)
            .map(|b| {
                let t = b.translation();
                self.to_pixel(t.x, t.y)
            })
            .unwrap_or_default()
    }

    /// Puck velocity in pixels per second.
    pub fn puck_velocity(&self) -> Vec2 {
        self.bodies
            .get(self.puck)
            .map(|b| {
                let v = b.linvel();
                self.to_pixel(v.x, v.y)
            })
            .unwrap_or_default()
    }

    pub fn place_puck(&mut self, position: Vec2, velocity: Vec2) {
        let translation = self.to_world(position);
        let linvel = self.to_world(velocity);
        if let Some(body) = self.bodies.get_mut(self.puck) {
            body.set_translation(translation, true);
            body.set_linvel(linvel, true);
            body.set_angvel(0.0, true);
        }
    }

    /// Rescales the puck velocity down to `max_speed` pixels per second.
    /// Returns whether the cap applied.
    pub fn clamp_puck_speed(&mut self, max_speed: f32) -> bool {
        let velocity = self.puck_velocity();
        let speed = velocity.length();
        if speed <= max_speed || speed == 0.0 {
            return false;
        }

        let capped = self.to_world(velocity * (max_speed / speed));
        if let Some(body) = self.bodies.get_mut(self.puck) {
            body.set_linvel(capped, true);
        }
        true
    }
}

/// Top and bottom rails plus the four end walls around the goal mouths.
/// No pocket geometry behind the goal lines: a puck crossing a goal line is
/// scored on that same step.
fn add_walls(colliders: &mut ColliderSet, config: &GameConfig, scale: Real) {
    let bounds = ArenaBounds::from(config);
    let p = |x: f32, y: f32| Vector::new(x * scale, y * scale);

    let segments = [
        (p(bounds.min_x, bounds.min_y), p(bounds.max_x, bounds.min_y)),
        (p(bounds.min_x, bounds.max_y), p(bounds.max_x, bounds.max_y)),
        (p(bounds.min_x, bounds.min_y), p(bounds.min_x, bounds.goal_top)),
        (p(bounds.min_x, bounds.goal_bottom), p(bounds.min_x, bounds.max_y)),
        (p(bounds.max_x, bounds.min_y), p(bounds.max_x, bounds.goal_top)),
        (p(bounds.max_x, bounds.goal_bottom), p(bounds.max_x, bounds.max_y)),
    ];

    for (a, b) in segments {
        let collider = ColliderBuilder::segment(a, b)
            .restitution(config.wall_restitution)
            .friction(0.0)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .user_data(ColliderTag::Wall.user_data())
            .build();
        colliders.insert(collider);
    }
}

fn add_paddle(
    bodies: &mut RigidBodySet,
    colliders: &mut ColliderSet,
    config: &GameConfig,
    start: Vec2,
    scale: Real,
) -> RigidBodyHandle {
    let body = RigidBodyBuilder::kinematic_position_based()
        .translation(Vector::new(start.x * scale, start.y * scale))
        .build();
    let handle = bodies.insert(body);

    let collider = ColliderBuilder::ball(config.paddle_radius * scale)
        .restitution(config.paddle_restitution)
        .friction(0.0)
        .active_events(ActiveEvents::COLLISION_EVENTS)
        .user_data(ColliderTag::Paddle.user_data())
        .build();
    colliders.insert_with_parent(collider, handle, bodies);

    handle
}

fn add_puck(
    bodies: &mut RigidBodySet,
    colliders: &mut ColliderSet,
    config: &GameConfig,
    scale: Real,
) -> RigidBodyHandle {
    let start = config.puck_start;
    let body = RigidBodyBuilder::dynamic()
        .translation(Vector::new(start.x * scale, start.y * scale))
        .linear_damping(config.puck_damping)
        .ccd_enabled(true)
        .build();
    let handle = bodies.insert(body);

    let collider = ColliderBuilder::ball(config.puck_radius * scale)
        .restitution(config.puck_restitution)
        .friction(0.0)
        .active_events(ActiveEvents::COLLISION_EVENTS)
        .user_data(ColliderTag::Puck.user_data())
        .build();
    colliders.insert_with_parent(collider, handle, bodies);

    handle
}

#[cfg(test)]
mod tests {
    use super::*;

    fn physics() -> ArenaPhysics {
        ArenaPhysics::new(&GameConfig::default())
    }

    #[test]
    fn bodies_start_at_configured_positions() {
        let world = physics();
        assert!((world.paddle_position(Side::Left) - Vec2::new(140.0, 260.0)).length() < 1e-3);
        assert!((world.paddle_position(Side::Right) - Vec2::new(760.0, 260.0)).length() < 1e-3);
        assert!((world.puck_position() - Vec2::new(450.0, 260.0)).length() < 1e-3);
    }

    #[test]
    fn resting_puck_stays_put_without_events() {
        let mut world = physics();
        for _ in 0..30 {
            assert!(world.step_once().is_empty());
        }
        assert!((world.puck_position() - Vec2::new(450.0, 260.0)).length() < 1e-3);
    }

    #[test]
    fn kinematic_paddle_reaches_target_after_one_step() {
        let mut world = physics();
        world.move_paddle(Side::Left, Vec2::new(146.8, 260.0));
        world.step_once();
        assert!((world.paddle_position(Side::Left).x - 146.8).abs() < 1e-2);
    }

    #[test]
    fn puck_bounces_off_top_wall_with_wall_event() {
        let mut world = physics();
        world.place_puck(Vec2::new(450.0, 100.0), Vec2::new(0.0, -600.0));

        let mut events = GameEvents::empty();
        for _ in 0..30 {
            events |= world.step_once();
        }

        assert!(events.contains(GameEvents::WALL));
        assert!(world.puck_velocity().y > 0.0);
        assert!(world.puck_position().y > 40.0);
    }

    #[test]
    fn fast_puck_does_not_tunnel_through_wall() {
        let mut world = physics();
        world.place_puck(Vec2::new(450.0, 80.0), Vec2::new(0.0, -6000.0));
        for _ in 0..10 {
            world.step_once();
            assert!(world.puck_position().y > 30.0);
        }
    }

    #[test]
    fn puck_hitting_paddle_reports_paddle_event() {
        let mut world = physics();
        world.place_puck(Vec2::new(300.0, 260.0), Vec2::new(-600.0, 0.0));

        let mut events = GameEvents::empty();
        for _ in 0..30 {
            events |= world.step_once();
        }

        assert!(events.contains(GameEvents::PADDLE));
        assert!(world.puck_velocity().x > 0.0);
    }

    #[test]
    fn speed_cap_preserves_direction() {
        let mut world = physics();
        world.place_puck(Vec2::new(450.0, 260.0), Vec2::new(3000.0, 4000.0));
        assert!(world.clamp_puck_speed(1200.0));

        let v = world.puck_velocity();
        assert!((v.length() - 1200.0).abs() < 0.5);
        assert!((v.x / v.y - 0.75).abs() < 1e-3);
        assert!(!world.clamp_puck_speed(1200.0));
    }
}

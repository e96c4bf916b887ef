mod events;
mod world;

pub use events::ColliderTag;
pub use world::ArenaPhysics;

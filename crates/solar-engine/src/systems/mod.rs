//! Reference components and systems.
//!
//! These cover the simulation side that every game built on the engine needs
//! and double as examples of writing a [`System`](solar_ecs::system::System).

pub mod lifetime;
pub mod motion;

use solar_ecs::manager::Manager;

pub use lifetime::{Lifetime, LifetimeSystem, LIFETIME_RESET_EVENT};
pub use motion::{MotionSystem, Position, Velocity};

/// Register the reference component types on `manager`.
pub fn register_components(manager: &mut Manager) {
    manager.register_serializable::<Position>("position");
    manager.register_serializable::<Velocity>("velocity");
    manager.register_serializable::<Lifetime>("lifetime");
}

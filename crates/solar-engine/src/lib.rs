//! Solar Engine -- fixed-timestep driver around the [`solar_ecs`] core.
//!
//! The ECS core only stores components and dispatches systems when asked.
//! This crate supplies the loop that asks: a [`GameLoop`](game_loop::GameLoop)
//! owning a [`Manager`](solar_ecs::manager::Manager), fed by frame time and
//! queued events, configured by an [`EngineConfig`](config::EngineConfig).
//!
//! # Quick Start
//!
//! ```
//! use solar_engine::prelude::*;
//!
//! let mut manager = Manager::new();
//! register_components(&mut manager);
//! manager.add_system(Box::new(MotionSystem::new()));
//!
//! let e = manager.create();
//! manager.add(e, Position { x: 0.0, y: 0.0 }).unwrap();
//! manager.add(e, Velocity { dx: 60.0, dy: 0.0 }).unwrap();
//!
//! let mut game = GameLoop::new(manager, EngineConfig::default()).unwrap();
//! game.run_ticks(60);
//!
//! let x = game.manager().get::<Position>(e).x;
//! assert!((x - 60.0).abs() < 1e-9);
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod game_loop;
pub mod logging;
pub mod systems;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the ECS crate for convenience.
pub use solar_ecs;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use solar_ecs::prelude::*;

    pub use crate::config::{ConfigError, EngineConfig};
    pub use crate::game_loop::{GameLoop, TickDiagnostics};
    pub use crate::logging::init_logging;
    pub use crate::systems::{
        register_components, Lifetime, LifetimeSystem, MotionSystem, Position, Velocity,
        LIFETIME_RESET_EVENT,
    };
}

//! Linear motion: `Position += Velocity * dt`.

use serde::{Deserialize, Serialize};
use solar_ecs::manager::Manager;
use solar_ecs::system::{DeltaTime, Event, System};

/// Name the motion system reports.
pub const MOTION_SYSTEM_NAME: &str = "motion";

/// 2D position component.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

/// 2D velocity component, in units per second.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity {
    /// Horizontal velocity.
    pub dx: f64,
    /// Vertical velocity.
    pub dy: f64,
}

/// Integrates every entity that has both a [`Position`] and a [`Velocity`].
///
/// A `"motion.pause"` event stops integration until `"motion.resume"`.
#[derive(Debug, Default)]
pub struct MotionSystem {
    paused: bool,
}

impl MotionSystem {
    /// A running motion system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether integration is currently paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

impl System for MotionSystem {
    fn name(&self) -> &str {
        MOTION_SYSTEM_NAME
    }

    fn event(&mut self, event: &Event) {
        if event.is("motion.pause") {
            self.paused = true;
        } else if event.is("motion.resume") {
            self.paused = false;
        }
    }

    fn update(&mut self, dt: DeltaTime, manager: &mut Manager) {
        if self.paused {
            return;
        }
        manager.operate2::<Position, Velocity, _>(|_, pos, vel| {
            pos.x += vel.dx * dt;
            pos.y += vel.dy * dt;
        });
    }
}

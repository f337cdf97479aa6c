//! Entities that expire after a fixed amount of simulated time.

use serde::{Deserialize, Serialize};
use solar_ecs::entity::Entity;
use solar_ecs::manager::Manager;
use solar_ecs::system::{DeltaTime, Event, System};

/// Event that makes [`LifetimeSystem`] restore every lifetime to its initial
/// value.
pub const LIFETIME_RESET_EVENT: &str = "lifetime.reset";

/// Remaining time before the owning entity is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lifetime {
    /// Seconds left.
    pub remaining: f64,
    /// Seconds the entity started with.
    pub initial: f64,
}

impl Lifetime {
    /// A lifetime of `seconds`.
    pub fn new(seconds: f64) -> Self {
        Self {
            remaining: seconds,
            initial: seconds,
        }
    }
}

/// Counts down every [`Lifetime`] and destroys entities whose time is up.
#[derive(Debug, Default)]
pub struct LifetimeSystem {
    reset_requested: bool,
    expired_total: u64,
}

impl LifetimeSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entities destroyed by this system so far.
    pub fn expired_total(&self) -> u64 {
        self.expired_total
    }
}

impl System for LifetimeSystem {
    fn name(&self) -> &str {
        "lifetime"
    }

    fn event(&mut self, event: &Event) {
        if event.is(LIFETIME_RESET_EVENT) {
            tracing::debug!("lifetime reset requested");
            self.reset_requested = true;
        }
    }

    fn update(&mut self, dt: DeltaTime, manager: &mut Manager) {
        let reset = std::mem::take(&mut self.reset_requested);
        let mut expired: Vec<Entity> = Vec::new();
        manager.operate::<Lifetime, _>(|entity, life| {
            if reset {
                life.remaining = life.initial;
            }
            life.remaining -= dt;
            if life.remaining <= 0.0 {
                expired.push(entity);
            }
        });

        // Destroy after iteration: removal reorders the dense arrays.
        for entity in &expired {
            manager.destroy(*entity);
        }
        if !expired.is_empty() {
            tracing::debug!(count = expired.len(), "lifetimes expired");
        }
        self.expired_total += expired.len() as u64;
    }
}

//! Fixed-timestep game loop driving a [`Manager`].
//!
//! Each tick:
//!
//! 1. Events queued with [`GameLoop::push_event`] are forwarded to every
//!    system through [`Manager::event`], in the order they were pushed.
//! 2. [`Manager::update`] runs every system once with the fixed step.
//! 3. The tick counter advances.
//!
//! [`GameLoop::advance`] feeds real frame time into an accumulator and runs as
//! many fixed ticks as fit, so simulation speed is independent of frame rate.
//!
//! # Example
//!
//! ```
//! use solar_engine::prelude::*;
//!
//! let mut game = GameLoop::new(Manager::new(), EngineConfig::default()).unwrap();
//! game.run_ticks(10);
//! assert_eq!(game.tick_count(), 10);
//! ```

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use solar_ecs::manager::Manager;
use solar_ecs::system::Event;

use crate::config::{ConfigError, EngineConfig};

// ---------------------------------------------------------------------------
// TickDiagnostics
// ---------------------------------------------------------------------------

/// Timing and counts for the last tick.
#[derive(Debug, Clone, Default)]
pub struct TickDiagnostics {
    /// Events forwarded to systems during the tick.
    pub events_dispatched: usize,
    /// Wall-clock time spent dispatching events.
    pub event_time: Duration,
    /// Wall-clock time spent in `Manager::update`.
    pub update_time: Duration,
    /// Total wall-clock time for the tick.
    pub total_time: Duration,
}

// ---------------------------------------------------------------------------
// GameLoop
// ---------------------------------------------------------------------------

/// The external loop that owns a [`Manager`] and ticks it at a fixed rate.
pub struct GameLoop {
    /// The ECS root.
    manager: Manager,
    /// Validated configuration.
    config: EngineConfig,
    /// Events waiting for the next tick.
    pending_events: VecDeque<Event>,
    /// Number of ticks executed so far.
    tick_counter: u64,
    /// Unsimulated frame time carried between `advance` calls.
    accumulator: f64,
    /// Diagnostics from the last tick.
    last_diagnostics: TickDiagnostics,
}

impl std::fmt::Debug for GameLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameLoop")
            .field("tick_counter", &self.tick_counter)
            .field("pending_events", &self.pending_events.len())
            .field("manager", &self.manager)
            .finish()
    }
}

impl GameLoop {
    /// Create a loop around `manager`.
    ///
    /// Fails if `config` does not validate. `config.entity_reserve` is passed
    /// to [`Manager::reserve`].
    pub fn new(mut manager: Manager, config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        if config.entity_reserve > 0 {
            manager.reserve(config.entity_reserve);
        }
        tracing::debug!(
            fixed_dt = config.fixed_dt,
            max_frame_time = config.max_frame_time,
            "game loop created"
        );
        Ok(Self {
            manager,
            config,
            pending_events: VecDeque::new(),
            tick_counter: 0,
            accumulator: 0.0,
            last_diagnostics: TickDiagnostics::default(),
        })
    }

    /// Queue `event` for dispatch at the start of the next tick.
    pub fn push_event(&mut self, event: Event) {
        self.pending_events.push_back(event);
    }

    /// Number of events waiting for the next tick.
    pub fn pending_event_count(&self) -> usize {
        self.pending_events.len()
    }

    /// Execute one fixed tick.
    pub fn tick(&mut self) {
        let tick_start = Instant::now();

        let events_dispatched = self.pending_events.len();
        while let Some(event) = self.pending_events.pop_front() {
            self.manager.event(&event);
        }
        let event_time = tick_start.elapsed();

        let update_start = Instant::now();
        self.manager.update(self.config.fixed_dt);
        let update_time = update_start.elapsed();

        self.tick_counter += 1;
        self.last_diagnostics = TickDiagnostics {
            events_dispatched,
            event_time,
            update_time,
            total_time: tick_start.elapsed(),
        };
        tracing::trace!(
            tick = self.tick_counter,
            events = events_dispatched,
            entities = self.manager.entity_count(),
            "tick complete"
        );
    }

    /// Run `count` ticks back to back.
    pub fn run_ticks(&mut self, count: u64) {
        for _ in 0..count {
            self.tick();
        }
    }

    /// Feed `frame_time` seconds of real time and run every fixed tick that
    /// fits. Returns the number of ticks run.
    ///
    /// Frame time above `max_frame_time` is clamped; negative or non-finite
    /// input is treated as zero.
    pub fn advance(&mut self, frame_time: f64) -> u32 {
        let frame_time = if frame_time.is_finite() && frame_time > 0.0 {
            frame_time
        } else {
            0.0
        };
        if frame_time > self.config.max_frame_time {
            tracing::debug!(
                frame_time,
                clamp = self.config.max_frame_time,
                "frame time clamped"
            );
        }
        self.accumulator += frame_time.min(self.config.max_frame_time);

        let mut ran = 0;
        while self.accumulator >= self.config.fixed_dt {
            self.tick();
            self.accumulator -= self.config.fixed_dt;
            ran += 1;
        }
        ran
    }

    /// Fraction of a fixed step left in the accumulator, in `[0, 1)`. Useful
    /// for interpolating between the last two simulated states.
    pub fn alpha(&self) -> f64 {
        self.accumulator / self.config.fixed_dt
    }

    // -- accessors ----------------------------------------------------------

    /// The number of ticks executed so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// Simulated time in seconds.
    ///
    /// Computed as `tick_count * fixed_dt` to avoid drift from repeated
    /// addition.
    pub fn sim_time(&self) -> f64 {
        self.tick_counter as f64 * self.config.fixed_dt
    }

    /// The fixed time step in seconds per tick.
    pub fn fixed_dt(&self) -> f64 {
        self.config.fixed_dt
    }

    /// The configuration this loop runs with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Read-only access to the ECS root.
    pub fn manager(&self) -> &Manager {
        &self.manager
    }

    /// Mutable access to the ECS root, for setup and tests.
    pub fn manager_mut(&mut self) -> &mut Manager {
        &mut self.manager
    }

    /// Give the manager back, dropping the loop.
    pub fn into_manager(self) -> Manager {
        self.manager
    }

    /// Diagnostics from the last tick.
    pub fn last_diagnostics(&self) -> &TickDiagnostics {
        &self.last_diagnostics
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

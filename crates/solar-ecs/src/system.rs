//! Systems: units of per-frame logic driven by the [`Manager`].

use serde::{Deserialize, Serialize};

use crate::manager::Manager;

/// Seconds elapsed since the previous update, supplied by the game loop.
pub type DeltaTime = f64;

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// An event forwarded to every system by [`Manager::event`].
///
/// The core does not interpret events; `name` identifies the kind and `data`
/// carries an arbitrary payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event kind, e.g. `"key_down"` or `"window.resized"`.
    pub name: String,
    /// Payload. `Null` when the event carries nothing.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Event {
    /// An event with no payload.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: serde_json::Value::Null,
        }
    }

    /// An event carrying `data`.
    pub fn with_data(name: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Whether this event is of kind `name`.
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

/// Logic that runs once per frame over the components held by a [`Manager`].
///
/// Systems are registered with [`Manager::add_system`] and invoked in
/// registration order. The Manager never inspects the concrete type.
pub trait System {
    /// Name used in logs and diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Handle one event.
    fn event(&mut self, event: &Event);

    /// Advance by `dt` seconds. Use `manager` to read and write components.
    fn update(&mut self, dt: DeltaTime, manager: &mut Manager);
}

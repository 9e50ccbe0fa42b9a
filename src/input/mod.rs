//! Input subsystem: from axis readings to key transitions
//!
//! ```text
//! (axis, value) ──► InputStateMachine ──► KeyTransition ──► KeyEmitter ──► KeyInjector
//!                   (recorded intent)                       (held keys)
//! ```
//!
//! Axes 0 and 1 are analog and go through a dead zone, axes 2 and 3 are
//! discrete events that fire momentary pulses.

pub mod emitter;
pub mod state_machine;

pub use emitter::KeyEmitter;
pub use state_machine::InputStateMachine;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Default upper dead-zone boundary
pub const DEFAULT_HIGH: i16 = 30;
/// Default lower dead-zone boundary
pub const DEFAULT_LOW: i16 = -30;

/// The fixed set of keys the controller can drive
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LogicalKey {
    Left,
    Right,
    Forward,
    Back,
    ActionE,
    ActionF,
    ActionR,
    ActionT,
}

impl LogicalKey {
    /// Every key, in the order used by the cleanup sweep
    pub const ALL: [LogicalKey; 8] = [
        LogicalKey::Left,
        LogicalKey::Right,
        LogicalKey::Forward,
        LogicalKey::Back,
        LogicalKey::ActionE,
        LogicalKey::ActionF,
        LogicalKey::ActionR,
        LogicalKey::ActionT,
    ];

    /// Keyboard key this logical key stands for
    pub fn label(self) -> char {
        match self {
            LogicalKey::Left => 'a',
            LogicalKey::Right => 'd',
            LogicalKey::Forward => 'w',
            LogicalKey::Back => 's',
            LogicalKey::ActionE => 'e',
            LogicalKey::ActionF => 'f',
            LogicalKey::ActionR => 'r',
            LogicalKey::ActionT => 't',
        }
    }
}

impl fmt::Display for LogicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.label())
    }
}

/// Request to move a key into the given state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyTransition {
    pub key: LogicalKey,
    pub pressed: bool,
}

impl KeyTransition {
    pub fn press(key: LogicalKey) -> Self {
        Self { key, pressed: true }
    }

    pub fn release(key: LogicalKey) -> Self {
        Self {
            key,
            pressed: false,
        }
    }
}

impl fmt::Display for KeyTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = if self.pressed { "press" } else { "release" };
        write!(f, "{} {}", action, self.key)
    }
}

/// Held status per key. A key without an entry counts as released.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyState {
    held: HashMap<LogicalKey, bool>,
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self, key: LogicalKey) -> bool {
        self.held.get(&key).copied().unwrap_or(false)
    }

    pub(crate) fn set(&mut self, key: LogicalKey, pressed: bool) {
        self.held.insert(key, pressed);
    }

    /// Held keys in [`LogicalKey::ALL`] order
    pub fn held_keys(&self) -> Vec<LogicalKey> {
        LogicalKey::ALL
            .into_iter()
            .filter(|key| self.is_held(*key))
            .collect()
    }

    pub fn any_held(&self) -> bool {
        self.held.values().any(|held| *held)
    }

    pub(crate) fn clear(&mut self) {
        self.held.clear();
    }
}

/// Dead-zone boundaries for the analog axes.
///
/// A reading is directional only when it is strictly above `high` or strictly
/// below `low`; both boundary values themselves are neutral. Doubles as the
/// `[thresholds]` section of the config file, missing fields use the defaults.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub high: i16,
    pub low: i16,
}

impl Thresholds {
    pub fn new(low: i16, high: i16) -> Self {
        Self { high, low }
    }

    /// A dead zone needs `low < high`
    pub fn is_valid(&self) -> bool {
        self.low < self.high
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            high: DEFAULT_HIGH,
            low: DEFAULT_LOW,
        }
    }
}

impl fmt::Display for Thresholds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.low, self.high)
    }
}

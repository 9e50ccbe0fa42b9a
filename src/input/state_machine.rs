//! Derives key transitions from axis readings
//!
//! | axis | reading                 | effect                                  |
//! |------|-------------------------|-----------------------------------------|
//! | 0    | `> high` / `< low`      | Right / Left held, opposite released    |
//! | 0    | `low..=high`            | Left and Right released                 |
//! | 1    | `< low` / `> high`      | Forward / Back held, opposite released  |
//! | 1    | `low..=high`            | Forward and Back released               |
//! | 2    | `0`, `1`, `2`           | pulse ActionF, ActionR, ActionT         |
//! | 3    | anything                | pulse ActionE                           |
//!
//! Everything else (unknown axes, other selector values) is a no-op.
//!
//! On a direction change the opposite key is released before the new one is
//! pressed, not the other way round: two opposing keys are never down at once.

use crate::input::{KeyState, KeyTransition, LogicalKey, Thresholds};
use tracing::{debug, trace};

pub const AXIS_HORIZONTAL: u8 = 0;
pub const AXIS_VERTICAL: u8 = 1;
pub const AXIS_SELECTOR: u8 = 2;
pub const AXIS_ACTION: u8 = 3;

/// Where an analog reading lands relative to the dead zone
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Zone {
    Below,
    Neutral,
    Above,
}

/// Tracks the intended key state and emits only the transitions that change it
#[derive(Debug, Clone)]
pub struct InputStateMachine {
    thresholds: Thresholds,
    state: KeyState,
}

impl InputStateMachine {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            state: KeyState::new(),
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Recorded intent after the last applied reading
    pub fn state(&self) -> &KeyState {
        &self.state
    }

    /// Applies one reading and returns the transitions it requires, in order.
    pub fn apply(&mut self, axis: u8, value: i16) -> Vec<KeyTransition> {
        let mut transitions = Vec::new();

        match axis {
            AXIS_HORIZONTAL => match self.zone(value) {
                Zone::Above => self.hold_one(LogicalKey::Right, LogicalKey::Left, &mut transitions),
                Zone::Below => self.hold_one(LogicalKey::Left, LogicalKey::Right, &mut transitions),
                Zone::Neutral => {
                    self.release_pair(LogicalKey::Left, LogicalKey::Right, &mut transitions)
                }
            },
            AXIS_VERTICAL => match self.zone(value) {
                Zone::Below => {
                    self.hold_one(LogicalKey::Forward, LogicalKey::Back, &mut transitions)
                }
                Zone::Above => {
                    self.hold_one(LogicalKey::Back, LogicalKey::Forward, &mut transitions)
                }
                Zone::Neutral => {
                    self.release_pair(LogicalKey::Forward, LogicalKey::Back, &mut transitions)
                }
            },
            AXIS_SELECTOR => match value {
                0 => self.pulse(LogicalKey::ActionF, &mut transitions),
                1 => self.pulse(LogicalKey::ActionR, &mut transitions),
                2 => self.pulse(LogicalKey::ActionT, &mut transitions),
                other => trace!("Ignoring selector value {}", other),
            },
            AXIS_ACTION => self.pulse(LogicalKey::ActionE, &mut transitions),
            unknown => trace!("Ignoring unknown axis {} (value {})", unknown, value),
        }

        if !transitions.is_empty() {
            debug!("Axis {} = {} -> {:?}", axis, value, transitions);
        }
        transitions
    }

    fn zone(&self, value: i16) -> Zone {
        if value > self.thresholds.high {
            Zone::Above
        } else if value < self.thresholds.low {
            Zone::Below
        } else {
            Zone::Neutral
        }
    }

    // Release first so the pair is never held together, not even between two calls
    fn hold_one(&mut self, key: LogicalKey, opposite: LogicalKey, out: &mut Vec<KeyTransition>) {
        self.ensure(opposite, false, out);
        self.ensure(key, true, out);
    }

    fn release_pair(&mut self, first: LogicalKey, second: LogicalKey, out: &mut Vec<KeyTransition>) {
        self.ensure(first, false, out);
        self.ensure(second, false, out);
    }

    fn ensure(&mut self, key: LogicalKey, pressed: bool, out: &mut Vec<KeyTransition>) {
        if self.state.is_held(key) != pressed {
            self.state.set(key, pressed);
            out.push(KeyTransition { key, pressed });
        }
    }

    /// Momentary press and release. Not filtered: every occurrence fires.
    fn pulse(&mut self, key: LogicalKey, out: &mut Vec<KeyTransition>) {
        out.push(KeyTransition::press(key));
        out.push(KeyTransition::release(key));
        self.state.set(key, false);
    }
}

impl Default for InputStateMachine {
    fn default() -> Self {
        Self::new(Thresholds::default())
    }
}

//! Applies key transitions to an injector
//!
//! The emitter keeps its own record of which keys the injector has actually
//! been told to hold. That record is the last idempotency check before the
//! backend and the source of truth for the cleanup sweep.

use crate::injector::{InjectorError, KeyInjector};
use crate::input::{KeyState, KeyTransition, LogicalKey};
use tracing::{debug, info, warn};

pub struct KeyEmitter<I: KeyInjector> {
    injector: I,
    held: KeyState,
    emitted: u64,
}

impl<I: KeyInjector> KeyEmitter<I> {
    pub fn new(injector: I) -> Self {
        Self {
            injector,
            held: KeyState::new(),
            emitted: 0,
        }
    }

    /// Keys confirmed as held by the injector
    pub fn held(&self) -> &KeyState {
        &self.held
    }

    /// Number of injector calls that went through
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Applies a single transition. Requests matching the held status are dropped.
    pub fn emit(&mut self, transition: KeyTransition) -> Result<(), InjectorError> {
        let KeyTransition { key, pressed } = transition;

        if self.held.is_held(key) == pressed {
            debug!("Dropping duplicate request: {}", transition);
            return Ok(());
        }

        if pressed {
            self.injector.press(key)?;
        } else {
            self.injector.release(key)?;
        }

        self.held.set(key, pressed);
        self.emitted += 1;
        Ok(())
    }

    /// Applies transitions in order, stopping at the first injector failure
    pub fn emit_all(&mut self, transitions: &[KeyTransition]) -> Result<(), InjectorError> {
        for transition in transitions {
            self.emit(*transition)?;
        }
        Ok(())
    }

    /// Releases every held key once, in [`LogicalKey::ALL`] order, and clears
    /// the held state.
    ///
    /// A failed release is logged and the sweep moves on; the key counts as
    /// released afterwards. Returns the keys a release was issued for.
    pub fn cleanup(&mut self) -> Vec<LogicalKey> {
        let held = self.held.held_keys();
        if held.is_empty() {
            debug!("Cleanup sweep: no keys held");
            return held;
        }

        info!(
            "Cleanup sweep: releasing {} held key(s) via {}",
            held.len(),
            self.injector.name()
        );
        for key in &held {
            match self.injector.release(*key) {
                Ok(()) => self.emitted += 1,
                Err(e) => warn!("Release of {} failed during cleanup: {}", key, e),
            }
        }

        self.held.clear();
        held
    }
}

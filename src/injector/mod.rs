//! Key injection backends
//!
//! The core never talks to the operating system directly. It hands press and
//! release requests to a [`KeyInjector`]:
//!
//! - [`LogInjector`] - writes every request to the log, used by the CLI
//! - [`RecordingInjector`] - records calls in memory for tests

pub mod recording;

pub use recording::{InjectorCall, RecordingInjector};

use crate::input::LogicalKey;
use tracing::info;

/// Failures reported by an injection backend
#[derive(Debug, thiserror::Error)]
pub enum InjectorError {
    #[error("Failed to press {key}: {reason}")]
    PressFailed { key: LogicalKey, reason: String },

    #[error("Failed to release {key}: {reason}")]
    ReleaseFailed { key: LogicalKey, reason: String },
}

/// Capability to press and release logical keys
pub trait KeyInjector {
    fn press(&mut self, key: LogicalKey) -> Result<(), InjectorError>;

    fn release(&mut self, key: LogicalKey) -> Result<(), InjectorError>;

    fn name(&self) -> &str;
}

impl<I: KeyInjector + ?Sized> KeyInjector for Box<I> {
    fn press(&mut self, key: LogicalKey) -> Result<(), InjectorError> {
        (**self).press(key)
    }

    fn release(&mut self, key: LogicalKey) -> Result<(), InjectorError> {
        (**self).release(key)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Backend that only logs the requested key changes
#[derive(Debug, Default)]
pub struct LogInjector {
    presses: u64,
    releases: u64,
}

impl LogInjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presses(&self) -> u64 {
        self.presses
    }

    pub fn releases(&self) -> u64 {
        self.releases
    }
}

impl KeyInjector for LogInjector {
    fn press(&mut self, key: LogicalKey) -> Result<(), InjectorError> {
        self.presses += 1;
        info!("Key down: {}", key.label());
        Ok(())
    }

    fn release(&mut self, key: LogicalKey) -> Result<(), InjectorError> {
        self.releases += 1;
        info!("Key up: {}", key.label());
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

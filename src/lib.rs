//! joykeys - turns the serial frame stream of an analog joystick controller
//! into logical key presses and releases.
//!
//! ```text
//! bytes ──► FrameReader ──► Frame ──► InputStateMachine ──► KeyTransition ──► KeyEmitter ──► KeyInjector
//! ```

pub mod config;
pub mod injector;
pub mod input;
pub mod protocol;
pub mod session;
pub mod transport;

pub use injector::{InjectorCall, InjectorError, KeyInjector, LogInjector, RecordingInjector};
pub use input::{InputStateMachine, KeyEmitter, KeyState, KeyTransition, LogicalKey, Thresholds};
pub use protocol::{decode, Frame, FrameReader};
pub use session::{Session, SessionEnd, SessionError, SessionHandle, SessionReport};
pub use transport::{ByteSource, ReadSource, SerialSource, TransportError};

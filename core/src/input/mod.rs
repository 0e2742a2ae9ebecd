//! Synthetic input: backend capability trait and the command emitter.
//!
//! The battle machine speaks in abstract commands ("select skill position
//! 2", "click Continue"); the emitter translates them into backend calls
//! using the configured UI layout. Which backend actually delivers the
//! clicks (window messages vs. OS cursor) is chosen at startup from
//! configuration and hidden behind one trait.

mod emitter;

pub use emitter::{Command, CommandEmitter, Emitter};

use critbot_types::Point;
use thiserror::Error;

/// Keys the bot may press (skill hotkeys and dialog shortcuts).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Digit(u8),
    Enter,
    Escape,
}

/// Errors from the input injection backend. Dispatch failure is fatal for
/// the current encounter only; the run loop decides whether to go on.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("target window is gone")]
    WindowGone,

    #[error("backend rejected {action}: {detail}")]
    Dispatch { action: &'static str, detail: String },

    #[error("backend does not support {action}")]
    Unsupported { action: &'static str },
}

/// Low-level input capability, implemented by the injection backends.
pub trait InputBackend: Send {
    fn click(&mut self, point: Point) -> Result<(), InputError>;
    fn key_press(&mut self, key: Key) -> Result<(), InputError>;
    fn move_and_click(&mut self, x: i32, y: i32) -> Result<(), InputError>;
}

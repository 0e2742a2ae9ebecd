//! Command emitter: abstract battle commands to backend input calls.

use std::time::Duration;

use critbot_types::{PacingSettings, UiLayout};

use super::{InputBackend, InputError};

/// Abstract commands the battle machine can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    OpenPage(u8),
    SelectSkill(u8),
    Capture,
    Keep,
    Continue,
    Flee,
}

/// Command-level input surface the battle machine drives. The production
/// implementation is [`CommandEmitter`]; tests substitute a recorder.
pub trait Emitter {
    fn emit(&mut self, command: Command) -> Result<(), InputError>;
}

/// Translates commands into clicks at the configured layout points,
/// applying the configured pacing delays.
pub struct CommandEmitter {
    backend: Box<dyn InputBackend>,
    layout: UiLayout,
    pacing: PacingSettings,
}

impl CommandEmitter {
    pub fn new(backend: Box<dyn InputBackend>, layout: UiLayout, pacing: PacingSettings) -> Self {
        Self {
            backend,
            layout,
            pacing,
        }
    }

    fn settle(&self, ms: u64) {
        if ms > 0 {
            std::thread::sleep(Duration::from_millis(ms));
        }
    }
}

impl Emitter for CommandEmitter {
    fn emit(&mut self, command: Command) -> Result<(), InputError> {
        tracing::debug!(?command, "emitting input command");
        match command {
            Command::OpenPage(page) => {
                debug_assert!((1..=3).contains(&page));
                let point = self.layout.page_tabs[(page - 1) as usize];
                self.backend.click(point)?;
                // Page flips animate; give the tiles time to land.
                self.settle(self.pacing.page_settle_ms);
            }
            Command::SelectSkill(position) => {
                debug_assert!(position < 4);
                let point = self.layout.skill_tiles[position as usize];
                self.backend.click(point)?;
                self.settle(self.pacing.click_delay_ms);
            }
            Command::Capture => {
                self.backend.click(self.layout.capture_button)?;
                self.settle(self.pacing.click_delay_ms);
            }
            Command::Keep => {
                self.backend.click(self.layout.keep_button)?;
                self.settle(self.pacing.click_delay_ms);
            }
            Command::Continue => {
                self.backend.click(self.layout.continue_button)?;
                self.settle(self.pacing.click_delay_ms);
            }
            Command::Flee => {
                self.backend.click(self.layout.flee_button)?;
                self.settle(self.pacing.click_delay_ms);
            }
        }
        Ok(())
    }
}

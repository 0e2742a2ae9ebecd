//! Perception adapter interface.
//!
//! Screen capture, template matching, and OCR live outside this crate; the
//! battle core only ever asks three typed questions about the screen. Any
//! failure answering them is a detection failure and is recovered locally
//! by the caller (treated as "signal absent"), never a fatal error.

use critbot_types::Rect;
use thiserror::Error;

/// Visual cues the battle machine polls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateId {
    /// Run button / skill bar; presence means a battle is on screen.
    BattleHud,
    /// "It's your turn" indicator.
    TurnReady,
    /// Keep/Release dialog after a successful capture.
    CaptureDialog,
    /// Continue button / victory banner.
    ContinueButton,
}

/// Errors from the perception backend.
#[derive(Debug, Error)]
pub enum PerceptionError {
    #[error("screen capture failed: {0}")]
    Capture(String),

    #[error("template {template:?} not loaded")]
    TemplateMissing { template: TemplateId },

    #[error("OCR backend unavailable")]
    OcrUnavailable,
}

/// Typed queries over the captured screen. Implemented by the vision
/// layer; consumed, never implemented, by the battle core.
pub trait Perception: Send + Sync {
    /// Is the template visible inside the region at or above the threshold?
    fn template_present(
        &self,
        region: Rect,
        template: TemplateId,
        threshold: f32,
    ) -> Result<bool, PerceptionError>;

    /// Read a percentage (0–100) from text in the region. `Ok(None)` means
    /// the text was present but unparseable.
    fn read_percentage(&self, region: Rect) -> Result<Option<f32>, PerceptionError>;

    /// Fill fraction (0.0–1.0) of a bar-style indicator in the region.
    fn read_bar_fraction(&self, region: Rect) -> Result<f32, PerceptionError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Scripted Perception (replay / dry-run harness)
// ─────────────────────────────────────────────────────────────────────────────

use std::sync::Mutex;

#[derive(Debug, Clone)]
struct ScriptState {
    hud_present: bool,
    turn_ready: bool,
    dialog_present: bool,
    continue_present: bool,
    hp_fraction: f32,
    capture_rate: Option<f32>,
}

impl Default for ScriptState {
    fn default() -> Self {
        Self {
            hud_present: false,
            turn_ready: false,
            dialog_present: false,
            continue_present: false,
            hp_fraction: 1.0,
            capture_rate: None,
        }
    }
}

/// A programmable perception source for dry runs and tests: a scenario
/// driver flips the signals, the machine polls them like any other screen.
#[derive(Debug, Default)]
pub struct ScriptedPerception {
    state: Mutex<ScriptState>,
}

impl ScriptedPerception {
    pub fn set_hud(&self, present: bool) {
        self.state.lock().unwrap().hud_present = present;
    }

    pub fn set_turn_ready(&self, ready: bool) {
        self.state.lock().unwrap().turn_ready = ready;
    }

    pub fn set_dialog(&self, present: bool) {
        self.state.lock().unwrap().dialog_present = present;
    }

    pub fn set_continue(&self, present: bool) {
        self.state.lock().unwrap().continue_present = present;
    }

    pub fn set_hp_fraction(&self, fraction: f32) {
        self.state.lock().unwrap().hp_fraction = fraction;
    }

    pub fn set_capture_rate(&self, percent: Option<f32>) {
        self.state.lock().unwrap().capture_rate = percent;
    }
}

impl Perception for ScriptedPerception {
    fn template_present(
        &self,
        _region: Rect,
        template: TemplateId,
        _threshold: f32,
    ) -> Result<bool, PerceptionError> {
        let state = self.state.lock().unwrap();
        Ok(match template {
            TemplateId::BattleHud => state.hud_present,
            TemplateId::TurnReady => state.turn_ready,
            TemplateId::CaptureDialog => state.dialog_present,
            TemplateId::ContinueButton => state.continue_present,
        })
    }

    fn read_percentage(&self, _region: Rect) -> Result<Option<f32>, PerceptionError> {
        Ok(self.state.lock().unwrap().capture_rate)
    }

    fn read_bar_fraction(&self, _region: Rect) -> Result<f32, PerceptionError> {
        Ok(self.state.lock().unwrap().hp_fraction)
    }
}

//! Battle phases and terminal outcomes.

use std::time::Instant;

use critbot_types::SkillSlot;

/// How an encounter ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Captured,
    Defeated,
    Fled,
    Errored,
}

impl Outcome {
    pub fn name(&self) -> &'static str {
        match self {
            Outcome::Captured => "captured",
            Outcome::Defeated => "defeated",
            Outcome::Fled => "fled",
            Outcome::Errored => "errored",
        }
    }
}

/// Current phase of the battle machine.
///
/// Every waiting phase carries its own absolute deadline; no phase blocks
/// past it. `ReadingEncounter`, `DecidingAction`, `ExecutingSkill`,
/// `CaptureDialog`, and `Terminal` are transient: they resolve within the
/// tick that enters them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BattlePhase {
    /// No live encounter.
    Idle,
    /// Waiting for the turn-ready indicator.
    AwaitingTurn { deadline: Instant, retries_left: u32 },
    /// First-turn capture-rate sampling (transient).
    ReadingEncounter,
    /// Choosing the capture/damage/flee branch (transient).
    DecidingAction {
        /// Set when the turn-ready wait was abandoned; forces the defeat
        /// skill without consulting perception again.
        forced: bool,
    },
    /// Page navigation + skill click (transient).
    ExecutingSkill {
        skill: SkillSlot,
        /// A capture click follows the animation.
        capture_next: bool,
    },
    /// Waiting for the turn indicator to cycle (disappear then reappear).
    AwaitingAnimation {
        deadline: Instant,
        indicator_seen_gone: bool,
        capture_next: bool,
    },
    /// Capture clicked; waiting for the Keep/Release dialog.
    CaptureAttempt { deadline: Instant },
    /// Dialog on screen; Keep click fires on entry (transient).
    CaptureDialog,
    /// Flee clicked; waiting for the battle UI to clear.
    Fleeing { deadline: Instant },
    /// Outcome reached (transient; the continue click fires on exit).
    Terminal(Outcome),
    /// Continue clicked; waiting for the battle UI to clear.
    AwaitingContinue { outcome: Outcome, deadline: Instant },
}

impl BattlePhase {
    pub fn is_idle(&self) -> bool {
        matches!(self, BattlePhase::Idle)
    }
}

//! Battle orchestration: edge detection, per-encounter state, and the
//! phase machine that drives a battle from start signal to outcome.

pub mod detector;
pub mod encounter;
pub mod machine;
pub mod phase;

pub use detector::{BattleDetector, BattleEdge};
pub use encounter::{CaptureRateSample, EncounterState};
pub use machine::{BattleMachine, EncounterResult, MachineSettings, TickFlow};
pub use phase::{BattlePhase, Outcome};

#[cfg(test)]
mod machine_tests;

pub mod battle;
pub mod config;
pub mod cooldown;
pub mod eligibility;
pub mod game_data;
pub mod input;
pub mod perception;
pub mod session;

// Re-exports for convenience
pub use battle::{
    BattleDetector, BattleMachine, BattlePhase, EncounterResult, EncounterState, Outcome, TickFlow,
};
pub use config::{AppConfigExt, ConfigError, validate_config};
pub use cooldown::{compute_wait, wait_out};
pub use eligibility::{Decision, evaluate};
pub use game_data::{Derivation, derive_rarity_ip, expected_full_hp_rate};
pub use input::{Command, CommandEmitter, Emitter, InputBackend, InputError, Key};
pub use perception::{Perception, PerceptionError, ScriptedPerception, TemplateId};
pub use session::{ControlFlags, SessionEvent, run_session};

pub use critbot_types as types;

//! Dry-run battles against a scripted client.
//!
//! Drives the battle machine with a fake clock and a scripted perception
//! layer that reacts the way the real client would: the turn indicator
//! cycles around each skill, damage lands when an animation completes, the
//! keep dialog follows a capture click, and the battle UI clears after the
//! final continue. Useful for checking a configuration's behavior without
//! touching a game window.

use std::sync::Arc;
use std::time::{Duration, Instant};

use critbot_core::battle::{BattleMachine, BattlePhase, EncounterResult, MachineSettings, TickFlow};
use critbot_core::input::{Command, Emitter, InputError};
use critbot_core::perception::ScriptedPerception;
use critbot_core::session::ControlFlags;
use critbot_core::types::AppConfig;

/// HP knocked off by each completed skill animation.
const DAMAGE_PER_SKILL: f32 = 0.30;

/// Upper bound on machine ticks before the run is declared stuck.
const MAX_STEPS: u32 = 400;

#[derive(Default)]
struct PrintingEmitter {
    commands: Vec<Command>,
}

impl Emitter for PrintingEmitter {
    fn emit(&mut self, command: Command) -> Result<(), InputError> {
        println!("  -> {command:?}");
        self.commands.push(command);
        Ok(())
    }
}

/// Run one scripted encounter with the given full-HP capture rate.
/// Returns `None` if the machine never settles within the step budget.
pub fn run_encounter(config: &AppConfig, rate: f32) -> Option<EncounterResult> {
    let flags = Arc::new(ControlFlags::default());
    let mut machine = BattleMachine::new(MachineSettings::from_config(config), Arc::clone(&flags));
    let mut emitter = PrintingEmitter::default();

    let perception = ScriptedPerception::default();
    perception.set_hud(true);
    perception.set_turn_ready(true);
    perception.set_hp_fraction(1.0);
    perception.set_capture_rate(Some(rate));

    let mut now = Instant::now();
    let mut hp: f32 = 1.0;
    machine.on_battle_detected(now);

    for _ in 0..MAX_STEPS {
        if let TickFlow::Finished(result) = machine.tick(now, &perception, &mut emitter) {
            return Some(result);
        }

        // Scripted client reactions to where the machine ended up.
        match machine.phase() {
            BattlePhase::AwaitingAnimation {
                indicator_seen_gone: false,
                ..
            } => {
                perception.set_turn_ready(false);
            }
            BattlePhase::AwaitingAnimation {
                indicator_seen_gone: true,
                ..
            } => {
                hp = (hp - DAMAGE_PER_SKILL).max(0.0);
                perception.set_hp_fraction(hp);
                if hp <= 0.0 {
                    perception.set_continue(true);
                }
                perception.set_turn_ready(true);
            }
            BattlePhase::CaptureAttempt { .. } => {
                perception.set_dialog(true);
            }
            BattlePhase::AwaitingContinue { .. } | BattlePhase::Fleeing { .. } => {
                perception.set_hud(false);
            }
            _ => {}
        }

        now += Duration::from_millis(config.timeouts.poll_interval_ms);
    }
    None
}

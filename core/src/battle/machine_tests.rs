use std::sync::Arc;
use std::time::{Duration, Instant};

use critbot_types::{AppConfig, IpRating, PerRarityPolicy, RarityTier, SkillSlot};

use crate::input::{Command, Emitter, InputError};
use crate::perception::ScriptedPerception;
use crate::session::ControlFlags;

use super::machine::{BattleMachine, MachineSettings, TickFlow};
use super::phase::{BattlePhase, Outcome};

#[derive(Default)]
struct RecordingEmitter {
    commands: Vec<Command>,
}

impl Emitter for RecordingEmitter {
    fn emit(&mut self, command: Command) -> Result<(), InputError> {
        self.commands.push(command);
        Ok(())
    }
}

struct FailingEmitter;

impl Emitter for FailingEmitter {
    fn emit(&mut self, _command: Command) -> Result<(), InputError> {
        Err(InputError::WindowGone)
    }
}

fn slot(index: u8) -> SkillSlot {
    SkillSlot::new(index).unwrap()
}

fn config_with_policies(damage_skill: u8, capture_skill: u8) -> AppConfig {
    let mut config = AppConfig::default();
    for rarity in RarityTier::ALL {
        config.eligibility.per_rarity.insert(
            rarity,
            PerRarityPolicy {
                enabled: true,
                min_ip_rating: IpRating::FMinus,
                damage_skill: slot(damage_skill),
                capture_skill: slot(capture_skill),
            },
        );
    }
    config
}

struct Harness {
    machine: BattleMachine,
    perception: ScriptedPerception,
    emitter: RecordingEmitter,
    flags: Arc<ControlFlags>,
    now: Instant,
}

impl Harness {
    fn new(config: &AppConfig) -> Self {
        let flags = Arc::new(ControlFlags::default());
        Self {
            machine: BattleMachine::new(MachineSettings::from_config(config), Arc::clone(&flags)),
            perception: ScriptedPerception::default(),
            emitter: RecordingEmitter::default(),
            flags,
            now: Instant::now(),
        }
    }

    fn start_battle(&mut self) {
        self.perception.set_hud(true);
        self.machine.on_battle_detected(self.now);
    }

    fn tick(&mut self) -> TickFlow {
        self.machine
            .tick(self.now, &self.perception, &mut self.emitter)
    }

    fn advance(&mut self, ms: u64) {
        self.now += Duration::from_millis(ms);
    }

    /// Drive the indicator through its gone-then-back cycle so the
    /// animation wait completes on the next tick.
    fn complete_animation(&mut self) -> TickFlow {
        self.perception.set_turn_ready(false);
        self.tick();
        self.perception.set_turn_ready(true);
        self.tick()
    }
}

#[test]
fn skill_on_the_open_page_skips_navigation() {
    let config = config_with_policies(2, 9);
    let mut harness = Harness::new(&config);
    harness.perception.set_turn_ready(true);
    harness.perception.set_hp_fraction(1.0);
    harness.perception.set_capture_rate(Some(12.0));
    harness.start_battle();

    // Full HP is above the capture window, so the damage skill fires.
    // Slot 2 lives on page 1, which is already open.
    harness.tick();
    assert_eq!(harness.emitter.commands, vec![Command::SelectSkill(1)]);
}

#[test]
fn skill_on_a_back_page_navigates_once_then_remembers_the_page() {
    let config = config_with_policies(9, 10);
    let mut harness = Harness::new(&config);
    harness.perception.set_turn_ready(true);
    harness.perception.set_hp_fraction(1.0);
    harness.perception.set_capture_rate(Some(12.0));
    harness.start_battle();

    harness.tick();
    assert_eq!(
        harness.emitter.commands,
        vec![Command::OpenPage(3), Command::SelectSkill(0)]
    );

    harness.perception.set_hp_fraction(0.8);
    harness.complete_animation();
    harness.tick();
    // Same skill on the next turn: page 3 is already open, one click only.
    harness.tick();
    assert_eq!(
        harness.emitter.commands,
        vec![
            Command::OpenPage(3),
            Command::SelectSkill(0),
            Command::SelectSkill(0)
        ]
    );
}

#[test]
fn fingerprint_is_skipped_below_full_hp() {
    let config = config_with_policies(2, 9);
    let mut harness = Harness::new(&config);
    harness.perception.set_turn_ready(true);
    harness.perception.set_hp_fraction(0.90);
    harness.perception.set_capture_rate(Some(12.0));
    harness.start_battle();

    harness.tick();
    let encounter = harness.machine.encounter().unwrap();
    assert!(encounter.sample.is_none());
    assert!(encounter.derived.is_none());
    // Unknown encounters fall through to the defeat skill.
    assert_eq!(harness.emitter.commands, vec![Command::SelectSkill(0)]);
}

#[test]
fn hp_within_tolerance_still_counts_as_full() {
    let config = config_with_policies(2, 9);
    let mut harness = Harness::new(&config);
    harness.perception.set_turn_ready(true);
    harness.perception.set_hp_fraction(0.99);
    harness.perception.set_capture_rate(Some(12.0));
    harness.start_battle();

    harness.tick();
    let encounter = harness.machine.encounter().unwrap();
    assert_eq!(
        encounter.derived,
        Some((RarityTier::Legendary, IpRating::A))
    );
}

#[test]
fn capture_flow_retries_then_keeps_on_dialog() {
    let config = config_with_policies(2, 9);
    let mut harness = Harness::new(&config);
    harness.perception.set_turn_ready(true);
    harness.perception.set_hp_fraction(1.0);
    harness.perception.set_capture_rate(Some(12.0));
    harness.start_battle();

    // Turn 1: full HP, chip damage.
    harness.tick();
    harness.perception.set_hp_fraction(0.40);
    harness.complete_animation();
    harness.tick();

    // Turn 2: inside the capture window; capture skill then capture click.
    harness.tick();
    assert_eq!(
        &harness.emitter.commands[1..],
        &[Command::OpenPage(3), Command::SelectSkill(0)]
    );
    harness.complete_animation();
    assert_eq!(harness.emitter.commands.last(), Some(&Command::Capture));
    assert_eq!(harness.machine.encounter().unwrap().attempts_left, 2);

    // No dialog: the attempt times out and the fight goes on.
    harness.advance(config.timeouts.capture_dialog_ms + 1);
    harness.tick();
    assert!(matches!(
        harness.machine.phase(),
        BattlePhase::AwaitingTurn { .. }
    ));

    // Turn 3: capture again, and this time the dialog shows up.
    harness.tick();
    harness.complete_animation();
    harness.perception.set_dialog(true);
    harness.tick();
    assert_eq!(harness.emitter.commands.last(), Some(&Command::Continue));
    assert!(harness.emitter.commands.contains(&Command::Keep));

    harness.perception.set_hud(false);
    let flow = harness.tick();
    match flow {
        TickFlow::Finished(result) => {
            assert_eq!(result.outcome, Outcome::Captured);
            assert_eq!(result.rarity, Some(RarityTier::Legendary));
            assert_eq!(result.ip_rating, Some(IpRating::A));
        }
        other => panic!("expected a captured result, got {other:?}"),
    }
    assert!(harness.machine.phase().is_idle());
}

#[test]
fn direct_capture_clicks_without_a_skill_first() {
    let mut config = config_with_policies(2, 9);
    config.battle.use_capture_skill_before = false;
    let mut harness = Harness::new(&config);
    harness.perception.set_turn_ready(true);
    harness.perception.set_hp_fraction(1.0);
    harness.perception.set_capture_rate(Some(12.0));
    harness.start_battle();

    // Turn 1: full HP, chip damage.
    harness.tick();
    assert_eq!(harness.emitter.commands, vec![Command::SelectSkill(1)]);

    // Turn 2: inside the capture window; the capture click fires straight
    // from the decision, no skill and no page navigation first.
    harness.perception.set_hp_fraction(0.40);
    harness.complete_animation();
    harness.tick();
    assert_eq!(
        &harness.emitter.commands[1..],
        &[Command::Capture]
    );
    assert!(matches!(
        harness.machine.phase(),
        BattlePhase::CaptureAttempt { .. }
    ));
    assert_eq!(harness.machine.encounter().unwrap().attempts_left, 2);

    harness.perception.set_dialog(true);
    harness.tick();
    harness.perception.set_hud(false);
    match harness.tick() {
        TickFlow::Finished(result) => assert_eq!(result.outcome, Outcome::Captured),
        other => panic!("expected a captured result, got {other:?}"),
    }
}

#[test]
fn defeat_mode_ignores_the_policy_table() {
    let mut config = config_with_policies(2, 9);
    config.battle.mode = critbot_types::BattleMode::Defeat;
    let mut harness = Harness::new(&config);
    harness.perception.set_turn_ready(true);
    harness.perception.set_hp_fraction(1.0);
    harness.perception.set_capture_rate(Some(12.0));
    harness.start_battle();

    // The table maps every rarity to slot 2; defeat mode must use the
    // global defeat skill (slot 1) without ever evaluating eligibility.
    harness.tick();
    assert_eq!(harness.emitter.commands, vec![Command::SelectSkill(0)]);
    assert!(harness.machine.encounter().unwrap().decision.is_none());

    harness.perception.set_hp_fraction(0.0);
    harness.complete_animation();
    harness.perception.set_hud(false);
    match harness.tick() {
        TickFlow::Finished(result) => assert_eq!(result.outcome, Outcome::Defeated),
        other => panic!("expected a defeat, got {other:?}"),
    }
    assert!(!harness.emitter.commands.contains(&Command::Capture));
}

#[test]
fn exhausted_attempts_switch_to_damage_only() {
    let mut config = config_with_policies(2, 9);
    config.battle.attempts = 1;
    let mut harness = Harness::new(&config);
    harness.perception.set_turn_ready(true);
    harness.perception.set_hp_fraction(1.0);
    harness.perception.set_capture_rate(Some(12.0));
    harness.start_battle();

    // Turn 1 fingerprints at full HP and chips damage.
    harness.tick();
    harness.perception.set_hp_fraction(0.30);
    harness.complete_animation();

    // Only attempt: capture skill, capture click, no dialog.
    harness.tick();
    harness.complete_animation();
    assert_eq!(harness.emitter.commands.last(), Some(&Command::Capture));
    harness.advance(config.timeouts.capture_dialog_ms + 1);
    harness.tick();

    // From here the damage skill carries the fight; no further captures.
    harness.tick();
    assert_eq!(harness.emitter.commands.last(), Some(&Command::SelectSkill(1)));
    harness.complete_animation();
    harness.tick();
    harness.tick();
    assert_eq!(harness.emitter.commands.last(), Some(&Command::SelectSkill(1)));
    assert_eq!(
        harness
            .emitter
            .commands
            .iter()
            .filter(|c| **c == Command::Capture)
            .count(),
        1
    );

    // The enemy falls: the continue button shows up once the last
    // animation plays out, ending the fight as a defeat.
    harness.perception.set_continue(true);
    harness.complete_animation();
    harness.perception.set_hud(false);
    match harness.tick() {
        TickFlow::Finished(result) => assert_eq!(result.outcome, Outcome::Defeated),
        other => panic!("expected a defeat, got {other:?}"),
    }
}

#[test]
fn stop_mid_animation_makes_one_cleanup_click() {
    let config = config_with_policies(2, 9);
    let mut harness = Harness::new(&config);
    harness.perception.set_turn_ready(true);
    harness.perception.set_hp_fraction(1.0);
    harness.perception.set_capture_rate(Some(12.0));
    harness.start_battle();

    harness.tick();
    assert!(matches!(
        harness.machine.phase(),
        BattlePhase::AwaitingAnimation { .. }
    ));
    let clicks_before = harness.emitter.commands.len();

    harness.flags.request_stop();
    match harness.tick() {
        TickFlow::Finished(result) => assert_eq!(result.outcome, Outcome::Errored),
        other => panic!("expected an errored result, got {other:?}"),
    }
    assert_eq!(
        &harness.emitter.commands[clicks_before..],
        &[Command::Continue]
    );
    assert!(harness.machine.phase().is_idle());
}

#[test]
fn turn_ready_retries_then_forces_the_defeat_skill() {
    let config = config_with_policies(2, 9);
    let mut harness = Harness::new(&config);
    harness.start_battle();

    for _ in 0..=config.timeouts.turn_ready_retries {
        assert_eq!(harness.tick(), TickFlow::Busy);
        harness.advance(config.timeouts.turn_ready_ms + 1);
    }
    harness.tick();
    // Forced defeat: slot 1 on page 1.
    assert_eq!(harness.emitter.commands, vec![Command::SelectSkill(0)]);
    assert!(matches!(
        harness.machine.phase(),
        BattlePhase::AwaitingAnimation { .. }
    ));
}

#[test]
fn animation_timeout_proceeds_without_the_indicator_cycling() {
    let config = config_with_policies(2, 9);
    let mut harness = Harness::new(&config);
    harness.perception.set_turn_ready(true);
    harness.perception.set_hp_fraction(1.0);
    harness.perception.set_capture_rate(Some(50.0));
    harness.start_battle();

    harness.tick();
    // The indicator never leaves the screen; the deadline moves us on.
    harness.advance(config.timeouts.animation_ms + 1);
    harness.tick();
    assert!(matches!(
        harness.machine.phase(),
        BattlePhase::AwaitingTurn { .. }
    ));
}

#[test]
fn ineligible_encounter_flees_when_configured() {
    let mut config = config_with_policies(2, 9);
    config.battle.flee_when_ineligible = true;
    let mut harness = Harness::new(&config);
    harness.perception.set_turn_ready(true);
    harness.perception.set_hp_fraction(1.0);
    // 38% is ambiguous (Rare S+ vs Exotic F-), so the encounter stays
    // unknown and unknown is ineligible.
    harness.perception.set_capture_rate(Some(38.0));
    harness.start_battle();

    harness.tick();
    assert_eq!(harness.emitter.commands, vec![Command::Flee]);
    harness.perception.set_hud(false);
    match harness.tick() {
        TickFlow::Finished(result) => {
            assert_eq!(result.outcome, Outcome::Fled);
            assert_eq!(result.rarity, None);
        }
        other => panic!("expected a fled result, got {other:?}"),
    }
}

#[test]
fn input_failure_ends_the_encounter_as_errored() {
    let config = config_with_policies(2, 9);
    let mut harness = Harness::new(&config);
    harness.perception.set_turn_ready(true);
    harness.perception.set_hp_fraction(1.0);
    harness.perception.set_capture_rate(Some(12.0));
    harness.start_battle();

    let flow = harness
        .machine
        .tick(harness.now, &harness.perception, &mut FailingEmitter);
    match flow {
        TickFlow::Finished(result) => assert_eq!(result.outcome, Outcome::Errored),
        other => panic!("expected an errored result, got {other:?}"),
    }
    assert!(harness.machine.phase().is_idle());
}

#[test]
fn battle_signal_while_live_is_ignored() {
    let config = config_with_policies(2, 9);
    let mut harness = Harness::new(&config);
    harness.start_battle();
    let started = harness.machine.encounter().unwrap().started_at;

    harness.advance(500);
    harness.machine.on_battle_detected(harness.now);
    assert_eq!(harness.machine.encounter().unwrap().started_at, started);
}

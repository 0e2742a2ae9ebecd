//! The battle phase state machine.
//!
//! Advances one step per tick of the surrounding control loop. Every wait
//! is an explicit phase carrying an absolute deadline checked against the
//! tick's `now`, so no phase can block past its budget, and every phase
//! prefers forcing a default action over stalling: a stalled bot in a live
//! battle is worse than a wrong action.
//!
//! Commands are emitted exactly when a phase is entered, at most once per
//! entry, which keeps retries from double-clicking the client into a
//! desynchronized state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use critbot_types::{
    AppConfig, BattleMode, IpRating, PerRarityPolicy, RarityTier, Regions, SkillSlot,
    TimeoutSettings,
};
use hashbrown::HashMap;

use crate::eligibility;
use crate::game_data::{self, Derivation};
use crate::input::{Command, Emitter, InputError};
use crate::perception::{Perception, TemplateId};
use crate::session::ControlFlags;

use super::encounter::{CaptureRateSample, EncounterState};
use super::phase::{BattlePhase, Outcome};

/// HP fraction at or below which the enemy counts as dead. Bar reads are
/// noisy near empty; half a percent absorbs that.
const DEAD_HP_FRACTION: f32 = 0.005;

/// Everything the machine needs from configuration, snapshotted at
/// construction so the config stays read-only for the whole run.
#[derive(Debug, Clone)]
pub struct MachineSettings {
    pub mode: BattleMode,
    pub capture_hp_percent: f32,
    pub attempts: u32,
    pub defeat_skill: SkillSlot,
    pub use_capture_skill_before: bool,
    pub flee_when_ineligible: bool,
    pub hp_full_tolerance_percent: f32,
    pub match_threshold: f32,
    pub regions: Regions,
    pub timeouts: TimeoutSettings,
    pub policies: HashMap<RarityTier, PerRarityPolicy>,
}

impl MachineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            mode: config.battle.mode,
            capture_hp_percent: config.battle.capture_hp_percent,
            attempts: config.battle.attempts,
            defeat_skill: config.battle.defeat_skill,
            use_capture_skill_before: config.battle.use_capture_skill_before,
            flee_when_ineligible: config.battle.flee_when_ineligible,
            hp_full_tolerance_percent: config.battle.hp_full_tolerance_percent,
            match_threshold: config.perception.match_threshold,
            regions: config.regions,
            timeouts: config.timeouts,
            policies: config
                .eligibility
                .per_rarity
                .iter()
                .map(|(rarity, policy)| (*rarity, policy.clone()))
                .collect(),
        }
    }
}

/// What one tick produced.
#[derive(Debug, Clone, PartialEq)]
pub enum TickFlow {
    /// No live encounter.
    Idle,
    /// Encounter in progress.
    Busy,
    /// Encounter finished; the state has been reset to idle.
    Finished(EncounterResult),
}

/// Emitted once per encounter when it reaches a terminal phase.
#[derive(Debug, Clone, PartialEq)]
pub struct EncounterResult {
    pub outcome: Outcome,
    pub rarity: Option<RarityTier>,
    pub ip_rating: Option<IpRating>,
    pub duration: Duration,
    pub ended_at: chrono::NaiveDateTime,
}

pub struct BattleMachine {
    settings: MachineSettings,
    flags: Arc<ControlFlags>,
    phase: BattlePhase,
    encounter: Option<EncounterState>,
}

impl BattleMachine {
    pub fn new(settings: MachineSettings, flags: Arc<ControlFlags>) -> Self {
        Self {
            settings,
            flags,
            phase: BattlePhase::Idle,
            encounter: None,
        }
    }

    pub fn phase(&self) -> &BattlePhase {
        &self.phase
    }

    pub fn encounter(&self) -> Option<&EncounterState> {
        self.encounter.as_ref()
    }

    pub fn request_pause(&self) {
        self.flags.request_pause();
    }

    pub fn resume(&self) {
        self.flags.resume();
    }

    pub fn request_stop(&self) {
        self.flags.request_stop();
    }

    /// External battle-start signal (enemy HUD became present).
    pub fn on_battle_detected(&mut self, now: Instant) {
        if !self.phase.is_idle() {
            tracing::warn!("battle-start signal while an encounter is live; ignoring");
            return;
        }
        tracing::info!("battle detected, encounter started");
        self.encounter = Some(EncounterState::new(now, self.settings.attempts));
        self.phase = self.awaiting_turn(now);
    }

    /// Advance the machine one step.
    pub fn tick(
        &mut self,
        now: Instant,
        perception: &dyn Perception,
        emitter: &mut dyn Emitter,
    ) -> TickFlow {
        if self.flags.is_stopped() && !self.phase.is_idle() {
            return TickFlow::Finished(self.abort(now, perception, emitter));
        }
        if self.phase.is_idle() {
            return TickFlow::Idle;
        }
        if self.flags.is_paused() {
            return TickFlow::Busy;
        }

        match self.advance(now, perception, emitter) {
            Ok(flow) => flow,
            Err(error) => {
                tracing::error!(%error, "input dispatch failed, ending encounter");
                TickFlow::Finished(self.conclude(now, Outcome::Errored))
            }
        }
    }

    // ── Phase dispatch ──────────────────────────────────────────────────────

    /// Transient phases (reading, deciding, executing, dialog, terminal)
    /// resolve within the tick that enters them; the loop bound covers the
    /// longest possible chain.
    fn advance(
        &mut self,
        now: Instant,
        perception: &dyn Perception,
        emitter: &mut dyn Emitter,
    ) -> Result<TickFlow, InputError> {
        for _ in 0..8 {
            match self.phase.clone() {
                BattlePhase::Idle => return Ok(TickFlow::Idle),

                BattlePhase::AwaitingTurn {
                    deadline,
                    retries_left,
                } => {
                    if self.present(perception, TemplateId::ContinueButton) {
                        self.phase = BattlePhase::Terminal(Outcome::Defeated);
                        continue;
                    }
                    if self.present(perception, TemplateId::TurnReady) {
                        let first_turn = self
                            .encounter
                            .as_ref()
                            .is_some_and(|enc| !enc.first_turn_done);
                        self.phase = if first_turn {
                            BattlePhase::ReadingEncounter
                        } else {
                            BattlePhase::DecidingAction { forced: false }
                        };
                        continue;
                    }
                    if now >= deadline {
                        if retries_left > 0 {
                            tracing::debug!(retries_left, "turn-ready wait expired, retrying");
                            self.phase = BattlePhase::AwaitingTurn {
                                deadline: now + self.timeout(self.settings.timeouts.turn_ready_ms),
                                retries_left: retries_left - 1,
                            };
                        } else {
                            tracing::warn!("turn-ready never appeared, forcing defeat skill");
                            self.phase = BattlePhase::DecidingAction { forced: true };
                            continue;
                        }
                    }
                    return Ok(TickFlow::Busy);
                }

                BattlePhase::ReadingEncounter => {
                    self.read_encounter(perception);
                    self.phase = BattlePhase::DecidingAction { forced: false };
                    continue;
                }

                BattlePhase::DecidingAction { forced } => {
                    self.phase = self.decide_action(now, forced, perception, emitter)?;
                    continue;
                }

                BattlePhase::ExecutingSkill { skill, capture_next } => {
                    if let Some(enc) = self.encounter.as_mut() {
                        if skill.page() != enc.open_page {
                            emitter.emit(Command::OpenPage(skill.page()))?;
                            enc.open_page = skill.page();
                        }
                        emitter.emit(Command::SelectSkill(skill.position_on_page()))?;
                        enc.last_action_at = now;
                    }
                    self.phase = BattlePhase::AwaitingAnimation {
                        deadline: now + self.timeout(self.settings.timeouts.animation_ms),
                        indicator_seen_gone: false,
                        capture_next,
                    };
                    return Ok(TickFlow::Busy);
                }

                BattlePhase::AwaitingAnimation {
                    deadline,
                    indicator_seen_gone,
                    capture_next,
                } => {
                    let ready = self.present(perception, TemplateId::TurnReady);
                    let done = if now >= deadline {
                        tracing::debug!("animation wait expired, assuming complete");
                        true
                    } else if !indicator_seen_gone {
                        if !ready {
                            self.phase = BattlePhase::AwaitingAnimation {
                                deadline,
                                indicator_seen_gone: true,
                                capture_next,
                            };
                        }
                        false
                    } else {
                        ready
                    };
                    if !done {
                        return Ok(TickFlow::Busy);
                    }

                    if capture_next {
                        self.phase = self.start_capture_attempt(now, emitter)?;
                        return Ok(TickFlow::Busy);
                    }

                    let hp = self.read_hp(perception);
                    if let (Some(hp), Some(enc)) = (hp, self.encounter.as_mut()) {
                        enc.last_hp_fraction = hp;
                    }
                    let dead = self
                        .encounter
                        .as_ref()
                        .is_some_and(|enc| enc.last_hp_fraction <= DEAD_HP_FRACTION);
                    if dead || self.present(perception, TemplateId::ContinueButton) {
                        self.phase = BattlePhase::Terminal(Outcome::Defeated);
                        continue;
                    }
                    self.phase = self.awaiting_turn(now);
                    return Ok(TickFlow::Busy);
                }

                BattlePhase::CaptureAttempt { deadline } => {
                    if self.present(perception, TemplateId::CaptureDialog) {
                        self.phase = BattlePhase::CaptureDialog;
                        continue;
                    }
                    if now >= deadline {
                        if let Some(enc) = self.encounter.as_mut() {
                            if enc.attempts_left == 0 {
                                tracing::warn!("capture attempts exhausted, damage only from here");
                                enc.capture_abandoned = true;
                            } else {
                                tracing::debug!(
                                    attempts_left = enc.attempts_left,
                                    "capture dialog never appeared, retrying next turn"
                                );
                            }
                        }
                        self.phase = self.awaiting_turn(now);
                    }
                    return Ok(TickFlow::Busy);
                }

                BattlePhase::CaptureDialog => {
                    // Always keep; releasing is out of scope.
                    emitter.emit(Command::Keep)?;
                    self.phase = BattlePhase::Terminal(Outcome::Captured);
                    continue;
                }

                BattlePhase::Fleeing { deadline } => {
                    if !self.present(perception, TemplateId::BattleHud) || now >= deadline {
                        return Ok(TickFlow::Finished(self.conclude(now, Outcome::Fled)));
                    }
                    return Ok(TickFlow::Busy);
                }

                BattlePhase::Terminal(outcome) => {
                    emitter.emit(Command::Continue)?;
                    self.phase = BattlePhase::AwaitingContinue {
                        outcome,
                        deadline: now + self.timeout(self.settings.timeouts.battle_ui_clear_ms),
                    };
                    return Ok(TickFlow::Busy);
                }

                BattlePhase::AwaitingContinue { outcome, deadline } => {
                    if !self.present(perception, TemplateId::BattleHud) {
                        return Ok(TickFlow::Finished(self.conclude(now, outcome)));
                    }
                    if now >= deadline {
                        tracing::debug!("battle UI still visible after continue, proceeding anyway");
                        return Ok(TickFlow::Finished(self.conclude(now, outcome)));
                    }
                    return Ok(TickFlow::Busy);
                }
            }
        }
        Ok(TickFlow::Busy)
    }

    // ── First-turn fingerprinting ───────────────────────────────────────────

    fn read_encounter(&mut self, perception: &dyn Perception) {
        let hp = self.read_hp(perception);
        let rate = match perception.read_percentage(self.settings.regions.capture_rate) {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!(%error, "capture-rate read failed");
                None
            }
        };
        let tolerance = self.settings.hp_full_tolerance_percent / 100.0;

        let Some(enc) = self.encounter.as_mut() else {
            return;
        };
        enc.first_turn_done = true;

        let Some(hp) = hp else {
            tracing::warn!("HP bar unreadable on first turn, skipping fingerprint");
            return;
        };
        enc.last_hp_fraction = hp;

        if hp + tolerance < 1.0 {
            // Resumed mid-fight or a previous read failed; the rate no
            // longer fingerprints anything.
            tracing::info!(hp_fraction = hp, "enemy below full HP, skipping fingerprint");
            return;
        }
        let Some(percent) = rate else {
            tracing::warn!("capture-rate text unparseable, treating encounter as unknown");
            return;
        };
        if enc.sample.is_some() {
            return;
        }
        enc.sample = Some(CaptureRateSample {
            percent,
            hp_fraction: hp,
        });
        match game_data::derive_rarity_ip(percent) {
            Derivation::Resolved(rarity, ip) => {
                tracing::info!(rate = percent, rarity = %rarity, ip = %ip, "fingerprint resolved");
                enc.derived = Some((rarity, ip));
            }
            Derivation::Ambiguous(cells) => {
                tracing::warn!(
                    rate = percent,
                    candidates = cells.len(),
                    "ambiguous fingerprint, treating encounter as unknown"
                );
            }
            Derivation::NoMatch => {
                tracing::warn!(rate = percent, "fingerprint matched no rarity/IP cell");
            }
        }
    }

    // ── Action decision ─────────────────────────────────────────────────────

    fn decide_action(
        &mut self,
        now: Instant,
        forced: bool,
        perception: &dyn Perception,
        emitter: &mut dyn Emitter,
    ) -> Result<BattlePhase, InputError> {
        if forced {
            return Ok(BattlePhase::ExecutingSkill {
                skill: self.settings.defeat_skill,
                capture_next: false,
            });
        }

        let hp = self.read_hp(perception);

        let settings = &self.settings;
        let Some(enc) = self.encounter.as_mut() else {
            return Ok(BattlePhase::Idle);
        };
        if let Some(hp) = hp {
            enc.last_hp_fraction = hp;
        }
        if enc.last_hp_fraction <= DEAD_HP_FRACTION {
            return Ok(BattlePhase::Terminal(Outcome::Defeated));
        }

        if settings.mode == BattleMode::Defeat {
            return Ok(BattlePhase::ExecutingSkill {
                skill: settings.defeat_skill,
                capture_next: false,
            });
        }

        let derived = enc.derived;
        let decision = *enc.decision.get_or_insert_with(|| {
            eligibility::evaluate(derived, &settings.policies, settings.defeat_skill)
        });

        let hp_percent = enc.last_hp_fraction * 100.0;
        if decision.eligible && enc.capture_viable() && hp_percent <= settings.capture_hp_percent {
            if settings.use_capture_skill_before {
                Ok(BattlePhase::ExecutingSkill {
                    skill: decision.capture_skill,
                    capture_next: true,
                })
            } else {
                self.start_capture_attempt(now, emitter)
            }
        } else if decision.eligible {
            // Chip HP down toward the capture window, or finish the fight
            // if attempts ran dry.
            Ok(BattlePhase::ExecutingSkill {
                skill: decision.damage_skill,
                capture_next: false,
            })
        } else if settings.flee_when_ineligible {
            tracing::info!("encounter ineligible, fleeing");
            emitter.emit(Command::Flee)?;
            Ok(BattlePhase::Fleeing {
                deadline: now + self.timeout(self.settings.timeouts.battle_ui_clear_ms),
            })
        } else {
            Ok(BattlePhase::ExecutingSkill {
                skill: decision.damage_skill,
                capture_next: false,
            })
        }
    }

    /// Decrements the attempt budget and fires the capture click. The
    /// budget is spent per attempt regardless of whether a dialog follows.
    fn start_capture_attempt(
        &mut self,
        now: Instant,
        emitter: &mut dyn Emitter,
    ) -> Result<BattlePhase, InputError> {
        if let Some(enc) = self.encounter.as_mut() {
            enc.attempts_left = enc.attempts_left.saturating_sub(1);
            enc.last_action_at = now;
            tracing::info!(attempts_left = enc.attempts_left, "capture attempt");
        }
        emitter.emit(Command::Capture)?;
        Ok(BattlePhase::CaptureAttempt {
            deadline: now + self.timeout(self.settings.timeouts.capture_dialog_ms),
        })
    }

    // ── Teardown ────────────────────────────────────────────────────────────

    /// Stop requested: a single best-effort cleanup click if the battle UI
    /// is still on screen, then conclude as errored.
    fn abort(
        &mut self,
        now: Instant,
        perception: &dyn Perception,
        emitter: &mut dyn Emitter,
    ) -> EncounterResult {
        tracing::info!("stop requested, aborting encounter");
        if self.present(perception, TemplateId::BattleHud)
            && let Err(error) = emitter.emit(Command::Continue)
        {
            tracing::warn!(%error, "cleanup click failed");
        }
        self.conclude(now, Outcome::Errored)
    }

    fn conclude(&mut self, now: Instant, outcome: Outcome) -> EncounterResult {
        self.phase = BattlePhase::Idle;
        let enc = self.encounter.take();
        let (rarity, ip_rating, duration) = match enc {
            Some(enc) => {
                let (rarity, ip) = enc.derived.map_or((None, None), |(r, i)| (Some(r), Some(i)));
                (rarity, ip, enc.elapsed(now))
            }
            None => (None, None, Duration::ZERO),
        };
        let result = EncounterResult {
            outcome,
            rarity,
            ip_rating,
            duration,
            ended_at: chrono::Local::now().naive_local(),
        };
        tracing::info!(
            outcome = outcome.name(),
            rarity = rarity.map(|r| r.name()),
            ip = ip_rating.map(|i| i.name()),
            duration_secs = duration.as_secs_f32(),
            "encounter finished"
        );
        result
    }

    // ── Perception helpers ──────────────────────────────────────────────────

    /// Detection failures are recovered here: a failed query reads as
    /// "absent" and the deadline machinery takes care of forward progress.
    fn present(&self, perception: &dyn Perception, template: TemplateId) -> bool {
        let region = match template {
            TemplateId::BattleHud => self.settings.regions.battle_hud,
            TemplateId::TurnReady => self.settings.regions.turn_indicator,
            TemplateId::CaptureDialog => self.settings.regions.capture_dialog,
            TemplateId::ContinueButton => self.settings.regions.continue_button,
        };
        match perception.template_present(region, template, self.settings.match_threshold) {
            Ok(found) => found,
            Err(error) => {
                tracing::warn!(%error, ?template, "perception query failed, treating as absent");
                false
            }
        }
    }

    fn read_hp(&self, perception: &dyn Perception) -> Option<f32> {
        match perception.read_bar_fraction(self.settings.regions.enemy_hp_bar) {
            Ok(fraction) => Some(fraction.clamp(0.0, 1.0)),
            Err(error) => {
                tracing::warn!(%error, "HP bar read failed");
                None
            }
        }
    }

    fn awaiting_turn(&self, now: Instant) -> BattlePhase {
        BattlePhase::AwaitingTurn {
            deadline: now + self.timeout(self.settings.timeouts.turn_ready_ms),
            retries_left: self.settings.timeouts.turn_ready_retries,
        }
    }

    fn timeout(&self, ms: u64) -> Duration {
        Duration::from_millis(ms)
    }
}

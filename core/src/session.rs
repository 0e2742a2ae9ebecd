//! The long-running hunt loop: poll the battle signal, drive the machine,
//! sit out the cooldown, repeat.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use critbot_types::AppConfig;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::battle::{
    BattleDetector, BattleEdge, BattleMachine, EncounterResult, MachineSettings, Outcome, TickFlow,
};
use crate::cooldown;
use crate::input::Emitter;
use crate::perception::{Perception, TemplateId};

/// Shared pause/stop switches. Cheap to clone behind an `Arc`; flipped from
/// the CLI thread, read from the session loop and the machine.
#[derive(Debug, Default)]
pub struct ControlFlags {
    paused: AtomicBool,
    stopped: AtomicBool,
}

impl ControlFlags {
    pub fn request_pause(&self) {
        self.paused.store(true, Ordering::Relaxed);
        tracing::info!("pause requested");
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::Relaxed);
        tracing::info!("resumed");
    }

    /// Stop is one-way; a stopped session never restarts.
    pub fn request_stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
        tracing::info!("stop requested");
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }
}

/// Progress reports pushed to whoever runs the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    EncounterFinished(EncounterResult),
    /// The post-battle cooldown elapsed; a new search can begin.
    SearchReady,
}

/// Run the hunt loop until stop is requested.
///
/// One poll interval per iteration: observe the battle signal, feed the
/// machine a tick, and after each finished encounter wait out the cooldown
/// before reporting `SearchReady`.
pub async fn run_session(
    config: &AppConfig,
    perception: &dyn Perception,
    emitter: &mut dyn Emitter,
    flags: Arc<ControlFlags>,
    events: mpsc::UnboundedSender<SessionEvent>,
) {
    let settings = MachineSettings::from_config(config);
    let mut detector = BattleDetector::default();
    let mut machine = BattleMachine::new(settings, Arc::clone(&flags));

    let mut ticker =
        tokio::time::interval(Duration::from_millis(config.timeouts.poll_interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!("session started");
    loop {
        ticker.tick().await;
        if flags.is_stopped() && machine.phase().is_idle() {
            break;
        }
        if flags.is_paused() && machine.phase().is_idle() {
            continue;
        }

        let now = Instant::now();
        let hud_present = match perception.template_present(
            config.regions.battle_hud,
            TemplateId::BattleHud,
            config.perception.match_threshold,
        ) {
            Ok(found) => found,
            Err(error) => {
                tracing::warn!(%error, "battle signal poll failed, treating as absent");
                false
            }
        };
        if machine.phase().is_idle() {
            if detector.observe(hud_present) == Some(BattleEdge::Started) {
                machine.on_battle_detected(now);
            }
        } else {
            // Keep the detector's view current; the machine owns the end
            // of the encounter.
            detector.observe(hud_present);
        }

        if let TickFlow::Finished(result) = machine.tick(now, perception, emitter) {
            detector.reset();
            let wait = cooldown::compute_wait(config.cooldown.reduction_trait, result.duration);
            let errored = result.outcome == Outcome::Errored;
            if events.send(SessionEvent::EncounterFinished(result)).is_err() {
                tracing::warn!("event receiver dropped, stopping session");
                break;
            }
            if flags.is_stopped() {
                break;
            }
            if errored && config.halt_on_input_error {
                tracing::error!("halting after errored encounter per configuration");
                break;
            }
            if !cooldown::wait_out(wait, &flags).await {
                break;
            }
            let _ = events.send(SessionEvent::SearchReady);
        }
    }
    tracing::info!("session stopped");
}

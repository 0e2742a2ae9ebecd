//! Live per-battle state.

use std::time::Instant;

use critbot_types::{IpRating, RarityTier};

use crate::eligibility::Decision;

/// A capture-rate reading taken at a known HP fraction. Produced at most
/// once per encounter, and only while the enemy is at (or within tolerance
/// of) full HP, where the percentage fingerprints the rarity/IP pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureRateSample {
    pub percent: f32,
    pub hp_fraction: f32,
}

/// The mutable record for one battle: created when the battle-start signal
/// fires, dropped when the encounter reaches a terminal phase. The open
/// skill page and the attempt budget live here and nowhere else.
#[derive(Debug, Clone)]
pub struct EncounterState {
    pub started_at: Instant,
    pub sample: Option<CaptureRateSample>,
    pub derived: Option<(RarityTier, IpRating)>,
    /// Eligibility is consulted once per encounter and cached.
    pub decision: Option<Decision>,
    pub attempts_left: u32,
    /// Attempts exhausted without a dialog; capture abandoned for the rest
    /// of the fight.
    pub capture_abandoned: bool,
    pub last_hp_fraction: f32,
    /// Which skill page the client currently shows (1..=3).
    pub open_page: u8,
    pub first_turn_done: bool,
    pub last_action_at: Instant,
}

impl EncounterState {
    pub fn new(now: Instant, attempts: u32) -> Self {
        Self {
            started_at: now,
            sample: None,
            derived: None,
            decision: None,
            attempts_left: attempts,
            capture_abandoned: false,
            last_hp_fraction: 1.0,
            open_page: 1,
            first_turn_done: false,
            last_action_at: now,
        }
    }

    pub fn elapsed(&self, now: Instant) -> std::time::Duration {
        now.duration_since(self.started_at)
    }

    /// Capture is still on the table for this encounter.
    pub fn capture_viable(&self) -> bool {
        self.attempts_left > 0 && !self.capture_abandoned
    }
}

//! Post-battle cooldown scheduling.
//!
//! The game enforces a fixed wait between encounters: 34 seconds, or 24
//! with the reduction trait. Time already spent fighting counts against
//! it, so a long battle can absorb the cooldown entirely. The wait itself
//! is scoped: it polls the pause/stop flags at sub-second granularity
//! instead of sleeping blind.

use std::time::Duration;

use crate::session::ControlFlags;

const BASE_COOLDOWN_SECS: u64 = 34;
const TRAIT_REDUCTION_SECS: u64 = 10;

/// Poll granularity for the scoped wait; bounds operator responsiveness.
const WAIT_SLICE: Duration = Duration::from_millis(100);

/// Effective wait after a battle of the given duration.
pub fn compute_wait(trait_enabled: bool, battle_duration: Duration) -> Duration {
    let base = if trait_enabled {
        BASE_COOLDOWN_SECS - TRAIT_REDUCTION_SECS
    } else {
        BASE_COOLDOWN_SECS
    };
    Duration::from_secs(base).saturating_sub(battle_duration)
}

/// Wait out a cooldown while staying responsive to pause/stop.
///
/// Returns false if a stop request cut the wait short. Pause freezes the
/// countdown rather than cancelling it.
pub async fn wait_out(duration: Duration, flags: &ControlFlags) -> bool {
    let mut remaining = duration;
    while !remaining.is_zero() {
        if flags.is_stopped() {
            tracing::debug!(remaining_ms = remaining.as_millis() as u64, "cooldown aborted by stop");
            return false;
        }
        let slice = remaining.min(WAIT_SLICE);
        tokio::time::sleep(slice).await;
        if !flags.is_paused() {
            remaining = remaining.saturating_sub(slice);
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trait_reduces_base_by_ten() {
        assert_eq!(
            compute_wait(true, Duration::from_secs(20)),
            Duration::from_secs(4)
        );
    }

    #[test]
    fn long_battle_absorbs_cooldown() {
        assert_eq!(
            compute_wait(false, Duration::from_secs(40)),
            Duration::ZERO
        );
    }

    #[test]
    fn zero_duration_battle_pays_full_base() {
        assert_eq!(compute_wait(false, Duration::ZERO), Duration::from_secs(34));
        assert_eq!(compute_wait(true, Duration::ZERO), Duration::from_secs(24));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_completes_when_undisturbed() {
        let flags = ControlFlags::default();
        assert!(wait_out(Duration::from_secs(3), &flags).await);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_aborts_wait() {
        let flags = ControlFlags::default();
        flags.request_stop();
        assert!(!wait_out(Duration::from_secs(30), &flags).await);
    }
}

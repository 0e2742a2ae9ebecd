//! Battle-presence detection with hysteresis.
//!
//! A single frame can misread the HUD (animation frames, popups), so the
//! detector requires N consecutive consistent observations before flipping
//! state. The session feeds it one HUD poll per tick.

/// Edge produced by an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleEdge {
    Started,
    Ended,
}

#[derive(Debug)]
pub struct BattleDetector {
    required_consecutive: u32,
    consecutive: u32,
    last_observation: bool,
    in_battle: bool,
}

impl Default for BattleDetector {
    fn default() -> Self {
        Self::new(2)
    }
}

impl BattleDetector {
    pub fn new(required_consecutive: u32) -> Self {
        Self {
            required_consecutive: required_consecutive.max(1),
            consecutive: 0,
            last_observation: false,
            in_battle: false,
        }
    }

    pub fn in_battle(&self) -> bool {
        self.in_battle
    }

    /// Feed one HUD-presence observation; returns an edge when the
    /// debounced state flips.
    pub fn observe(&mut self, hud_present: bool) -> Option<BattleEdge> {
        if hud_present == self.last_observation {
            self.consecutive += 1;
        } else {
            self.last_observation = hud_present;
            self.consecutive = 1;
        }

        if self.consecutive >= self.required_consecutive && hud_present != self.in_battle {
            self.in_battle = hud_present;
            let edge = if hud_present {
                BattleEdge::Started
            } else {
                BattleEdge::Ended
            };
            tracing::debug!(?edge, "battle presence flipped");
            return Some(edge);
        }
        None
    }

    /// Force the detector back to the searching state (used after the
    /// machine has already concluded the encounter).
    pub fn reset(&mut self) {
        self.consecutive = 0;
        self.last_observation = false;
        self.in_battle = false;
    }
}

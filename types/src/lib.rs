//! Shared configuration types for critbot
//!
//! This crate contains the serializable configuration and game-data types
//! shared between the battle core (critbot-core) and the CLI front end.
//! Everything here is read-only during a run; the core snapshots what it
//! needs at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ─────────────────────────────────────────────────────────────────────────────
// Rarity & IP Rating
// ─────────────────────────────────────────────────────────────────────────────

/// Creature scarcity classification, Common (most common) to Legendary (rarest).
///
/// The derive order gives `Ord` by increasing rarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RarityTier {
    Common,
    Rare,
    Epic,
    Exotic,
    Legendary,
}

impl RarityTier {
    pub const ALL: [RarityTier; 5] = [
        RarityTier::Common,
        RarityTier::Rare,
        RarityTier::Epic,
        RarityTier::Exotic,
        RarityTier::Legendary,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RarityTier::Common => "Common",
            RarityTier::Rare => "Rare",
            RarityTier::Epic => "Epic",
            RarityTier::Exotic => "Exotic",
            RarityTier::Legendary => "Legendary",
        }
    }
}

impl fmt::Display for RarityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// In-game power grade of a creature, F- (weakest) to S+ (strongest).
///
/// Total order is used for "minimum IP" threshold checks; ties count as
/// meeting the minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IpRating {
    #[serde(rename = "F-")]
    FMinus,
    F,
    #[serde(rename = "F+")]
    FPlus,
    D,
    #[serde(rename = "D+")]
    DPlus,
    C,
    #[serde(rename = "C+")]
    CPlus,
    B,
    #[serde(rename = "B+")]
    BPlus,
    A,
    #[serde(rename = "A+")]
    APlus,
    S,
    #[serde(rename = "S+")]
    SPlus,
}

impl IpRating {
    pub const ALL: [IpRating; 13] = [
        IpRating::FMinus,
        IpRating::F,
        IpRating::FPlus,
        IpRating::D,
        IpRating::DPlus,
        IpRating::C,
        IpRating::CPlus,
        IpRating::B,
        IpRating::BPlus,
        IpRating::A,
        IpRating::APlus,
        IpRating::S,
        IpRating::SPlus,
    ];

    /// Position on the weakest-first scale: F- is 0, S+ is 12.
    pub fn index(&self) -> u8 {
        *self as u8
    }

    pub fn name(&self) -> &'static str {
        match self {
            IpRating::FMinus => "F-",
            IpRating::F => "F",
            IpRating::FPlus => "F+",
            IpRating::D => "D",
            IpRating::DPlus => "D+",
            IpRating::C => "C",
            IpRating::CPlus => "C+",
            IpRating::B => "B",
            IpRating::BPlus => "B+",
            IpRating::A => "A",
            IpRating::APlus => "A+",
            IpRating::S => "S",
            IpRating::SPlus => "S+",
        }
    }
}

impl fmt::Display for IpRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Skill Slots
// ─────────────────────────────────────────────────────────────────────────────

/// One of 12 skills laid out across 3 pages of 4 tiles each.
///
/// Serialized as the bare slot number; construction rejects anything
/// outside 1..=12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SkillSlot(u8);

impl SkillSlot {
    pub const MAX: u8 = 12;

    pub fn new(index: u8) -> Result<Self, InvalidSkillSlot> {
        if (1..=Self::MAX).contains(&index) {
            Ok(SkillSlot(index))
        } else {
            Err(InvalidSkillSlot(index))
        }
    }

    pub fn index(&self) -> u8 {
        self.0
    }

    /// Page the slot lives on (1..=3).
    pub fn page(&self) -> u8 {
        (self.0 - 1) / 4 + 1
    }

    /// Tile position within its page (0..=3).
    pub fn position_on_page(&self) -> u8 {
        (self.0 - 1) % 4
    }
}

impl TryFrom<u8> for SkillSlot {
    type Error = InvalidSkillSlot;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        SkillSlot::new(value)
    }
}

impl From<SkillSlot> for u8 {
    fn from(slot: SkillSlot) -> u8 {
        slot.0
    }
}

impl fmt::Display for SkillSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "skill {}", self.0)
    }
}

/// Skill slot outside 1..=12.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidSkillSlot(pub u8);

impl fmt::Display for InvalidSkillSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "skill slot {} out of range 1..=12", self.0)
    }
}

impl std::error::Error for InvalidSkillSlot {}

// ─────────────────────────────────────────────────────────────────────────────
// Geometry
// ─────────────────────────────────────────────────────────────────────────────

/// A clickable point in window client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A region of interest queried for a specific visual signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Battle Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Whether the bot tries to capture eligible creatures or just defeats
/// everything it meets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BattleMode {
    #[default]
    Capture,
    Defeat,
}

/// Per-rarity capture rules, looked up by the eligibility evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerRarityPolicy {
    pub enabled: bool,
    /// Minimum IP rating to bother capturing; F- accepts everything.
    #[serde(default = "default_min_ip")]
    pub min_ip_rating: IpRating,
    pub damage_skill: SkillSlot,
    pub capture_skill: SkillSlot,
}

fn default_min_ip() -> IpRating {
    IpRating::FMinus
}

/// Battle behavior knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSettings {
    pub mode: BattleMode,
    /// Attempt capture once enemy HP is at or below this percent.
    pub capture_hp_percent: f32,
    /// Capture attempts per battle before giving up and defeating.
    pub attempts: u32,
    /// Skill used when the encounter is ineligible or in defeat mode.
    pub defeat_skill: SkillSlot,
    /// When true, the configured capture skill is used on the capture turn
    /// before the capture click; when false the capture click fires directly.
    pub use_capture_skill_before: bool,
    /// Run from ineligible encounters instead of defeating them
    /// (capture mode only).
    pub flee_when_ineligible: bool,
    /// Tolerance (in percent of HP) for treating the first-turn reading as
    /// "full HP" when fingerprinting the capture rate.
    pub hp_full_tolerance_percent: f32,
}

impl Default for BattleSettings {
    fn default() -> Self {
        Self {
            mode: BattleMode::Capture,
            capture_hp_percent: 45.0,
            attempts: 3,
            defeat_skill: SkillSlot(1),
            use_capture_skill_before: true,
            flee_when_ineligible: false,
            hp_full_tolerance_percent: 2.0,
        }
    }
}

/// Per-rarity eligibility table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EligibilitySettings {
    #[serde(default)]
    pub per_rarity: HashMap<RarityTier, PerRarityPolicy>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Timeouts & Cooldown
// ─────────────────────────────────────────────────────────────────────────────

/// Deadline budgets for every bounded wait in the battle machine.
/// All in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutSettings {
    /// Waiting for the turn-ready indicator.
    pub turn_ready_ms: u64,
    /// Extra turn-ready waits before falling through to the forced defeat path.
    pub turn_ready_retries: u32,
    /// Waiting for the skill animation to finish.
    pub animation_ms: u64,
    /// Waiting for the capture dialog after a capture click.
    pub capture_dialog_ms: u64,
    /// Waiting for the battle UI to clear after the continue click.
    pub battle_ui_clear_ms: u64,
    /// Main loop tick interval; also the responsiveness bound for
    /// pause/stop requests.
    pub poll_interval_ms: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            turn_ready_ms: 8_000,
            turn_ready_retries: 3,
            animation_ms: 6_000,
            capture_dialog_ms: 4_000,
            battle_ui_clear_ms: 5_000,
            poll_interval_ms: 100,
        }
    }
}

/// Post-battle cooldown inputs. The base is fixed by the game (34 s, or
/// 24 s with the reduction trait); only the trait flag is configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CooldownSettings {
    pub reduction_trait: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Screen Regions & UI Layout
// ─────────────────────────────────────────────────────────────────────────────

/// Regions of interest the battle machine polls. Defaults assume a
/// 1920x1080 client area; proportions follow the game's fixed HUD layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Regions {
    /// Bottom-left area holding the Run button; presence means "in battle".
    pub battle_hud: Rect,
    /// "It's your turn" banner area.
    pub turn_indicator: Rect,
    /// Enemy HP bar near the top-right HUD.
    pub enemy_hp_bar: Rect,
    /// Capture-rate percentage text under the enemy portrait.
    pub capture_rate: Rect,
    /// Keep/Release dialog area after a successful capture.
    pub capture_dialog: Rect,
    /// Continue button / victory banner area.
    pub continue_button: Rect,
}

impl Default for Regions {
    fn default() -> Self {
        Self {
            battle_hud: Rect::new(0, 713, 634, 367),
            turn_indicator: Rect::new(672, 820, 576, 80),
            enemy_hp_bar: Rect::new(1114, 32, 730, 184),
            capture_rate: Rect::new(1114, 220, 320, 60),
            capture_dialog: Rect::new(576, 270, 768, 540),
            continue_button: Rect::new(768, 864, 384, 150),
        }
    }
}

/// Click targets for the abstract input commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiLayout {
    /// Skill page tabs, left to right (pages 1..=3).
    pub page_tabs: [Point; 3],
    /// Skill tiles on the open page, left to right (positions 0..=3).
    pub skill_tiles: [Point; 4],
    pub capture_button: Point,
    pub keep_button: Point,
    pub continue_button: Point,
    pub flee_button: Point,
}

impl Default for UiLayout {
    fn default() -> Self {
        Self {
            page_tabs: [
                Point::new(700, 930),
                Point::new(760, 930),
                Point::new(820, 930),
            ],
            skill_tiles: [
                Point::new(700, 1000),
                Point::new(860, 1000),
                Point::new(1020, 1000),
                Point::new(1180, 1000),
            ],
            capture_button: Point::new(1420, 1000),
            keep_button: Point::new(860, 690),
            continue_button: Point::new(960, 940),
            flee_button: Point::new(160, 1000),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Input & Perception Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Which synthetic-input backend to instantiate at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputBackendKind {
    /// Window messages sent directly to the game client; cursor untouched.
    #[default]
    DirectWindow,
    /// OS-level cursor movement and clicks; requires focus.
    OsCursor,
}

/// Input pacing. All in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacingSettings {
    /// Delay after any click.
    pub click_delay_ms: u64,
    /// Settle delay after switching skill pages.
    pub page_settle_ms: u64,
}

impl Default for PacingSettings {
    fn default() -> Self {
        Self {
            click_delay_ms: 120,
            page_settle_ms: 350,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InputSettings {
    pub backend: InputBackendKind,
    #[serde(default)]
    pub pacing: PacingSettings,
}

/// Template-match acceptance threshold (0.0..=1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerceptionSettings {
    pub match_threshold: f32,
}

impl Default for PerceptionSettings {
    fn default() -> Self {
        Self {
            match_threshold: 0.82,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Top-Level Config
// ─────────────────────────────────────────────────────────────────────────────

/// The whole run configuration. Persisted via confy; read-only during a run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub battle: BattleSettings,
    pub eligibility: EligibilitySettings,
    pub timeouts: TimeoutSettings,
    pub cooldown: CooldownSettings,
    pub regions: Regions,
    pub layout: UiLayout,
    pub input: InputSettings,
    pub perception: PerceptionSettings,
    /// Stop the whole run when an input dispatch fails, instead of moving
    /// on to the next encounter.
    pub halt_on_input_error: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ip_rating_order_is_weakest_first() {
        assert!(IpRating::FMinus < IpRating::F);
        assert!(IpRating::BPlus < IpRating::A);
        assert!(IpRating::A < IpRating::APlus);
        assert!(IpRating::S < IpRating::SPlus);
        assert_eq!(IpRating::FMinus.index(), 0);
        assert_eq!(IpRating::SPlus.index(), 12);
    }

    #[test]
    fn rarity_order_is_common_first() {
        assert!(RarityTier::Common < RarityTier::Rare);
        assert!(RarityTier::Exotic < RarityTier::Legendary);
    }

    #[test]
    fn skill_slot_page_math() {
        let s1 = SkillSlot::new(1).unwrap();
        let s4 = SkillSlot::new(4).unwrap();
        let s5 = SkillSlot::new(5).unwrap();
        let s9 = SkillSlot::new(9).unwrap();
        let s12 = SkillSlot::new(12).unwrap();

        assert_eq!((s1.page(), s1.position_on_page()), (1, 0));
        assert_eq!((s4.page(), s4.position_on_page()), (1, 3));
        assert_eq!((s5.page(), s5.position_on_page()), (2, 0));
        assert_eq!((s9.page(), s9.position_on_page()), (3, 0));
        assert_eq!((s12.page(), s12.position_on_page()), (3, 3));
    }

    #[test]
    fn skill_slot_rejects_out_of_range() {
        assert!(SkillSlot::new(0).is_err());
        assert!(SkillSlot::new(13).is_err());
    }
}

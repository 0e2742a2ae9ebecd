//! Configuration persistence and startup validation.
//!
//! The shared types live in critbot-types; this module adds confy-backed
//! load/save and the startup validation pass. Validation failures are
//! fatal: a malformed config must never be discovered mid-battle.

use critbot_types::{AppConfig, BattleMode, RarityTier, Rect};
use thiserror::Error;

const APP_NAME: &str = "critbot";
const CONFIG_NAME: &str = "config";

/// Errors during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration")]
    Load(#[from] confy::ConfyError),

    #[error("failed to save configuration")]
    Save(#[source] confy::ConfyError),

    #[error("capture_hp_percent {value} outside 1..=99")]
    CaptureHpOutOfRange { value: f32 },

    #[error("capture attempts must be at least 1")]
    ZeroAttempts,

    #[error("hp_full_tolerance_percent {value} outside 0..=10")]
    ToleranceOutOfRange { value: f32 },

    #[error("no eligibility entry for rarity {rarity} (capture mode requires a full table)")]
    MissingPolicy { rarity: RarityTier },

    #[error("region '{name}' has zero width or height")]
    EmptyRegion { name: &'static str },

    #[error("poll_interval_ms {value} outside 10..=1000")]
    PollIntervalOutOfRange { value: u64 },

    #[error("match_threshold {value} outside 0.0..=1.0")]
    ThresholdOutOfRange { value: f32 },
}

/// Extension trait for AppConfig persistence.
pub trait AppConfigExt: Sized {
    fn load() -> Result<Self, ConfigError>;
    fn save(&self) -> Result<(), ConfigError>;
}

impl AppConfigExt for AppConfig {
    fn load() -> Result<Self, ConfigError> {
        let config: AppConfig = confy::load(APP_NAME, CONFIG_NAME)?;
        Ok(config)
    }

    fn save(&self) -> Result<(), ConfigError> {
        confy::store(APP_NAME, CONFIG_NAME, self).map_err(ConfigError::Save)
    }
}

/// Validate a configuration before a run starts.
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let battle = &config.battle;

    if !(1.0..=99.0).contains(&battle.capture_hp_percent) {
        return Err(ConfigError::CaptureHpOutOfRange {
            value: battle.capture_hp_percent,
        });
    }
    if battle.attempts == 0 {
        return Err(ConfigError::ZeroAttempts);
    }
    // A negative tolerance would make the full-HP fingerprint gate
    // unsatisfiable and silently degrade every encounter to unknown.
    if !(0.0..=10.0).contains(&battle.hp_full_tolerance_percent) {
        return Err(ConfigError::ToleranceOutOfRange {
            value: battle.hp_full_tolerance_percent,
        });
    }

    // Capture mode needs a policy row for every rarity, even if disabled,
    // so a mid-battle lookup can never come up empty by accident.
    if battle.mode == BattleMode::Capture {
        for rarity in RarityTier::ALL {
            if !config.eligibility.per_rarity.contains_key(&rarity) {
                return Err(ConfigError::MissingPolicy { rarity });
            }
        }
    }

    let regions: [(&'static str, Rect); 6] = [
        ("battle_hud", config.regions.battle_hud),
        ("turn_indicator", config.regions.turn_indicator),
        ("enemy_hp_bar", config.regions.enemy_hp_bar),
        ("capture_rate", config.regions.capture_rate),
        ("capture_dialog", config.regions.capture_dialog),
        ("continue_button", config.regions.continue_button),
    ];
    for (name, rect) in regions {
        if rect.is_empty() {
            return Err(ConfigError::EmptyRegion { name });
        }
    }

    if !(10..=1000).contains(&config.timeouts.poll_interval_ms) {
        return Err(ConfigError::PollIntervalOutOfRange {
            value: config.timeouts.poll_interval_ms,
        });
    }

    if !(0.0..=1.0).contains(&config.perception.match_threshold) {
        return Err(ConfigError::ThresholdOutOfRange {
            value: config.perception.match_threshold,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use critbot_types::{IpRating, PerRarityPolicy, SkillSlot};

    fn full_table_config() -> AppConfig {
        let mut config = AppConfig::default();
        for rarity in RarityTier::ALL {
            config.eligibility.per_rarity.insert(
                rarity,
                PerRarityPolicy {
                    enabled: true,
                    min_ip_rating: IpRating::A,
                    damage_skill: SkillSlot::new(1).unwrap(),
                    capture_skill: SkillSlot::new(2).unwrap(),
                },
            );
        }
        config
    }

    #[test]
    fn default_config_with_full_table_validates() {
        assert!(validate_config(&full_table_config()).is_ok());
    }

    #[test]
    fn capture_mode_requires_every_rarity() {
        let mut config = full_table_config();
        config.eligibility.per_rarity.remove(&RarityTier::Exotic);
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingPolicy {
                rarity: RarityTier::Exotic
            })
        ));
    }

    #[test]
    fn defeat_mode_allows_empty_table() {
        let mut config = AppConfig::default();
        config.battle.mode = BattleMode::Defeat;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn rejects_empty_region() {
        let mut config = full_table_config();
        config.regions.enemy_hp_bar = Rect::new(10, 10, 0, 20);
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::EmptyRegion {
                name: "enemy_hp_bar"
            })
        ));
    }

    #[test]
    fn rejects_negative_tolerance() {
        let mut config = full_table_config();
        config.battle.hp_full_tolerance_percent = -1.0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ToleranceOutOfRange { .. })
        ));
    }

    #[test]
    fn rejects_zero_attempts() {
        let mut config = full_table_config();
        config.battle.attempts = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ZeroAttempts)
        ));
    }
}

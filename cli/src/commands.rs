use std::io::Write;

use critbot_core::AppConfigExt;
use critbot_core::game_data;
use critbot_core::types::{BattleMode, IpRating, RarityTier};

use crate::CliContext;
use crate::sim;

pub async fn show_config(ctx: &CliContext) {
    let config = ctx.config.read().await;
    println!("{config:#?}");
}

/// Tweak one of the commonly-adjusted battle settings and persist.
pub async fn set_field(ctx: &CliContext, field: &str, value: &str) -> Result<(), String> {
    let mut config = ctx.config.write().await;
    match field {
        "mode" => {
            config.battle.mode = match value {
                "capture" => BattleMode::Capture,
                "defeat" => BattleMode::Defeat,
                other => return Err(format!("unknown mode: {other}")),
            };
        }
        "capture-hp" => {
            config.battle.capture_hp_percent =
                value.parse().map_err(|e| format!("bad percent: {e}"))?;
        }
        "attempts" => {
            config.battle.attempts = value.parse().map_err(|e| format!("bad count: {e}"))?;
        }
        "flee" => {
            config.battle.flee_when_ineligible =
                value.parse().map_err(|e| format!("bad flag: {e}"))?;
        }
        "cooldown-trait" => {
            config.cooldown.reduction_trait =
                value.parse().map_err(|e| format!("bad flag: {e}"))?;
        }
        other => {
            return Err(format!(
                "unknown field: {other} (mode, capture-hp, attempts, flee, cooldown-trait)"
            ));
        }
    }
    config.save().map_err(|e| e.to_string())?;
    println!("{field} = {value}");
    Ok(())
}

/// Print the full-HP capture-rate table, one row per rarity.
pub fn show_rates() {
    let header: Vec<String> = IpRating::ALL.iter().map(|ip| format!("{:>4}", ip)).collect();
    println!("{:<10}{}", "", header.join(""));
    for rarity in RarityTier::ALL {
        let row: Vec<String> = IpRating::ALL
            .iter()
            .map(|ip| format!("{:>4.0}", game_data::expected_full_hp_rate(rarity, *ip)))
            .collect();
        println!("{:<10}{}", rarity.name(), row.join(""));
    }
}

pub async fn simulate(ctx: &CliContext, rate: f32) -> Result<(), String> {
    let config = ctx.config.read().await.clone();
    critbot_core::validate_config(&config).map_err(|e| e.to_string())?;
    match sim::run_encounter(&config, rate) {
        Some(result) => {
            let identity = match (result.rarity, result.ip_rating) {
                (Some(rarity), Some(ip)) => format!("{rarity} {ip}"),
                _ => "unknown".to_string(),
            };
            println!(
                "outcome: {} ({identity}), {:.1}s",
                result.outcome.name(),
                result.duration.as_secs_f32()
            );
            Ok(())
        }
        None => Err("simulation never settled; check the timeout settings".to_string()),
    }
}

pub fn pause(ctx: &CliContext) {
    ctx.flags.request_pause();
}

pub fn resume(ctx: &CliContext) {
    ctx.flags.resume();
}

pub fn stop(ctx: &CliContext) {
    ctx.flags.request_stop();
}

pub fn exit() {
    write!(std::io::stdout(), "quitting...").expect("error exiting");
    std::io::stdout().flush().expect("error flushing stdout");
}

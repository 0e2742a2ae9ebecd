//! Capture-rate fingerprint table.
//!
//! At full HP the displayed capture percentage is a fingerprint of the
//! enemy's (rarity, IP rating) pair: each rarity has a base rate and every
//! IP step above F- shaves 2 points off it. The bands genuinely overlap in
//! places (Exotic and Legendary share the even 14–30 range), so derivation
//! can be ambiguous; ambiguity is reported, never guessed away.

use critbot_types::{IpRating, RarityTier};

/// Full-HP capture percent at the weakest rating (F-) for each rarity.
fn base_rate(rarity: RarityTier) -> u8 {
    match rarity {
        RarityTier::Common => 75,
        RarityTier::Rare => 60,
        RarityTier::Epic => 45,
        RarityTier::Exotic => 38,
        RarityTier::Legendary => 30,
    }
}

/// Expected full-HP capture percent for one (rarity, IP) cell.
pub fn expected_full_hp_rate(rarity: RarityTier, ip: IpRating) -> u8 {
    base_rate(rarity) - 2 * ip.index()
}

/// Outcome of matching an observed full-HP capture percentage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Derivation {
    Resolved(RarityTier, IpRating),
    /// More than one cell matches the observed percentage.
    Ambiguous(Vec<(RarityTier, IpRating)>),
    NoMatch,
}

/// Match an observed full-HP capture percentage against the table.
///
/// The observation is rounded to the nearest whole percent before
/// comparison; OCR never yields a trustworthy fraction.
pub fn derive_rarity_ip(observed_percent: f32) -> Derivation {
    let rounded = observed_percent.round();
    if !(0.0..=100.0).contains(&rounded) {
        return Derivation::NoMatch;
    }
    let rounded = rounded as u8;

    let mut matches = Vec::new();
    for rarity in RarityTier::ALL {
        for ip in IpRating::ALL {
            if expected_full_hp_rate(rarity, ip) == rounded {
                matches.push((rarity, ip));
            }
        }
    }

    match matches.len() {
        0 => Derivation::NoMatch,
        1 => Derivation::Resolved(matches[0].0, matches[0].1),
        _ => Derivation::Ambiguous(matches),
    }
}

//! Capture-eligibility evaluation.
//!
//! Pure: the battle machine calls this once per encounter after the
//! first-turn rarity/IP derivation (or with `None` when derivation failed,
//! which always maps to ineligible).

use critbot_types::{IpRating, PerRarityPolicy, RarityTier, SkillSlot};
use hashbrown::HashMap;

/// What the evaluator decided for this encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub eligible: bool,
    pub damage_skill: SkillSlot,
    /// Only meaningful when eligible.
    pub capture_skill: SkillSlot,
}

impl Decision {
    fn ineligible(defeat_skill: SkillSlot) -> Self {
        Self {
            eligible: false,
            damage_skill: defeat_skill,
            capture_skill: defeat_skill,
        }
    }
}

/// Evaluate capture eligibility for a derived (rarity, IP) pair.
///
/// Unknown derivation, missing table entry, or a disabled entry all fall
/// back to the global defeat skill with capture off. Ties on the minimum
/// rating count as eligible.
pub fn evaluate(
    derived: Option<(RarityTier, IpRating)>,
    table: &HashMap<RarityTier, PerRarityPolicy>,
    defeat_skill: SkillSlot,
) -> Decision {
    let Some((rarity, ip)) = derived else {
        return Decision::ineligible(defeat_skill);
    };

    let Some(policy) = table.get(&rarity) else {
        return Decision::ineligible(defeat_skill);
    };

    if !policy.enabled || ip < policy.min_ip_rating {
        return Decision::ineligible(defeat_skill);
    }

    Decision {
        eligible: true,
        damage_skill: policy.damage_skill,
        capture_skill: policy.capture_skill,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(n: u8) -> SkillSlot {
        SkillSlot::new(n).unwrap()
    }

    fn table_with(rarity: RarityTier, enabled: bool, min: IpRating) -> HashMap<RarityTier, PerRarityPolicy> {
        let mut table = HashMap::new();
        table.insert(
            rarity,
            PerRarityPolicy {
                enabled,
                min_ip_rating: min,
                damage_skill: slot(3),
                capture_skill: slot(7),
            },
        );
        table
    }

    #[test]
    fn equal_rating_is_eligible() {
        let table = table_with(RarityTier::Legendary, true, IpRating::A);
        let decision = evaluate(
            Some((RarityTier::Legendary, IpRating::A)),
            &table,
            slot(1),
        );
        assert!(decision.eligible);
        assert_eq!(decision.damage_skill, slot(3));
        assert_eq!(decision.capture_skill, slot(7));
    }

    #[test]
    fn below_minimum_is_ineligible() {
        let table = table_with(RarityTier::Legendary, true, IpRating::A);
        let decision = evaluate(
            Some((RarityTier::Legendary, IpRating::BPlus)),
            &table,
            slot(1),
        );
        assert!(!decision.eligible);
        assert_eq!(decision.damage_skill, slot(1));
    }

    #[test]
    fn above_minimum_is_eligible() {
        let table = table_with(RarityTier::Epic, true, IpRating::B);
        assert!(evaluate(Some((RarityTier::Epic, IpRating::SPlus)), &table, slot(1)).eligible);
    }

    #[test]
    fn disabled_entry_is_ineligible() {
        let table = table_with(RarityTier::Rare, false, IpRating::FMinus);
        assert!(!evaluate(Some((RarityTier::Rare, IpRating::SPlus)), &table, slot(1)).eligible);
    }

    #[test]
    fn missing_entry_is_ineligible() {
        let table = table_with(RarityTier::Rare, true, IpRating::FMinus);
        assert!(!evaluate(Some((RarityTier::Common, IpRating::SPlus)), &table, slot(1)).eligible);
    }

    #[test]
    fn unknown_derivation_is_ineligible() {
        let table = table_with(RarityTier::Legendary, true, IpRating::FMinus);
        let decision = evaluate(None, &table, slot(4));
        assert!(!decision.eligible);
        assert_eq!(decision.damage_skill, slot(4));
    }

    #[test]
    fn every_enabled_cell_matches_threshold_rule() {
        // Eligibility must equal (ip >= min) across the whole grid.
        for min in IpRating::ALL {
            let table = table_with(RarityTier::Exotic, true, min);
            for ip in IpRating::ALL {
                let decision = evaluate(Some((RarityTier::Exotic, ip)), &table, slot(1));
                assert_eq!(decision.eligible, ip >= min, "ip={ip} min={min}");
            }
        }
    }
}

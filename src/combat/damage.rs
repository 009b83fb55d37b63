//! Damage calculation
//!
//! Pure combat math: chain and combo multipliers, elemental affinity,
//! the attack pipeline, and heal/shield amounts.

use serde::{Deserialize, Serialize};

use crate::board::ElementKind;

/// Chain length at which the multiplier caps
pub const CHAIN_CAP_LENGTH: usize = 10;
/// Multiplier at and beyond `CHAIN_CAP_LENGTH`
pub const CHAIN_CAP_MULTIPLIER: f32 = 5.0;
/// Combo bonus per streak step
pub const COMBO_STEP: f32 = 0.15;
/// Combo multiplier ceiling
pub const COMBO_CAP: f32 = 2.0;
/// Heal per chained tile, as a fraction of max HP
pub const HEAL_PER_TILE: f32 = 0.05;
/// Flat Heal Boost bonus, as a fraction of max HP
pub const HEAL_BOOST: f32 = 0.05;
/// Shield per chained tile, as a fraction of max HP
pub const SHIELD_PER_TILE: f32 = 0.03;

/// Multipliers applied when one element beats another
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffinityTable {
    /// Attacker has the advantage
    pub strong: f32,
    /// Attacker is at a disadvantage
    pub weak: f32,
}

impl Default for AffinityTable {
    fn default() -> Self {
        Self { strong: 1.25, weak: 0.3 }
    }
}

/// Chain multiplier: `1 + 4/9 * (n - 1)`, reaching 5x at ten tiles
pub fn chain_multiplier(chain_count: usize) -> f32 {
    if chain_count <= 1 {
        return 1.0;
    }
    let k = (CHAIN_CAP_MULTIPLIER - 1.0) / (CHAIN_CAP_LENGTH - 1) as f32;
    (1.0 + k * (chain_count - 1) as f32).min(CHAIN_CAP_MULTIPLIER)
}

/// Combo multiplier: +15% per consecutive step, capped at 2x
pub fn combo_multiplier(streak: u32) -> f32 {
    let steps = streak.saturating_sub(1) as f32;
    (1.0 + COMBO_STEP * steps).min(COMBO_CAP)
}

/// Element that `attacker` beats on the pentagon (Fire > Wind > Earth > Lightning > Water > Fire)
/// or on the Light/Dark axis
fn beats(attacker: ElementKind) -> Option<ElementKind> {
    match attacker {
        ElementKind::Fire => Some(ElementKind::Wind),
        ElementKind::Wind => Some(ElementKind::Earth),
        ElementKind::Earth => Some(ElementKind::Lightning),
        ElementKind::Lightning => Some(ElementKind::Water),
        ElementKind::Water => Some(ElementKind::Fire),
        ElementKind::Light => Some(ElementKind::Dark),
        ElementKind::Dark => Some(ElementKind::Light),
        ElementKind::Heal | ElementKind::Shield | ElementKind::Major => None,
    }
}

/// Affinity multiplier of `attacker` against `defender`.
///
/// Utility elements are always neutral. Light and Dark each beat the other.
pub fn element_affinity(attacker: ElementKind, defender: ElementKind, table: &AffinityTable) -> f32 {
    if !attacker.is_combat() || !defender.is_combat() {
        return 1.0;
    }
    if beats(attacker) == Some(defender) {
        return table.strong;
    }
    // Light/Dark is mutual, so only the pentagon has a weak side
    let mutual = matches!(attacker, ElementKind::Light | ElementKind::Dark);
    if !mutual && beats(defender) == Some(attacker) {
        return table.weak;
    }
    1.0
}

/// Modifier values contributed by items, majors and relics.
///
/// The pipeline applies them in a fixed order: flat attack first, then the
/// chain/combo/affinity product, then the late damage adjustments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackModifiers {
    /// Added to base attack before any multiplier
    pub flat_attack: f32,
    /// Scales the chain multiplier (Pure major)
    pub chain_scale: f32,
    /// Scales an advantaged affinity (Dragon major)
    pub advantage_scale: f32,
    /// Scales the product after multipliers (Barrier major, Black Contract)
    pub damage_scale: f32,
    /// Added after everything else (MagiTech, residue mana)
    pub flat_damage: f32,
}

impl Default for AttackModifiers {
    fn default() -> Self {
        Self {
            flat_attack: 0.0,
            chain_scale: 1.0,
            advantage_scale: 1.0,
            damage_scale: 1.0,
            flat_damage: 0.0,
        }
    }
}

/// Inputs describing one attack
#[derive(Debug, Clone, Copy)]
pub struct AttackInput {
    pub base_attack: f32,
    /// Chain count after item and major adjustments
    pub chain_count: usize,
    pub combo_streak: u32,
    pub attacker: ElementKind,
    pub defender: ElementKind,
}

/// Breakdown of a resolved attack
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackBreakdown {
    /// Attack after flat bonuses
    pub attack: f32,
    pub chain_count: usize,
    pub chain_multiplier: f32,
    pub combo_multiplier: f32,
    pub affinity_multiplier: f32,
    /// Final damage, never negative
    pub damage: f32,
}

/// Run the attack pipeline
pub fn calculate_attack(input: &AttackInput, table: &AffinityTable, mods: &AttackModifiers) -> AttackBreakdown {
    let attack = input.base_attack + mods.flat_attack;

    let chain_mult = chain_multiplier(input.chain_count) * mods.chain_scale;
    let combo_mult = combo_multiplier(input.combo_streak);
    let mut affinity = element_affinity(input.attacker, input.defender, table);
    if affinity > 1.0 {
        affinity *= mods.advantage_scale;
    }

    let raw = attack * chain_mult * combo_mult * affinity;
    let damage = (raw * mods.damage_scale + mods.flat_damage).max(0.0);

    AttackBreakdown {
        attack,
        chain_count: input.chain_count,
        chain_multiplier: chain_mult,
        combo_multiplier: combo_mult,
        affinity_multiplier: affinity,
        damage,
    }
}

/// Heal from a chain of Heal tiles, clamped to missing HP
pub fn heal_amount(max_hp: f32, current_hp: f32, chain_count: usize, heal_boost: bool) -> f32 {
    if chain_count == 0 {
        return 0.0;
    }
    let mut amount = max_hp * HEAL_PER_TILE * chain_count as f32;
    if heal_boost {
        amount += max_hp * HEAL_BOOST;
    }
    let missing = (max_hp - current_hp).max(0.0);
    amount.min(missing)
}

/// Shield from a chain of Shield tiles (before the shield cap)
pub fn shield_amount(max_hp: f32, chain_count: usize) -> f32 {
    max_hp * SHIELD_PER_TILE * chain_count as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_chain_multiplier() {
        assert_eq!(chain_multiplier(0), 1.0);
        assert_eq!(chain_multiplier(1), 1.0);
        assert!(approx(chain_multiplier(5), 1.0 + 4.0 / 9.0 * 4.0));
        assert!(approx(chain_multiplier(10), 5.0));
        assert_eq!(chain_multiplier(25), 5.0);

        let mut last = 0.0;
        for n in 0..30 {
            let m = chain_multiplier(n);
            assert!(m >= last);
            assert!(m <= CHAIN_CAP_MULTIPLIER);
            last = m;
        }
    }

    #[test]
    fn test_combo_multiplier() {
        assert_eq!(combo_multiplier(1), 1.0);
        assert!(approx(combo_multiplier(2), 1.15));
        // 1 + 0.15 * 6 = 1.9, 1 + 0.15 * 7 = 2.05 -> capped
        assert!(combo_multiplier(7) > combo_multiplier(6));
        assert_eq!(combo_multiplier(8), 2.0);
        assert_eq!(combo_multiplier(50), 2.0);
    }

    #[test]
    fn test_pentagon_affinity() {
        use ElementKind::*;
        let t = AffinityTable::default();
        let cycle = [Fire, Wind, Earth, Lightning, Water];
        for i in 0..5 {
            let a = cycle[i];
            let b = cycle[(i + 1) % 5];
            assert_eq!(element_affinity(a, b, &t), t.strong, "{a} vs {b}");
            assert_eq!(element_affinity(b, a, &t), t.weak, "{b} vs {a}");
        }
        assert_eq!(element_affinity(Fire, Earth, &t), 1.0);
        assert_eq!(element_affinity(Fire, Fire, &t), 1.0);
    }

    #[test]
    fn test_light_dark_and_utility() {
        use ElementKind::*;
        let t = AffinityTable::default();
        assert_eq!(element_affinity(Light, Dark, &t), t.strong);
        assert_eq!(element_affinity(Dark, Light, &t), t.strong);
        assert_eq!(element_affinity(Light, Fire, &t), 1.0);
        assert_eq!(element_affinity(Heal, Fire, &t), 1.0);
        assert_eq!(element_affinity(Fire, Shield, &t), 1.0);
    }

    #[test]
    fn test_five_chain_neutral_attack() {
        let input = AttackInput {
            base_attack: 10.0,
            chain_count: 5,
            combo_streak: 1,
            attacker: ElementKind::Fire,
            defender: ElementKind::Earth,
        };
        let result = calculate_attack(&input, &AffinityTable::default(), &AttackModifiers::default());
        assert!(approx(result.chain_multiplier, 2.7778));
        assert!(approx(result.damage, 27.7778));
    }

    #[test]
    fn test_modifier_order() {
        let input = AttackInput {
            base_attack: 10.0,
            chain_count: 1,
            combo_streak: 1,
            attacker: ElementKind::Water,
            defender: ElementKind::Fire,
        };
        let mods = AttackModifiers {
            flat_attack: 2.0,
            advantage_scale: 2.0,
            damage_scale: 0.5,
            flat_damage: 3.0,
            ..Default::default()
        };
        let result = calculate_attack(&input, &AffinityTable::default(), &mods);
        // (10 + 2) * 1 * 1 * (1.25 * 2) * 0.5 + 3
        assert!(approx(result.damage, 18.0));
        assert!(approx(result.attack, 12.0));
    }

    #[test]
    fn test_heal_clamped_to_missing() {
        assert!(approx(heal_amount(100.0, 50.0, 3, false), 15.0));
        assert!(approx(heal_amount(100.0, 50.0, 3, true), 20.0));
        assert!(approx(heal_amount(100.0, 95.0, 4, false), 5.0));
        assert_eq!(heal_amount(100.0, 100.0, 4, true), 0.0);
        assert_eq!(heal_amount(100.0, 10.0, 0, true), 0.0);
    }

    #[test]
    fn test_shield_amount() {
        assert!(approx(shield_amount(100.0, 4), 12.0));
    }
}

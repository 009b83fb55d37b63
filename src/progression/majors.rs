//! Endless-mode majors
//!
//! Two slots, each holding an active major or a passive major at level 1-5.
//! Every hook is a pure function of the held majors and their levels and is
//! the identity when the major is not held.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of major slots
pub const SLOT_COUNT: usize = 2;
/// Highest major level
pub const MAX_LEVEL: u8 = 5;

/// Active majors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MajorKind {
    /// More damage taken, board shuffled every turn
    Chaos,
    /// Weaker chain multiplier
    Pure,
    /// Carries the previous chain into the next one
    Rune,
    /// Stronger elemental advantage, pricier shop
    Dragon,
    /// Damage bonus from the board's most common element
    MagiTech,
    /// Blunts enemy attacks, weakens own damage
    Barrier,
}

/// Passive majors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassiveKind {
    FireExplosion,
    WaterSnow,
    LightningBolt,
    WindGale,
    EarthCrystal,
    DarkDeath,
    LightHoly,
}

/// What a slot holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MajorChoice {
    Active(MajorKind),
    Passive(PassiveKind),
}

impl MajorChoice {
    /// Every choice, actives first
    pub const ALL: [MajorChoice; 13] = [
        MajorChoice::Active(MajorKind::Chaos),
        MajorChoice::Active(MajorKind::Pure),
        MajorChoice::Active(MajorKind::Rune),
        MajorChoice::Active(MajorKind::Dragon),
        MajorChoice::Active(MajorKind::MagiTech),
        MajorChoice::Active(MajorKind::Barrier),
        MajorChoice::Passive(PassiveKind::FireExplosion),
        MajorChoice::Passive(PassiveKind::WaterSnow),
        MajorChoice::Passive(PassiveKind::LightningBolt),
        MajorChoice::Passive(PassiveKind::WindGale),
        MajorChoice::Passive(PassiveKind::EarthCrystal),
        MajorChoice::Passive(PassiveKind::DarkDeath),
        MajorChoice::Passive(PassiveKind::LightHoly),
    ];

    pub fn is_active(&self) -> bool {
        matches!(self, MajorChoice::Active(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            MajorChoice::Active(kind) => match kind {
                MajorKind::Chaos => "Chaos",
                MajorKind::Pure => "Pure",
                MajorKind::Rune => "Rune",
                MajorKind::Dragon => "Dragon",
                MajorKind::MagiTech => "MagiTech",
                MajorKind::Barrier => "Barrier",
            },
            MajorChoice::Passive(kind) => match kind {
                PassiveKind::FireExplosion => "Fire Explosion",
                PassiveKind::WaterSnow => "Water Snow",
                PassiveKind::LightningBolt => "Lightning Bolt",
                PassiveKind::WindGale => "Wind Gale",
                PassiveKind::EarthCrystal => "Earth Crystal",
                PassiveKind::DarkDeath => "Dark Death",
                PassiveKind::LightHoly => "Light Holy",
            },
        }
    }
}

impl std::fmt::Display for MajorChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A filled slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MajorSlot {
    pub choice: MajorChoice,
    pub level: u8,
}

/// Both major slots plus the Rune memory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MajorProgression {
    slots: [Option<MajorSlot>; SLOT_COUNT],
    /// Last raw chain stored by Rune
    rune_last_chain: usize,
}

impl MajorProgression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, index: usize) -> Option<MajorSlot> {
        self.slots.get(index).copied().flatten()
    }

    pub fn slots(&self) -> impl Iterator<Item = MajorSlot> + '_ {
        self.slots.iter().flatten().copied()
    }

    /// Put a major in a slot. Re-selecting the held major levels it up instead.
    pub fn select(&mut self, index: usize, choice: MajorChoice) -> bool {
        if index >= SLOT_COUNT {
            return false;
        }
        if self.slot(index).map(|s| s.choice) == Some(choice) {
            return self.level_up(index);
        }

        self.slots[index] = Some(MajorSlot { choice, level: 1 });
        log::info!("Major slot {} set to {}", index, choice);
        true
    }

    /// Raise a slot's level. False when empty or already at max.
    pub fn level_up(&mut self, index: usize) -> bool {
        let Some(Some(held)) = self.slots.get_mut(index) else {
            return false;
        };
        if held.level >= MAX_LEVEL {
            log::debug!("{} already at max level", held.choice);
            return false;
        }
        held.level += 1;
        log::info!("{} leveled up to {}", held.choice, held.level);
        true
    }

    /// A major book levels up whichever slot holds that major
    pub fn use_major_book(&mut self, choice: MajorChoice) -> bool {
        match self.slots.iter().position(|s| s.map(|s| s.choice) == Some(choice)) {
            Some(index) => self.level_up(index),
            None => {
                log::debug!("Major book for {} has no matching slot", choice);
                false
            }
        }
    }

    /// Level of a held major, 0 when not held
    pub fn level_of(&self, choice: MajorChoice) -> u8 {
        self.slots()
            .find(|s| s.choice == choice)
            .map(|s| s.level)
            .unwrap_or(0)
    }

    fn active_level(&self, kind: MajorKind) -> Option<f32> {
        match self.level_of(MajorChoice::Active(kind)) {
            0 => None,
            l => Some(l as f32),
        }
    }

    fn passive_level(&self, kind: PassiveKind) -> Option<f32> {
        match self.level_of(MajorChoice::Passive(kind)) {
            0 => None,
            l => Some(l as f32),
        }
    }

    pub fn has(&self, choice: MajorChoice) -> bool {
        self.level_of(choice) > 0
    }

    /// Distinct random picks for a selection screen
    pub fn roll_offers(count: usize, rng: &mut impl Rng) -> Vec<MajorChoice> {
        MajorChoice::ALL.choose_multiple(rng, count.min(MajorChoice::ALL.len())).copied().collect()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    // ========================================================================
    // Active major hooks
    // ========================================================================

    /// Multiplier on damage taken from Chaos and MagiTech
    pub fn damage_taken_scale(&self) -> f32 {
        let mut scale = 1.0;
        if let Some(l) = self.active_level(MajorKind::Chaos) {
            scale *= 1.0 + 0.25 - 0.03 * (l - 1.0);
        }
        if let Some(l) = self.active_level(MajorKind::MagiTech) {
            scale *= 1.0 + 0.15 - 0.03 * (l - 1.0);
        }
        scale
    }

    /// Chaos reshuffles the board before every player turn
    pub fn should_shuffle(&self) -> bool {
        self.has(MajorChoice::Active(MajorKind::Chaos))
    }

    /// Pure chain multiplier scale
    pub fn chain_scale(&self) -> f32 {
        self.active_level(MajorKind::Pure)
            .map(|l| 0.8 + 0.03 * (l - 1.0))
            .unwrap_or(1.0)
    }

    /// Dragon scale on an advantaged affinity
    pub fn advantage_scale(&self) -> f32 {
        if self.has(MajorChoice::Active(MajorKind::Dragon)) {
            1.5
        } else {
            1.0
        }
    }

    /// Dragon shop price scale
    pub fn shop_price_scale(&self) -> f32 {
        self.active_level(MajorKind::Dragon)
            .map(|l| 1.15 - 0.03 * (l - 1.0))
            .unwrap_or(1.0)
    }

    /// Barrier penalty on own damage
    pub fn damage_scale(&self) -> f32 {
        self.active_level(MajorKind::Barrier)
            .map(|l| 1.0 - (0.2 - 0.03 * (l - 1.0)))
            .unwrap_or(1.0)
    }

    /// MagiTech flat damage from the count of the board's dominant element
    pub fn magitech_bonus(&self, dominant_count: usize) -> f32 {
        if self.has(MajorChoice::Active(MajorKind::MagiTech)) {
            dominant_count as f32
        } else {
            0.0
        }
    }

    /// Enemy attack after Barrier: reduced by the last chain length, at most
    /// `atk * (0.7 + 0.03 * level)`
    pub fn barrier_reduction(&self, enemy_attack: f32, last_chain: usize) -> f32 {
        let Some(l) = self.active_level(MajorKind::Barrier) else {
            return enemy_attack;
        };
        let cap = enemy_attack * (0.7 + 0.03 * l);
        let reduction = (last_chain as f32).min(cap);
        (enemy_attack - reduction).max(0.0)
    }

    /// Stored Rune chain
    pub fn rune_last_chain(&self) -> usize {
        self.rune_last_chain
    }

    /// HP lost when the new raw chain is shorter than the stored one
    pub fn rune_penalty(&self, raw_chain: usize) -> f32 {
        let Some(l) = self.active_level(MajorKind::Rune) else {
            return 0.0;
        };
        if self.rune_last_chain == 0 || raw_chain >= self.rune_last_chain {
            return 0.0;
        }
        self.rune_last_chain as f32 * (3.0 - 0.2 * (l - 1.0))
    }

    /// Chain count with the stored Rune chain added
    pub fn rune_chain_bonus(&self, chain: usize) -> usize {
        if self.has(MajorChoice::Active(MajorKind::Rune)) {
            chain + self.rune_last_chain
        } else {
            chain
        }
    }

    pub fn store_rune_chain(&mut self, raw_chain: usize) {
        if self.has(MajorChoice::Active(MajorKind::Rune)) {
            self.rune_last_chain = raw_chain;
        }
    }

    // ========================================================================
    // Passive major hooks
    // ========================================================================

    /// Extra damage when Fire Explosion procs
    pub fn fire_explosion(&self, rng: &mut impl Rng) -> Option<f32> {
        let l = self.passive_level(PassiveKind::FireExplosion)?;
        let chance = 0.2 + 0.03 * (l - 1.0);
        if rng.gen::<f32>() < chance {
            Some(10.0 + (l - 1.0))
        } else {
            None
        }
    }

    /// New attack bonus after a one-hit kill
    pub fn water_snow_gain(&self, current_bonus: f32) -> f32 {
        let Some(l) = self.passive_level(PassiveKind::WaterSnow) else {
            return current_bonus;
        };
        let cap = 10.0 + (l - 1.0);
        if current_bonus < cap {
            (current_bonus + 0.5).min(cap)
        } else {
            current_bonus
        }
    }

    /// Whether Lightning Bolt stuns the enemy for a turn
    pub fn lightning_stun(&self, rng: &mut impl Rng) -> bool {
        match self.passive_level(PassiveKind::LightningBolt) {
            Some(l) => rng.gen::<f32>() < 0.2 + 0.03 * (l - 1.0),
            None => false,
        }
    }

    pub fn wind_gale_bonus(&self) -> f32 {
        self.passive_level(PassiveKind::WindGale)
            .map(|l| 0.10 + 0.01 * (l - 1.0))
            .unwrap_or(0.0)
    }

    /// Gold after the Earth Crystal bonus for the killing chain
    pub fn earth_crystal_gold(&self, base_gold: u32, chain: usize) -> u32 {
        let Some(l) = self.passive_level(PassiveKind::EarthCrystal) else {
            return base_gold;
        };
        let bonus = chain as i64 - 3 + (l as i64 - 1);
        if bonus > 0 {
            base_gold + bonus as u32
        } else {
            base_gold
        }
    }

    /// Chance that an attack kills the enemy outright
    pub fn dark_death_enemy_chance(&self) -> f32 {
        self.passive_level(PassiveKind::DarkDeath)
            .map(|l| 0.01 + 0.005 * (l - 1.0))
            .unwrap_or(0.0)
    }

    /// Chance that a landed enemy hit kills the player outright
    pub fn dark_death_player_chance(&self) -> f32 {
        self.passive_level(PassiveKind::DarkDeath)
            .map(|l| 0.001 + 0.0005 * (l - 1.0))
            .unwrap_or(0.0)
    }

    /// Heal from Light Holy when it procs: half the damage dealt
    pub fn light_holy_heal(&self, damage: f32, rng: &mut impl Rng) -> Option<f32> {
        let l = self.passive_level(PassiveKind::LightHoly)?;
        if rng.gen::<f32>() < 0.1 + 0.03 * (l - 1.0) {
            Some(damage * 0.5)
        } else {
            None
        }
    }
}

//! Endless-mode relics
//!
//! Run-long items only sold in endless mode, plus the floor counter that
//! drives their per-floor effects and the periodic major selection.

use serde::{Deserialize, Serialize};

/// Default floors between major selections
pub const MAJOR_SELECTION_INTERVAL: u32 = 50;
/// Floors between Doping boosts
pub const DOPING_INTERVAL: u32 = 20;
/// Black Contract stack cap (1% each)
pub const BLACK_CONTRACT_MAX_STACKS: u32 = 50;

/// Relic kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelicKind {
    /// Heal 5% of damage dealt, up to 15% max HP per floor
    Vampire,
    /// Max HP +10%, then +5% every 20 floors
    Doping,
    /// First hit taken per enemy x0.7, enemy attack x1.1
    DoubleBlade,
    /// Max HP x0.9, damage +1% per floor up to 50%
    BlackContract,
    /// Revive at 20% HP, shrinking max HP to 80%
    LizardTail,
    /// Half of overkill damage carries into the next attack
    ResidueMana,
    /// +10% gold and +10% damage taken per coin
    DeadCoin,
    /// Skip a fight and heal 30%
    Tent,
}

impl RelicKind {
    pub fn name(&self) -> &'static str {
        match self {
            RelicKind::Vampire => "Vampire Seal",
            RelicKind::Doping => "Doping",
            RelicKind::DoubleBlade => "Double Blade",
            RelicKind::BlackContract => "Black Contract",
            RelicKind::LizardTail => "Lizard Tail",
            RelicKind::ResidueMana => "Residue Mana",
            RelicKind::DeadCoin => "Dead Coin",
            RelicKind::Tent => "Tent",
        }
    }
}

/// Side effects of clearing a floor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloorCleared {
    /// Max HP multiplier to apply to the player
    pub max_hp_scale: f32,
    /// A major selection is due
    pub major_selection: bool,
}

/// Endless-mode relic state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelicSet {
    pub floors_cleared: u32,
    pub residue_mana: f32,
    pub vampire_healed_this_floor: f32,
    pub black_contract_stacks: u32,
    pub vampire: bool,
    pub doping: bool,
    pub double_blade: bool,
    pub black_contract: bool,
    pub residue: bool,
    pub lizard_tails: u32,
    pub dead_coins: u32,
    pub tents: u32,
}

impl RelicSet {
    pub fn new() -> Self {
        Self {
            floors_cleared: 0,
            residue_mana: 0.0,
            vampire_healed_this_floor: 0.0,
            black_contract_stacks: 0,
            vampire: false,
            doping: false,
            double_blade: false,
            black_contract: false,
            residue: false,
            lizard_tails: 0,
            dead_coins: 0,
            tents: 0,
        }
    }

    /// Take a relic. Returns the max HP multiplier the pickup applies.
    pub fn add(&mut self, kind: RelicKind) -> f32 {
        log::info!("Relic acquired: {}", kind.name());
        match kind {
            RelicKind::Vampire => self.vampire = true,
            RelicKind::Doping => {
                self.doping = true;
                return 1.1;
            }
            RelicKind::DoubleBlade => self.double_blade = true,
            RelicKind::BlackContract => {
                if !self.black_contract {
                    self.black_contract = true;
                    return 0.9;
                }
            }
            RelicKind::LizardTail => self.lizard_tails += 1,
            RelicKind::ResidueMana => self.residue = true,
            RelicKind::DeadCoin => self.dead_coins += 1,
            RelicKind::Tent => self.tents += 1,
        }
        1.0
    }

    /// Advance the floor counter. A major selection is due every `major_interval` floors.
    pub fn on_floor_cleared(&mut self, major_interval: u32) -> FloorCleared {
        self.floors_cleared += 1;

        if self.black_contract && self.black_contract_stacks < BLACK_CONTRACT_MAX_STACKS {
            self.black_contract_stacks += 1;
        }
        self.vampire_healed_this_floor = 0.0;

        let max_hp_scale = if self.doping && self.floors_cleared % DOPING_INTERVAL == 0 {
            log::debug!("Doping boost at floor {}", self.floors_cleared);
            1.05
        } else {
            1.0
        };

        let major_selection = major_interval > 0 && self.floors_cleared % major_interval == 0;
        if major_selection {
            log::info!("{} floors cleared, major selection due", self.floors_cleared);
        }

        FloorCleared { max_hp_scale, major_selection }
    }

    /// Vampire heal for a hit, limited per floor. Records the amount.
    pub fn vampire_heal(&mut self, damage: f32, max_hp: f32) -> f32 {
        if !self.vampire || damage <= 0.0 {
            return 0.0;
        }
        let limit = max_hp * 0.15;
        let remaining = (limit - self.vampire_healed_this_floor).max(0.0);
        let heal = (damage * 0.05).min(remaining);
        self.vampire_healed_this_floor += heal;
        heal
    }

    /// Double Blade first-hit multiplier
    pub fn first_hit_scale(&self) -> Option<f32> {
        self.double_blade.then_some(0.7)
    }

    /// Double Blade enemy attack multiplier
    pub fn enemy_attack_scale(&self) -> f32 {
        if self.double_blade {
            1.1
        } else {
            1.0
        }
    }

    /// Black Contract damage multiplier
    pub fn damage_scale(&self) -> f32 {
        if self.black_contract {
            1.0 + (self.black_contract_stacks as f32 * 0.01).min(0.5)
        } else {
            1.0
        }
    }

    /// Dead Coin damage-taken multiplier
    pub fn damage_taken_scale(&self) -> f32 {
        1.0 + self.dead_coins as f32 * 0.1
    }

    /// Dead Coin gold bonus, rounded
    pub fn apply_gold_bonus(&self, gold: u32) -> u32 {
        if self.dead_coins == 0 {
            return gold;
        }
        (gold as f32 * (1.0 + self.dead_coins as f32 * 0.1)).round() as u32
    }

    /// Consume a lizard tail if one is held
    pub fn try_lizard_tail(&mut self) -> bool {
        if self.lizard_tails == 0 {
            return false;
        }
        self.lizard_tails -= 1;
        log::info!("Lizard tail used, {} left", self.lizard_tails);
        true
    }

    /// Bank half of the overkill damage
    pub fn store_residue(&mut self, overkill: f32) {
        if self.residue && overkill > 0.0 {
            self.residue_mana += overkill * 0.5;
        }
    }

    /// Take the banked residue for the next attack
    pub fn take_residue(&mut self) -> f32 {
        if !self.residue {
            return 0.0;
        }
        std::mem::take(&mut self.residue_mana)
    }

    /// Consume a tent if one is held
    pub fn take_tent(&mut self) -> bool {
        if self.tents == 0 {
            return false;
        }
        self.tents -= 1;
        true
    }
}

impl Default for RelicSet {
    fn default() -> Self {
        Self::new()
    }
}

//! Item registry
//!
//! Ownership counts and flags for every item family, and the pure
//! projections the combat math reads from them.

use std::collections::HashMap;

use crate::board::{ElementKind, SpawnTable};
use crate::board::spawn::SEVEN_ORB_THRESHOLD;
use crate::combat::ComboRules;

use super::item::{
    Consumable, ItemDef, ItemEffect, ItemFlag, ItemKind, StackCounter, MAX_CHAIN_BOOSTERS, MAX_ORB_STACKS,
    MAX_SHOP_DISCOUNTS,
};
use super::resonance::ResonanceSet;

/// Chain count forced by the seven-orb collection
pub const SEVEN_ORB_CHAIN: usize = 10;
/// Shop discount per stack
pub const DISCOUNT_PER_STACK: f32 = 0.1;
/// Kill gold bonus per Madis hand
pub const MADIS_HAND_BONUS: f32 = 0.2;
/// Barrier item: shield gained per point of damage dealt
pub const BARRIER_RATIO: f32 = 0.2;

/// Everything the player owns
#[derive(Debug, Clone, Default)]
pub struct ItemRegistry {
    /// Times each kind was acquired
    owned: HashMap<ItemKind, u32>,
    /// Indexed like `ElementKind::COMBAT`
    orb_stacks: [u8; 7],
    combo_keeper: bool,
    heal_boost: bool,
    barrier: bool,
    last_stand: bool,
    chain_boosters: u8,
    shop_discounts: u8,
    madis_hands: u32,
    flat_attack: f32,
    resonances: ResonanceSet,
    heal_potions: u32,
    shield_potions: u32,
}

impl ItemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an item's effect.
    ///
    /// Returns false when the item had no effect (stack cap reached, flag
    /// already owned, resonance already owned). Major books and relics are
    /// only recorded here.
    pub fn add_item(&mut self, kind: ItemKind) -> bool {
        let applied = match kind.effect() {
            ItemEffect::Resonance(resonance) => self.resonances.add(resonance),
            ItemEffect::Orb(element) => self.add_orb(element),
            ItemEffect::Flag(flag) => self.set_flag(flag),
            ItemEffect::Stack(counter) => self.add_stack(counter),
            ItemEffect::FlatAttack(amount) => {
                self.flat_attack += amount;
                true
            }
            ItemEffect::Consumable(Consumable::HealPotion) => {
                self.heal_potions += 1;
                true
            }
            ItemEffect::Consumable(Consumable::ShieldPotion) => {
                self.shield_potions += 1;
                true
            }
            ItemEffect::MajorBook(_) | ItemEffect::Relic(_) => true,
        };

        if applied {
            *self.owned.entry(kind).or_insert(0) += 1;
            log::info!("Item acquired: {:?}", kind);
        } else {
            log::debug!("Item had no effect: {:?}", kind);
        }
        applied
    }

    fn add_orb(&mut self, element: ElementKind) -> bool {
        let Some(idx) = element.combat_index() else {
            return false;
        };
        if self.orb_stacks[idx] >= MAX_ORB_STACKS {
            return false;
        }
        self.orb_stacks[idx] += 1;
        true
    }

    fn set_flag(&mut self, flag: ItemFlag) -> bool {
        let slot = match flag {
            ItemFlag::ComboKeeper => &mut self.combo_keeper,
            ItemFlag::HealBoost => &mut self.heal_boost,
            ItemFlag::Barrier => &mut self.barrier,
            ItemFlag::LastStand => &mut self.last_stand,
        };
        !std::mem::replace(slot, true)
    }

    fn add_stack(&mut self, counter: StackCounter) -> bool {
        match counter {
            StackCounter::ChainBooster => bump(&mut self.chain_boosters, counter.cap()),
            StackCounter::ShopDiscount => bump(&mut self.shop_discounts, counter.cap()),
            StackCounter::MadisHand => {
                self.madis_hands += 1;
                true
            }
        }
    }

    /// Spend a potion. False when none is held.
    pub fn use_consumable(&mut self, consumable: Consumable) -> bool {
        let count = match consumable {
            Consumable::HealPotion => &mut self.heal_potions,
            Consumable::ShieldPotion => &mut self.shield_potions,
        };
        if *count == 0 {
            return false;
        }
        *count -= 1;
        true
    }

    pub fn consumable_count(&self, consumable: Consumable) -> u32 {
        match consumable {
            Consumable::HealPotion => self.heal_potions,
            Consumable::ShieldPotion => self.shield_potions,
        }
    }

    pub fn toggle_resonance(&mut self, id: usize) -> bool {
        self.resonances.toggle(id)
    }

    pub fn resonances(&self) -> &ResonanceSet {
        &self.resonances
    }

    // ========================================================================
    // Projections
    // ========================================================================

    /// Chain count after the seven-orb floor and chain boosters
    pub fn effective_chain_count(&self, raw: usize) -> usize {
        if raw == 0 {
            return 0;
        }
        let mut chain = raw;
        if self.has_all_seven_orbs() {
            chain = chain.max(SEVEN_ORB_CHAIN);
        }
        chain + self.chain_boosters as usize
    }

    /// Base attack plus flat mana item bonuses
    pub fn apply_attack_bonus(&self, base_attack: f32) -> f32 {
        base_attack + self.flat_attack
    }

    pub fn flat_attack(&self) -> f32 {
        self.flat_attack
    }

    pub fn discount_rate(&self) -> f32 {
        (DISCOUNT_PER_STACK * self.shop_discounts as f32).clamp(0.0, 1.0)
    }

    pub fn discounted_price(&self, base_price: u32) -> u32 {
        (base_price as f32 * (1.0 - self.discount_rate())).round().max(0.0) as u32
    }

    pub fn gold_on_kill(&self, base_gold: u32) -> u32 {
        if self.madis_hands == 0 {
            return base_gold;
        }
        (base_gold as f32 * (1.0 + MADIS_HAND_BONUS * self.madis_hands as f32)).round() as u32
    }

    pub fn orb_stacks(&self, element: ElementKind) -> u8 {
        element.combat_index().map(|i| self.orb_stacks[i]).unwrap_or(0)
    }

    pub fn spawn_table(&self) -> SpawnTable {
        SpawnTable::from_orbs(&self.orb_stacks)
    }

    pub fn has_all_seven_orbs(&self) -> bool {
        self.orb_stacks.iter().all(|&s| s >= SEVEN_ORB_THRESHOLD)
    }

    pub fn same_resonance(&self, a: ElementKind, b: ElementKind) -> bool {
        self.resonances.same_group(a, b)
    }

    /// Shield granted by the Barrier item for damage dealt
    pub fn barrier_shield(&self, damage_dealt: f32) -> f32 {
        if self.barrier {
            damage_dealt * BARRIER_RATIO
        } else {
            0.0
        }
    }

    pub fn has_heal_boost(&self) -> bool {
        self.heal_boost
    }

    pub fn has_last_stand(&self) -> bool {
        self.last_stand
    }

    pub fn has_combo_keeper(&self) -> bool {
        self.combo_keeper
    }

    pub fn chain_boosters(&self) -> u8 {
        self.chain_boosters
    }

    pub fn item_count(&self, kind: ItemKind) -> u32 {
        self.owned.get(&kind).copied().unwrap_or(0)
    }

    /// Whether the catalog cap still allows buying this item
    pub fn can_buy_more(&self, def: &ItemDef) -> bool {
        if def.max_stack > 0 && self.item_count(def.kind) >= def.max_stack {
            return false;
        }
        // Family caps the catalog may not mirror
        match def.kind.effect() {
            ItemEffect::Orb(element) => self.orb_stacks(element) < MAX_ORB_STACKS,
            ItemEffect::Flag(_) => self.item_count(def.kind) == 0,
            ItemEffect::Stack(StackCounter::ChainBooster) => self.chain_boosters < MAX_CHAIN_BOOSTERS,
            ItemEffect::Stack(StackCounter::ShopDiscount) => self.shop_discounts < MAX_SHOP_DISCOUNTS,
            ItemEffect::Resonance(resonance) => !self.resonances.owns(&resonance),
            _ => true,
        }
    }
}

/// Increment a capped counter
fn bump(count: &mut u8, cap: Option<u8>) -> bool {
    if cap.is_some_and(|cap| *count >= cap) {
        return false;
    }
    *count += 1;
    true
}

impl ComboRules for ItemRegistry {
    fn same_group(&self, a: ElementKind, b: ElementKind) -> bool {
        self.same_resonance(a, b)
    }

    fn keeps_combo(&self) -> bool {
        self.combo_keeper
    }
}

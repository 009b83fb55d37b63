//! Item definitions
//!
//! Every purchasable item kind and the effect it maps to. The registry
//! dispatches on `ItemEffect`, so each family's rule lives in one place.

use serde::{Deserialize, Serialize};

use crate::board::ElementKind;
use crate::progression::{MajorChoice, RelicKind};

use super::resonance::Resonance;

/// Orb stacks per element
pub const MAX_ORB_STACKS: u8 = 5;
/// Chain booster stacks
pub const MAX_CHAIN_BOOSTERS: u8 = 3;
/// Shop discount stacks
pub const MAX_SHOP_DISCOUNTS: u8 = 3;
/// Heal potion strength, as a fraction of max HP
pub const HEAL_POTION_RATIO: f32 = 0.3;
/// Shield potion strength, as a fraction of max HP
pub const SHIELD_POTION_RATIO: f32 = 0.2;

/// Item kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// Two elements that continue each other's combo
    Resonance(ElementKind, ElementKind),
    /// Raises an element's spawn share
    Orb(ElementKind),
    ComboKeeper,
    /// +1 chain per stack
    ChainBooster,
    HealBoost,
    /// Shield from damage dealt
    Barrier,
    ShopDiscount,
    LastStand,
    ManaBracelet,
    ManaNecklace,
    ManaRing,
    /// +20% kill gold per hand
    MadisHand,
    HealPotion,
    ShieldPotion,
    /// Levels up a held major
    MajorBook(MajorChoice),
    Relic(RelicKind),
}

/// On/off items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemFlag {
    ComboKeeper,
    HealBoost,
    Barrier,
    LastStand,
}

/// Counted items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackCounter {
    ChainBooster,
    ShopDiscount,
    MadisHand,
}

impl StackCounter {
    /// Stack cap, `None` when unbounded
    pub fn cap(&self) -> Option<u8> {
        match self {
            StackCounter::ChainBooster => Some(MAX_CHAIN_BOOSTERS),
            StackCounter::ShopDiscount => Some(MAX_SHOP_DISCOUNTS),
            StackCounter::MadisHand => None,
        }
    }
}

/// Potions used outside the attack flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Consumable {
    HealPotion,
    ShieldPotion,
}

/// What owning an item does
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ItemEffect {
    Resonance(Resonance),
    Orb(ElementKind),
    Flag(ItemFlag),
    Stack(StackCounter),
    FlatAttack(f32),
    Consumable(Consumable),
    MajorBook(MajorChoice),
    Relic(RelicKind),
}

impl ItemKind {
    /// Effect table
    pub fn effect(&self) -> ItemEffect {
        match *self {
            ItemKind::Resonance(a, b) => ItemEffect::Resonance(Resonance::new(a, b)),
            ItemKind::Orb(element) => ItemEffect::Orb(element),
            ItemKind::ComboKeeper => ItemEffect::Flag(ItemFlag::ComboKeeper),
            ItemKind::HealBoost => ItemEffect::Flag(ItemFlag::HealBoost),
            ItemKind::Barrier => ItemEffect::Flag(ItemFlag::Barrier),
            ItemKind::LastStand => ItemEffect::Flag(ItemFlag::LastStand),
            ItemKind::ChainBooster => ItemEffect::Stack(StackCounter::ChainBooster),
            ItemKind::ShopDiscount => ItemEffect::Stack(StackCounter::ShopDiscount),
            ItemKind::MadisHand => ItemEffect::Stack(StackCounter::MadisHand),
            ItemKind::ManaBracelet => ItemEffect::FlatAttack(3.0),
            ItemKind::ManaNecklace => ItemEffect::FlatAttack(5.0),
            ItemKind::ManaRing => ItemEffect::FlatAttack(7.0),
            ItemKind::HealPotion => ItemEffect::Consumable(Consumable::HealPotion),
            ItemKind::ShieldPotion => ItemEffect::Consumable(Consumable::ShieldPotion),
            ItemKind::MajorBook(choice) => ItemEffect::MajorBook(choice),
            ItemKind::Relic(relic) => ItemEffect::Relic(relic),
        }
    }

    /// Relative weight when the shop rolls offers
    pub fn shop_weight(&self) -> f32 {
        match self {
            ItemKind::Resonance(..) | ItemKind::Orb(_) => 2.0,
            _ => 1.0,
        }
    }

    /// Only offered in endless runs
    pub fn endless_only(&self) -> bool {
        matches!(self, ItemKind::MajorBook(_) | ItemKind::Relic(_))
    }
}

/// A catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDef {
    pub kind: ItemKind,
    pub name: String,
    pub description: String,
    pub price: u32,
    /// Ownership cap; 0 means unlimited
    #[serde(default)]
    pub max_stack: u32,
}

impl ItemDef {
    pub fn new(kind: ItemKind, name: &str, description: &str, price: u32, max_stack: u32) -> Self {
        Self {
            kind,
            name: name.to_string(),
            description: description.to_string(),
            price,
            max_stack,
        }
    }
}

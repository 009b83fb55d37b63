//! Item catalog
//!
//! Every item the shop can offer, with base prices and ownership caps.

use serde::{Deserialize, Serialize};

use crate::board::ElementKind;
use crate::items::{ItemDef, ItemKind};
use crate::progression::{MajorChoice, RelicKind};

/// Collection of item definitions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemCatalog {
    pub items: Vec<ItemDef>,
}

impl ItemCatalog {
    /// Find the definition for a kind
    pub fn find(&self, kind: ItemKind) -> Option<&ItemDef> {
        self.items.iter().find(|d| d.kind == kind)
    }

    pub fn as_slice(&self) -> &[ItemDef] {
        &self.items
    }
}

/// Create the default catalog (hardcoded fallback)
pub fn default_item_catalog() -> ItemCatalog {
    use ElementKind::*;

    let mut items = vec![
        ItemDef::new(ItemKind::ComboKeeper, "Combo Keeper", "The combo survives one non-attack turn", 50, 1),
        ItemDef::new(ItemKind::ChainBooster, "Chain Booster", "+1 chain on every match", 45, 3),
        ItemDef::new(ItemKind::HealBoost, "Heal Boost", "Heals restore an extra 5% max HP", 35, 1),
        ItemDef::new(ItemKind::Barrier, "Barrier", "Gain shield equal to 20% of damage dealt", 50, 1),
        ItemDef::new(ItemKind::ShopDiscount, "Regular Customer", "10% off in the shop", 30, 3),
        ItemDef::new(ItemKind::LastStand, "Last Stand", "Survive one lethal hit at 30% HP", 60, 1),
        ItemDef::new(ItemKind::ManaBracelet, "Mana Bracelet", "+3 attack", 30, 0),
        ItemDef::new(ItemKind::ManaNecklace, "Mana Necklace", "+5 attack", 45, 0),
        ItemDef::new(ItemKind::ManaRing, "Mana Ring", "+7 attack", 60, 0),
        ItemDef::new(ItemKind::MadisHand, "Madis Hand", "+20% gold per kill", 40, 0),
        ItemDef::new(ItemKind::HealPotion, "Heal Potion", "Restore 30% max HP", 15, 0),
        ItemDef::new(ItemKind::ShieldPotion, "Shield Potion", "Gain a shield of 20% max HP", 15, 0),
    ];

    for element in ElementKind::COMBAT {
        items.push(ItemDef::new(
            ItemKind::Orb(element),
            &format!("{} Orb", element),
            &format!("{} tiles spawn more often", element),
            20,
            5,
        ));
    }

    for (a, b) in [(Fire, Wind), (Wind, Earth), (Earth, Lightning), (Lightning, Water), (Water, Fire), (Light, Dark)] {
        items.push(ItemDef::new(
            ItemKind::Resonance(a, b),
            &format!("{}-{} Resonance", a, b),
            &format!("{} and {} attacks share a combo", a, b),
            40,
            1,
        ));
    }

    let relics = [
        (RelicKind::Vampire, 80, 1),
        (RelicKind::Doping, 70, 1),
        (RelicKind::DoubleBlade, 60, 1),
        (RelicKind::BlackContract, 90, 1),
        (RelicKind::LizardTail, 100, 0),
        (RelicKind::ResidueMana, 70, 1),
        (RelicKind::DeadCoin, 50, 0),
        (RelicKind::Tent, 40, 0),
    ];
    for (relic, price, max_stack) in relics {
        items.push(ItemDef::new(ItemKind::Relic(relic), relic.name(), "Endless relic", price, max_stack));
    }

    for choice in MajorChoice::ALL {
        items.push(ItemDef::new(
            ItemKind::MajorBook(choice),
            &format!("{} Book", choice),
            "Levels up a held major",
            100,
            0,
        ));
    }

    ItemCatalog { items }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog() {
        let catalog = default_item_catalog();
        assert!(catalog.find(ItemKind::Orb(ElementKind::Dark)).is_some());
        assert_eq!(catalog.find(ItemKind::ChainBooster).map(|d| d.max_stack), Some(3));
        assert!(catalog.find(ItemKind::Orb(ElementKind::Heal)).is_none());
        assert!(catalog.items.iter().all(|d| d.price > 0));
    }

    #[test]
    fn test_catalog_ron_roundtrip() {
        let catalog = default_item_catalog();
        let text = ron::ser::to_string_pretty(&catalog, ron::ser::PrettyConfig::default()).unwrap();
        let parsed: ItemCatalog = ron::from_str(&text).unwrap();
        assert_eq!(parsed, catalog);
    }
}

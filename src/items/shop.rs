//! Shop
//!
//! Rolls weighted offers from the catalog, prices them with the player's
//! discounts, and handles rerolls and purchases against a gold purse.

use rand::Rng;

use crate::progression::GameMode;

use super::item::{ItemDef, ItemKind};
use super::registry::ItemRegistry;

/// Offers per shop visit
pub const OFFER_COUNT: usize = 3;
/// First reroll cost
pub const BASE_REROLL_COST: u32 = 10;
/// Cost added per reroll this visit
pub const REROLL_STEP: u32 = 10;

/// One shop visit
#[derive(Debug, Clone, Default)]
pub struct Shop {
    offers: Vec<ItemDef>,
    purchased: Vec<bool>,
    rerolls: u32,
    open: bool,
}

impl Shop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the shop with a fresh set of offers
    pub fn open(&mut self, catalog: &[ItemDef], items: &ItemRegistry, mode: GameMode, rng: &mut impl Rng) {
        self.rerolls = 0;
        self.open = true;
        self.generate(catalog, items, mode, rng);
        log::info!("Shop opened with {} offers", self.offers.len());
    }

    pub fn close(&mut self) {
        self.open = false;
        self.offers.clear();
        self.purchased.clear();
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn offers(&self) -> &[ItemDef] {
        &self.offers
    }

    pub fn is_purchased(&self, index: usize) -> bool {
        self.purchased.get(index).copied().unwrap_or(false)
    }

    /// Weighted picks without repeats among items still buyable
    fn generate(&mut self, catalog: &[ItemDef], items: &ItemRegistry, mode: GameMode, rng: &mut impl Rng) {
        let mut available: Vec<&ItemDef> = catalog
            .iter()
            .filter(|def| mode == GameMode::Endless || !def.kind.endless_only())
            .filter(|def| items.can_buy_more(def))
            .collect();

        self.offers.clear();
        let count = OFFER_COUNT.min(available.len());
        for _ in 0..count {
            let total: f32 = available.iter().map(|d| d.kind.shop_weight()).sum();
            let roll = rng.gen_range(0.0..total);
            let mut cumulative = 0.0;
            let mut picked = available.len() - 1;
            for (i, def) in available.iter().enumerate() {
                cumulative += def.kind.shop_weight();
                if roll < cumulative {
                    picked = i;
                    break;
                }
            }
            self.offers.push(available.remove(picked).clone());
        }
        self.purchased = vec![false; self.offers.len()];
    }

    pub fn reroll_cost(&self) -> u32 {
        BASE_REROLL_COST + REROLL_STEP * self.rerolls
    }

    /// Pay for a new set of offers. False if closed or short on gold.
    pub fn reroll(&mut self, gold: &mut u32, catalog: &[ItemDef], items: &ItemRegistry, mode: GameMode, rng: &mut impl Rng) -> bool {
        let cost = self.reroll_cost();
        if !self.open || *gold < cost {
            log::debug!("Reroll rejected: cost {}, gold {}", cost, gold);
            return false;
        }
        *gold -= cost;
        self.rerolls += 1;
        self.generate(catalog, items, mode, rng);
        log::info!("Shop rerolled for {} gold", cost);
        true
    }

    /// Final price after discounts and the shop price multiplier
    pub fn price(def: &ItemDef, items: &ItemRegistry, price_scale: f32) -> u32 {
        (items.discounted_price(def.price) as f32 * price_scale).round() as u32
    }

    /// Buy an offer. Returns the kind to apply, or `None` when closed,
    /// already bought, capped, or unaffordable.
    pub fn buy(&mut self, index: usize, gold: &mut u32, items: &ItemRegistry, price_scale: f32) -> Option<ItemKind> {
        if !self.open || self.is_purchased(index) {
            return None;
        }
        let def = self.offers.get(index)?;
        if !items.can_buy_more(def) {
            log::debug!("{} can't be bought any more", def.name);
            return None;
        }
        let price = Self::price(def, items, price_scale);
        if *gold < price {
            log::debug!("Not enough gold for {}: {} < {}", def.name, gold, price);
            return None;
        }

        *gold -= price;
        self.purchased[index] = true;
        log::info!("Bought {} for {} gold", def.name, price);
        Some(def.kind)
    }
}

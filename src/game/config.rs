//! Rule tunables
//!
//! Loaded from `config.ron` by the data manager; every field has a default
//! so partial files work.

use serde::{Deserialize, Serialize};

use crate::board::DEFAULT_MAX_SWAPS;
use crate::combat::stats::DEFAULT_EVADE;
use crate::combat::AffinityTable;
use crate::progression::relics::MAJOR_SELECTION_INTERVAL;

/// Session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Elemental advantage multipliers
    pub affinity: AffinityTable,
    /// Swaps allowed per player turn
    pub max_swaps: u32,
    /// Kills between board growth steps
    pub resize_every_kills: u32,
    /// Kills between shop visits
    pub shop_every_kills: u32,
    /// Base player evade chance
    pub player_evade_chance: f32,
    /// Floors between endless-mode major selections
    pub major_selection_every_floors: u32,
    /// Majors offered per selection
    pub major_offer_count: usize,
    /// Normal-mode stage that unlocks endless mode
    pub endless_unlock_stage: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            affinity: AffinityTable::default(),
            max_swaps: DEFAULT_MAX_SWAPS,
            resize_every_kills: 3,
            shop_every_kills: 15,
            player_evade_chance: DEFAULT_EVADE,
            major_selection_every_floors: MAJOR_SELECTION_INTERVAL,
            major_offer_count: 3,
            endless_unlock_stage: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config: GameConfig = ron::from_str("(shop_every_kills: 5, affinity: (strong: 1.5, weak: 0.5))").unwrap();
        assert_eq!(config.shop_every_kills, 5);
        assert_eq!(config.affinity.strong, 1.5);
        assert_eq!(config.max_swaps, 3);
        assert_eq!(config.resize_every_kills, 3);
    }
}

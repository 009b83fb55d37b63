//! Combat system

pub mod combo;
pub mod damage;
pub mod stats;

pub use combo::{ComboRules, ComboTracker, NoComboItems};
pub use damage::{
    calculate_attack, chain_multiplier, combo_multiplier, element_affinity, heal_amount, shield_amount, AffinityTable,
    AttackBreakdown, AttackInput, AttackModifiers,
};
pub use stats::{CombatantStats, DefenseModifiers, EnemyStats, HitResult, PlayerStats};

//! Combatant stats
//!
//! HP, shield and attack for the player and the current enemy. All HP and
//! shield changes go through `take_damage`, `heal` and `add_shield`.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::ElementKind;
use crate::progression::scaling::StageScaling;

/// Shield ceiling as a fraction of max HP
pub const MAX_SHIELD_RATIO: f32 = 0.4;
/// HP restored after last stand, as a fraction of max HP
pub const LAST_STAND_HP: f32 = 0.3;
/// HP restored on every kill, as a fraction of max HP
pub const KILL_HEAL: f32 = 0.1;
/// Default player evade chance
pub const DEFAULT_EVADE: f32 = 0.2;

/// Stats shared by every combatant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatantStats {
    pub max_hp: f32,
    pub current_hp: f32,
    pub attack: f32,
    pub shield: f32,
    pub max_shield: f32,
    pub evade_chance: f32,
}

/// How a hit was split between shield and HP
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Absorption {
    pub absorbed: f32,
    pub hp_lost: f32,
    pub shield_broken: bool,
}

impl CombatantStats {
    /// Full-HP combatant with no shield
    pub fn new(max_hp: f32, attack: f32, evade_chance: f32) -> Self {
        Self {
            max_hp,
            current_hp: max_hp,
            attack,
            shield: 0.0,
            max_shield: max_hp * MAX_SHIELD_RATIO,
            evade_chance,
        }
    }

    /// Apply damage to shield first, then HP. HP never drops below zero.
    pub fn take_damage(&mut self, damage: f32) -> Absorption {
        if damage <= 0.0 {
            return Absorption::default();
        }

        let mut result = Absorption::default();
        let mut remaining = damage;

        if self.shield > 0.0 {
            let absorbed = self.shield.min(remaining);
            self.shield -= absorbed;
            remaining -= absorbed;
            result.absorbed = absorbed;
            if self.shield <= 0.0 {
                self.shield = 0.0;
                result.shield_broken = true;
            }
        }

        if remaining > 0.0 {
            result.hp_lost = remaining.min(self.current_hp);
            self.current_hp = (self.current_hp - remaining).max(0.0);
        }

        result
    }

    /// Restore HP up to max. Returns the amount actually healed.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if amount <= 0.0 {
            return 0.0;
        }
        let before = self.current_hp;
        self.current_hp = (self.current_hp + amount).min(self.max_hp);
        self.current_hp - before
    }

    /// Add shield up to `max_shield`. Returns the amount actually added.
    pub fn add_shield(&mut self, amount: f32) -> f32 {
        if amount <= 0.0 {
            return 0.0;
        }
        let before = self.shield;
        self.shield = (self.shield + amount).min(self.max_shield);
        self.shield - before
    }

    pub fn is_dead(&self) -> bool {
        self.current_hp <= 0.0
    }

    pub fn missing_hp(&self) -> f32 {
        (self.max_hp - self.current_hp).max(0.0)
    }

    /// Change max HP, clamping current HP and shield to the new limits
    fn set_max_hp(&mut self, max_hp: f32) {
        self.max_hp = max_hp;
        self.max_shield = max_hp * MAX_SHIELD_RATIO;
        self.current_hp = self.current_hp.min(max_hp);
        self.shield = self.shield.min(self.max_shield);
    }
}

// ============================================================================
// Player
// ============================================================================

/// Modifiers applied to an incoming hit, gathered from majors and relics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefenseModifiers {
    /// Product of every damage-taken multiplier
    pub damage_taken_scale: f32,
    /// Multiplier for the first hit taken against the current enemy
    pub first_hit_scale: Option<f32>,
    /// Added to the base evade chance
    pub evasion_bonus: f32,
    /// Chance that a landed hit kills outright
    pub instant_death_chance: f32,
    /// Last stand item owned
    pub last_stand: bool,
}

impl Default for DefenseModifiers {
    fn default() -> Self {
        Self {
            damage_taken_scale: 1.0,
            first_hit_scale: None,
            evasion_bonus: 0.0,
            instant_death_chance: 0.0,
            last_stand: false,
        }
    }
}

/// Outcome of a hit on the player
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HitResult {
    /// Damage after damage-taken modifiers
    pub damage: f32,
    pub evaded: bool,
    pub instant_death: bool,
    pub absorbed: f32,
    pub hp_lost: f32,
    pub last_stand_triggered: bool,
}

/// Player stats and per-run flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub stats: CombatantStats,
    pub stage: u32,
    pub last_stand_used: bool,
    pub last_stand_triggered_this_hit: bool,
    /// Attack gained from one-hit kills
    pub bonus_attack: f32,
    /// Persistent max HP multiplier from relics
    pub hp_scale: f32,
    pub first_hit_this_turn: bool,
}

impl PlayerStats {
    pub fn new(evade_chance: f32) -> Self {
        let scaling = StageScaling::new(1);
        Self {
            stats: CombatantStats::new(scaling.player_max_hp(), scaling.player_attack(), evade_chance),
            stage: 1,
            last_stand_used: false,
            last_stand_triggered_this_hit: false,
            bonus_attack: 0.0,
            hp_scale: 1.0,
            first_hit_this_turn: true,
        }
    }

    /// Fresh player for a run starting at `stage`, at full HP
    pub fn starting_at(stage: u32, evade_chance: f32) -> Self {
        let mut player = Self::new(evade_chance);
        player.update_for_stage(stage);
        player.stats.current_hp = player.stats.max_hp;
        player
    }

    /// Recompute max HP and attack for a stage. Current HP is only filled at stage 1.
    pub fn update_for_stage(&mut self, stage: u32) {
        let scaling = StageScaling::new(stage);
        self.stage = scaling.stage;
        self.stats.attack = scaling.player_attack();
        self.stats.set_max_hp(scaling.player_max_hp() * self.hp_scale);
        if self.stage == 1 {
            self.stats.current_hp = self.stats.max_hp;
        }
    }

    /// Multiply max HP persistently; survives later restats
    pub fn scale_max_hp(&mut self, factor: f32) {
        self.hp_scale *= factor;
        let max_hp = self.stats.max_hp * factor;
        self.stats.set_max_hp(max_hp);
    }

    /// Base attack plus accumulated bonus
    pub fn current_attack(&self) -> f32 {
        self.stats.attack + self.bonus_attack
    }

    /// Resolve an incoming hit.
    ///
    /// Order: damage-taken modifiers, evasion, instant death, shield and HP,
    /// then last stand.
    pub fn take_hit(&mut self, damage: f32, mods: &DefenseModifiers, rng: &mut impl Rng) -> HitResult {
        self.last_stand_triggered_this_hit = false;
        if damage <= 0.0 {
            return HitResult::default();
        }

        let mut damage = damage * mods.damage_taken_scale;
        if let Some(scale) = mods.first_hit_scale {
            if self.first_hit_this_turn {
                self.first_hit_this_turn = false;
                damage *= scale;
            }
        }

        let mut result = HitResult { damage, ..Default::default() };

        if rng.gen::<f32>() < self.stats.evade_chance + mods.evasion_bonus {
            log::debug!("Player evaded {:.1} damage", damage);
            result.evaded = true;
            return result;
        }

        if mods.instant_death_chance > 0.0 && rng.gen::<f32>() < mods.instant_death_chance {
            log::info!("Player struck down instantly");
            result.instant_death = true;
            result.hp_lost = self.stats.current_hp;
            self.stats.current_hp = 0.0;
            return result;
        }

        let absorption = self.stats.take_damage(damage);
        result.absorbed = absorption.absorbed;
        result.hp_lost = absorption.hp_lost;

        if self.stats.is_dead() && mods.last_stand && !self.last_stand_used {
            self.last_stand_used = true;
            self.last_stand_triggered_this_hit = true;
            self.stats.current_hp = self.stats.max_hp * LAST_STAND_HP;
            result.last_stand_triggered = true;
            log::info!("Last stand! Revived at {:.1}/{:.1}", self.stats.current_hp, self.stats.max_hp);
        }

        result
    }

    /// Kill reward: heal 10% of max HP and re-arm first-hit effects
    pub fn on_enemy_killed(&mut self) -> f32 {
        self.first_hit_this_turn = true;
        self.stats.heal(self.stats.max_hp * KILL_HEAL)
    }

    pub fn is_dead(&self) -> bool {
        self.stats.is_dead()
    }
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self::new(DEFAULT_EVADE)
    }
}

// ============================================================================
// Enemy
// ============================================================================

/// The enemy currently being fought
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyStats {
    pub name: String,
    pub element: ElementKind,
    pub base_hp: f32,
    pub base_attack: f32,
    pub gold_bonus: u32,
    pub stage: u32,
    pub stats: CombatantStats,
    pub stunned_turns: u32,
}

impl EnemyStats {
    pub fn new(name: impl Into<String>, element: ElementKind, base_hp: f32, base_attack: f32, gold_bonus: u32, stage: u32) -> Self {
        let mut enemy = Self {
            name: name.into(),
            element,
            base_hp,
            base_attack,
            gold_bonus,
            stage,
            stats: CombatantStats::new(base_hp, base_attack, 0.0),
            stunned_turns: 0,
        };
        enemy.update_for_stage(stage);
        enemy
    }

    /// Scale to a stage and restore full HP
    pub fn update_for_stage(&mut self, stage: u32) {
        let scaling = StageScaling::new(stage);
        self.stage = scaling.stage;
        let max_hp = scaling.enemy_hp(self.base_hp);
        self.stats = CombatantStats::new(max_hp, scaling.enemy_attack(self.base_attack), 0.0);
    }

    /// Apply damage. Returns the overkill beyond remaining HP.
    pub fn take_damage(&mut self, damage: f32) -> f32 {
        let before = self.stats.current_hp;
        self.stats.take_damage(damage);
        (damage - before).max(0.0)
    }

    /// Stun for `turns` enemy turns; a longer existing stun is kept
    pub fn stun(&mut self, turns: u32) {
        self.stunned_turns = self.stunned_turns.max(turns);
    }

    pub fn is_stunned(&self) -> bool {
        self.stunned_turns > 0
    }

    /// Start an enemy turn. Returns false (and spends a stun turn) when stunned.
    pub fn begin_turn(&mut self) -> bool {
        if self.stunned_turns > 0 {
            self.stunned_turns -= 1;
            return false;
        }
        true
    }

    pub fn is_dead(&self) -> bool {
        self.stats.is_dead()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_shield_absorbs_fully() {
        let mut stats = CombatantStats::new(100.0, 10.0, 0.0);
        stats.shield = 30.0;
        let result = stats.take_damage(20.0);
        assert_eq!(stats.current_hp, 100.0);
        assert_eq!(stats.shield, 10.0);
        assert_eq!(result.absorbed, 20.0);
        assert!(!result.shield_broken);
    }

    #[test]
    fn test_shield_breaks_and_spills() {
        let mut stats = CombatantStats::new(100.0, 10.0, 0.0);
        stats.shield = 15.0;
        let result = stats.take_damage(40.0);
        assert_eq!(stats.shield, 0.0);
        assert_eq!(stats.current_hp, 75.0);
        assert!(result.shield_broken);
        assert_eq!(result.hp_lost, 25.0);
    }

    #[test]
    fn test_shield_capped() {
        let mut stats = CombatantStats::new(100.0, 10.0, 0.0);
        assert_eq!(stats.add_shield(30.0), 30.0);
        assert_eq!(stats.add_shield(30.0), 10.0);
        assert_eq!(stats.shield, 40.0);
    }

    #[test]
    fn test_heal_clamped() {
        let mut stats = CombatantStats::new(100.0, 10.0, 0.0);
        stats.current_hp = 95.0;
        assert_eq!(stats.heal(20.0), 5.0);
        assert_eq!(stats.current_hp, 100.0);
    }

    #[test]
    fn test_player_plain_hit() {
        let mut player = PlayerStats::new(0.0);
        let result = player.take_hit(20.0, &DefenseModifiers::default(), &mut StdRng::seed_from_u64(1));
        assert!(!result.evaded);
        assert_eq!(player.stats.current_hp, 80.0);
    }

    #[test]
    fn test_certain_evasion() {
        let mut player = PlayerStats::new(1.0);
        let result = player.take_hit(50.0, &DefenseModifiers::default(), &mut StdRng::seed_from_u64(1));
        assert!(result.evaded);
        assert_eq!(player.stats.current_hp, 100.0);
    }

    #[test]
    fn test_last_stand_once() {
        let mut player = PlayerStats::new(0.0);
        let mut rng = StdRng::seed_from_u64(3);
        let mods = DefenseModifiers { last_stand: true, ..Default::default() };

        let first = player.take_hit(500.0, &mods, &mut rng);
        assert!(first.last_stand_triggered);
        assert!((player.stats.current_hp - 30.0).abs() < 1e-4);
        assert!(player.last_stand_used);

        let second = player.take_hit(500.0, &mods, &mut rng);
        assert!(!second.last_stand_triggered);
        assert!(player.is_dead());
    }

    #[test]
    fn test_first_hit_scale_once_per_enemy() {
        let mut player = PlayerStats::new(0.0);
        let mut rng = StdRng::seed_from_u64(3);
        let mods = DefenseModifiers { first_hit_scale: Some(0.5), ..Default::default() };

        assert_eq!(player.take_hit(20.0, &mods, &mut rng).damage, 10.0);
        assert_eq!(player.take_hit(20.0, &mods, &mut rng).damage, 20.0);
        player.on_enemy_killed();
        assert_eq!(player.take_hit(20.0, &mods, &mut rng).damage, 10.0);
    }

    #[test]
    fn test_restat_keeps_hp_scale() {
        let mut player = PlayerStats::new(0.0);
        player.scale_max_hp(0.9);
        assert!((player.stats.max_hp - 90.0).abs() < 1e-4);
        player.update_for_stage(2);
        assert!((player.stats.max_hp - 103.0 * 0.9).abs() < 1e-3);
        assert!((player.stats.current_hp - 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_enemy_overkill_and_stun() {
        let mut enemy = EnemyStats::new("Slime", ElementKind::Fire, 30.0, 5.0, 0, 1);
        assert_eq!(enemy.take_damage(10.0), 0.0);
        assert_eq!(enemy.take_damage(35.0), 15.0);
        assert!(enemy.is_dead());

        let mut enemy = EnemyStats::new("Slime", ElementKind::Fire, 30.0, 5.0, 0, 1);
        enemy.stun(1);
        assert!(!enemy.begin_turn());
        assert!(enemy.begin_turn());
    }
}

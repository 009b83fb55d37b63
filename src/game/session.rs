//! Game session
//!
//! One run from the first enemy to game over. The session owns every piece
//! of run state and wires the board, combat math, items, majors and relics
//! together; each call resolves synchronously and reports what happened.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::config::GameConfig;
use super::turn::{PlayerAction, TurnManager, TurnPhase};
use crate::board::{Chain, ElementKind, Grid, Position};
use crate::combat::{
    calculate_attack, heal_amount, shield_amount, AttackBreakdown, AttackInput, AttackModifiers, ComboTracker,
    DefenseModifiers, EnemyStats, HitResult, PlayerStats,
};
use crate::data::{DataManager, EnemyTemplates};
use crate::items::item::{HEAL_POTION_RATIO, SHIELD_POTION_RATIO};
use crate::items::{Consumable, ItemDef, ItemEffect, ItemKind, ItemRegistry, Shop};
use crate::progression::majors::MAX_LEVEL;
use crate::progression::{board_size_for, GameMode, Grade, MajorChoice, MajorProgression, RelicSet, StageScaling};
use crate::save::{SettingsStore, StoreError, ENDLESS_UNLOCK_KEY};

/// Messages kept in the log
const MAX_MESSAGES: usize = 100;
/// Lizard tail: max HP multiplier on revive
const LIZARD_TAIL_MAX_HP: f32 = 0.8;
/// Lizard tail: HP restored, as a share of the reduced max HP
const LIZARD_TAIL_HP: f32 = 0.2;
/// Tent heal, share of max HP
const TENT_HEAL: f32 = 0.3;

// ============================================================================
// Messages
// ============================================================================

/// Categories for message filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageCategory {
    Combat,
    Item,
    System,
    Warning,
}

/// A line in the session log
#[derive(Debug, Clone)]
pub struct GameMessage {
    pub text: String,
    pub round: u32,
    pub category: MessageCategory,
}

// ============================================================================
// Outcomes
// ============================================================================

/// Rewards and board changes from killing an enemy
#[derive(Debug, Clone, PartialEq)]
pub struct KillReward {
    pub enemy: String,
    pub gold: u32,
    pub healed: f32,
    /// Stage after the kill
    pub stage: u32,
    /// New board size when the board grew
    pub resized: Option<(usize, usize)>,
    pub shop_opened: bool,
    pub major_selection: bool,
}

/// A resolved attack
#[derive(Debug, Clone, PartialEq)]
pub struct AttackOutcome {
    pub element: ElementKind,
    /// Tiles in the matched chain
    pub raw_chain: usize,
    pub breakdown: AttackBreakdown,
    /// Fire Explosion extra damage
    pub explosion: Option<f32>,
    /// Total damage dealt
    pub damage: f32,
    /// HP lost to the Rune penalty
    pub rune_penalty: f32,
    pub instant_kill: bool,
    pub shield_gained: f32,
    pub healed: f32,
    pub stunned: bool,
    pub kill: Option<KillReward>,
}

/// A resolved heal or shield match
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupportOutcome {
    pub chain: usize,
    /// HP healed or shield gained after caps
    pub amount: f32,
}

/// The enemy's retaliation
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnemyAttackOutcome {
    /// Enemy lost its turn to a stun
    pub stunned: bool,
    /// Attack after relic and major adjustments
    pub attack: f32,
    pub hit: HitResult,
    pub combo_reset: bool,
    pub lizard_tail_used: bool,
}

/// Everything that happened in one call to [`Session::resolve_turn`]
#[derive(Debug, Clone, PartialEq)]
pub struct TurnResult {
    /// False when the action arrived outside the player phase
    pub accepted: bool,
    pub action: PlayerAction,
    pub attack: Option<AttackOutcome>,
    pub support: Option<SupportOutcome>,
    /// No chain was found (or the player passed)
    pub passed: bool,
    pub enemy: Option<EnemyAttackOutcome>,
    /// Board was shuffled for the next turn
    pub shuffled: bool,
    pub phase: TurnPhase,
}

impl TurnResult {
    fn new(action: PlayerAction, phase: TurnPhase) -> Self {
        Self {
            accepted: true,
            action,
            attack: None,
            support: None,
            passed: false,
            enemy: None,
            shuffled: false,
            phase,
        }
    }

    fn rejected(action: PlayerAction, phase: TurnPhase) -> Self {
        Self {
            accepted: false,
            ..Self::new(action, phase)
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// A single run
pub struct Session {
    config: GameConfig,
    data: DataManager,
    mode: GameMode,
    /// Random number generator (seeded for reproducibility)
    rng: StdRng,
    grid: Grid,
    player: PlayerStats,
    enemy: EnemyStats,
    combo: ComboTracker,
    items: ItemRegistry,
    majors: MajorProgression,
    relics: RelicSet,
    shop: Shop,
    turns: TurnManager,
    stage: u32,
    kills: u32,
    gold: u32,
    /// Board growth steps taken
    expansions: u32,
    /// Chain length of the last matching action, read by the Barrier major
    last_chain: usize,
    major_selection_pending: bool,
    messages: VecDeque<GameMessage>,
}

impl Session {
    /// Create a session at stage 1. `config` overrides the tunables in `data`.
    pub fn new(config: GameConfig, data: DataManager, mode: GameMode, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let items = ItemRegistry::new();
        let (width, height) = board_size_for(0);
        let grid = Grid::new(width, height, &items.spawn_table(), &mut rng).with_max_swaps(config.max_swaps);
        let enemy = spawn_enemy(&data.enemies, 1, &mut rng);
        let player = PlayerStats::starting_at(1, config.player_evade_chance);

        let mut session = Self {
            config,
            data,
            mode,
            rng,
            grid,
            player,
            enemy,
            combo: ComboTracker::new(),
            items,
            majors: MajorProgression::new(),
            relics: RelicSet::new(),
            shop: Shop::new(),
            turns: TurnManager::new(),
            stage: 1,
            kills: 0,
            gold: 0,
            expansions: 0,
            last_chain: 0,
            major_selection_pending: false,
            messages: VecDeque::with_capacity(MAX_MESSAGES),
        };
        session.add_message(
            format!("{} run started. A {} appears!", mode.name(), session.enemy.name),
            MessageCategory::System,
        );
        log::info!("Session created: mode={}, seed={}", mode.name(), seed);
        session
    }

    /// Create a session with the tunables loaded by `data`
    pub fn with_data(data: DataManager, mode: GameMode, seed: u64) -> Self {
        let config = data.config.clone();
        Self::new(config, data, mode, seed)
    }

    /// Reset every piece of run state and start over at `stage`
    pub fn init_session(&mut self, stage: u32) {
        let stage = stage.max(1);
        self.stage = stage;
        self.kills = 0;
        self.gold = 0;
        self.expansions = 0;
        self.last_chain = 0;
        self.major_selection_pending = false;
        self.player = PlayerStats::starting_at(stage, self.config.player_evade_chance);
        self.combo = ComboTracker::new();
        self.items = ItemRegistry::new();
        self.majors.reset();
        self.relics = RelicSet::new();
        self.shop.close();
        self.turns.reset();
        self.messages.clear();

        let (width, height) = board_size_for(0);
        self.grid = Grid::new(width, height, &self.items.spawn_table(), &mut self.rng)
            .with_max_swaps(self.config.max_swaps);
        self.enemy = spawn_enemy(&self.data.enemies, stage, &mut self.rng);

        self.add_message(
            format!("Run restarted at stage {}. A {} appears!", stage, self.enemy.name),
            MessageCategory::System,
        );
        log::info!("Session initialised at stage {}", stage);
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Replace the board, keeping the configured swap cap
    pub fn set_grid(&mut self, grid: Grid) {
        self.grid = grid.with_max_swaps(self.config.max_swaps);
    }

    pub fn player(&self) -> &PlayerStats {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut PlayerStats {
        &mut self.player
    }

    pub fn enemy(&self) -> &EnemyStats {
        &self.enemy
    }

    pub fn set_enemy(&mut self, enemy: EnemyStats) {
        self.enemy = enemy;
    }

    pub fn combo(&self) -> &ComboTracker {
        &self.combo
    }

    pub fn items(&self) -> &ItemRegistry {
        &self.items
    }

    pub fn majors(&self) -> &MajorProgression {
        &self.majors
    }

    pub fn relics(&self) -> &RelicSet {
        &self.relics
    }

    pub fn phase(&self) -> TurnPhase {
        self.turns.phase()
    }

    pub fn round(&self) -> u32 {
        self.turns.round()
    }

    pub fn is_game_over(&self) -> bool {
        self.turns.is_over()
    }

    pub fn stage(&self) -> u32 {
        self.stage
    }

    pub fn kills(&self) -> u32 {
        self.kills
    }

    pub fn gold(&self) -> u32 {
        self.gold
    }

    pub fn add_gold(&mut self, amount: u32) {
        self.gold += amount;
    }

    pub fn last_chain(&self) -> usize {
        self.last_chain
    }

    pub fn major_selection_pending(&self) -> bool {
        self.major_selection_pending
    }

    pub fn messages(&self) -> &VecDeque<GameMessage> {
        &self.messages
    }

    /// Add a message to the log
    pub fn add_message(&mut self, text: impl Into<String>, category: MessageCategory) {
        self.messages.push_back(GameMessage {
            text: text.into(),
            round: self.turns.round(),
            category,
        });

        if self.messages.len() > MAX_MESSAGES {
            self.messages.pop_front();
        }
    }

    // ========================================================================
    // Board
    // ========================================================================

    /// Longest chain of `element` on the current board
    pub fn find_chain(&self, element: ElementKind) -> Chain {
        self.grid.longest_chain(element)
    }

    /// Swap two tiles during the player phase
    pub fn swap(&mut self, a: Position, b: Position) -> bool {
        if self.turns.phase() != TurnPhase::PlayerTurn {
            return false;
        }
        self.grid.swap(a, b)
    }

    /// Remove a matched chain plus the random extras, then refill
    fn consume_chain(&mut self, chain: &Chain) {
        self.grid.remove_tiles(chain);
        self.grid.apply_additional_random_remove(&mut self.rng);
        let table = self.items.spawn_table();
        self.grid.fill_empty_tiles(&table, &mut self.rng);
        self.grid.reset_swaps();
    }

    // ========================================================================
    // Player actions
    // ========================================================================

    fn attack_modifiers(&mut self) -> AttackModifiers {
        AttackModifiers {
            flat_attack: self.items.flat_attack(),
            chain_scale: self.majors.chain_scale(),
            advantage_scale: self.majors.advantage_scale(),
            damage_scale: self.majors.damage_scale() * self.relics.damage_scale(),
            flat_damage: self.majors.magitech_bonus(self.grid.dominant_element_count()) + self.relics.take_residue(),
        }
    }

    /// Attack with the longest chain of a combat element.
    ///
    /// Returns `None` (nothing changes) when the element is not a combat
    /// element or has no tiles on the board. A kill is handled in full
    /// before returning.
    pub fn resolve_attack(&mut self, element: ElementKind) -> Option<AttackOutcome> {
        if !element.is_combat() {
            return None;
        }
        let chain = self.grid.longest_chain(element);
        if chain.is_empty() {
            return None;
        }
        let raw_chain = chain.len();

        let rune_penalty = self.majors.rune_penalty(raw_chain);
        if rune_penalty > 0.0 {
            let stats = &mut self.player.stats;
            stats.current_hp = (stats.current_hp - rune_penalty).max(0.0);
            log::info!("Rune penalty: chain {} < {}, HP -{:.1}", raw_chain, self.majors.rune_last_chain(), rune_penalty);
        }
        if self.player.is_dead() {
            return Some(self.collapse_under_rune(element, &chain, rune_penalty));
        }

        let chain_count = self.majors.rune_chain_bonus(self.items.effective_chain_count(raw_chain));
        self.majors.store_rune_chain(raw_chain);
        let streak = self.combo.on_attack(element, &self.items);

        let mods = self.attack_modifiers();
        let input = AttackInput {
            base_attack: self.player.current_attack(),
            chain_count,
            combo_streak: streak,
            attacker: element,
            defender: self.enemy.element,
        };
        let breakdown = calculate_attack(&input, &self.config.affinity, &mods);

        let explosion = self.majors.fire_explosion(&mut self.rng);
        let damage = breakdown.damage + explosion.unwrap_or(0.0);

        log::info!(
            "Attack: {} x{} (raw {}) vs {} {}, combo {:.2}, affinity {:.2}, damage {:.1}",
            element,
            chain_count,
            raw_chain,
            self.enemy.element,
            self.enemy.name,
            breakdown.combo_multiplier,
            breakdown.affinity_multiplier,
            damage
        );

        let one_hit = self.enemy.stats.current_hp >= self.enemy.stats.max_hp;
        let overkill = self.enemy.take_damage(damage);
        self.relics.store_residue(overkill);

        let mut instant_kill = false;
        let death_chance = self.majors.dark_death_enemy_chance();
        if !self.enemy.is_dead() && death_chance > 0.0 && self.rng.gen::<f32>() < death_chance {
            self.enemy.stats.current_hp = 0.0;
            instant_kill = true;
            log::info!("Dark Death claims the {}", self.enemy.name);
        }

        let shield_gained = self.player.stats.add_shield(self.items.barrier_shield(damage));
        let mut healed = 0.0;
        if let Some(heal) = self.majors.light_holy_heal(damage, &mut self.rng) {
            healed += self.player.stats.heal(heal);
        }
        let vampire = self.relics.vampire_heal(damage, self.player.stats.max_hp);
        healed += self.player.stats.heal(vampire);

        let mut stunned = false;
        if !self.enemy.is_dead() && self.majors.lightning_stun(&mut self.rng) {
            self.enemy.stun(1);
            stunned = true;
            log::debug!("{} is stunned", self.enemy.name);
        }

        if self.enemy.is_dead() && one_hit {
            self.player.bonus_attack = self.majors.water_snow_gain(self.player.bonus_attack);
        }

        self.consume_chain(&chain);
        self.last_chain = raw_chain;
        self.add_message(
            format!("{} chain of {} hits the {} for {:.0}", element, chain_count, self.enemy.name, damage),
            MessageCategory::Combat,
        );

        let kill = if self.enemy.is_dead() {
            Some(self.on_enemy_defeated(raw_chain))
        } else {
            None
        };

        Some(AttackOutcome {
            element,
            raw_chain,
            breakdown,
            explosion,
            damage,
            rune_penalty,
            instant_kill,
            shield_gained,
            healed,
            stunned,
            kill,
        })
    }

    /// The Rune penalty killed the player before the attack landed. The
    /// chain is spent but deals no damage, so a kill cannot heal the
    /// player back above zero.
    fn collapse_under_rune(&mut self, element: ElementKind, chain: &Chain, rune_penalty: f32) -> AttackOutcome {
        let raw_chain = chain.len();
        self.majors.store_rune_chain(raw_chain);
        self.consume_chain(chain);
        self.last_chain = raw_chain;
        log::info!("Rune penalty of {:.1} was fatal, the {} chain fizzles", rune_penalty, element);
        self.add_message("The rune backlash overwhelms you", MessageCategory::Warning);

        AttackOutcome {
            element,
            raw_chain,
            breakdown: AttackBreakdown {
                attack: 0.0,
                chain_count: raw_chain,
                chain_multiplier: 1.0,
                combo_multiplier: 1.0,
                affinity_multiplier: 1.0,
                damage: 0.0,
            },
            explosion: None,
            damage: 0.0,
            rune_penalty,
            instant_kill: false,
            shield_gained: 0.0,
            healed: 0.0,
            stunned: false,
            kill: None,
        }
    }

    /// Heal with the longest Heal chain. `None` when there is none.
    pub fn resolve_heal(&mut self) -> Option<SupportOutcome> {
        let chain = self.grid.longest_chain(ElementKind::Heal);
        if chain.is_empty() {
            return None;
        }
        let stats = &self.player.stats;
        let amount = heal_amount(stats.max_hp, stats.current_hp, chain.len(), self.items.has_heal_boost());

        self.combo.on_non_attack(&self.items);
        self.consume_chain(&chain);
        self.last_chain = chain.len();

        let healed = self.player.stats.heal(amount);
        log::info!("Heal chain {}: +{:.1} HP", chain.len(), healed);
        self.add_message(format!("Healed {:.0} HP", healed), MessageCategory::Combat);
        Some(SupportOutcome { chain: chain.len(), amount: healed })
    }

    /// Shield with the longest Shield chain. `None` when there is none.
    pub fn resolve_shield(&mut self) -> Option<SupportOutcome> {
        let chain = self.grid.longest_chain(ElementKind::Shield);
        if chain.is_empty() {
            return None;
        }
        let amount = shield_amount(self.player.stats.max_hp, chain.len());

        self.combo.on_non_attack(&self.items);
        self.consume_chain(&chain);
        self.last_chain = chain.len();

        let gained = self.player.stats.add_shield(amount);
        log::info!("Shield chain {}: +{:.1} (now {:.1})", chain.len(), gained, self.player.stats.shield);
        self.add_message(format!("Shield +{:.0}", gained), MessageCategory::Combat);
        Some(SupportOutcome { chain: chain.len(), amount: gained })
    }

    /// A turn with no match: the combo sees a non-attack and swaps reset
    fn pass_turn(&mut self) {
        self.combo.on_non_attack(&self.items);
        self.grid.reset_swaps();
        self.last_chain = 0;
        log::debug!("Turn passed");
    }

    // ========================================================================
    // Enemy turn
    // ========================================================================

    fn defense_modifiers(&self) -> DefenseModifiers {
        DefenseModifiers {
            damage_taken_scale: self.relics.damage_taken_scale() * self.majors.damage_taken_scale(),
            first_hit_scale: self.relics.first_hit_scale(),
            evasion_bonus: self.majors.wind_gale_bonus(),
            instant_death_chance: self.majors.dark_death_player_chance(),
            last_stand: self.items.has_last_stand(),
        }
    }

    /// The current enemy attacks the player
    pub fn enemy_attack(&mut self) -> EnemyAttackOutcome {
        if self.enemy.is_dead() {
            return EnemyAttackOutcome::default();
        }
        if !self.enemy.begin_turn() {
            log::info!("{} is stunned and loses its turn", self.enemy.name);
            self.add_message(format!("The {} is stunned!", self.enemy.name), MessageCategory::Combat);
            return EnemyAttackOutcome {
                stunned: true,
                ..Default::default()
            };
        }

        let attack = self.enemy.stats.attack * self.relics.enemy_attack_scale();
        let attack = self.majors.barrier_reduction(attack, self.last_chain);
        let mods = self.defense_modifiers();
        let hit = self.player.take_hit(attack, &mods, &mut self.rng);

        let mut outcome = EnemyAttackOutcome {
            attack,
            hit,
            ..Default::default()
        };

        if hit.evaded {
            self.add_message(format!("You evade the {}'s attack", self.enemy.name), MessageCategory::Combat);
        } else {
            log::info!(
                "{} hits for {:.1} (shield {:.1}, HP -{:.1}) -> {:.1}/{:.1}",
                self.enemy.name,
                hit.damage,
                hit.absorbed,
                hit.hp_lost,
                self.player.stats.current_hp,
                self.player.stats.max_hp
            );
            self.add_message(format!("The {} hits you for {:.0}", self.enemy.name, hit.damage), MessageCategory::Combat);
        }

        if hit.last_stand_triggered {
            self.combo.reset_combo();
            outcome.combo_reset = true;
            self.add_message("Last stand! You cling to life", MessageCategory::Warning);
        }

        outcome.lizard_tail_used = self.try_revive();
        outcome
    }

    /// Lizard tail revive for a dead player
    fn try_revive(&mut self) -> bool {
        if !self.player.is_dead() || !self.relics.try_lizard_tail() {
            return false;
        }
        self.player.scale_max_hp(LIZARD_TAIL_MAX_HP);
        self.player.stats.current_hp = self.player.stats.max_hp * LIZARD_TAIL_HP;
        log::info!("Lizard tail revive at {:.1}/{:.1}", self.player.stats.current_hp, self.player.stats.max_hp);
        self.add_message("The lizard tail drops off. You live!", MessageCategory::Warning);
        true
    }

    // ========================================================================
    // Stage flow
    // ========================================================================

    /// Kill bookkeeping: gold, heal, restat, floor effects, board growth,
    /// shop cadence and the next enemy
    fn on_enemy_defeated(&mut self, chain: usize) -> KillReward {
        let enemy = self.enemy.name.clone();
        self.kills += 1;
        self.stage += 1;

        let base = StageScaling::new(self.stage).base_gold() + self.enemy.gold_bonus;
        let gold = self.items.gold_on_kill(base);
        let gold = self.majors.earth_crystal_gold(gold, chain);
        let gold = self.relics.apply_gold_bonus(gold);
        self.gold += gold;

        let healed = self.player.on_enemy_killed();
        self.player.update_for_stage(self.stage);

        let mut major_selection = false;
        if self.mode == GameMode::Endless {
            major_selection = self.clear_floor();
        }

        let resized = self.grow_board();

        let shop_every = self.config.shop_every_kills;
        let shop_opened = shop_every > 0 && self.kills % shop_every == 0;
        if shop_opened {
            self.shop.open(&self.data.items.items, &self.items, self.mode, &mut self.rng);
            self.add_message("A merchant appears", MessageCategory::System);
        }

        self.enemy = spawn_enemy(&self.data.enemies, self.stage, &mut self.rng);

        log::info!(
            "{} defeated! kills={}, stage={}, +{} gold (total {})",
            enemy,
            self.kills,
            self.stage,
            gold,
            self.gold
        );
        self.add_message(
            format!("The {} falls. +{} gold. A {} appears!", enemy, gold, self.enemy.name),
            MessageCategory::System,
        );

        KillReward {
            enemy,
            gold,
            healed,
            stage: self.stage,
            resized,
            shop_opened,
            major_selection,
        }
    }

    /// Endless floor effects. Returns true when a major selection came due.
    fn clear_floor(&mut self) -> bool {
        let cleared = self.relics.on_floor_cleared(self.config.major_selection_every_floors);
        if cleared.max_hp_scale != 1.0 {
            self.player.scale_max_hp(cleared.max_hp_scale);
        }
        if cleared.major_selection {
            self.major_selection_pending = true;
            self.add_message("A new major can be chosen", MessageCategory::System);
        }
        cleared.major_selection
    }

    /// Grow the board on the resize cadence
    fn grow_board(&mut self) -> Option<(usize, usize)> {
        let every = self.config.resize_every_kills;
        if every == 0 || self.kills % every != 0 {
            return None;
        }
        self.expansions += 1;
        let (width, height) = board_size_for(self.expansions);
        if (width, height) == (self.grid.width(), self.grid.height()) {
            return None;
        }
        let table = self.items.spawn_table();
        self.grid.resize(width, height, &table, &mut self.rng);
        Some((width, height))
    }

    fn start_player_turn(&mut self) -> bool {
        self.turns.end_round();
        if self.majors.should_shuffle() {
            self.grid.shuffle(&mut self.rng);
            log::debug!("Chaos shuffles the board");
            return true;
        }
        false
    }

    fn end_run(&mut self) {
        self.turns.game_over();
        let grade = self.grade();
        log::info!("Game over at stage {} ({} kills) - grade {}", self.stage, self.kills, grade);
        self.add_message(format!("You died on stage {}. Grade {}", self.stage, grade), MessageCategory::Warning);
    }

    /// Resolve a full round: the player action, then the enemy's reply
    /// unless the enemy died, then the game-over check.
    pub fn resolve_turn(&mut self, action: PlayerAction) -> TurnResult {
        if !self.turns.begin_resolving() {
            log::debug!("Action {:?} rejected in phase {:?}", action, self.turns.phase());
            return TurnResult::rejected(action, self.turns.phase());
        }
        let mut result = TurnResult::new(action, TurnPhase::Resolving);

        match action {
            PlayerAction::Attack(element) => result.attack = self.resolve_attack(element),
            PlayerAction::Heal => result.support = self.resolve_heal(),
            PlayerAction::Shield => result.support = self.resolve_shield(),
            PlayerAction::Pass => {}
        }
        if result.attack.is_none() && result.support.is_none() {
            self.pass_turn();
            result.passed = true;
        }

        if self.player.is_dead() && !self.try_revive() {
            self.end_run();
            result.phase = self.turns.phase();
            return result;
        }

        let killed = result.attack.as_ref().is_some_and(|a| a.kill.is_some());
        if !killed {
            self.turns.begin_enemy_turn();
            let reply = self.enemy_attack();
            result.enemy = Some(reply);
            if self.player.is_dead() {
                self.end_run();
                result.phase = self.turns.phase();
                return result;
            }
        }

        result.shuffled = self.start_player_turn();
        result.phase = self.turns.phase();
        result
    }

    // ========================================================================
    // Items
    // ========================================================================

    /// Apply an acquired item: registry effects, major books and relics
    pub fn apply_item(&mut self, kind: ItemKind) -> bool {
        match kind.effect() {
            ItemEffect::MajorBook(choice) => {
                if !self.majors.use_major_book(choice) {
                    return false;
                }
                self.items.add_item(kind)
            }
            ItemEffect::Relic(relic) => {
                if !self.items.add_item(kind) {
                    return false;
                }
                let scale = self.relics.add(relic);
                if scale != 1.0 {
                    self.player.scale_max_hp(scale);
                }
                true
            }
            _ => self.items.add_item(kind),
        }
    }

    pub fn toggle_resonance(&mut self, id: usize) -> bool {
        self.items.toggle_resonance(id)
    }

    /// Drink a potion. Free action.
    pub fn use_consumable(&mut self, consumable: Consumable) -> bool {
        if self.turns.is_over() || !self.items.use_consumable(consumable) {
            return false;
        }
        let max_hp = self.player.stats.max_hp;
        match consumable {
            Consumable::HealPotion => {
                let healed = self.player.stats.heal(max_hp * HEAL_POTION_RATIO);
                self.add_message(format!("Heal potion: +{:.0} HP", healed), MessageCategory::Item);
            }
            Consumable::ShieldPotion => {
                let gained = self.player.stats.add_shield(max_hp * SHIELD_POTION_RATIO);
                self.add_message(format!("Shield potion: +{:.0} shield", gained), MessageCategory::Item);
            }
        }
        true
    }

    /// Skip the current fight with a tent: heal and move on without gold
    pub fn use_tent(&mut self) -> bool {
        if self.turns.phase() != TurnPhase::PlayerTurn || !self.relics.take_tent() {
            return false;
        }
        let max_hp = self.player.stats.max_hp;
        self.player.stats.heal(max_hp * TENT_HEAL);
        self.stage += 1;
        if self.mode == GameMode::Endless {
            self.clear_floor();
        }
        self.player.update_for_stage(self.stage);
        self.enemy = spawn_enemy(&self.data.enemies, self.stage, &mut self.rng);
        log::info!("Tent used, resting to stage {}", self.stage);
        self.add_message(format!("You rest and move on to stage {}", self.stage), MessageCategory::Item);
        true
    }

    // ========================================================================
    // Shop
    // ========================================================================

    pub fn shop_open(&self) -> bool {
        self.shop.is_open()
    }

    pub fn shop_offers(&self) -> &[ItemDef] {
        self.shop.offers()
    }

    /// Price of an offer after discounts and the Dragon multiplier
    pub fn shop_price(&self, index: usize) -> Option<u32> {
        let def = self.shop.offers().get(index)?;
        Some(Shop::price(def, &self.items, self.majors.shop_price_scale()))
    }

    /// Buy an offer and apply it
    pub fn buy(&mut self, index: usize) -> bool {
        // A book needs a slotted major with a level to gain
        if let Some(ItemEffect::MajorBook(choice)) = self.shop.offers().get(index).map(|d| d.kind.effect()) {
            let level = self.majors.level_of(choice);
            if level == 0 || level >= MAX_LEVEL {
                log::debug!("{} can't take a book at level {}, not sold", choice, level);
                return false;
            }
        }
        let Some(kind) = self.shop.buy(index, &mut self.gold, &self.items, self.majors.shop_price_scale()) else {
            return false;
        };
        let applied = self.apply_item(kind);
        if !applied {
            log::warn!("Bought {:?} but it had no effect", kind);
        }
        self.add_message(format!("Bought {:?}", kind), MessageCategory::Item);
        true
    }

    pub fn reroll(&mut self) -> bool {
        self.shop.reroll(&mut self.gold, &self.data.items.items, &self.items, self.mode, &mut self.rng)
    }

    pub fn reroll_cost(&self) -> u32 {
        self.shop.reroll_cost()
    }

    pub fn close_shop(&mut self) {
        self.shop.close();
    }

    // ========================================================================
    // Majors
    // ========================================================================

    /// Roll majors to choose from
    pub fn major_offers(&mut self) -> Vec<MajorChoice> {
        MajorProgression::roll_offers(self.config.major_offer_count, &mut self.rng)
    }

    /// Put a major in a slot, settling any pending selection
    pub fn select_major(&mut self, slot: usize, choice: MajorChoice) -> bool {
        let selected = self.majors.select(slot, choice);
        if selected {
            self.major_selection_pending = false;
            self.add_message(format!("Major {} in slot {}", choice, slot), MessageCategory::System);
        }
        selected
    }

    pub fn level_up_major(&mut self, slot: usize) -> bool {
        self.majors.level_up(slot)
    }

    // ========================================================================
    // Results
    // ========================================================================

    pub fn grade(&self) -> Grade {
        Grade::for_stage(self.mode, self.stage)
    }

    /// Whether this run earned the endless-mode unlock
    pub fn earned_endless_unlock(&self) -> bool {
        self.mode == GameMode::Normal && self.stage >= self.config.endless_unlock_stage
    }

    /// Persist the endless unlock if earned. Returns true when newly set.
    pub fn record_unlock(&self, store: &mut impl SettingsStore) -> Result<bool, StoreError> {
        if !self.earned_endless_unlock() || store.get_bool(ENDLESS_UNLOCK_KEY) {
            return Ok(false);
        }
        store.set_bool(ENDLESS_UNLOCK_KEY, true)?;
        log::info!("Endless mode unlocked");
        Ok(true)
    }
}

/// Spawn the next enemy from the templates, with a slime when none exist
fn spawn_enemy(templates: &EnemyTemplates, stage: u32, rng: &mut StdRng) -> EnemyStats {
    match templates.pick(stage, rng) {
        Some(template) => template.spawn(stage, rng),
        None => {
            log::warn!("No enemy templates loaded, spawning a slime");
            let element = ElementKind::COMBAT[rng.gen_range(0..ElementKind::COMBAT.len())];
            EnemyStats::new("Slime", element, 20.0, 4.0, 0, stage)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::{MajorKind, PassiveKind, RelicKind};
    use crate::save::MemoryStore;

    fn session() -> Session {
        let config = GameConfig {
            player_evade_chance: 0.0,
            ..GameConfig::default()
        };
        Session::new(config, DataManager::default(), GameMode::Normal, 7)
    }

    fn dummy(element: ElementKind, hp: f32, attack: f32) -> EnemyStats {
        let mut enemy = EnemyStats::new("Dummy", element, hp, attack, 0, 1);
        enemy.stats.max_hp = hp;
        enemy.stats.current_hp = hp;
        enemy.stats.attack = attack;
        enemy
    }

    #[test]
    fn test_new_session() {
        let s = session();
        assert_eq!(s.stage(), 1);
        assert_eq!(s.phase(), TurnPhase::PlayerTurn);
        assert_eq!((s.grid().width(), s.grid().height()), (2, 2));
        assert!(s.grid().is_full());
        assert_eq!(s.player().stats.current_hp, 100.0);
    }

    #[test]
    fn test_attack_removes_and_refills() {
        let mut s = session();
        s.set_grid(Grid::from_rows(&["FFW", "FEW", "HSL"]).unwrap());
        s.set_enemy(dummy(ElementKind::Wind, 1000.0, 0.0));

        let outcome = s.resolve_attack(ElementKind::Fire).unwrap();
        assert_eq!(outcome.raw_chain, 3);
        assert!(s.grid().is_full());
        // Fire beats Wind: 10 atk x chain(3) x combo(1) x 1.25
        let expected = 10.0 * (1.0 + 4.0 / 9.0 * 2.0) * 1.25;
        assert!((outcome.damage - expected).abs() < 1e-3);
        assert_eq!(s.last_chain(), 3);
    }

    #[test]
    fn test_attack_without_chain_is_none() {
        let mut s = session();
        s.set_grid(Grid::from_rows(&["FF", "FF"]).unwrap());
        assert!(s.resolve_attack(ElementKind::Water).is_none());
        assert!(s.resolve_attack(ElementKind::Heal).is_none());
    }

    #[test]
    fn test_missing_chain_passes_turn() {
        let mut s = session();
        s.set_grid(Grid::from_rows(&["FF", "FF"]).unwrap());
        s.set_enemy(dummy(ElementKind::Fire, 100.0, 20.0));

        let result = s.resolve_turn(PlayerAction::Attack(ElementKind::Dark));
        assert!(result.accepted);
        assert!(result.passed);
        let reply = result.enemy.unwrap();
        assert_eq!(reply.hit.hp_lost, 20.0);
        assert_eq!(s.player().stats.current_hp, 80.0);
        assert_eq!(s.phase(), TurnPhase::PlayerTurn);
        assert_eq!(s.round(), 2);
    }

    #[test]
    fn test_kill_advances_stage() {
        let mut s = session();
        s.set_grid(Grid::from_rows(&["FF", "FF"]).unwrap());
        s.set_enemy(dummy(ElementKind::Wind, 1.0, 50.0));

        let result = s.resolve_turn(PlayerAction::Attack(ElementKind::Fire));
        let kill = result.attack.unwrap().kill.unwrap();
        assert!(result.enemy.is_none());
        assert_eq!(kill.stage, 2);
        assert_eq!(kill.gold, 10);
        assert_eq!(s.gold(), 10);
        assert_eq!(s.kills(), 1);
        assert!(!s.enemy().is_dead());
    }

    #[test]
    fn test_heal_and_shield() {
        let mut s = session();
        s.player_mut().stats.current_hp = 50.0;
        s.set_grid(Grid::from_rows(&["HH", "SF"]).unwrap());
        let heal = s.resolve_heal().unwrap();
        assert_eq!(heal.chain, 2);
        assert!((heal.amount - 10.0).abs() < 1e-4);

        s.set_grid(Grid::from_rows(&["SS", "SF"]).unwrap());
        let shield = s.resolve_shield().unwrap();
        assert!((shield.amount - 9.0).abs() < 1e-4);
    }

    #[test]
    fn test_stunned_enemy_skips() {
        let mut s = session();
        let mut enemy = dummy(ElementKind::Fire, 100.0, 30.0);
        enemy.stun(1);
        s.set_enemy(enemy);
        let reply = s.enemy_attack();
        assert!(reply.stunned);
        assert_eq!(s.player().stats.current_hp, 100.0);
        let reply = s.enemy_attack();
        assert!(!reply.stunned);
    }

    #[test]
    fn test_death_ends_run() {
        let mut s = session();
        s.set_grid(Grid::from_rows(&["FF", "FF"]).unwrap());
        s.set_enemy(dummy(ElementKind::Fire, 100.0, 500.0));
        let result = s.resolve_turn(PlayerAction::Pass);
        assert_eq!(result.phase, TurnPhase::GameOver);
        assert!(s.is_game_over());
        assert!(!s.resolve_turn(PlayerAction::Pass).accepted);
        assert_eq!(s.grade(), Grade::F);
    }

    #[test]
    fn test_lizard_tail_revives() {
        let mut s = session();
        assert!(s.apply_item(ItemKind::Relic(RelicKind::LizardTail)));
        s.set_enemy(dummy(ElementKind::Fire, 100.0, 500.0));
        let reply = s.enemy_attack();
        assert!(reply.lizard_tail_used);
        assert!((s.player().stats.max_hp - 80.0).abs() < 1e-3);
        assert!((s.player().stats.current_hp - 16.0).abs() < 1e-3);
    }

    fn rune_session() -> Session {
        let mut s = session();
        s.select_major(0, MajorChoice::Active(MajorKind::Rune));
        s.set_grid(Grid::from_rows(&["FF", "FF"]).unwrap());
        s.set_enemy(dummy(ElementKind::Earth, 10_000.0, 0.0));
        s.resolve_turn(PlayerAction::Attack(ElementKind::Fire));
        assert_eq!(s.majors().rune_last_chain(), 4);

        // Shorter chain next turn, against an enemy one hit from death
        s.set_grid(Grid::from_rows(&["FW", "EH"]).unwrap());
        s.set_enemy(dummy(ElementKind::Earth, 1.0, 0.0));
        s.player_mut().stats.current_hp = 5.0;
        s
    }

    #[test]
    fn test_fatal_rune_penalty_ends_run_before_kill() {
        let mut s = rune_session();
        let result = s.resolve_turn(PlayerAction::Attack(ElementKind::Fire));

        let attack = result.attack.unwrap();
        assert!((attack.rune_penalty - 12.0).abs() < 1e-4);
        assert_eq!(attack.damage, 0.0);
        assert!(attack.kill.is_none());
        assert_eq!(result.phase, TurnPhase::GameOver);
        assert_eq!(s.player().stats.current_hp, 0.0);
        assert_eq!(s.kills(), 0);
        assert!(!s.enemy().is_dead());
    }

    #[test]
    fn test_fatal_rune_penalty_uses_lizard_tail() {
        let mut s = rune_session();
        s.apply_item(ItemKind::Relic(RelicKind::LizardTail));
        let result = s.resolve_turn(PlayerAction::Attack(ElementKind::Fire));

        assert_eq!(result.phase, TurnPhase::PlayerTurn);
        assert!((s.player().stats.current_hp - 16.0).abs() < 1e-3);
        assert_eq!(s.kills(), 0);
    }

    #[test]
    fn test_relic_pickup_scales_hp() {
        let mut s = session();
        s.apply_item(ItemKind::Relic(RelicKind::Doping));
        assert!((s.player().stats.max_hp - 110.0).abs() < 1e-3);
    }

    #[test]
    fn test_major_book_needs_slot() {
        let mut s = session();
        let chaos = MajorChoice::Active(MajorKind::Chaos);
        assert!(!s.apply_item(ItemKind::MajorBook(chaos)));
        assert!(s.select_major(0, chaos));
        assert!(s.apply_item(ItemKind::MajorBook(chaos)));
        assert_eq!(s.majors().level_of(chaos), 2);
    }

    #[test]
    fn test_barrier_major_uses_last_chain() {
        let mut s = session();
        s.select_major(0, MajorChoice::Active(MajorKind::Barrier));
        s.set_grid(Grid::from_rows(&["HH", "HS"]).unwrap());
        s.player_mut().stats.current_hp = 50.0;
        s.resolve_heal();
        s.set_enemy(dummy(ElementKind::Fire, 100.0, 10.0));
        let reply = s.enemy_attack();
        assert!((reply.attack - 7.0).abs() < 1e-4);
    }

    #[test]
    fn test_potions_are_free() {
        let mut s = session();
        s.player_mut().stats.current_hp = 40.0;
        assert!(!s.use_consumable(Consumable::HealPotion));
        s.apply_item(ItemKind::HealPotion);
        assert!(s.use_consumable(Consumable::HealPotion));
        assert_eq!(s.player().stats.current_hp, 70.0);
        assert_eq!(s.phase(), TurnPhase::PlayerTurn);
    }

    #[test]
    fn test_tent_skips_fight() {
        let mut s = Session::new(GameConfig::default(), DataManager::default(), GameMode::Endless, 3);
        assert!(!s.use_tent());
        s.apply_item(ItemKind::Relic(RelicKind::Tent));
        s.player_mut().stats.current_hp = 50.0;
        assert!(s.use_tent());
        assert_eq!(s.stage(), 2);
        assert_eq!(s.gold(), 0);
        assert_eq!(s.relics().floors_cleared, 1);
        assert!(s.player().stats.current_hp > 50.0);
    }

    #[test]
    fn test_water_snow_on_one_hit_kill() {
        let mut s = session();
        s.select_major(0, MajorChoice::Passive(PassiveKind::WaterSnow));
        s.set_grid(Grid::from_rows(&["AA", "AA"]).unwrap());
        s.set_enemy(dummy(ElementKind::Fire, 5.0, 0.0));
        s.resolve_attack(ElementKind::Water);
        assert_eq!(s.player().bonus_attack, 0.5);
    }

    #[test]
    fn test_record_unlock() {
        let mut s = session();
        let mut store = MemoryStore::new();
        assert!(!s.record_unlock(&mut store).unwrap());

        s.stage = 100;
        assert!(s.record_unlock(&mut store).unwrap());
        assert!(store.get_bool(ENDLESS_UNLOCK_KEY));
        assert!(!s.record_unlock(&mut store).unwrap());
    }

    #[test]
    fn test_message_log_capped() {
        let mut s = session();
        for i in 0..150 {
            s.add_message(format!("line {}", i), MessageCategory::System);
        }
        assert_eq!(s.messages().len(), MAX_MESSAGES);
        assert_eq!(s.messages().front().map(|m| m.text.as_str()), Some("line 50"));
        assert_eq!(s.messages().back().map(|m| m.text.as_str()), Some("line 149"));
    }

    #[test]
    fn test_init_session_resets() {
        let mut s = session();
        s.add_gold(100);
        s.apply_item(ItemKind::ChainBooster);
        s.init_session(5);
        assert_eq!(s.stage(), 5);
        assert_eq!(s.gold(), 0);
        assert_eq!(s.items().chain_boosters(), 0);
        assert_eq!(s.player().stats.current_hp, s.player().stats.max_hp);
    }
}

//! End-to-end session scenarios

use manachain::board::{ElementKind, Grid};
use manachain::combat::{chain_multiplier, EnemyStats};
use manachain::data::DataManager;
use manachain::game::{GameConfig, PlayerAction, Session, TurnPhase};
use manachain::items::ItemKind;
use manachain::progression::GameMode;

fn config() -> GameConfig {
    GameConfig {
        player_evade_chance: 0.0,
        ..GameConfig::default()
    }
}

fn session_with(config: GameConfig, seed: u64) -> Session {
    Session::new(config, DataManager::default(), GameMode::Normal, seed)
}

fn enemy(element: ElementKind, hp: f32, attack: f32) -> EnemyStats {
    let mut enemy = EnemyStats::new("Training Dummy", element, hp, attack, 0, 1);
    enemy.stats.max_hp = hp;
    enemy.stats.current_hp = hp;
    enemy.stats.attack = attack;
    enemy
}

/// Kill a fragile enemy with a full Fire board
fn kill_one(session: &mut Session) {
    session.set_grid(Grid::from_rows(&["FF", "FF"]).unwrap());
    session.set_enemy(enemy(ElementKind::Wind, 1.0, 0.0));
    let result = session.resolve_turn(PlayerAction::Attack(ElementKind::Fire));
    assert!(result.attack.and_then(|a| a.kill).is_some());
}

#[test]
fn test_l_shaped_fire_chain() {
    let mut session = session_with(config(), 1);
    session.set_grid(Grid::from_rows(&["FEE", "FEE", "FFF"]).unwrap());
    session.set_enemy(enemy(ElementKind::Fire, 1000.0, 0.0));

    assert_eq!(session.find_chain(ElementKind::Fire).len(), 5);
    let outcome = session.resolve_attack(ElementKind::Fire).unwrap();
    assert!((outcome.breakdown.chain_multiplier - 2.7778).abs() < 1e-3);
    assert_eq!(outcome.breakdown.affinity_multiplier, 1.0);
    assert!((outcome.damage - 10.0 * chain_multiplier(5)).abs() < 1e-3);
    assert!(session.grid().is_full());
}

#[test]
fn test_enemy_hit_without_shield() {
    let mut session = session_with(config(), 2);
    session.set_enemy(enemy(ElementKind::Earth, 100.0, 20.0));
    let reply = session.enemy_attack();
    assert!(!reply.hit.evaded);
    assert_eq!(session.player().stats.current_hp, 80.0);
}

#[test]
fn test_last_stand_only_once() {
    let mut session = session_with(config(), 3);
    assert!(session.apply_item(ItemKind::LastStand));
    session.set_grid(Grid::from_rows(&["FF", "FF"]).unwrap());
    session.set_enemy(enemy(ElementKind::Water, 10_000.0, 1000.0));

    let first = session.resolve_turn(PlayerAction::Pass);
    let reply = first.enemy.unwrap();
    assert!(reply.hit.last_stand_triggered);
    assert!(reply.combo_reset);
    assert_eq!(first.phase, TurnPhase::PlayerTurn);
    assert!((session.player().stats.current_hp - 30.0).abs() < 1e-3);

    let second = session.resolve_turn(PlayerAction::Pass);
    assert_eq!(second.phase, TurnPhase::GameOver);
    assert!(session.player().is_dead());
}

#[test]
fn test_resonance_overlap_rejected() {
    let mut session = session_with(config(), 4);
    assert!(session.apply_item(ItemKind::Resonance(ElementKind::Fire, ElementKind::Wind)));
    assert!(session.apply_item(ItemKind::Resonance(ElementKind::Wind, ElementKind::Earth)));
    assert!(session.apply_item(ItemKind::Resonance(ElementKind::Light, ElementKind::Dark)));

    let resonances = session.items().resonances();
    assert!(resonances.is_active(0));
    assert!(!resonances.is_active(1));
    assert!(resonances.is_active(2));

    // Overlaps Fire/Wind
    assert!(!session.toggle_resonance(1));
    assert!(session.toggle_resonance(0));
    assert!(session.toggle_resonance(1));
    // Two already active
    assert!(!session.toggle_resonance(0));
}

#[test]
fn test_resonance_carries_combo() {
    let mut session = session_with(config(), 5);
    session.apply_item(ItemKind::Resonance(ElementKind::Fire, ElementKind::Wind));
    session.set_enemy(enemy(ElementKind::Earth, 10_000.0, 0.0));

    session.set_grid(Grid::from_rows(&["FF", "EE"]).unwrap());
    session.resolve_turn(PlayerAction::Attack(ElementKind::Fire));
    session.set_grid(Grid::from_rows(&["WW", "EE"]).unwrap());
    let result = session.resolve_turn(PlayerAction::Attack(ElementKind::Wind));
    assert!((result.attack.unwrap().breakdown.combo_multiplier - 1.15).abs() < 1e-5);
    assert_eq!(session.combo().streak, 2);
}

#[test]
fn test_same_seed_same_run() {
    let play = |seed: u64| {
        let mut session = session_with(config(), seed);
        let mut log = Vec::new();
        for _ in 0..30 {
            if session.is_game_over() {
                break;
            }
            let element = ElementKind::COMBAT
                .iter()
                .copied()
                .max_by_key(|&e| session.find_chain(e).len())
                .unwrap_or(ElementKind::Fire);
            session.resolve_turn(PlayerAction::Attack(element));
            log.push((session.grid().dump(), session.player().stats.current_hp, session.stage()));
        }
        log
    };

    assert_eq!(play(42), play(42));
}

#[test]
fn test_shop_cadence() {
    let mut session = session_with(
        GameConfig {
            shop_every_kills: 2,
            ..config()
        },
        6,
    );

    kill_one(&mut session);
    assert!(!session.shop_open());
    kill_one(&mut session);
    assert!(session.shop_open());
    assert_eq!(session.shop_offers().len(), 3);

    session.close_shop();
    kill_one(&mut session);
    assert!(!session.shop_open());
    kill_one(&mut session);
    assert!(session.shop_open());
}

#[test]
fn test_shop_purchase_applies_item() {
    let mut session = session_with(
        GameConfig {
            shop_every_kills: 1,
            ..config()
        },
        7,
    );
    kill_one(&mut session);
    assert!(session.shop_open());

    let price = session.shop_price(0).unwrap();
    assert!(!session.buy(0));
    session.add_gold(price);
    let gold_before = session.gold();
    assert!(session.buy(0));
    assert_eq!(session.gold(), gold_before - price);
    assert!(!session.buy(0));

    let kind = session.shop_offers()[0].kind;
    assert_eq!(session.items().item_count(kind), 1);
}

#[test]
fn test_board_resize_schedule() {
    let mut session = session_with(config(), 8);
    let mut sizes = Vec::new();
    for _ in 0..9 {
        kill_one(&mut session);
        sizes.push((session.grid().width(), session.grid().height()));
    }
    // set_grid in kill_one resets to 2x2 before each attack; the resize
    // happens after the kill
    assert_eq!(sizes[2], (2, 3));
    assert_eq!(sizes[5], (3, 3));
    assert_eq!(sizes[8], (3, 4));
    assert_eq!(session.kills(), 9);
    assert_eq!(session.stage(), 10);
}

#[test]
fn test_endless_major_selection() {
    let config = GameConfig {
        major_selection_every_floors: 2,
        ..config()
    };
    let mut session = Session::new(config, DataManager::default(), GameMode::Endless, 9);
    kill_one(&mut session);
    assert!(!session.major_selection_pending());
    kill_one(&mut session);
    assert!(session.major_selection_pending());

    let offers = session.major_offers();
    assert_eq!(offers.len(), 3);
    assert!(session.select_major(0, offers[0]));
    assert!(!session.major_selection_pending());
}

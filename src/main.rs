//! Manachain - Entry Point
//!
//! Headless driver: plays a seeded run to game over with a greedy policy,
//! logging every turn, then records the endless unlock.
//!
//! Usage: `manachain [--seed N] [--endless] [--max-rounds N] [--export-data DIR]`

use std::path::Path;

use anyhow::{bail, Context, Result};

use manachain::combat::element_affinity;
use manachain::data::{export_default_data, DataManager};
use manachain::game::{PlayerAction, Session};
use manachain::items::Consumable;
use manachain::progression::GameMode;
use manachain::save::{JsonFileStore, SettingsStore, ENDLESS_UNLOCK_KEY};
use manachain::ElementKind;

/// Heal when HP falls below this share of max
const HEAL_THRESHOLD: f32 = 0.4;
/// Hard stop for runaway runs
const DEFAULT_MAX_ROUNDS: u32 = 5_000;

struct Options {
    seed: u64,
    mode: GameMode,
    max_rounds: u32,
    export_dir: Option<String>,
}

fn parse_args() -> Result<Options> {
    let mut options = Options {
        seed: 0x5eed,
        mode: GameMode::Normal,
        max_rounds: DEFAULT_MAX_ROUNDS,
        export_dir: None,
    };

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--seed" => {
                let value = args.next().context("--seed needs a value")?;
                options.seed = value.parse().with_context(|| format!("invalid seed: {}", value))?;
            }
            "--max-rounds" => {
                let value = args.next().context("--max-rounds needs a value")?;
                options.max_rounds = value.parse().with_context(|| format!("invalid round limit: {}", value))?;
            }
            "--endless" => options.mode = GameMode::Endless,
            "--export-data" => options.export_dir = Some(args.next().context("--export-data needs a directory")?),
            other => bail!("unknown argument: {}", other),
        }
    }
    Ok(options)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = parse_args()?;
    log::info!("Starting Manachain v{}", env!("CARGO_PKG_VERSION"));

    if let Some(dir) = &options.export_dir {
        export_default_data(Path::new(dir)).with_context(|| format!("exporting data to {}", dir))?;
        return Ok(());
    }

    let mut store = JsonFileStore::open_default().context("opening settings")?;
    if options.mode == GameMode::Endless && !store.get_bool(ENDLESS_UNLOCK_KEY) {
        log::warn!("Endless mode is still locked; playing it anyway");
    }

    let mut session = Session::with_data(DataManager::new(), options.mode, options.seed);
    while !session.is_game_over() && session.round() <= options.max_rounds {
        play_between_turns(&mut session);

        let action = choose_action(&session);
        let result = session.resolve_turn(action);
        if !result.accepted {
            bail!("action {:?} rejected in phase {:?}", action, result.phase);
        }
        log::debug!(
            "Round {}: {:?} -> HP {:.0}/{:.0}, enemy {} {:.0}/{:.0}",
            session.round(),
            action,
            session.player().stats.current_hp,
            session.player().stats.max_hp,
            session.enemy().name,
            session.enemy().stats.current_hp,
            session.enemy().stats.max_hp
        );
    }

    println!(
        "{} run over: stage {}, {} kills, {} gold, grade {}",
        session.mode().name(),
        session.stage(),
        session.kills(),
        session.gold(),
        session.grade()
    );

    if session.record_unlock(&mut store).context("saving unlock flag")? {
        println!("Endless mode unlocked!");
    }

    log::info!("Manachain shut down cleanly");
    Ok(())
}

/// Free actions before committing the turn: shop, majors, potions
fn play_between_turns(session: &mut Session) {
    if session.shop_open() {
        for index in 0..session.shop_offers().len() {
            session.buy(index);
        }
        session.close_shop();
    }

    if session.major_selection_pending() {
        let offers = session.major_offers();
        if let Some(choice) = offers.first() {
            let slot = if session.majors().slot(0).is_none() { 0 } else { 1 };
            session.select_major(slot, *choice);
        }
    }

    let stats = &session.player().stats;
    if stats.current_hp < stats.max_hp * HEAL_THRESHOLD {
        session.use_consumable(Consumable::HealPotion);
    }
}

/// Greedy policy: heal when low, otherwise the attack with the best
/// chain length times affinity
fn choose_action(session: &Session) -> PlayerAction {
    let stats = &session.player().stats;
    if stats.current_hp < stats.max_hp * HEAL_THRESHOLD && !session.find_chain(ElementKind::Heal).is_empty() {
        return PlayerAction::Heal;
    }

    let affinity = &session.config().affinity;
    let defender = session.enemy().element;
    ElementKind::COMBAT
        .iter()
        .map(|&element| {
            let chain = session.find_chain(element).len() as f32;
            (element, chain * element_affinity(element, defender, affinity))
        })
        .filter(|(_, score)| *score > 0.0)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(element, _)| PlayerAction::Attack(element))
        .unwrap_or_else(|| {
            if !session.find_chain(ElementKind::Shield).is_empty() {
                PlayerAction::Shield
            } else {
                PlayerAction::Heal
            }
        })
}

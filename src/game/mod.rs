//! Game module - Turn flow and session state

pub mod config;
pub mod session;
pub mod turn;

pub use config::GameConfig;
pub use session::{
    AttackOutcome, EnemyAttackOutcome, GameMessage, KillReward, MessageCategory, Session, SupportOutcome, TurnResult,
};
pub use turn::{PlayerAction, TurnManager, TurnPhase};

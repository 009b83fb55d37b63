//! Turn flow
//!
//! Phases of one round and the actions a player can take.

use serde::{Deserialize, Serialize};

use crate::board::ElementKind;

/// Phase of the current round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    /// Waiting for a player action
    PlayerTurn,
    /// Player action being applied
    Resolving,
    /// Enemy retaliation
    EnemyTurn,
    /// Player is dead
    GameOver,
}

/// What the player does with their turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerAction {
    /// Match the longest chain of a combat element
    Attack(ElementKind),
    /// Match the longest Heal chain
    Heal,
    /// Match the longest Shield chain
    Shield,
    /// Do nothing
    Pass,
}

impl PlayerAction {
    /// Element whose chain this action consumes
    pub fn element(&self) -> Option<ElementKind> {
        match self {
            PlayerAction::Attack(element) => Some(*element),
            PlayerAction::Heal => Some(ElementKind::Heal),
            PlayerAction::Shield => Some(ElementKind::Shield),
            PlayerAction::Pass => None,
        }
    }

    pub fn is_attack(&self) -> bool {
        matches!(self, PlayerAction::Attack(_))
    }
}

/// Tracks the phase and round counter
#[derive(Debug, Clone, PartialEq)]
pub struct TurnManager {
    phase: TurnPhase,
    round: u32,
}

impl TurnManager {
    pub fn new() -> Self {
        Self {
            phase: TurnPhase::PlayerTurn,
            round: 1,
        }
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    /// Start resolving a player action. False outside the player phase.
    pub fn begin_resolving(&mut self) -> bool {
        if self.phase != TurnPhase::PlayerTurn {
            return false;
        }
        self.phase = TurnPhase::Resolving;
        true
    }

    pub fn begin_enemy_turn(&mut self) {
        if self.phase != TurnPhase::GameOver {
            self.phase = TurnPhase::EnemyTurn;
        }
    }

    /// Close the round and hand control back to the player
    pub fn end_round(&mut self) {
        if self.phase != TurnPhase::GameOver {
            self.phase = TurnPhase::PlayerTurn;
            self.round += 1;
        }
    }

    pub fn game_over(&mut self) {
        self.phase = TurnPhase::GameOver;
    }

    pub fn is_over(&self) -> bool {
        self.phase == TurnPhase::GameOver
    }

    /// Back to round one, player to act
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for TurnManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_flow() {
        let mut turns = TurnManager::new();
        assert!(turns.begin_resolving());
        assert!(!turns.begin_resolving());
        turns.begin_enemy_turn();
        assert_eq!(turns.phase(), TurnPhase::EnemyTurn);
        turns.end_round();
        assert_eq!(turns.phase(), TurnPhase::PlayerTurn);
        assert_eq!(turns.round(), 2);
    }

    #[test]
    fn test_game_over_is_terminal() {
        let mut turns = TurnManager::new();
        turns.game_over();
        turns.end_round();
        turns.begin_enemy_turn();
        assert!(turns.is_over());
        assert!(!turns.begin_resolving());
        assert_eq!(turns.round(), 1);
    }

    #[test]
    fn test_action_elements() {
        assert_eq!(PlayerAction::Heal.element(), Some(ElementKind::Heal));
        assert_eq!(PlayerAction::Attack(ElementKind::Dark).element(), Some(ElementKind::Dark));
        assert_eq!(PlayerAction::Pass.element(), None);
        assert!(!PlayerAction::Shield.is_attack());
    }
}

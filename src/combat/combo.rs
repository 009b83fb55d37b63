//! Combo tracking
//!
//! Consecutive attacks with the same element, or with two elements of one
//! active resonance, build a streak that scales damage.

use serde::{Deserialize, Serialize};

use super::damage::combo_multiplier;
use crate::board::ElementKind;

/// Item-dependent combo rules
pub trait ComboRules {
    /// Whether two different elements continue each other's combo
    fn same_group(&self, a: ElementKind, b: ElementKind) -> bool;

    /// Whether a single non-attack turn is tolerated
    fn keeps_combo(&self) -> bool;
}

/// Rules with no items owned
pub struct NoComboItems;

impl ComboRules for NoComboItems {
    fn same_group(&self, _a: ElementKind, _b: ElementKind) -> bool {
        false
    }

    fn keeps_combo(&self) -> bool {
        false
    }
}

/// Combo state machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboTracker {
    pub last_element: Option<ElementKind>,
    pub streak: u32,
    pub non_attack_run: u32,
}

impl ComboTracker {
    pub fn new() -> Self {
        Self {
            last_element: None,
            streak: 1,
            non_attack_run: 0,
        }
    }

    /// Record an attack. Returns the new streak.
    pub fn on_attack(&mut self, element: ElementKind, rules: &impl ComboRules) -> u32 {
        let continues = match self.last_element {
            Some(last) => last == element || rules.same_group(last, element),
            None => false,
        };

        self.streak = if continues { self.streak + 1 } else { 1 };
        self.last_element = Some(element);
        self.non_attack_run = 0;

        log::debug!("Combo streak {} ({})", self.streak, element);
        self.streak
    }

    /// Record a heal, shield or pass. Returns true if the combo broke.
    pub fn on_non_attack(&mut self, rules: &impl ComboRules) -> bool {
        if rules.keeps_combo() {
            self.non_attack_run += 1;
            if self.non_attack_run < 2 {
                log::debug!("Combo kept through one non-attack turn");
                return false;
            }
        }

        let broke = self.streak > 1;
        self.streak = 1;
        self.last_element = None;
        if broke {
            log::debug!("Combo broken");
        }
        broke
    }

    /// Forced reset, e.g. after last stand
    pub fn reset_combo(&mut self) {
        self.streak = 1;
        self.last_element = None;
        self.non_attack_run = 0;
    }

    pub fn multiplier(&self) -> f32 {
        combo_multiplier(self.streak)
    }
}

impl Default for ComboTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Resonant;

    impl ComboRules for Resonant {
        fn same_group(&self, a: ElementKind, b: ElementKind) -> bool {
            let pair = [ElementKind::Fire, ElementKind::Wind];
            pair.contains(&a) && pair.contains(&b)
        }

        fn keeps_combo(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_same_element_builds_streak() {
        let mut combo = ComboTracker::new();
        assert_eq!(combo.on_attack(ElementKind::Fire, &NoComboItems), 1);
        assert_eq!(combo.on_attack(ElementKind::Fire, &NoComboItems), 2);
        assert_eq!(combo.on_attack(ElementKind::Fire, &NoComboItems), 3);
        assert!((combo.multiplier() - 1.3).abs() < 1e-5);
        assert_eq!(combo.on_attack(ElementKind::Water, &NoComboItems), 1);
    }

    #[test]
    fn test_resonance_continues_combo() {
        let mut combo = ComboTracker::new();
        combo.on_attack(ElementKind::Fire, &Resonant);
        assert_eq!(combo.on_attack(ElementKind::Wind, &Resonant), 2);
        assert_eq!(combo.on_attack(ElementKind::Earth, &Resonant), 1);
    }

    #[test]
    fn test_non_attack_breaks_without_keeper() {
        let mut combo = ComboTracker::new();
        combo.on_attack(ElementKind::Fire, &NoComboItems);
        combo.on_attack(ElementKind::Fire, &NoComboItems);
        assert!(combo.on_non_attack(&NoComboItems));
        assert_eq!(combo.streak, 1);
        assert_eq!(combo.last_element, None);
    }

    #[test]
    fn test_keeper_tolerates_one_non_attack() {
        let mut combo = ComboTracker::new();
        combo.on_attack(ElementKind::Fire, &Resonant);
        combo.on_attack(ElementKind::Fire, &Resonant);

        assert!(!combo.on_non_attack(&Resonant));
        assert_eq!(combo.on_attack(ElementKind::Fire, &Resonant), 3);

        assert!(!combo.on_non_attack(&Resonant));
        assert!(combo.on_non_attack(&Resonant));
        assert_eq!(combo.streak, 1);
    }

    #[test]
    fn test_reset() {
        let mut combo = ComboTracker::new();
        combo.on_attack(ElementKind::Dark, &NoComboItems);
        combo.on_attack(ElementKind::Dark, &NoComboItems);
        combo.reset_combo();
        assert_eq!(combo, ComboTracker::new());
    }
}

//! Weighted tile spawning
//!
//! Heal and Shield always take 10% each. The remaining 80% is split among
//! the seven combat elements in proportion to `1 + orb stacks`, or evenly
//! once every combat element holds at least three orbs.

use rand::Rng;

use super::tile::ElementKind;

/// Fixed share for each utility element
pub const UTILITY_SHARE: f32 = 0.1;
/// Share split among the combat elements
pub const COMBAT_SHARE: f32 = 0.8;
/// Orb stacks per element needed for the seven-orb collection
pub const SEVEN_ORB_THRESHOLD: u8 = 3;

/// Spawn probability for every element kind
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnTable {
    /// Indexed by position in `ElementKind::ALL`
    probabilities: [f32; 10],
}

impl SpawnTable {
    /// Table with no orb bias
    pub fn uniform() -> Self {
        Self::from_orbs(&[0; 7])
    }

    /// Build the table from per-element orb stacks, ordered as `ElementKind::COMBAT`
    pub fn from_orbs(orb_stacks: &[u8; 7]) -> Self {
        let mut probabilities = [0.0; 10];
        let seven_orbs = orb_stacks.iter().all(|&s| s >= SEVEN_ORB_THRESHOLD);
        let total_priority: u32 = orb_stacks.iter().map(|&s| 1 + s as u32).sum();

        for (slot, element) in ElementKind::ALL.iter().enumerate() {
            probabilities[slot] = match element {
                ElementKind::Heal | ElementKind::Shield => UTILITY_SHARE,
                ElementKind::Major => 0.0,
                combat => {
                    if seven_orbs {
                        COMBAT_SHARE / 7.0
                    } else {
                        let idx = combat.combat_index().unwrap_or(0);
                        let priority = 1 + orb_stacks[idx] as u32;
                        COMBAT_SHARE * priority as f32 / total_priority as f32
                    }
                }
            };
        }

        Self { probabilities }
    }

    /// Probability of spawning `element`
    pub fn probability(&self, element: ElementKind) -> f32 {
        ElementKind::ALL
            .iter()
            .position(|e| *e == element)
            .map(|i| self.probabilities[i])
            .unwrap_or(0.0)
    }

    /// Sum of all probabilities (1.0 up to float error)
    pub fn total(&self) -> f32 {
        self.probabilities.iter().sum()
    }

    /// Pick an element by weighted roll
    pub fn roll(&self, rng: &mut impl Rng) -> ElementKind {
        let total = self.total();
        let roll = rng.gen_range(0.0..total);
        let mut cumulative = 0.0;

        for (slot, &p) in self.probabilities.iter().enumerate() {
            if p <= 0.0 {
                continue;
            }
            cumulative += p;
            if roll < cumulative {
                return ElementKind::ALL[slot];
            }
        }

        // Float drift at the top of the range lands on the last weighted kind
        ElementKind::Shield
    }
}

impl Default for SpawnTable {
    fn default() -> Self {
        Self::uniform()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_probabilities_sum_to_one() {
        for stacks in [[0; 7], [5, 0, 0, 0, 0, 0, 0], [1, 2, 3, 4, 5, 0, 1], [3; 7], [5; 7]] {
            let table = SpawnTable::from_orbs(&stacks);
            assert!((table.total() - 1.0).abs() < 1e-5, "stacks {:?}", stacks);
        }
    }

    #[test]
    fn test_orb_bias() {
        let table = SpawnTable::from_orbs(&[0, 5, 0, 0, 0, 0, 0]);
        assert!(table.probability(ElementKind::Fire) > table.probability(ElementKind::Wind));
        assert_eq!(table.probability(ElementKind::Heal), UTILITY_SHARE);
        assert_eq!(table.probability(ElementKind::Shield), UTILITY_SHARE);
        assert_eq!(table.probability(ElementKind::Major), 0.0);
    }

    #[test]
    fn test_seven_orbs_uniform() {
        let table = SpawnTable::from_orbs(&[3, 5, 4, 3, 3, 5, 3]);
        let expected = COMBAT_SHARE / 7.0;
        for element in ElementKind::COMBAT {
            assert!((table.probability(element) - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_roll_never_major() {
        let table = SpawnTable::uniform();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..2000 {
            assert_ne!(table.roll(&mut rng), ElementKind::Major);
        }
    }
}

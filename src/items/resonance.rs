//! Resonances
//!
//! A resonance pairs two elements so attacks with either continue the same
//! combo. At most two can be active, and no element may appear in both.

use serde::{Deserialize, Serialize};

use crate::board::ElementKind;

/// Active resonance limit
pub const MAX_ACTIVE: usize = 2;

/// An element pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resonance {
    pub a: ElementKind,
    pub b: ElementKind,
}

impl Resonance {
    /// Pair two elements. A degenerate pair falls back to Fire/Light.
    pub fn new(a: ElementKind, b: ElementKind) -> Self {
        if a == b {
            return Self { a: ElementKind::Fire, b: ElementKind::Light };
        }
        Self { a, b }
    }

    pub fn contains(&self, element: ElementKind) -> bool {
        self.a == element || self.b == element
    }

    /// Whether the two pairs share an element
    pub fn overlaps(&self, other: &Resonance) -> bool {
        other.contains(self.a) || other.contains(self.b)
    }

    /// Whether both elements belong to this pair
    pub fn links(&self, x: ElementKind, y: ElementKind) -> bool {
        self.contains(x) && self.contains(y)
    }
}

/// Owned resonances and which of them are active
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResonanceSet {
    owned: Vec<Resonance>,
    active: Vec<usize>,
}

impl ResonanceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this pair is owned, in either order
    pub fn owns(&self, resonance: &Resonance) -> bool {
        self.owned.iter().any(|r| r.links(resonance.a, resonance.b))
    }

    /// Add a resonance and activate it if it fits. False if already owned.
    pub fn add(&mut self, resonance: Resonance) -> bool {
        if self.owns(&resonance) {
            return false;
        }
        self.owned.push(resonance);
        let id = self.owned.len() - 1;
        if self.can_activate(id) {
            self.active.push(id);
        }
        log::info!("Resonance {}/{} acquired", resonance.a, resonance.b);
        true
    }

    fn can_activate(&self, id: usize) -> bool {
        let Some(candidate) = self.owned.get(id) else {
            return false;
        };
        self.active.len() < MAX_ACTIVE
            && self
                .active
                .iter()
                .filter_map(|&i| self.owned.get(i))
                .all(|r| !r.overlaps(candidate))
    }

    /// Flip a resonance on or off. Activation is rejected past the limit or on
    /// element overlap.
    pub fn toggle(&mut self, id: usize) -> bool {
        if id >= self.owned.len() {
            return false;
        }
        if let Some(pos) = self.active.iter().position(|&i| i == id) {
            self.active.remove(pos);
            return true;
        }
        if !self.can_activate(id) {
            log::debug!("Resonance {} rejected", id);
            return false;
        }
        self.active.push(id);
        true
    }

    pub fn is_active(&self, id: usize) -> bool {
        self.active.contains(&id)
    }

    pub fn owned(&self) -> &[Resonance] {
        &self.owned
    }

    pub fn active(&self) -> impl Iterator<Item = &Resonance> {
        self.active.iter().filter_map(|&i| self.owned.get(i))
    }

    /// Whether an active resonance links both elements
    pub fn same_group(&self, x: ElementKind, y: ElementKind) -> bool {
        self.active().any(|r| r.links(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ElementKind::*;

    fn set_with(pairs: &[(ElementKind, ElementKind)]) -> ResonanceSet {
        let mut set = ResonanceSet::new();
        for &(a, b) in pairs {
            set.add(Resonance::new(a, b));
        }
        set
    }

    #[test]
    fn test_overlap_rejected() {
        let mut set = set_with(&[(Fire, Wind), (Wind, Earth), (Water, Dark)]);
        // Fire/Wind auto-active, Wind/Earth overlaps, Water/Dark fits
        assert!(set.is_active(0));
        assert!(!set.is_active(1));
        assert!(set.is_active(2));

        assert!(!set.toggle(1));
        assert!(set.toggle(0));
        assert!(set.toggle(1));
        assert!(set.is_active(1));
    }

    #[test]
    fn test_max_two_active() {
        let mut set = set_with(&[(Fire, Wind), (Earth, Water), (Light, Dark)]);
        assert_eq!(set.active().count(), 2);
        assert!(!set.toggle(2));
        assert!(set.toggle(1));
        assert!(set.toggle(2));
        assert_eq!(set.active().count(), 2);
        assert_eq!(set.owned().len(), 3);
    }

    #[test]
    fn test_same_group() {
        let set = set_with(&[(Fire, Wind)]);
        assert!(set.same_group(Fire, Wind));
        assert!(set.same_group(Wind, Fire));
        assert!(!set.same_group(Fire, Earth));
    }

    #[test]
    fn test_duplicates_and_bad_ids() {
        let mut set = set_with(&[(Fire, Wind)]);
        assert!(set.owns(&Resonance::new(Wind, Fire)));
        assert!(!set.owns(&Resonance::new(Fire, Earth)));
        assert!(!set.add(Resonance::new(Wind, Fire)));
        assert!(!set.toggle(7));
        assert_eq!(Resonance::new(Dark, Dark), Resonance::new(Fire, Light));
    }
}

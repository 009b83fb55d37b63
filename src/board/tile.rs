//! Tile definitions
//!
//! Element kinds and the tiles that carry them.

use serde::{Deserialize, Serialize};

/// Position of a cell on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another position
    pub fn distance(&self, other: &Position) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// Element carried by a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElementKind {
    // Combat elements
    Wind,
    Fire,
    Lightning,
    Water,
    Earth,
    Light,
    Dark,

    // Utility elements
    Heal,
    Shield,

    /// Endless-mode major tile, never produced by the regular spawn table
    Major,
}

impl ElementKind {
    /// Every element kind, in declaration order
    pub const ALL: [ElementKind; 10] = [
        ElementKind::Wind,
        ElementKind::Fire,
        ElementKind::Lightning,
        ElementKind::Water,
        ElementKind::Earth,
        ElementKind::Light,
        ElementKind::Dark,
        ElementKind::Heal,
        ElementKind::Shield,
        ElementKind::Major,
    ];

    /// The seven elements that take part in the affinity graph
    pub const COMBAT: [ElementKind; 7] = [
        ElementKind::Wind,
        ElementKind::Fire,
        ElementKind::Lightning,
        ElementKind::Water,
        ElementKind::Earth,
        ElementKind::Light,
        ElementKind::Dark,
    ];

    pub fn is_combat(&self) -> bool {
        !matches!(self, ElementKind::Heal | ElementKind::Shield | ElementKind::Major)
    }

    /// Index into `COMBAT`, if this is a combat element
    pub fn combat_index(&self) -> Option<usize> {
        ElementKind::COMBAT.iter().position(|e| e == self)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Wind => "Wind",
            ElementKind::Fire => "Fire",
            ElementKind::Lightning => "Lightning",
            ElementKind::Water => "Water",
            ElementKind::Earth => "Earth",
            ElementKind::Light => "Light",
            ElementKind::Dark => "Dark",
            ElementKind::Heal => "Heal",
            ElementKind::Shield => "Shield",
            ElementKind::Major => "Major",
        }
    }

    /// Single character used by the text dump of a board
    pub fn glyph(&self) -> char {
        match self {
            ElementKind::Wind => 'W',
            ElementKind::Fire => 'F',
            ElementKind::Lightning => 'L',
            ElementKind::Water => 'A',
            ElementKind::Earth => 'E',
            ElementKind::Light => 'I',
            ElementKind::Dark => 'D',
            ElementKind::Heal => 'H',
            ElementKind::Shield => 'S',
            ElementKind::Major => 'M',
        }
    }

    /// Inverse of `glyph`
    pub fn from_glyph(c: char) -> Option<Self> {
        ElementKind::ALL.iter().copied().find(|e| e.glyph() == c.to_ascii_uppercase())
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single occupied cell on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub element: ElementKind,
    pub position: Position,
}

impl Tile {
    pub fn new(element: ElementKind, position: Position) -> Self {
        Self { element, position }
    }
}

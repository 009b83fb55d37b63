//! Stage-based scaling
//!
//! Player and enemy stat curves, gold per kill, board growth and the
//! grade shown when a run ends.

use serde::{Deserialize, Serialize};

/// Run mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameMode {
    #[default]
    Normal,
    /// Unlocked by reaching stage 100 in a normal run
    Endless,
}

impl GameMode {
    pub fn name(&self) -> &'static str {
        match self {
            GameMode::Normal => "Normal",
            GameMode::Endless => "Endless",
        }
    }
}

// =============================================================================
// Stat curves
// =============================================================================

/// Player max HP at stage 1
pub const PLAYER_BASE_HP: f32 = 100.0;
/// Player attack at stage 1
pub const PLAYER_BASE_ATTACK: f32 = 10.0;
const PLAYER_HP_GROWTH: f32 = 1.03;
const PLAYER_ATTACK_GROWTH: f32 = 1.04;

/// Upper stage of the first enemy band
pub const BAND_ONE_END: u32 = 30;
/// Upper stage of the second enemy band
pub const BAND_TWO_END: u32 = 60;

/// Per-stage growth of one enemy band
#[derive(Debug, Clone, Copy)]
struct BandGrowth {
    hp: f32,
    attack: f32,
}

const BANDS: [BandGrowth; 3] = [
    BandGrowth { hp: 1.07, attack: 1.04 },
    BandGrowth { hp: 1.08, attack: 1.05 },
    BandGrowth { hp: 1.09, attack: 1.06 },
];

/// Scaling for one stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageScaling {
    /// Current stage (1-indexed)
    pub stage: u32,
}

impl StageScaling {
    pub fn new(stage: u32) -> Self {
        Self { stage: stage.max(1) }
    }

    fn steps(&self) -> i32 {
        self.stage.saturating_sub(1) as i32
    }

    /// Player max HP before relic scaling
    pub fn player_max_hp(&self) -> f32 {
        PLAYER_BASE_HP * PLAYER_HP_GROWTH.powi(self.steps())
    }

    pub fn player_attack(&self) -> f32 {
        PLAYER_BASE_ATTACK * PLAYER_ATTACK_GROWTH.powi(self.steps())
    }

    /// Enemy HP for a template's base value
    pub fn enemy_hp(&self, base_hp: f32) -> f32 {
        banded(base_hp, self.stage, |b| b.hp)
    }

    /// Enemy attack for a template's base value
    pub fn enemy_attack(&self, base_attack: f32) -> f32 {
        banded(base_attack, self.stage, |b| b.attack)
    }

    /// Base gold for a kill that advanced the run to this stage
    pub fn base_gold(&self) -> u32 {
        if self.stage <= BAND_ONE_END {
            10
        } else if self.stage <= BAND_TWO_END {
            15
        } else {
            20
        }
    }
}

/// Piecewise exponential curve. Each band starts from the value the previous
/// band reached at its boundary, so the curve is continuous.
fn banded(base: f32, stage: u32, rate: impl Fn(&BandGrowth) -> f32) -> f32 {
    let stage = stage.max(1);
    let first = rate(&BANDS[0]);
    if stage <= BAND_ONE_END {
        return base * first.powi((stage - 1) as i32);
    }

    let at_one = base * first.powi((BAND_ONE_END - 1) as i32);
    let second = rate(&BANDS[1]);
    if stage <= BAND_TWO_END {
        return at_one * second.powi((stage - BAND_ONE_END) as i32);
    }

    let at_two = at_one * second.powi((BAND_TWO_END - BAND_ONE_END) as i32);
    at_two * rate(&BANDS[2]).powi((stage - BAND_TWO_END) as i32)
}

// =============================================================================
// Board growth
// =============================================================================

/// Board size after `expansions` growth steps: 2x2, 2x3, 3x3, 3x4 ... 7x7
pub fn board_size_for(expansions: u32) -> (usize, usize) {
    let step = expansions.min(10) as usize;
    (2 + step / 2, 2 + (step + 1) / 2)
}

// =============================================================================
// Grades
// =============================================================================

/// Result grade for a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    SSS,
    SS,
    SPlus,
    S,
    APlus,
    A,
    BPlus,
    B,
    CPlus,
    C,
    DPlus,
    D,
    FPlus,
    F,
}

const NORMAL_GRADES: [(u32, Grade); 9] = [
    (100, Grade::SPlus),
    (90, Grade::APlus),
    (80, Grade::A),
    (70, Grade::BPlus),
    (60, Grade::B),
    (50, Grade::CPlus),
    (40, Grade::C),
    (30, Grade::DPlus),
    (20, Grade::D),
];

const ENDLESS_GRADES: [(u32, Grade); 12] = [
    (300, Grade::SSS),
    (250, Grade::SS),
    (200, Grade::S),
    (190, Grade::APlus),
    (180, Grade::A),
    (170, Grade::BPlus),
    (160, Grade::B),
    (150, Grade::CPlus),
    (140, Grade::C),
    (130, Grade::DPlus),
    (120, Grade::D),
    (110, Grade::FPlus),
];

impl Grade {
    /// Grade for the stage a run ended on
    pub fn for_stage(mode: GameMode, stage: u32) -> Self {
        let table: &[(u32, Grade)] = match mode {
            GameMode::Normal => &NORMAL_GRADES,
            GameMode::Endless => &ENDLESS_GRADES,
        };
        table
            .iter()
            .find(|(min, _)| stage >= *min)
            .map(|(_, g)| *g)
            .unwrap_or(Grade::F)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Grade::SSS => "SSS",
            Grade::SS => "SS",
            Grade::SPlus => "S+",
            Grade::S => "S",
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::DPlus => "D+",
            Grade::D => "D",
            Grade::FPlus => "F+",
            Grade::F => "F",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

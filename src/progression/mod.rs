//! Progression systems

pub mod majors;
pub mod relics;
pub mod scaling;

pub use majors::{MajorChoice, MajorKind, MajorProgression, MajorSlot, PassiveKind};
pub use relics::{FloorCleared, RelicKind, RelicSet};
pub use scaling::{board_size_for, GameMode, Grade, StageScaling};

//! Enemy templates for data-driven enemy creation
//!
//! These templates are loaded from RON files and used to spawn enemies.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::ElementKind;
use crate::combat::EnemyStats;

/// A template for creating enemies from external data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyTemplate {
    /// Unique template ID for reference
    pub id: String,
    /// Display name
    pub name: String,
    /// First stage it can appear on
    pub min_stage: u32,
    /// Last stage it can appear on, unbounded when `None`
    #[serde(default)]
    pub max_stage: Option<u32>,
    /// HP at stage 1
    pub base_hp: f32,
    /// Attack at stage 1
    pub base_attack: f32,
    /// Extra gold on kill
    #[serde(default)]
    pub gold_bonus: u32,
    /// Relative spawn frequency (1.0 = common, 0.1 = rare)
    pub spawn_weight: f32,
}

impl EnemyTemplate {
    pub fn allows_stage(&self, stage: u32) -> bool {
        stage >= self.min_stage && self.max_stage.map_or(true, |max| stage <= max)
    }

    /// Spawn at a stage with a random combat element
    pub fn spawn(&self, stage: u32, rng: &mut impl Rng) -> EnemyStats {
        let element = ElementKind::COMBAT[rng.gen_range(0..ElementKind::COMBAT.len())];
        EnemyStats::new(self.name.clone(), element, self.base_hp, self.base_attack, self.gold_bonus, stage)
    }
}

/// Collection of enemy templates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnemyTemplates {
    pub templates: Vec<EnemyTemplate>,
}

impl EnemyTemplates {
    /// Find a template by ID
    pub fn find(&self, id: &str) -> Option<&EnemyTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Get all enemies allowed on a stage
    pub fn for_stage(&self, stage: u32) -> Vec<&EnemyTemplate> {
        self.templates.iter().filter(|t| t.allows_stage(stage)).collect()
    }

    /// Weighted pick for a stage. Falls back to every template when none
    /// covers the stage.
    pub fn pick(&self, stage: u32, rng: &mut impl Rng) -> Option<&EnemyTemplate> {
        let mut pool = self.for_stage(stage);
        if pool.is_empty() {
            pool = self.templates.iter().collect();
        }
        let total: f32 = pool.iter().map(|t| t.spawn_weight.max(0.0)).sum();
        if total <= 0.0 {
            return pool.first().copied();
        }

        let roll = rng.gen_range(0.0..total);
        let mut cumulative = 0.0;
        for t in &pool {
            cumulative += t.spawn_weight.max(0.0);
            if roll < cumulative {
                return Some(*t);
            }
        }
        pool.last().copied()
    }
}

fn template(id: &str, name: &str, stages: (u32, Option<u32>), hp: f32, attack: f32, gold_bonus: u32, weight: f32) -> EnemyTemplate {
    EnemyTemplate {
        id: id.to_string(),
        name: name.to_string(),
        min_stage: stages.0,
        max_stage: stages.1,
        base_hp: hp,
        base_attack: attack,
        gold_bonus,
        spawn_weight: weight,
    }
}

/// Create default enemy templates (hardcoded fallback)
pub fn default_enemy_templates() -> EnemyTemplates {
    EnemyTemplates {
        templates: vec![
            // === Early stages ===
            template("slime", "Slime", (1, Some(40)), 20.0, 4.0, 0, 1.0),
            template("imp", "Imp", (1, Some(60)), 16.0, 6.0, 1, 1.0),
            template("wisp", "Wisp", (5, None), 14.0, 5.0, 2, 0.6),

            // === Mid stages ===
            template("golem", "Golem", (15, None), 34.0, 5.0, 3, 0.8),
            template("wraith", "Wraith", (25, None), 22.0, 8.0, 4, 0.7),

            // === Late stages and rares ===
            template("drake", "Drake", (45, None), 30.0, 9.0, 6, 0.5),
            template("gold_mimic", "Gold Mimic", (10, None), 18.0, 6.0, 15, 0.1),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_stage_window() {
        let templates = default_enemy_templates();
        let early: Vec<_> = templates.for_stage(1).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(early, vec!["slime", "imp"]);
        assert!(templates.for_stage(100).iter().all(|t| t.id != "slime"));
        assert!(templates.find("drake").is_some());
    }

    #[test]
    fn test_pick_respects_window() {
        let templates = default_enemy_templates();
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..200 {
            let t = templates.pick(3, &mut rng).unwrap();
            assert!(t.allows_stage(3));
        }
    }

    #[test]
    fn test_pick_falls_back() {
        let templates = EnemyTemplates {
            templates: vec![template("late", "Late", (50, None), 10.0, 1.0, 0, 1.0)],
        };
        let mut rng = StdRng::seed_from_u64(8);
        assert_eq!(templates.pick(1, &mut rng).map(|t| t.id.as_str()), Some("late"));
        assert!(EnemyTemplates::default().pick(1, &mut rng).is_none());
    }

    #[test]
    fn test_spawn_scales() {
        let mut rng = StdRng::seed_from_u64(1);
        let templates = default_enemy_templates();
        let slime = &templates.templates[0];
        let enemy = slime.spawn(1, &mut rng);
        assert_eq!(enemy.stats.max_hp, 20.0);
        assert!(enemy.element.is_combat());
        assert!(slime.spawn(10, &mut rng).stats.max_hp > 20.0);
    }
}

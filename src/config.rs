use std::env;
use std::fmt;

use macroquad::prelude::*;

use crate::generator::LevelParams;
use crate::model::{ColorValue, DEFAULT_WATER_COLORS};

pub const SEED_ENV: &str = "WATER_SORT_SEED";
pub const DIFFICULTY_ENV: &str = "WATER_SORT_DIFFICULTY";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}
impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// 0 is easy, 1 is medium, anything else is hard.
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Difficulty::Easy,
            1 => Difficulty::Medium,
            _ => Difficulty::Hard,
        }
    }

    pub fn get_label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        if let Ok(index) = value.parse::<usize>() {
            return Some(Self::from_index(index));
        }
        match value.as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Colored bottle count and shuffle moves for this difficulty.
    pub fn scale(&self, max_colors: usize, max_shuffle_moves: usize) -> (usize, usize) {
        match self {
            Difficulty::Easy => (max_colors / 3, max_shuffle_moves / 3),
            Difficulty::Medium => (max_colors / 2, max_shuffle_moves / 2),
            Difficulty::Hard => (max_colors, max_shuffle_moves),
        }
    }
}
impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.get_label())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    pub bottle_capacity: usize,
    pub empty_bottle_count: usize,
    pub max_shuffle_moves: usize,
    pub colors: Vec<(usize, ColorValue)>,
    pub difficulty: Difficulty,
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            bottle_capacity: 4,
            empty_bottle_count: 2,
            max_shuffle_moves: 1000,
            colors: DEFAULT_WATER_COLORS.to_vec(),
            difficulty: Difficulty::Hard,
            seed: None,
        }
    }
}

impl GameConfig {
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Applies overrides looked up by environment variable name. Values that
    /// don't parse are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup(SEED_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(seed) => self.seed = Some(seed),
                Err(err) => warn!("Ignoring {}={:?}: {}", SEED_ENV, raw, err),
            }
        }
        if let Some(raw) = lookup(DIFFICULTY_ENV) {
            match Difficulty::parse(&raw) {
                Some(difficulty) => self.difficulty = difficulty,
                None => warn!("Ignoring {}={:?}: expected easy, medium, hard or an index", DIFFICULTY_ENV, raw),
            }
        }
        self
    }

    pub fn max_colors(&self) -> usize {
        self.colors.len()
    }

    pub fn level_params(&self, difficulty: Difficulty) -> LevelParams {
        let (color_count, shuffle_moves) = difficulty.scale(self.max_colors(), self.max_shuffle_moves);
        LevelParams {
            empty_count: self.empty_bottle_count,
            color_count,
            bottle_capacity: self.bottle_capacity,
            shuffle_moves,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_index_mapping() {
        assert_eq!(Difficulty::from_index(0), Difficulty::Easy);
        assert_eq!(Difficulty::from_index(1), Difficulty::Medium);
        assert_eq!(Difficulty::from_index(2), Difficulty::Hard);
        assert_eq!(Difficulty::from_index(9), Difficulty::Hard);
    }

    #[test]
    fn difficulty_parses_names_and_indices() {
        assert_eq!(Difficulty::parse(" EASY "), Some(Difficulty::Easy));
        assert_eq!(Difficulty::parse("1"), Some(Difficulty::Medium));
        assert_eq!(Difficulty::parse("7"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::parse("-1"), None);
        assert_eq!(Difficulty::parse("impossible"), None);
    }

    #[test]
    fn difficulty_scaling_truncates() {
        assert_eq!(Difficulty::Easy.scale(8, 1000), (2, 333));
        assert_eq!(Difficulty::Medium.scale(8, 1000), (4, 500));
        assert_eq!(Difficulty::Hard.scale(8, 1000), (8, 1000));
        assert_eq!(Difficulty::Medium.scale(7, 5), (3, 2));
    }

    #[test]
    fn level_params_follow_config() {
        let config = GameConfig::default();
        let params = config.level_params(Difficulty::Easy);
        assert_eq!(params.empty_count, 2);
        assert_eq!(params.bottle_capacity, 4);
        assert_eq!(params.color_count, 2);
        assert_eq!(params.shuffle_moves, 333);
    }

    #[test]
    fn overrides_apply_and_bad_values_are_ignored() {
        let config = GameConfig::default().with_overrides(|key| match key {
            SEED_ENV => Some("42".to_string()),
            DIFFICULTY_ENV => Some("Medium".to_string()),
            _ => None,
        });
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.difficulty, Difficulty::Medium);

        let config = GameConfig::default().with_overrides(|key| match key {
            SEED_ENV => Some("not-a-number".to_string()),
            DIFFICULTY_ENV => Some("impossible".to_string()),
            _ => None,
        });
        assert_eq!(config, GameConfig::default());
    }
}

use macroquad::prelude::{debug, warn};
use rand::Rng;
use thiserror::Error;

use crate::model::{Bottle, ColorValue, LiquidSegment, total_liquid};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LevelParams {
    pub empty_count: usize,
    pub color_count: usize,
    pub bottle_capacity: usize,
    pub shuffle_moves: usize,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Bottle capacity must be at least 1")]
    ZeroCapacity,

    #[error("Level asks for {requested} colors but only {available} are defined")]
    NotEnoughColors { requested: usize, available: usize },

    #[error("Shuffling needs at least two bottles, level has {bottles}")]
    TooFewBottles { bottles: usize },
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ShuffleSummary {
    pub accepted: usize,
    pub rejected: usize,
}

impl LevelParams {
    pub fn bottle_count(&self) -> usize {
        self.empty_count + self.color_count
    }

    pub fn validate(&self, colors: &[(usize, ColorValue)]) -> Result<(), GenerationError> {
        if self.bottle_capacity == 0 {
            return Err(GenerationError::ZeroCapacity);
        }
        if self.color_count > colors.len() {
            return Err(GenerationError::NotEnoughColors {
                requested: self.color_count,
                available: colors.len(),
            });
        }
        if self.shuffle_moves > 0 && self.bottle_count() < 2 {
            return Err(GenerationError::TooFewBottles {
                bottles: self.bottle_count(),
            });
        }
        Ok(())
    }
}

/// Builds, shuffles and tops off a new level.
pub fn generate_level(
    params: &LevelParams,
    colors: &[(usize, ColorValue)],
    rng: &mut impl Rng,
) -> Result<Vec<Bottle>, GenerationError> {
    params.validate(colors)?;

    let mut bottles = init_bottles(
        params.empty_count,
        params.color_count,
        params.bottle_capacity,
        colors,
    );
    let summary = shuffle_bottles(&mut bottles, params.shuffle_moves, rng);
    debug!(
        "Shuffled {} bottles: {} moves accepted, {} attempts rejected",
        bottles.len(),
        summary.accepted,
        summary.rejected
    );
    let topped_off = top_off_bottles(&mut bottles);
    debug!("Top-off moved {} units, {} units in play", topped_off, total_liquid(&bottles));
    Ok(bottles)
}

/// One full bottle per color (first `color_count` colors), followed by
/// `empty_count` empty bottles.
pub fn init_bottles(
    empty_count: usize,
    color_count: usize,
    bottle_capacity: usize,
    colors: &[(usize, ColorValue)],
) -> Vec<Bottle> {
    let mut bottles: Vec<Bottle> = colors
        .iter()
        .take(color_count)
        .map(|&(color_id, color)| {
            let segment = LiquidSegment::new(color_id, bottle_capacity, color);
            Bottle::with_contents(bottle_capacity, vec![segment])
        })
        .collect();
    bottles.extend((0..empty_count).map(|_| Bottle::new(bottle_capacity)));
    bottles
}

/// Pops `amount` off the top of one bottle and pushes it onto another,
/// regardless of color. Puts the liquid back if it doesn't fit.
pub fn shuffle_move_water(bottles: &mut [Bottle], from_index: usize, to_index: usize, amount: usize) -> bool {
    let Some((from, to)) = crate::model::pair_mut(bottles, from_index, to_index) else {
        return false;
    };
    let Some(water) = from.pop_segment(Some(amount)) else {
        return false;
    };
    match to.push_segment(water) {
        Ok(()) => true,
        Err(water) => {
            from.return_segment(water);
            false
        }
    }
}

/// With two or more bottles, any liquid plus any free room means some bottle can pour.
fn has_shuffle_move(bottles: &[Bottle]) -> bool {
    bottles.len() >= 2
        && bottles.iter().any(|b| !b.is_empty())
        && bottles.iter().any(|b| b.get_remaining_capacity() > 0)
}

/// Makes `move_count` random moves, each taking a random part of a top
/// segment. Attempts that can't move anything are retried and don't count.
pub fn shuffle_bottles(bottles: &mut [Bottle], move_count: usize, rng: &mut impl Rng) -> ShuffleSummary {
    let mut summary = ShuffleSummary::default();
    if move_count == 0 {
        return summary;
    }
    if !has_shuffle_move(bottles) {
        warn!("No shuffle move is possible, leaving bottles as they are");
        return summary;
    }

    while summary.accepted < move_count {
        let from_index = rng.random_range(0..bottles.len());
        let to_index = rng.random_range(0..bottles.len());
        if from_index == to_index {
            summary.rejected += 1;
            continue;
        }
        let Some(top) = bottles[from_index].get_top_segment() else {
            summary.rejected += 1;
            continue;
        };
        let max_amount = bottles[to_index].get_remaining_capacity().min(top.get_amount());
        if max_amount == 0 {
            summary.rejected += 1;
            continue;
        }
        let amount = rng.random_range(1..=max_amount);
        if shuffle_move_water(bottles, from_index, to_index, amount) {
            summary.accepted += 1;
        } else {
            summary.rejected += 1;
        }
    }
    summary
}

/// Index of the partly filled bottle with the most room left. Earlier bottles win ties.
pub fn find_largest_bottle_cap(bottles: &[Bottle]) -> Option<usize> {
    let mut largest: Option<(usize, usize)> = None;
    for (index, bottle) in bottles.iter().enumerate() {
        let cap = bottle.get_remaining_capacity();
        if bottle.is_empty() || cap == 0 {
            continue;
        }
        if largest.is_none_or(|(_, largest_cap)| cap > largest_cap) {
            largest = Some((index, cap));
        }
    }
    largest.map(|(index, _)| index)
}

/// Index of the partly filled bottle with the least room left. Later bottles win ties.
pub fn find_smallest_bottle_cap(bottles: &[Bottle]) -> Option<usize> {
    let mut smallest: Option<(usize, usize)> = None;
    for (index, bottle) in bottles.iter().enumerate() {
        let cap = bottle.get_remaining_capacity();
        if bottle.is_empty() || cap == 0 {
            continue;
        }
        if smallest.is_none_or(|(_, smallest_cap)| smallest_cap >= cap) {
            smallest = Some((index, cap));
        }
    }
    smallest.map(|(index, _)| index)
}

/// Moves single units from the emptiest partly filled bottle to the fullest
/// one until at most one partly filled bottle is left. Returns the number of
/// units moved.
pub fn top_off_bottles(bottles: &mut [Bottle]) -> usize {
    let mut moved = 0;
    loop {
        let (Some(largest), Some(smallest)) = (find_largest_bottle_cap(bottles), find_smallest_bottle_cap(bottles))
        else {
            break;
        };
        let Some((from, to)) = crate::model::pair_mut(bottles, largest, smallest) else {
            break;
        };
        let Some(water) = from.pop_segment(Some(1)) else {
            break;
        };
        if let Err(water) = to.push_segment(water) {
            from.return_segment(water);
            break;
        }
        moved += 1;
    }
    moved
}

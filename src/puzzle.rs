use rand::Rng;

use crate::generator::{GenerationError, LevelParams, generate_level};
use crate::model::{Bottle, ColorValue, move_liquid, pair_mut};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    None,
    Bottle(usize),
}

/// What a call to [`PuzzleEngine::select_bottle`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    Deselected,
    Selected(usize),
    Poured { from: usize, to: usize },
    Rejected { from: usize, to: usize },
}

/// Live puzzle state: the bottles, the restart baseline, move history and
/// the currently selected pour source.
#[derive(Debug, Clone)]
pub struct PuzzleEngine {
    bottles: Vec<Bottle>,
    initial_bottles: Vec<Bottle>,
    history: Vec<Vec<Bottle>>,
    redo_stack: Vec<Vec<Bottle>>,
    selected: Selection,
}

impl Default for PuzzleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PuzzleEngine {
    pub fn new() -> Self {
        Self {
            bottles: Vec::new(),
            initial_bottles: Vec::new(),
            history: Vec::new(),
            redo_stack: Vec::new(),
            selected: Selection::None,
        }
    }

    #[cfg(test)]
    pub fn from_bottles(bottles: Vec<Bottle>) -> Self {
        let mut engine = Self::new();
        engine.load_bottles(bottles);
        engine
    }

    /// Generates a fresh level. On error the current level stays as it was.
    pub fn new_level(
        &mut self,
        params: &LevelParams,
        colors: &[(usize, ColorValue)],
        rng: &mut impl Rng,
    ) -> Result<(), GenerationError> {
        let bottles = generate_level(params, colors, rng)?;
        self.load_bottles(bottles);
        Ok(())
    }

    /// Installs `bottles` as both the starting and the current configuration.
    pub fn load_bottles(&mut self, bottles: Vec<Bottle>) {
        self.bottles = bottles.clone();
        self.initial_bottles = bottles;
        self.history.clear();
        self.redo_stack.clear();
        self.selected = Selection::None;
    }

    pub fn select_bottle(&mut self, index: Option<usize>) -> SelectOutcome {
        let index = index.filter(|&i| i < self.bottles.len());
        match (self.selected, index) {
            (_, None) => {
                self.selected = Selection::None;
                SelectOutcome::Deselected
            }
            (Selection::Bottle(from), Some(to)) if from == to => {
                self.selected = Selection::None;
                SelectOutcome::Deselected
            }
            (Selection::None, Some(index)) => {
                self.selected = Selection::Bottle(index);
                SelectOutcome::Selected(index)
            }
            (Selection::Bottle(from), Some(to)) => {
                self.selected = Selection::None;
                if self.pour(from, to) {
                    SelectOutcome::Poured { from, to }
                } else {
                    SelectOutcome::Rejected { from, to }
                }
            }
        }
    }

    fn pour(&mut self, from: usize, to: usize) -> bool {
        let snapshot = self.snapshot();
        let Some((from_bottle, to_bottle)) = pair_mut(&mut self.bottles, from, to) else {
            return false;
        };
        if !move_liquid(from_bottle, to_bottle) {
            return false;
        }
        self.history.push(snapshot);
        self.redo_stack.clear();
        true
    }

    /// Every bottle is either empty or full of a single color.
    pub fn is_solved(&self) -> bool {
        self.bottles.iter().all(|b| b.is_empty() || b.is_sorted())
    }

    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.history.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.bottles, previous);
        self.redo_stack.push(current);
        self.selected = Selection::None;
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.bottles, next);
        self.history.push(current);
        self.selected = Selection::None;
        true
    }

    pub fn restart(&mut self) {
        self.bottles = self.initial_bottles.clone();
        self.history.clear();
        self.redo_stack.clear();
        self.selected = Selection::None;
    }

    pub fn get_bottles(&self) -> &[Bottle] {
        &self.bottles
    }

    /// Deep copy of the current bottles.
    pub fn snapshot(&self) -> Vec<Bottle> {
        self.bottles.clone()
    }

    pub fn get_selected(&self) -> Option<usize> {
        match self.selected {
            Selection::Bottle(index) => Some(index),
            Selection::None => None,
        }
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// One line per bottle, e.g. `|11|2_`.
    pub fn get_text_representation(&self) -> String {
        self.bottles
            .iter()
            .map(Bottle::get_text_representation)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DEFAULT_WATER_COLORS, LiquidSegment, total_liquid};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn seg(color_id: usize, amount: usize) -> LiquidSegment {
        LiquidSegment::new(color_id, amount, (10, 20, 30))
    }

    fn layout(bottles: &[Bottle]) -> Vec<Vec<(usize, usize)>> {
        bottles
            .iter()
            .map(|b| {
                b.get_segments()
                    .iter()
                    .map(|s| (s.get_color_id(), s.get_amount()))
                    .collect()
            })
            .collect()
    }

    /// [1,2 | 1 | empty], capacity 3.
    fn small_puzzle() -> PuzzleEngine {
        PuzzleEngine::from_bottles(vec![
            Bottle::with_contents(3, vec![seg(1, 1), seg(2, 2)]),
            Bottle::with_contents(3, vec![seg(1, 2)]),
            Bottle::new(3),
        ])
    }

    #[test]
    fn solved_detection() {
        let solved = PuzzleEngine::from_bottles(vec![
            Bottle::with_contents(4, vec![seg(1, 4)]),
            Bottle::new(4),
        ]);
        assert!(solved.is_solved());

        let mixed = PuzzleEngine::from_bottles(vec![
            Bottle::with_contents(4, vec![seg(1, 2), seg(2, 2)]),
            Bottle::new(4),
        ]);
        assert!(!mixed.is_solved());

        let partial = PuzzleEngine::from_bottles(vec![
            Bottle::with_contents(4, vec![seg(1, 3)]),
            Bottle::with_contents(4, vec![seg(1, 1)]),
        ]);
        assert!(!partial.is_solved());
    }

    #[test]
    fn selection_state_machine() {
        let mut puzzle = small_puzzle();
        assert_eq!(puzzle.select_bottle(Some(0)), SelectOutcome::Selected(0));
        assert_eq!(puzzle.get_selected(), Some(0));
        assert_eq!(puzzle.select_bottle(Some(0)), SelectOutcome::Deselected);
        assert_eq!(puzzle.get_selected(), None);

        puzzle.select_bottle(Some(1));
        assert_eq!(puzzle.select_bottle(None), SelectOutcome::Deselected);
        assert_eq!(puzzle.get_selected(), None);

        puzzle.select_bottle(Some(1));
        assert_eq!(puzzle.select_bottle(Some(99)), SelectOutcome::Deselected);
        assert_eq!(puzzle.history_len(), 0);
    }

    #[test]
    fn deselect_never_touches_bottles() {
        let mut puzzle = small_puzzle();
        let before = layout(puzzle.get_bottles());
        puzzle.select_bottle(None);
        puzzle.select_bottle(Some(2));
        puzzle.select_bottle(None);
        assert_eq!(layout(puzzle.get_bottles()), before);
        assert_eq!(puzzle.get_selected(), None);
    }

    #[test]
    fn successful_pour_records_history() {
        let mut puzzle = small_puzzle();
        puzzle.select_bottle(Some(0));
        assert_eq!(puzzle.select_bottle(Some(2)), SelectOutcome::Poured { from: 0, to: 2 });
        assert_eq!(puzzle.get_selected(), None);
        assert_eq!(puzzle.history_len(), 1);
        assert_eq!(
            layout(puzzle.get_bottles()),
            vec![vec![(1, 1)], vec![(1, 2)], vec![(2, 2)]]
        );
    }

    #[test]
    fn rejected_pour_only_deselects() {
        let mut puzzle = small_puzzle();
        let before = layout(puzzle.get_bottles());
        puzzle.select_bottle(Some(1));
        assert_eq!(puzzle.select_bottle(Some(0)), SelectOutcome::Rejected { from: 1, to: 0 });
        assert_eq!(puzzle.get_selected(), None);
        assert_eq!(puzzle.history_len(), 0);
        assert_eq!(layout(puzzle.get_bottles()), before);
    }

    #[test]
    fn undo_round_trip() {
        let mut puzzle = small_puzzle();
        let start = layout(puzzle.get_bottles());
        assert!(!puzzle.undo());

        puzzle.select_bottle(Some(0));
        puzzle.select_bottle(Some(2));
        let after_move = layout(puzzle.get_bottles());
        puzzle.select_bottle(Some(1));
        assert!(puzzle.undo());
        assert_eq!(layout(puzzle.get_bottles()), start);
        assert_eq!(puzzle.history_len(), 0);
        assert_eq!(puzzle.get_selected(), None);

        assert!(puzzle.redo());
        assert_eq!(layout(puzzle.get_bottles()), after_move);
        assert_eq!(puzzle.history_len(), 1);
        assert!(!puzzle.redo());
    }

    #[test]
    fn new_pour_clears_redo() {
        let mut puzzle = small_puzzle();
        puzzle.select_bottle(Some(0));
        puzzle.select_bottle(Some(2));
        puzzle.undo();
        assert!(puzzle.can_redo());
        puzzle.select_bottle(Some(1));
        puzzle.select_bottle(Some(2));
        assert!(!puzzle.can_redo());
    }

    #[test]
    fn restart_restores_initial_bottles() {
        let mut puzzle = small_puzzle();
        let start = layout(puzzle.get_bottles());
        puzzle.select_bottle(Some(0));
        puzzle.select_bottle(Some(2));
        puzzle.select_bottle(Some(0));
        puzzle.select_bottle(Some(1));
        assert_eq!(puzzle.history_len(), 2);
        puzzle.select_bottle(Some(1));

        puzzle.restart();
        assert_eq!(layout(puzzle.get_bottles()), start);
        assert_eq!(puzzle.history_len(), 0);
        assert!(!puzzle.can_redo());
        assert_eq!(puzzle.get_selected(), None);
    }

    #[test]
    fn snapshot_is_independent() {
        let mut puzzle = small_puzzle();
        let snapshot = puzzle.snapshot();
        puzzle.select_bottle(Some(0));
        puzzle.select_bottle(Some(2));
        assert!(snapshot[2].is_empty());
        assert!(!puzzle.get_bottles()[2].is_empty());
    }

    #[test]
    fn new_level_replaces_state_and_keeps_it_on_error() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut puzzle = small_puzzle();
        puzzle.select_bottle(Some(0));
        puzzle.select_bottle(Some(2));

        let params = LevelParams {
            empty_count: 2,
            color_count: 4,
            bottle_capacity: 4,
            shuffle_moves: 100,
        };
        puzzle.new_level(&params, &DEFAULT_WATER_COLORS, &mut rng).unwrap();
        assert_eq!(puzzle.get_bottles().len(), 6);
        assert_eq!(puzzle.history_len(), 0);
        assert_eq!(total_liquid(puzzle.get_bottles()), 16);

        let generated = layout(puzzle.get_bottles());
        let bad = LevelParams {
            color_count: 20,
            ..params
        };
        assert!(puzzle.new_level(&bad, &DEFAULT_WATER_COLORS, &mut rng).is_err());
        assert_eq!(layout(puzzle.get_bottles()), generated);

        puzzle.restart();
        assert_eq!(layout(puzzle.get_bottles()), generated);
    }

    #[test]
    fn text_representation_lists_bottles() {
        assert_eq!(small_puzzle().get_text_representation(), "|1|22\n|11_\n___");
    }

    proptest! {
        #[test]
        fn liquid_is_conserved_through_play(
            seed in any::<u64>(),
            clicks in prop::collection::vec(prop::option::of(0usize..7), 0..60),
            undo_every in 2usize..6,
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let params = LevelParams {
                empty_count: 2,
                color_count: 4,
                bottle_capacity: 4,
                shuffle_moves: 50,
            };
            let mut puzzle = PuzzleEngine::new();
            puzzle.new_level(&params, &DEFAULT_WATER_COLORS, &mut rng).unwrap();
            let total = total_liquid(puzzle.get_bottles());

            for (i, click) in clicks.into_iter().enumerate() {
                puzzle.select_bottle(click);
                if i % undo_every == 0 {
                    puzzle.undo();
                }
                prop_assert_eq!(total_liquid(puzzle.get_bottles()), total);
                for bottle in puzzle.get_bottles() {
                    prop_assert!(bottle.get_filled_amount() <= bottle.get_capacity());
                    for pair in bottle.get_segments().windows(2) {
                        prop_assert_ne!(&pair[0], &pair[1]);
                    }
                }
            }
            while puzzle.undo() {}
            puzzle.restart();
            prop_assert_eq!(total_liquid(puzzle.get_bottles()), total);
        }
    }
}

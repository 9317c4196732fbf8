use clipboard_rs::{Clipboard, ClipboardContext};
use macroquad::prelude::{KeyCode, debug, error, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::{Difficulty, GameConfig};
use crate::model::*;
use crate::puzzle::{PuzzleEngine, SelectOutcome};
use crate::renderer::Renderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Playing,
}

pub struct GameEngine {
    config: GameConfig,
    difficulty: Difficulty,
    puzzle: PuzzleEngine,
    rng: StdRng,
    buttons: Vec<Button>,
    renderer: Renderer,
    screen: Screen,
}

impl GameEngine {
    pub fn new(config: GameConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let buttons = vec![
            Button::new("Menu", ControlAction::OpenMenu, to_macroquad_color(DEFAULT_WATER_COLORS[6].1)),
            Button::new("Undo", ControlAction::Undo, to_macroquad_color(DEFAULT_WATER_COLORS[2].1)),
            Button::new("Redo", ControlAction::Redo, to_macroquad_color(DEFAULT_WATER_COLORS[7].1)),
            Button::new("Restart", ControlAction::Restart, to_macroquad_color(DEFAULT_WATER_COLORS[0].1)),
            Button::new("New", ControlAction::NewLevel, to_macroquad_color(DEFAULT_WATER_COLORS[1].1)),
            Button::new("Copy", ControlAction::CopyState, to_macroquad_color(DEFAULT_WATER_COLORS[5].1)),
        ];

        Self {
            difficulty: config.difficulty,
            config,
            puzzle: PuzzleEngine::new(),
            rng,
            buttons,
            renderer: Renderer::new(),
            screen: Screen::Menu,
        }
    }

    #[cfg(test)]
    pub fn get_screen(&self) -> Screen {
        self.screen
    }

    #[cfg(test)]
    pub fn get_difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[cfg(test)]
    pub fn get_puzzle(&self) -> &PuzzleEngine {
        &self.puzzle
    }

    pub fn render(&mut self) {
        self.renderer.autoset_viewport();
        match self.screen {
            Screen::Menu => self.renderer.render_menu("Water Sort Puzzle", &Difficulty::ALL),
            Screen::Playing => {
                let buttons = self
                    .buttons
                    .iter()
                    .map(|button| (button, self.is_action_available(button.get_action())))
                    .collect::<Vec<_>>();
                self.renderer.render_game(
                    self.puzzle.get_bottles(),
                    self.puzzle.get_selected(),
                    &buttons,
                );
            }
        }
    }

    fn is_action_available(&self, action: ControlAction) -> bool {
        match action {
            ControlAction::Undo => self.puzzle.can_undo(),
            ControlAction::Redo => self.puzzle.can_redo(),
            _ => true,
        }
    }

    pub fn handle_click(&mut self, x: f32, y: f32) {
        let item = self
            .renderer
            .get_hit_test_registry()
            .hit_test(x, y)
            .map(|hit| hit.item);
        self.handle_hit_item(item);
    }

    fn handle_hit_item(&mut self, item: Option<HitItem>) {
        let action = match (self.screen, item) {
            (Screen::Menu, Some(HitItem::MenuItem { difficulty })) => ControlAction::ChooseDifficulty(difficulty),
            (Screen::Menu, _) => return,
            (Screen::Playing, Some(HitItem::Button { action })) => action,
            (Screen::Playing, Some(HitItem::Bottle { index })) => ControlAction::SelectBottle(index),
            (Screen::Playing, _) => ControlAction::Deselect,
        };
        self.handle_game_action(action);
    }

    pub fn handle_key(&mut self, key: KeyCode) {
        let action = match key {
            KeyCode::R => ControlAction::Restart,
            KeyCode::Right => ControlAction::NewLevel,
            KeyCode::Left => ControlAction::Undo,
            KeyCode::Up => ControlAction::Redo,
            KeyCode::Escape => ControlAction::OpenMenu,
            KeyCode::C => ControlAction::CopyState,
            _ => return,
        };
        if self.screen == Screen::Playing {
            self.handle_game_action(action);
        }
    }

    pub fn handle_game_action(&mut self, action: ControlAction) {
        match action {
            ControlAction::SelectBottle(index) => {
                match self.puzzle.select_bottle(Some(index)) {
                    SelectOutcome::Poured { from, to } => {
                        debug!("Poured bottle {} into {} (move {})", from, to, self.puzzle.history_len())
                    }
                    SelectOutcome::Rejected { from, to } => debug!("Can't pour bottle {} into {}", from, to),
                    SelectOutcome::Selected(_) | SelectOutcome::Deselected => {}
                }
            }
            ControlAction::Deselect => {
                self.puzzle.select_bottle(None);
            }
            ControlAction::Restart => {
                self.puzzle.restart();
            }
            ControlAction::NewLevel => {
                self.new_level();
            }
            ControlAction::Undo => {
                self.puzzle.undo();
            }
            ControlAction::Redo => {
                self.puzzle.redo();
            }
            ControlAction::OpenMenu => {
                self.screen = Screen::Menu;
            }
            ControlAction::ChooseDifficulty(difficulty) => {
                self.screen = Screen::Playing;
                if difficulty != self.difficulty || self.puzzle.get_bottles().is_empty() {
                    info!("Difficulty set to {}", difficulty);
                    self.difficulty = difficulty;
                    self.new_level();
                }
            }
            ControlAction::CopyState => {
                let repr = self.puzzle.get_text_representation();
                self.set_clipboard(&repr);
            }
        }
    }

    /// Starts a new level once the current one is solved. Returns whether it did.
    pub fn advance_if_solved(&mut self) -> bool {
        let puzzle = &self.puzzle;
        if self.screen != Screen::Playing || puzzle.get_bottles().is_empty() || !puzzle.is_solved() {
            return false;
        }
        info!("Puzzle solved");
        self.new_level();
        true
    }

    fn new_level(&mut self) {
        let params = self.config.level_params(self.difficulty);
        match self.puzzle.new_level(&params, &self.config.colors, &mut self.rng) {
            Ok(()) => {
                info!(
                    "New {} level: {} colors, {} shuffle moves",
                    self.difficulty, params.color_count, params.shuffle_moves
                );
                debug!("\n{}", self.puzzle.get_text_representation());
            }
            Err(err) => error!("Could not generate a level: {}", err),
        }
    }

    fn set_clipboard(&self, content: &str) {
        let result = ClipboardContext::new().and_then(|ctx| ctx.set_text(content.to_string()));
        if let Err(err) = result {
            warn!("Could not copy the puzzle to the clipboard: {}", err);
        }
    }
}

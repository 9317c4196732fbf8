mod config;
mod gameplay;
mod generator;
mod model;
mod puzzle;
mod renderer;

use crate::config::GameConfig;
use crate::gameplay::*;

use macroquad::prelude::*;

const COMMAND_KEYS: [KeyCode; 6] = [
    KeyCode::R,
    KeyCode::Right,
    KeyCode::Left,
    KeyCode::Up,
    KeyCode::Escape,
    KeyCode::C,
];

fn window_conf() -> Conf {
    Conf {
        window_title: "Water Sort Puzzle".to_string(),
        window_width: 1280,
        window_height: 720,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let mut engine = GameEngine::new(GameConfig::from_env());
    loop {
        if is_mouse_button_pressed(MouseButton::Left) {
            let (x, y) = mouse_position();
            engine.handle_click(x, y);
        }
        for key in COMMAND_KEYS {
            if is_key_pressed(key) {
                engine.handle_key(key);
            }
        }
        engine.advance_if_solved();
        engine.render();
        next_frame().await;
    }
}

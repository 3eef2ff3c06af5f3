//! WASM bindings for twenty48-core
//!
//! Provides a JavaScript-friendly API for the engine. The browser supplies
//! the seed so the crate never needs an OS random source on wasm32.

use rand::rngs::StdRng;
use wasm_bindgen::prelude::*;

use crate::{Direction, Game, GameConfig};

/// WASM-friendly wrapper around Game
#[wasm_bindgen]
pub struct WasmGame {
    inner: Game<StdRng>,
}

#[wasm_bindgen]
impl WasmGame {
    /// Create a game and deal the two starting tiles
    #[wasm_bindgen(constructor)]
    pub fn new(
        height: usize,
        width: usize,
        win_value: u32,
        seed: u64,
    ) -> Result<WasmGame, JsError> {
        let config = GameConfig {
            height,
            width,
            win_value,
        };
        let inner = Game::seeded(config, seed)?;
        Ok(WasmGame { inner })
    }

    /// Start a new session, keeping the high score
    pub fn reset(&mut self) {
        self.inner.reset();
    }

    /// Slide in a direction ("up", "left", "down", "right").
    /// Returns true if the grid changed.
    #[wasm_bindgen(js_name = makeMove)]
    pub fn make_move(&mut self, direction: &str) -> Result<bool, JsError> {
        let direction: Direction = direction.parse()?;
        Ok(self.inner.make_move(direction))
    }

    /// Check if a direction would change the grid
    #[wasm_bindgen(js_name = canMove)]
    pub fn can_move(&self, direction: &str) -> Result<bool, JsError> {
        let direction: Direction = direction.parse()?;
        Ok(self.inner.can_move(direction))
    }

    #[wasm_bindgen(js_name = isGameOver)]
    pub fn is_game_over(&self) -> bool {
        self.inner.is_game_over()
    }

    #[wasm_bindgen(js_name = isWin)]
    pub fn is_win(&self) -> bool {
        self.inner.is_win()
    }

    /// Get game status: "ongoing", "won" or "lost"
    pub fn status(&self) -> String {
        self.inner.status().as_str().to_string()
    }

    pub fn score(&self) -> u64 {
        self.inner.score()
    }

    #[wasm_bindgen(js_name = highScore)]
    pub fn high_score(&self) -> u64 {
        self.inner.high_score()
    }

    #[wasm_bindgen(js_name = winValue)]
    pub fn win_value(&self) -> u32 {
        self.inner.win_value()
    }

    pub fn height(&self) -> usize {
        self.inner.grid().height()
    }

    pub fn width(&self) -> usize {
        self.inner.grid().width()
    }

    /// Cell values, row-major
    pub fn cells(&self) -> Vec<u32> {
        self.inner.grid().cells().to_vec()
    }

    /// Full state as { grid, score, high_score, win_value, status }
    pub fn snapshot(&self) -> Result<JsValue, JsError> {
        Ok(serde_wasm_bindgen::to_value(&self.inner.snapshot())?)
    }

    /// Plain-text rendering of the grid
    pub fn render(&self) -> String {
        self.inner.to_string()
    }
}

//! 2048 sliding-tile puzzle engine.
//!
//! # Grid Layout
//!
//! ```text
//! height × width cells, row-major, default 4×4:
//!
//!   (0,0) (0,1) (0,2) (0,3)
//!   (1,0) (1,1) (1,2) (1,3)
//!   (2,0) (2,1) (2,2) (2,3)
//!   (3,0) (3,1) (3,2) (3,3)
//!
//! Each cell holds a tile value: 0 = empty, otherwise 2, 4, 8, ...
//! ```
//!
//! # Direction Reduction
//!
//! Only one slide is implemented: collapsing each row towards index 0
//! (`Left`). The other directions are expressed through two lossless
//! transforms, `transpose` (swap rows and columns) and `invert` (reverse
//! each row):
//!
//! ```text
//! Left  = collapse rows
//! Right = invert ∘ Left ∘ invert
//! Up    = transpose ∘ Left ∘ transpose
//! Down  = transpose ∘ Right ∘ transpose
//! ```
//!
//! Move legality uses the same reduction over `line_is_movable`.
//!
//! # Spawn Rule
//!
//! ```text
//! roll = uniform [0, 100)
//! value = 4 if roll > 89 else 2      (10% fours)
//! cell  = uniform among empty cells
//! ```

use std::fmt;
use std::str::FromStr;

use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[cfg(feature = "wasm")]
pub mod wasm;

/// Value of a single cell (0 = empty).
pub type Tile = u32;

/// Running score.
pub type Score = u64;

/// Default grid height.
pub const DEFAULT_HEIGHT: usize = 4;
/// Default grid width.
pub const DEFAULT_WIDTH: usize = 4;
/// Default winning tile.
pub const DEFAULT_WIN_VALUE: Tile = 2048;
/// Largest tile a [`Tile`] can hold. Two of these never merge.
pub const MAX_TILE: Tile = 1 << (Tile::BITS - 1);

/// Spawn roll range is `[0, SPAWN_ROLL)`.
const SPAWN_ROLL: u32 = 100;
/// Rolls strictly above this spawn a 4.
const FOUR_THRESHOLD: u32 = 89;

// ============================================================================
// ERRORS
// ============================================================================

/// Invalid engine configuration. Returned only at construction time.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("a {height}x{width} grid cannot hold the two starting tiles")]
    TooSmall { height: usize, width: usize },
    #[error("win value {0} must be greater than 2")]
    WinValueTooLow(Tile),
    #[error("grid is {found_height}x{found_width}, config expects {height}x{width}")]
    DimensionMismatch {
        height: usize,
        width: usize,
        found_height: usize,
        found_width: usize,
    },
}

/// Malformed grid input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("grid has no cells")]
    Empty,
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("tile {value} at ({row}, {col}) is not 0 or a power of two >= 2")]
    InvalidTile { row: usize, col: usize, value: Tile },
}

/// Unknown direction name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown direction {0:?} (expected up, left, down or right)")]
pub struct ParseDirectionError(pub String);

// ============================================================================
// DIRECTION
// ============================================================================

/// A direction to slide tiles.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Left,
    Down,
    Right,
}

impl Direction {
    /// All four directions, in the order up, left, down, right.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Left,
        Direction::Down,
        Direction::Right,
    ];

    /// Lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Left => "left",
            Direction::Down => "down",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "left" => Ok(Direction::Left),
            "down" => Ok(Direction::Down),
            "right" => Ok(Direction::Right),
            _ => Err(ParseDirectionError(s.to_string())),
        }
    }
}

// ============================================================================
// LINE ALGORITHMS
// ============================================================================

/// Slide all non-zero tiles to the front of the line, keeping their order.
pub fn tighten(line: &mut [Tile]) {
    let mut write = 0;
    for read in 0..line.len() {
        if line[read] != 0 {
            line.swap(write, read);
            write += 1;
        }
    }
}

/// Single left-to-right merge pass.
///
/// The first cell of an equal adjacent pair becomes 0 and the second doubles,
/// so a tile produced by a merge is never merged again in the same pass.
/// Pairs of [`MAX_TILE`] stay as they are.
/// Returns the sum of the doubled values.
pub fn merge(line: &mut [Tile]) -> Score {
    let mut gained = 0;
    let mut pending = false;
    for i in 0..line.len() {
        if pending {
            line[i] *= 2;
            gained += Score::from(line[i]);
            pending = false;
        } else if i + 1 < line.len() && can_merge(line[i], line[i + 1]) {
            line[i] = 0;
            pending = true;
        }
    }
    gained
}

/// Collapse a line towards index 0: tighten, merge, tighten.
///
/// Returns the score gained from merges.
///
/// ```
/// use twenty48_core::collapse_line;
/// let mut line = [2, 2, 2, 0];
/// assert_eq!(collapse_line(&mut line), 4);
/// assert_eq!(line, [4, 2, 0, 0]);
/// ```
pub fn collapse_line(line: &mut [Tile]) -> Score {
    tighten(line);
    let gained = merge(line);
    tighten(line);
    gained
}

/// Check whether collapsing towards index 0 would change the line.
pub fn line_is_movable(line: &[Tile]) -> bool {
    line.windows(2).any(|pair| {
        let (a, b) = (pair[0], pair[1]);
        (a == 0 && b != 0) || can_merge(a, b)
    })
}

#[inline]
fn can_merge(a: Tile, b: Tile) -> bool {
    a != 0 && a == b && a < MAX_TILE
}

#[inline]
fn is_valid_tile(value: Tile) -> bool {
    value == 0 || (value >= 2 && value.is_power_of_two())
}

// ============================================================================
// GRID
// ============================================================================

/// Rectangular grid of tiles, stored row-major.
///
/// Serializes as a list of rows, e.g. `[[2,0],[0,4]]`.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<Tile>>", into = "Vec<Vec<Tile>>")]
pub struct Grid {
    height: usize,
    width: usize,
    cells: Vec<Tile>,
}

impl Grid {
    /// All-empty grid.
    pub fn empty(height: usize, width: usize) -> Grid {
        Grid {
            height,
            width,
            cells: vec![0; height * width],
        }
    }

    /// Build a grid from rows, validating shape and tile values.
    pub fn from_rows(rows: Vec<Vec<Tile>>) -> Result<Grid, GridError> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if height == 0 || width == 0 {
            return Err(GridError::Empty);
        }

        let mut cells = Vec::with_capacity(height * width);
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != width {
                return Err(GridError::RaggedRow {
                    row,
                    expected: width,
                    found: values.len(),
                });
            }
            for (col, value) in values.into_iter().enumerate() {
                if !is_valid_tile(value) {
                    return Err(GridError::InvalidTile { row, col, value });
                }
                cells.push(value);
            }
        }

        Ok(Grid {
            height,
            width,
            cells,
        })
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Tile at `(row, col)`, or `None` outside the grid.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<Tile> {
        if row < self.height && col < self.width {
            Some(self.cells[row * self.width + col])
        } else {
            None
        }
    }

    #[inline]
    fn set(&mut self, row: usize, col: usize, value: Tile) {
        debug_assert!(row < self.height && col < self.width);
        self.cells[row * self.width + col] = value;
    }

    /// Iterate over rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Tile]> + '_ {
        self.cells.chunks(self.width.max(1))
    }

    /// Copy out as nested rows.
    pub fn to_rows(&self) -> Vec<Vec<Tile>> {
        self.rows().map(<[Tile]>::to_vec).collect()
    }

    /// Row-major cell values.
    #[inline]
    pub fn cells(&self) -> &[Tile] {
        &self.cells
    }

    /// Swap rows and columns. An `h×w` grid becomes `w×h`.
    pub fn transpose(&self) -> Grid {
        let mut out = Grid::empty(self.width, self.height);
        for row in 0..self.height {
            for col in 0..self.width {
                out.cells[col * self.height + row] = self.cells[row * self.width + col];
            }
        }
        out
    }

    /// Reverse every row.
    pub fn invert(&self) -> Grid {
        let mut out = self.clone();
        for row in out.cells.chunks_mut(self.width.max(1)) {
            row.reverse();
        }
        out
    }

    /// Number of non-empty cells.
    pub fn count_tiles(&self) -> usize {
        self.cells.iter().filter(|&&v| v != 0).count()
    }

    /// Coordinates of every empty cell, row-major.
    pub fn empty_cells(&self) -> Vec<(usize, usize)> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &v)| v == 0)
            .map(|(i, _)| (i / self.width, i % self.width))
            .collect()
    }

    /// Largest tile on the grid (0 if empty).
    pub fn max_tile(&self) -> Tile {
        self.cells.iter().copied().max().unwrap_or(0)
    }

    /// Sum of all tile values.
    pub fn sum(&self) -> u64 {
        self.cells.iter().map(|&v| u64::from(v)).sum()
    }

    fn shift_left(&self) -> (Grid, Score) {
        let mut out = self.clone();
        let mut gained = 0;
        for row in out.cells.chunks_mut(self.width.max(1)) {
            gained += collapse_line(row);
        }
        (out, gained)
    }

    fn left_movable(&self) -> bool {
        self.rows().any(line_is_movable)
    }

    /// Grid after sliding in `direction`, with the score gained. No spawn.
    pub fn shifted(&self, direction: Direction) -> (Grid, Score) {
        match direction {
            Direction::Left => self.shift_left(),
            Direction::Right => {
                let (grid, gained) = self.invert().shift_left();
                (grid.invert(), gained)
            }
            Direction::Up => {
                let (grid, gained) = self.transpose().shift_left();
                (grid.transpose(), gained)
            }
            Direction::Down => {
                let (grid, gained) = self.transpose().shifted(Direction::Right);
                (grid.transpose(), gained)
            }
        }
    }

    /// Check whether sliding in `direction` would change the grid.
    pub fn can_shift(&self, direction: Direction) -> bool {
        match direction {
            Direction::Left => self.left_movable(),
            Direction::Right => self.invert().left_movable(),
            Direction::Up => self.transpose().left_movable(),
            Direction::Down => self.transpose().can_shift(Direction::Right),
        }
    }
}

impl TryFrom<Vec<Vec<Tile>>> for Grid {
    type Error = GridError;

    fn try_from(rows: Vec<Vec<Tile>>) -> Result<Self, Self::Error> {
        Grid::from_rows(rows)
    }
}

impl From<Grid> for Vec<Vec<Tile>> {
    fn from(grid: Grid) -> Self {
        grid.to_rows()
    }
}

impl fmt::Display for Grid {
    /// Box drawing, one 6-column cell per tile:
    ///
    /// ```text
    /// +------+------+
    /// |  2   |      |
    /// +------+------+
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = format!("+{}", "------+".repeat(self.width));
        for row in self.rows() {
            writeln!(f, "{}", separator)?;
            for &value in row {
                if value > 0 {
                    write!(f, "|{:^5} ", value)?;
                } else {
                    write!(f, "|      ")?;
                }
            }
            writeln!(f, "|")?;
        }
        writeln!(f, "{}", separator)
    }
}

// ============================================================================
// CONFIG / STATUS / SNAPSHOT
// ============================================================================

/// Engine configuration, fixed for the lifetime of a [`Game`].
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct GameConfig {
    pub height: usize,
    pub width: usize,
    /// A session is won once any tile reaches this value.
    pub win_value: Tile,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            height: DEFAULT_HEIGHT,
            width: DEFAULT_WIDTH,
            win_value: DEFAULT_WIN_VALUE,
        }
    }
}

impl GameConfig {
    /// Default 4x4 grid with a custom win value.
    pub fn with_win_value(win_value: Tile) -> Self {
        Self {
            win_value,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.height.saturating_mul(self.width) < 2 {
            return Err(ConfigError::TooSmall {
                height: self.height,
                width: self.width,
            });
        }
        if self.win_value <= 2 {
            return Err(ConfigError::WinValueTooLow(self.win_value));
        }
        Ok(())
    }
}

/// Outcome of the current session.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Ongoing,
    Won,
    Lost,
}

impl GameStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GameStatus::Ongoing => "ongoing",
            GameStatus::Won => "won",
            GameStatus::Lost => "lost",
        }
    }
}

/// A tile placed by [`Game::spawn`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Spawn {
    pub row: usize,
    pub col: usize,
    pub value: Tile,
}

/// Observable engine state for drivers.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub grid: Grid,
    pub score: Score,
    pub high_score: Score,
    pub win_value: Tile,
    pub status: GameStatus,
}

// ============================================================================
// GAME
// ============================================================================

/// The board engine: grid, score, session high score and random source.
///
/// The random source is owned by the engine; pass a seeded one for
/// reproducible games.
///
/// ```
/// use twenty48_core::{Direction, Game, GameConfig};
/// let mut game = Game::seeded(GameConfig::default(), 7).unwrap();
/// assert_eq!(game.grid().count_tiles(), 2);
/// let moved = Direction::ALL.iter().any(|&d| game.make_move(d));
/// assert!(moved);
/// ```
#[derive(Clone, Debug)]
pub struct Game<R = StdRng> {
    config: GameConfig,
    grid: Grid,
    score: Score,
    high_score: Score,
    rng: R,
}

#[cfg(feature = "os-rng")]
impl Game<StdRng> {
    /// New game seeded from the operating system.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        Self::with_rng(config, StdRng::from_os_rng())
    }
}

impl Game<StdRng> {
    /// New game with a deterministic seed.
    pub fn seeded(config: GameConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Game<R> {
    /// New game using `rng` for every spawn. Starts with two tiles.
    pub fn with_rng(config: GameConfig, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut game = Game {
            config,
            grid: Grid::empty(config.height, config.width),
            score: 0,
            high_score: 0,
            rng,
        };
        game.reset();
        Ok(game)
    }

    /// Start from a prepared grid instead of a reset. Score starts at 0.
    pub fn from_grid(config: GameConfig, grid: Grid, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        if grid.height() != config.height || grid.width() != config.width {
            return Err(ConfigError::DimensionMismatch {
                height: config.height,
                width: config.width,
                found_height: grid.height(),
                found_width: grid.width(),
            });
        }
        Ok(Game {
            config,
            grid,
            score: 0,
            high_score: 0,
            rng,
        })
    }

    /// Start a new session.
    ///
    /// The score being discarded replaces the high score if it is larger;
    /// this is the only place the high score changes.
    pub fn reset(&mut self) {
        if self.score > self.high_score {
            info!("new high score {} (was {})", self.score, self.high_score);
            self.high_score = self.score;
        }
        self.score = 0;
        self.grid = Grid::empty(self.config.height, self.config.width);
        self.spawn();
        self.spawn();
        debug!("reset {}x{} grid", self.config.height, self.config.width);
    }

    /// Place a 2 (90%) or 4 (10%) on a uniformly chosen empty cell.
    ///
    /// Returns `None` and leaves the grid alone if there is no empty cell.
    pub fn spawn(&mut self) -> Option<Spawn> {
        let value = if self.rng.random_range(0..SPAWN_ROLL) > FOUR_THRESHOLD {
            4
        } else {
            2
        };
        let empty = self.grid.empty_cells();
        let Some(&(row, col)) = empty.choose(&mut self.rng) else {
            warn!("spawn requested on a full grid");
            return None;
        };
        self.grid.set(row, col, value);
        trace!("spawned {} at ({}, {})", value, row, col);
        Some(Spawn { row, col, value })
    }

    /// Slide in `direction`, then spawn one tile.
    ///
    /// Returns false, with nothing changed, if the slide would not move any
    /// tile.
    pub fn make_move(&mut self, direction: Direction) -> bool {
        if !self.can_move(direction) {
            trace!("rejected move {}", direction);
            return false;
        }
        let (grid, gained) = self.grid.shifted(direction);
        self.grid = grid;
        self.score += gained;
        self.spawn();
        debug!("move {}: +{} (score {})", direction, gained, self.score);
        true
    }
}

impl<R> Game<R> {
    /// Check whether a move in `direction` would change the grid.
    #[inline]
    pub fn can_move(&self, direction: Direction) -> bool {
        self.grid.can_shift(direction)
    }

    /// No direction changes the grid.
    pub fn is_game_over(&self) -> bool {
        !Direction::ALL.iter().any(|&d| self.can_move(d))
    }

    /// Some tile has reached the win value.
    pub fn is_win(&self) -> bool {
        self.grid.cells().iter().any(|&v| v >= self.config.win_value)
    }

    /// A win takes precedence over a stuck board.
    pub fn status(&self) -> GameStatus {
        if self.is_win() {
            GameStatus::Won
        } else if self.is_game_over() {
            GameStatus::Lost
        } else {
            GameStatus::Ongoing
        }
    }

    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[inline]
    pub fn score(&self) -> Score {
        self.score
    }

    /// Best score of the sessions discarded by [`Game::reset`] so far.
    #[inline]
    pub fn high_score(&self) -> Score {
        self.high_score
    }

    #[inline]
    pub fn win_value(&self) -> Tile {
        self.config.win_value
    }

    #[inline]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            grid: self.grid.clone(),
            score: self.score,
            high_score: self.high_score,
            win_value: self.config.win_value,
            status: self.status(),
        }
    }
}

impl<R> fmt::Display for Game<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SCORE: {}", self.score)?;
        if self.high_score != 0 {
            writeln!(f, "HIGHSCORE {}", self.high_score)?;
        }
        write!(f, "{}", self.grid)
    }
}

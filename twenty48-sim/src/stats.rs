//! Simulation statistics tracking.

use std::collections::BTreeMap;
use std::time::Instant;

use log::info;
use twenty48_core::{GameStatus, Score, Tile};

/// Statistics collected across simulated games.
#[derive(Debug)]
pub struct SimStats {
    /// Finished games (won or lost)
    pub games: u64,
    pub wins: u64,
    pub losses: u64,

    /// Successful moves across all games
    pub moves: u64,

    /// Sum of final scores, for the mean
    pub total_score: u64,
    pub best_score: Score,

    /// Final max tile -> number of games
    pub max_tiles: BTreeMap<Tile, u64>,

    start_time: Instant,
    last_log_time: Instant,
    last_log_games: u64,
}

impl SimStats {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            games: 0,
            wins: 0,
            losses: 0,
            moves: 0,
            total_score: 0,
            best_score: 0,
            max_tiles: BTreeMap::new(),
            start_time: now,
            last_log_time: now,
            last_log_games: 0,
        }
    }

    /// Record a finished game
    pub fn record_game(&mut self, status: GameStatus, score: Score, max_tile: Tile, moves: u64) {
        self.games += 1;
        match status {
            GameStatus::Won => self.wins += 1,
            GameStatus::Lost => self.losses += 1,
            GameStatus::Ongoing => {}
        }
        self.moves += moves;
        self.total_score += score;
        self.best_score = self.best_score.max(score);
        *self.max_tiles.entry(max_tile).or_insert(0) += 1;
    }

    pub fn mean_score(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.total_score as f64 / self.games as f64
        }
    }

    /// Fraction of finished games that were won
    pub fn win_rate(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.wins as f64 / self.games as f64
        }
    }

    /// Games per second over the window starting at `since`
    fn rate(since: Instant, games: u64) -> f64 {
        let elapsed = since.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            games as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Check if we should log progress
    pub fn should_log(&self, interval_secs: u64) -> bool {
        self.last_log_time.elapsed().as_secs() >= interval_secs
    }

    /// Log progress and reset log timer
    pub fn log_progress(&mut self) {
        let elapsed_total = self.start_time.elapsed().as_secs();
        let rate = Self::rate(self.last_log_time, self.games - self.last_log_games);

        info!(
            "[{:02}:{:02}:{:02}] games={} wins={} rate={:.1}/s mean={:.0} best={}",
            elapsed_total / 3600,
            (elapsed_total % 3600) / 60,
            elapsed_total % 60,
            self.games,
            self.wins,
            rate,
            self.mean_score(),
            self.best_score,
        );

        self.last_log_time = Instant::now();
        self.last_log_games = self.games;
    }

    /// Print final summary
    pub fn print_summary(&self) {
        println!("Games played: {}", self.games);
        println!("  - Wins: {} ({:.1}%)", self.wins, 100.0 * self.win_rate());
        println!("  - Losses: {}", self.losses);
        println!("Moves: {}", self.moves);
        println!("Best score: {}", self.best_score);
        println!("Mean score: {:.1}", self.mean_score());
        println!("Max tile reached:");
        for (tile, count) in self.max_tiles.iter().rev() {
            println!(
                "  {:>6}: {} ({:.1}%)",
                tile,
                count,
                100.0 * *count as f64 / self.games as f64
            );
        }

        println!(
            "Average rate: {:.1} games/sec",
            Self::rate(self.start_time, self.games)
        );
    }
}

//! Whole-game properties
//!
//! - game over is exactly "no direction changes the grid", checked by
//!   enumerating every grid over a small tile alphabet
//! - seeded random play keeps the spawn, score and tile invariants on every
//!   move until the session ends

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use twenty48_core::{Direction, Game, GameConfig, GameStatus, Grid, Tile};

/// Every grid of the given shape whose cells take values from `alphabet`.
fn all_grids(height: usize, width: usize, alphabet: &[Tile]) -> Vec<Grid> {
    let cells = height * width;
    let total = alphabet.len().pow(cells as u32);
    let mut grids = Vec::with_capacity(total);

    for mut index in 0..total {
        let mut rows = vec![vec![0; width]; height];
        for cell in 0..cells {
            rows[cell / width][cell % width] = alphabet[index % alphabet.len()];
            index /= alphabet.len();
        }
        grids.push(Grid::from_rows(rows).unwrap());
    }
    grids
}

fn check_game_over_exhaustive(height: usize, width: usize, alphabet: &[Tile]) -> usize {
    let config = GameConfig {
        height,
        width,
        win_value: 2048,
    };
    let mut stuck = 0;

    for grid in all_grids(height, width, alphabet) {
        let unchanged_everywhere = Direction::ALL
            .iter()
            .all(|&d| grid.shifted(d).0 == grid);
        let game = Game::from_grid(config, grid.clone(), StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(game.is_game_over(), unchanged_everywhere, "grid\n{}", grid);
        if unchanged_everywhere {
            stuck += 1;
        }
    }
    stuck
}

#[test]
fn test_game_over_exhaustive_2x2() {
    let stuck = check_game_over_exhaustive(2, 2, &[0, 2, 4, 8]);
    // The empty grid, plus every full grid with no equal neighbours (proper
    // 3-colourings of a 4-cycle: 18).
    assert_eq!(stuck, 19);
}

#[test]
fn test_game_over_exhaustive_2x3() {
    let stuck = check_game_over_exhaustive(2, 3, &[0, 2, 4]);
    // The empty grid and the two checkerboards of 2 and 4.
    assert_eq!(stuck, 3);
}

#[test]
fn test_game_over_exhaustive_1x4() {
    check_game_over_exhaustive(1, 4, &[0, 2, 4, 8, 16]);
}

#[test]
fn test_random_play_invariants() {
    let mut policy_rng = StdRng::seed_from_u64(1234);
    let mut game = Game::seeded(GameConfig::default(), 77).unwrap();

    for _ in 0..5 {
        let mut moves = 0;
        while game.status() == GameStatus::Ongoing {
            let legal: Vec<Direction> = Direction::ALL
                .iter()
                .copied()
                .filter(|&d| game.can_move(d))
                .collect();
            let direction = *legal.choose(&mut policy_rng).unwrap();

            let score_before = game.score();
            let (slid, gained) = game.grid().shifted(direction);

            assert!(game.make_move(direction));
            moves += 1;

            assert_eq!(game.score(), score_before + gained);
            assert_eq!(game.grid().count_tiles(), slid.count_tiles() + 1);
            assert!(game
                .grid()
                .cells()
                .iter()
                .all(|&v| v == 0 || (v >= 2 && v.is_power_of_two())));

            // Illegal directions are rejected without touching anything.
            for d in Direction::ALL {
                if !game.can_move(d) {
                    let before = game.grid().clone();
                    let score = game.score();
                    assert!(!game.make_move(d));
                    assert_eq!(game.grid(), &before);
                    assert_eq!(game.score(), score);
                }
            }
        }

        assert!(moves > 0);
        assert_eq!(game.status(), GameStatus::Lost);
        assert!(game.is_game_over());

        let final_score = game.score();
        let previous_high = game.high_score();
        game.reset();
        assert_eq!(game.high_score(), previous_high.max(final_score));
        assert_eq!(game.score(), 0);
        assert_eq!(game.grid().count_tiles(), 2);
    }
}

#[test]
fn test_small_win_value_is_reached() {
    let config = GameConfig::with_win_value(32);
    let mut game = Game::seeded(config, 9).unwrap();
    let mut played = 0;

    // Prefer down, left, right, up; with a target of 32 this wins long before
    // the board fills.
    while game.status() == GameStatus::Ongoing && played < 10_000 {
        let order = [Direction::Down, Direction::Left, Direction::Right, Direction::Up];
        let moved = order.iter().any(|&d| game.make_move(d));
        assert!(moved);
        played += 1;
    }

    assert_eq!(game.status(), GameStatus::Won);
    assert!(game.is_win());
    assert!(game.grid().max_tile() >= 32);
}

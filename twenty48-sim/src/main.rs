//! 2048 Simulator
//!
//! Plays many headless games with a fixed move policy and reports
//! aggregate statistics.
//!
//! Usage:
//!   cargo run --release --bin sim -- --games 1000 --policy corner
//!
//!   # Reproducible run on a 3x3 grid, first to 256
//!   cargo run --release --bin sim -- --seed 7 --height 3 --width 3 --win 256

mod policy;
mod stats;

use std::env;
use std::process;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use twenty48_core::{Game, GameConfig, GameStatus};

use crate::policy::Policy;
use crate::stats::SimStats;

#[derive(Debug, Clone, PartialEq)]
struct Options {
    games: u64,
    seed: Option<u64>,
    policy: Policy,
    config: GameConfig,
    log_interval_secs: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            games: 100,
            seed: None,
            policy: Policy::Random,
            config: GameConfig::default(),
            log_interval_secs: 5,
        }
    }
}

fn print_usage() {
    eprintln!("Usage: sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --games N             Number of games to play (default 100)");
    eprintln!("  --seed S              RNG seed (default: random)");
    eprintln!("  --policy NAME         random | greedy | corner (default random)");
    eprintln!("  --height H            Grid height (default 4)");
    eprintln!("  --width W             Grid width (default 4)");
    eprintln!("  --win V               Winning tile (default 2048)");
    eprintln!("  --log-interval SECS   Progress log interval (default 5)");
    eprintln!("  -h, --help            Show this message");
    eprintln!();
    eprintln!("Set RUST_LOG=debug for per-game results.");
}

fn flag_value<T: FromStr>(args: &[String], i: usize, flag: &str) -> Result<T, String> {
    let raw = args
        .get(i)
        .ok_or_else(|| format!("{} needs a value", flag))?;
    raw.parse()
        .map_err(|_| format!("invalid value for {}: {}", flag, raw))
}

/// Parse arguments (without the program name). `Ok(None)` means help.
fn parse_args(args: &[String]) -> Result<Option<Options>, String> {
    let mut opts = Options::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--games" => {
                i += 1;
                opts.games = flag_value(args, i, "--games")?;
            }
            "--seed" => {
                i += 1;
                opts.seed = Some(flag_value(args, i, "--seed")?);
            }
            "--policy" => {
                i += 1;
                let name: String = flag_value(args, i, "--policy")?;
                opts.policy = name.parse()?;
            }
            "--height" => {
                i += 1;
                opts.config.height = flag_value(args, i, "--height")?;
            }
            "--width" => {
                i += 1;
                opts.config.width = flag_value(args, i, "--width")?;
            }
            "--win" => {
                i += 1;
                opts.config.win_value = flag_value(args, i, "--win")?;
            }
            "--log-interval" => {
                i += 1;
                opts.log_interval_secs = flag_value(args, i, "--log-interval")?;
            }
            "-h" | "--help" => return Ok(None),
            other => return Err(format!("unknown argument: {}", other)),
        }
        i += 1;
    }

    Ok(Some(opts))
}

/// Play until the session is won or lost. Returns the number of moves made.
fn play_game<R: Rng + ?Sized>(game: &mut Game<StdRng>, policy: Policy, rng: &mut R) -> u64 {
    let mut moves = 0;
    while game.status() == GameStatus::Ongoing {
        let Some(direction) = policy.choose(game.grid(), rng) else {
            break;
        };
        if game.make_move(direction) {
            moves += 1;
        }
    }
    moves
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let opts = match parse_args(&args) {
        Ok(Some(opts)) => opts,
        Ok(None) => {
            print_usage();
            return;
        }
        Err(e) => {
            eprintln!("Error: {}\n", e);
            print_usage();
            process::exit(1);
        }
    };

    let seed = opts.seed.unwrap_or_else(rand::random);
    let mut game = match Game::seeded(opts.config, seed) {
        Ok(game) => game,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    let mut policy_rng = StdRng::seed_from_u64(seed.wrapping_add(1));

    println!("2048 Simulator");
    println!("==============");
    println!(
        "Grid: {}x{}  Win: {}  Policy: {}  Seed: {}",
        opts.config.height, opts.config.width, opts.config.win_value, opts.policy, seed
    );
    println!("Games: {}", opts.games);
    println!();

    // Set up SIGINT handler for graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!("\n\nInterrupt received, finishing current game...");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Could not install Ctrl-C handler: {}", e);
    }

    let start = Instant::now();
    let mut stats = SimStats::new();

    for index in 0..opts.games {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        // The constructor already dealt the first game.
        if index > 0 {
            game.reset();
        }

        let moves = play_game(&mut game, opts.policy, &mut policy_rng);
        let status = game.status();
        debug!(
            "game {}: {} score={} max_tile={} moves={}",
            index + 1,
            status.as_str(),
            game.score(),
            game.grid().max_tile(),
            moves
        );
        stats.record_game(status, game.score(), game.grid().max_tile(), moves);

        if stats.should_log(opts.log_interval_secs) {
            stats.log_progress();
        }
    }

    // Fold the last game's score into the session high score.
    let last_board = game.to_string();
    game.reset();

    println!("\n==============");
    println!("Simulation complete!");
    println!("==============");
    println!("Time: {:.2}s", start.elapsed().as_secs_f64());
    println!();
    stats.print_summary();
    println!("Session high score: {}", game.high_score());
    println!("\nLast board:\n{}", last_board);

    if stats.games < opts.games {
        println!("Stopped after {} of {} games.", stats.games, opts.games);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_defaults() {
        let opts = parse_args(&[]).unwrap().unwrap();
        assert_eq!(opts, Options::default());
        assert_eq!(opts.config, GameConfig::default());
    }

    #[test]
    fn test_parse_all_flags() {
        let opts = parse_args(&args(&[
            "--games", "10", "--seed", "42", "--policy", "corner", "--height", "3", "--width", "5",
            "--win", "256", "--log-interval", "1",
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(opts.games, 10);
        assert_eq!(opts.seed, Some(42));
        assert_eq!(opts.policy, Policy::Corner);
        assert_eq!(opts.config.height, 3);
        assert_eq!(opts.config.width, 5);
        assert_eq!(opts.config.win_value, 256);
        assert_eq!(opts.log_interval_secs, 1);
    }

    #[test]
    fn test_parse_help_and_errors() {
        assert_eq!(parse_args(&args(&["--help"])), Ok(None));
        assert!(parse_args(&args(&["--games"])).is_err());
        assert!(parse_args(&args(&["--games", "many"])).is_err());
        assert!(parse_args(&args(&["--policy", "minimax"])).is_err());
        assert!(parse_args(&args(&["--bogus"])).is_err());
    }

    #[test]
    fn test_play_game_runs_to_end() {
        let config = GameConfig {
            height: 3,
            width: 3,
            win_value: 2048,
        };
        let mut rng = StdRng::seed_from_u64(5);
        for policy in [Policy::Random, Policy::Greedy, Policy::Corner] {
            let mut game = Game::seeded(config, 17).unwrap();
            let moves = play_game(&mut game, policy, &mut rng);
            assert!(moves > 0);
            // 2048 is out of reach on a 3x3 grid.
            assert_eq!(game.status(), GameStatus::Lost);
        }
    }

    #[test]
    fn test_play_game_stops_on_win() {
        let mut game = Game::seeded(GameConfig::with_win_value(16), 3).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        play_game(&mut game, Policy::Corner, &mut rng);
        assert_eq!(game.status(), GameStatus::Won);
    }
}

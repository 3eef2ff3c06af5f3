//! Move selection for headless play.

use std::fmt;
use std::str::FromStr;

use rand::seq::IndexedRandom;
use rand::Rng;
use twenty48_core::{Direction, Grid, Score};

/// Fixed preference order used by [`Policy::Corner`].
const CORNER_ORDER: [Direction; 4] = [
    Direction::Down,
    Direction::Left,
    Direction::Right,
    Direction::Up,
];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Policy {
    /// Uniform among legal directions.
    Random,
    /// Largest immediate merge score, ties broken in `Direction::ALL` order.
    Greedy,
    /// First legal direction of down, left, right, up.
    Corner,
}

impl Policy {
    /// Pick a direction that changes `grid`, or `None` if the game is over.
    pub fn choose<R: Rng + ?Sized>(self, grid: &Grid, rng: &mut R) -> Option<Direction> {
        match self {
            Policy::Random => {
                let legal: Vec<Direction> = Direction::ALL
                    .iter()
                    .copied()
                    .filter(|&d| grid.can_shift(d))
                    .collect();
                legal.choose(rng).copied()
            }
            Policy::Greedy => {
                let mut best: Option<(Direction, Score)> = None;
                for d in Direction::ALL {
                    if !grid.can_shift(d) {
                        continue;
                    }
                    let (_, gained) = grid.shifted(d);
                    if best.map_or(true, |(_, score)| gained > score) {
                        best = Some((d, gained));
                    }
                }
                best.map(|(d, _)| d)
            }
            Policy::Corner => CORNER_ORDER.iter().copied().find(|&d| grid.can_shift(d)),
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Policy::Random => "random",
            Policy::Greedy => "greedy",
            Policy::Corner => "corner",
        };
        f.write_str(name)
    }
}

impl FromStr for Policy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(Policy::Random),
            "greedy" => Ok(Policy::Greedy),
            "corner" => Ok(Policy::Corner),
            other => Err(format!("unknown policy: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grid(rows: &[&[u32]]) -> Grid {
        Grid::from_rows(rows.iter().map(|r| r.to_vec()).collect()).unwrap()
    }

    #[test]
    fn test_parse_policy() {
        assert_eq!("random".parse::<Policy>(), Ok(Policy::Random));
        assert_eq!("Greedy".parse::<Policy>(), Ok(Policy::Greedy));
        assert_eq!("CORNER".parse::<Policy>(), Ok(Policy::Corner));
        assert!("expectimax".parse::<Policy>().is_err());
    }

    #[test]
    fn test_stuck_grid_has_no_choice() {
        let stuck = grid(&[&[2, 4], &[4, 2]]);
        let mut rng = StdRng::seed_from_u64(0);
        for policy in [Policy::Random, Policy::Greedy, Policy::Corner] {
            assert_eq!(policy.choose(&stuck, &mut rng), None);
        }
    }

    #[test]
    fn test_random_only_picks_legal() {
        // Only right and down move anything.
        let g = grid(&[&[2, 0], &[0, 0]]);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let d = Policy::Random.choose(&g, &mut rng).unwrap();
            assert!(d == Direction::Right || d == Direction::Down);
        }
    }

    #[test]
    fn test_greedy_prefers_bigger_merge() {
        // Vertical merges the 8s (+16), horizontal only the 2s (+4).
        let g = grid(&[&[8, 2, 2], &[8, 4, 16]]);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(Policy::Greedy.choose(&g, &mut rng), Some(Direction::Up));
    }

    #[test]
    fn test_corner_order() {
        let mut rng = StdRng::seed_from_u64(0);
        let g = grid(&[&[2, 0], &[0, 0]]);
        assert_eq!(Policy::Corner.choose(&g, &mut rng), Some(Direction::Down));
        let bottom_left = grid(&[&[0, 0], &[2, 0]]);
        assert_eq!(Policy::Corner.choose(&bottom_left, &mut rng), Some(Direction::Right));
    }
}

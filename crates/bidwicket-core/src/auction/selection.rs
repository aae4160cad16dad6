// Strategies for drawing the next player out of the pool.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::player::Player;

/// Picks which pool player goes under the hammer next.
pub trait PlayerSelector: fmt::Debug + Send {
    /// Return an index into `pool`. Only called with a non-empty pool.
    fn select(&mut self, pool: &[Player]) -> usize;
}

/// Uniform random draw.
#[derive(Debug)]
pub struct RandomSelector {
    rng: StdRng,
}

impl RandomSelector {
    /// Seeded from the OS entropy source.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Reproducible draws for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self { rng }
    }
}

impl Default for RandomSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerSelector for RandomSelector {
    fn select(&mut self, pool: &[Player]) -> usize {
        self.rng.random_range(0..pool.len())
    }
}

/// Deterministic queue: always the player at the front of the pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialSelector;

impl PlayerSelector for SequentialSelector {
    fn select(&mut self, _pool: &[Player]) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::player::Role;

    fn pool(n: usize) -> Vec<Player> {
        (0..n)
            .map(|i| Player::new(format!("P{i}"), Role::Batsman, 70))
            .collect()
    }

    #[test]
    fn sequential_always_takes_front() {
        let mut sel = SequentialSelector;
        assert_eq!(sel.select(&pool(5)), 0);
        assert_eq!(sel.select(&pool(1)), 0);
    }

    #[test]
    fn seeded_random_is_reproducible() {
        let players = pool(10);
        let mut a = RandomSelector::seeded(42);
        let mut b = RandomSelector::seeded(42);
        let draws_a: Vec<usize> = (0..20).map(|_| a.select(&players)).collect();
        let draws_b: Vec<usize> = (0..20).map(|_| b.select(&players)).collect();
        assert_eq!(draws_a, draws_b);
    }

    #[test]
    fn random_stays_in_bounds() {
        let players = pool(3);
        let mut sel = RandomSelector::seeded(7);
        for _ in 0..100 {
            assert!(sel.select(&players) < 3);
        }
    }

    #[test]
    fn random_single_player_pool() {
        let mut sel = RandomSelector::new();
        assert_eq!(sel.select(&pool(1)), 0);
    }
}

//! Victim selection for frame replacement
//!
//! Replacement is uniform-random: recency and frequency are never consulted.
//! The selector is a trait so deterministic sequences can stand in for the
//! random source.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub trait VictimSelector {
    /// Pick a frame index in `0..frame_count`. `frame_count` is never zero.
    fn pick_victim(&mut self, frame_count: usize) -> usize;
}

impl<V: VictimSelector + ?Sized> VictimSelector for &mut V {
    fn pick_victim(&mut self, frame_count: usize) -> usize {
        (**self).pick_victim(frame_count)
    }
}

impl<V: VictimSelector + ?Sized> VictimSelector for Box<V> {
    fn pick_victim(&mut self, frame_count: usize) -> usize {
        (**self).pick_victim(frame_count)
    }
}

/// Uniformly random frame choice
pub struct RandomVictim {
    rng: StdRng,
}

impl RandomVictim {
    pub fn new() -> Self {
        RandomVictim {
            rng: StdRng::from_rng(&mut rand::rng()),
        }
    }

    /// Reproducible choices for a given seed
    pub fn seeded(seed: u64) -> Self {
        RandomVictim {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomVictim {
    fn default() -> Self {
        Self::new()
    }
}

impl VictimSelector for RandomVictim {
    fn pick_victim(&mut self, frame_count: usize) -> usize {
        self.rng.random_range(..frame_count)
    }
}

/// Replays a fixed list of frame indices, then keeps returning the last one
#[derive(Debug, Clone, Default)]
pub struct ScriptedVictim {
    picks: VecDeque<usize>,
    last: usize,
}

impl ScriptedVictim {
    pub fn new<I: IntoIterator<Item = usize>>(picks: I) -> Self {
        ScriptedVictim {
            picks: picks.into_iter().collect(),
            last: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.picks.len()
    }
}

impl VictimSelector for ScriptedVictim {
    fn pick_victim(&mut self, frame_count: usize) -> usize {
        if let Some(pick) = self.picks.pop_front() {
            self.last = pick;
        }
        self.last % frame_count
    }
}

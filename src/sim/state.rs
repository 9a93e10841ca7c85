//! Game state and core simulation types
//!
//! One `GameState` exists per signed-in session. Dropping it cancels every
//! pending expiry, because expiry deadlines live in the state itself.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::target::Target;
use crate::consts::*;

/// Result of an honored click
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickOutcome {
    /// Points the clicked target was worth
    pub points: u32,
    /// Local cumulative score after crediting the click
    pub new_score: u64,
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Session seed for reproducibility
    pub seed: u64,
    /// Seeded RNG; all randomness flows through here
    rng: Pcg32,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Ticks between spawn attempts
    pub spawn_interval_ticks: u64,
    /// Live target capacity; spawn attempts at capacity are dropped
    pub capacity: usize,
    /// Live targets (sorted by id for determinism)
    pub targets: Vec<Target>,
    /// Local cumulative score, authoritative for this session
    pub score: u64,
    /// Next entity ID
    next_id: u32,
}

impl GameState {
    /// Create a fresh state for a new session, seeded from the ledger score
    pub fn new(seed: u64, initial_score: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            time_ticks: 0,
            spawn_interval_ticks: SPAWN_INTERVAL_TICKS,
            capacity: TARGET_CAPACITY,
            targets: Vec::new(),
            score: initial_score,
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn rng_mut(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    /// Look up a live target by id
    pub fn target(&self, id: u32) -> Option<&Target> {
        self.targets.iter().find(|t| t.id == id)
    }

    pub fn live_count(&self) -> usize {
        self.targets.len()
    }

    /// Honor a click on `id`: remove the target and credit its points.
    ///
    /// Returns `None` when the id is not live (already clicked or expired);
    /// that case is a no-op, never an error. The removal happens here,
    /// synchronously, before any persistence write - the first remove wins,
    /// so a target can never be credited twice.
    pub fn click(&mut self, id: u32) -> Option<ClickOutcome> {
        let idx = self.targets.iter().position(|t| t.id == id)?;
        let target = self.targets.remove(idx);
        self.score += u64::from(target.points);
        Some(ClickOutcome {
            points: target.points,
            new_score: self.score,
        })
    }
}

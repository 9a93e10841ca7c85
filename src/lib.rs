//! Orb Rush - a click-the-target arcade game with a live leaderboard
//!
//! Core modules:
//! - `sim`: Deterministic simulation (target spawning, expiry, click scoring)
//! - `leaderboard`: Top-N snapshot diffing (rank changes, score deltas, activity)
//! - `backend`: Hosted-backend collaborators (auth, user directory, score ledger)
//! - `session`: Session-scoped game runtime and leaderboard refresh driver
//! - `config`: Data-driven gameplay/leaderboard tuning

pub mod backend;
pub mod config;
pub mod leaderboard;
pub mod session;
pub mod sim;

pub use config::Config;
pub use leaderboard::LeaderboardDiffer;
pub use session::GameSession;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz; coarse enough for a clicker, smooth enough for input)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Simulation ticks per second
    pub const TICKS_PER_SEC: u64 = 60;

    /// Default spawn cadence (one spawn attempt per second)
    pub const SPAWN_INTERVAL_TICKS: u64 = TICKS_PER_SEC;
    /// Default live target capacity; spawn attempts beyond this are dropped
    pub const TARGET_CAPACITY: usize = 20;

    /// Viewport margins so a full target always fits on screen
    pub const MARGIN_X: f32 = 50.0;
    pub const MARGIN_TOP: f32 = 100.0;
    pub const MARGIN_BOTTOM: f32 = 100.0;

    /// Kind weights (normal / big / bonus), must sum to 1.0
    pub const WEIGHT_NORMAL: f32 = 0.70;
    pub const WEIGHT_BIG: f32 = 0.15;
    pub const WEIGHT_BONUS: f32 = 0.15;

    /// Target palette (display only, indexed by `Target::color`)
    pub const PALETTE: [&str; 7] = [
        "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEAA7", "#DDA0DD", "#98D8C8",
    ];

    /// Leaderboard poll cadence (ms)
    pub const LEADERBOARD_POLL_MS: f64 = 2000.0;
    /// How many rows the leaderboard shows
    pub const LEADERBOARD_TOP_N: usize = 10;
    /// A player counts as active if their score changed within this window (ms)
    pub const ACTIVITY_WINDOW_MS: f64 = 30_000.0;
    /// Recency boundary between the fast and slow clicks-per-second tiers (ms)
    pub const CPS_FAST_WINDOW_MS: f64 = 10_000.0;
}

/// Convert a millisecond duration to whole simulation ticks
#[inline]
pub fn ms_to_ticks(ms: u64) -> u64 {
    ms * consts::TICKS_PER_SEC / 1000
}

//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod state;
pub mod target;
pub mod tick;

pub use state::{ClickOutcome, GameState};
pub use target::{Target, TargetKind, Viewport};
pub use tick::{GameEvent, TickInput, tick};

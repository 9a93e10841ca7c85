//! Target entities and spawn parameter tables
//!
//! A target is an ephemeral clickable entity: it lives from its spawn tick
//! until it is clicked or its ttl elapses, whichever comes first.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Target categories, drawn from a fixed weighted distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetKind {
    Normal,
    Big,
    Bonus,
}

impl TargetKind {
    /// Weighted categorical draw (normal 70%, big 15%, bonus 15%)
    pub fn draw(rng: &mut Pcg32) -> Self {
        let roll: f32 = rng.random();
        if roll < WEIGHT_NORMAL {
            TargetKind::Normal
        } else if roll < WEIGHT_NORMAL + WEIGHT_BIG {
            TargetKind::Big
        } else {
            TargetKind::Bonus
        }
    }

    /// Rendered diameter range in px
    pub fn size_range(self) -> std::ops::Range<f32> {
        match self {
            TargetKind::Normal => 40.0..70.0,
            TargetKind::Big => 50.0..80.0,
            TargetKind::Bonus => 30.0..50.0,
        }
    }

    /// Point award range
    pub fn point_range(self) -> std::ops::RangeInclusive<u32> {
        match self {
            TargetKind::Normal => 1..=3,
            TargetKind::Big => 5..=7,
            TargetKind::Bonus => 8..=10,
        }
    }

    /// Time-to-live in ticks (bonus > big > normal)
    pub fn ttl_ticks(self) -> u64 {
        match self {
            TargetKind::Normal => 8 * TICKS_PER_SEC,
            TargetKind::Big => 12 * TICKS_PER_SEC,
            TargetKind::Bonus => 15 * TICKS_PER_SEC,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TargetKind::Normal => "normal",
            TargetKind::Big => "big",
            TargetKind::Bonus => "bonus",
        }
    }
}

/// Playable area in CSS pixels, supplied by the platform glue
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

/// A clickable target entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub id: u32,
    /// Top-left corner within the viewport
    pub pos: Vec2,
    /// Rendered diameter in px
    pub size: f32,
    pub kind: TargetKind,
    /// Points awarded on click
    pub points: u32,
    /// Index into `consts::PALETTE` (display only)
    pub color: usize,
    /// Tick the target appeared on
    pub spawned_tick: u64,
    pub ttl_ticks: u64,
}

impl Target {
    /// Spawn a fresh target with randomized kind, size, points, and position
    pub fn spawn(id: u32, rng: &mut Pcg32, viewport: Viewport, now_tick: u64) -> Self {
        let kind = TargetKind::draw(rng);
        let size = rng.random_range(kind.size_range());
        let points = rng.random_range(kind.point_range());
        let color = rng.random_range(0..PALETTE.len());

        // Constrain so the full rendered size fits on screen with a margin
        let max_x = (viewport.width - size - MARGIN_X).max(MARGIN_X);
        let max_y = (viewport.height - size - MARGIN_BOTTOM).max(MARGIN_TOP);
        let x = if max_x > MARGIN_X {
            rng.random_range(MARGIN_X..max_x)
        } else {
            MARGIN_X
        };
        let y = if max_y > MARGIN_TOP {
            rng.random_range(MARGIN_TOP..max_y)
        } else {
            MARGIN_TOP
        };

        Self {
            id,
            pos: Vec2::new(x, y),
            size,
            kind,
            points,
            color,
            spawned_tick: now_tick,
            ttl_ticks: kind.ttl_ticks(),
        }
    }

    /// Tick at which the target self-expires if not clicked first
    #[inline]
    pub fn expires_at(&self) -> u64 {
        self.spawned_tick + self.ttl_ticks
    }

    /// Fraction of lifetime remaining (1.0 fresh, 0.0 expired), for the timer bar
    pub fn life_remaining(&self, now_tick: u64) -> f32 {
        let elapsed = now_tick.saturating_sub(self.spawned_tick) as f32;
        (1.0 - elapsed / self.ttl_ticks as f32).clamp(0.0, 1.0)
    }
}

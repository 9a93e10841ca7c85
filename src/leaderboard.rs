//! Leaderboard snapshot diffing
//!
//! Turns successive top-N ledger reads into an annotated view: per-entry
//! rank-change classification (for the up/down animations), score deltas,
//! and a recency-based "active player" flag. The differ owns a rolling
//! previous-snapshot map; nothing here is persisted.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::backend::types::{ScoreRow, UserId, UserProfile};

/// How an entry's rank moved between the previous snapshot and this one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RankChange {
    MovedUp,
    MovedDown,
    Unchanged,
}

impl RankChange {
    /// CSS class hook for the rank-change animation
    pub fn as_str(self) -> &'static str {
        match self {
            RankChange::MovedUp => "up",
            RankChange::MovedDown => "down",
            RankChange::Unchanged => "same",
        }
    }
}

/// One annotated leaderboard row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    /// 1-based position in the snapshot
    pub rank: usize,
    pub user_id: UserId,
    /// Resolved display name (placeholder when the directory has no row)
    pub name: String,
    pub avatar_url: Option<String>,
    pub score: u64,
    /// Score change since the previous snapshot (0 on first appearance)
    pub score_delta: i64,
    pub change: RankChange,
    /// When the underlying row last changed (epoch ms), for activity display
    pub changed_at_ms: f64,
}

/// A player flagged as currently engaged
#[derive(Debug, Clone, PartialEq)]
pub struct ActivePlayer {
    pub user_id: UserId,
    pub name: String,
    pub avatar_url: Option<String>,
    /// Coarse two-tier recency heuristic, not a measured rate
    pub clicks_per_second: f32,
    pub score_delta: i64,
}

/// Diffs consecutive top-N snapshots against a rolling previous state
#[derive(Debug, Default)]
pub struct LeaderboardDiffer {
    previous_scores: HashMap<UserId, u64>,
    previous_ranks: HashMap<UserId, usize>,
}

impl LeaderboardDiffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Annotate a fresh snapshot against the previous one.
    ///
    /// A user absent from the previous snapshot is treated as having held
    /// their current rank, so a first appearance is always `Unchanged`.
    /// Both rolling maps are replaced wholesale after classification; the
    /// next call always compares against the snapshot seen here, never a
    /// partial update. Row order is taken as-is from the ledger query.
    pub fn reconcile(
        &mut self,
        rows: &[ScoreRow],
        profiles: &HashMap<UserId, UserProfile>,
    ) -> Vec<RankedEntry> {
        let mut entries = Vec::with_capacity(rows.len());
        let mut next_scores = HashMap::with_capacity(rows.len());
        let mut next_ranks = HashMap::with_capacity(rows.len());

        for (i, row) in rows.iter().enumerate() {
            let rank = i + 1;
            let previous_score = self
                .previous_scores
                .get(&row.user_id)
                .copied()
                .unwrap_or(0);
            let previous_rank = self
                .previous_ranks
                .get(&row.user_id)
                .copied()
                .unwrap_or(rank);

            let change = match rank.cmp(&previous_rank) {
                std::cmp::Ordering::Less => RankChange::MovedUp,
                std::cmp::Ordering::Greater => RankChange::MovedDown,
                std::cmp::Ordering::Equal => RankChange::Unchanged,
            };

            let (name, avatar_url) = match profiles.get(&row.user_id) {
                Some(profile) => (
                    profile
                        .name
                        .clone()
                        .unwrap_or_else(|| row.user_id.placeholder_name()),
                    profile.avatar_url.clone(),
                ),
                None => (row.user_id.placeholder_name(), None),
            };

            entries.push(RankedEntry {
                rank,
                user_id: row.user_id.clone(),
                name,
                avatar_url,
                score: row.score,
                score_delta: row.score as i64 - previous_score as i64,
                change,
                changed_at_ms: row.changed_at_ms,
            });

            next_scores.insert(row.user_id.clone(), row.score);
            next_ranks.insert(row.user_id.clone(), rank);
        }

        self.previous_scores = next_scores;
        self.previous_ranks = next_ranks;
        entries
    }
}

/// Flag entries whose score changed within `window_ms` as active.
///
/// Clicks-per-second is deliberately approximate: two tiers keyed off
/// recency alone (fast if the change is newer than `fast_ms`), sorted
/// fastest first. Display affordance only.
pub fn active_players(
    entries: &[RankedEntry],
    now_ms: f64,
    window_ms: f64,
    fast_ms: f64,
) -> Vec<ActivePlayer> {
    let mut active: Vec<ActivePlayer> = entries
        .iter()
        .filter(|e| now_ms - e.changed_at_ms < window_ms)
        .map(|e| ActivePlayer {
            user_id: e.user_id.clone(),
            name: e.name.clone(),
            avatar_url: e.avatar_url.clone(),
            clicks_per_second: if now_ms - e.changed_at_ms < fast_ms {
                1.5
            } else {
                0.8
            },
            score_delta: e.score_delta,
        })
        .collect();
    active.sort_by(|a, b| {
        b.clicks_per_second
            .partial_cmp(&a.clicks_per_second)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    active
}

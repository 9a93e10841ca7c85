//! In-memory ledger for the native demo and tests
//!
//! Same four operations as the REST client, minus the network. Ordering of
//! tied scores is made deterministic (user id ascending) so the demo output
//! is stable; the hosted backend provides its own stable order.

use std::collections::HashMap;

use super::types::{ScoreRow, UserId, UserProfile};

#[derive(Debug, Default)]
pub struct MemoryLedger {
    scores: HashMap<UserId, (u64, f64)>,
    users: HashMap<UserId, UserProfile>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_score(&self, user: &UserId) -> Option<u64> {
        self.scores.get(user).map(|(score, _)| *score)
    }

    /// Idempotent overwrite keyed by user id
    pub fn upsert_score(&mut self, user: &UserId, score: u64, now_ms: f64) {
        self.scores.insert(user.clone(), (score, now_ms));
    }

    pub fn upsert_user(&mut self, profile: UserProfile) {
        self.users.insert(profile.id.clone(), profile);
    }

    /// Top-N rows ordered by score descending, ties by user id
    pub fn top_scores(&self, n: usize) -> Vec<ScoreRow> {
        let mut rows: Vec<ScoreRow> = self
            .scores
            .iter()
            .map(|(user_id, (score, changed_at_ms))| ScoreRow {
                user_id: user_id.clone(),
                score: *score,
                changed_at_ms: *changed_at_ms,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        rows.truncate(n);
        rows
    }

    pub fn profiles(&self, ids: &[UserId]) -> HashMap<UserId, UserProfile> {
        ids.iter()
            .filter_map(|id| self.users.get(id).map(|p| (id.clone(), p.clone())))
            .collect()
    }
}

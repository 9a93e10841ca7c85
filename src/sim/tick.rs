//! Fixed timestep simulation tick
//!
//! Core game loop that advances the target lifecycle deterministically:
//! click resolution, deadline expiry, cadence-driven spawning.

use super::state::GameState;
use super::target::{Target, Viewport};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Target id the player clicked this frame, if any
    pub click: Option<u32>,
    /// Current playable area
    pub viewport: Viewport,
}

/// Things that happened during a tick, for the glue to animate/persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    Spawned { id: u32 },
    Expired { id: u32 },
    Clicked { id: u32, points: u32, new_score: u64 },
    /// A spawn opportunity was dropped because the live set was at capacity
    SpawnSkipped,
}

/// Advance the game state by one fixed timestep.
///
/// Order matters: the click is honored first so a click and an expiry landing
/// on the same tick resolve to the click. Every target sees exactly one
/// terminal event - `Clicked` or `Expired`, never both.
pub fn tick(state: &mut GameState, input: &TickInput, events: &mut Vec<GameEvent>) {
    state.time_ticks += 1;

    // Click resolution (no-op if the target already left the live set)
    if let Some(id) = input.click {
        if let Some(outcome) = state.click(id) {
            events.push(GameEvent::Clicked {
                id,
                points: outcome.points,
                new_score: outcome.new_score,
            });
        }
    }

    // Deadline expiry sweep
    let now = state.time_ticks;
    state.targets.retain(|t| {
        if t.expires_at() <= now {
            events.push(GameEvent::Expired { id: t.id });
            false
        } else {
            true
        }
    });

    // Spawn attempt on the cadence boundary
    if state.time_ticks.is_multiple_of(state.spawn_interval_ticks) {
        if state.live_count() >= state.capacity {
            // Drop the opportunity; no queueing
            events.push(GameEvent::SpawnSkipped);
        } else {
            let id = state.next_entity_id();
            let now = state.time_ticks;
            let viewport = input.viewport;
            let target = {
                let rng = state.rng_mut();
                Target::spawn(id, rng, viewport, now)
            };
            state.targets.push(target);
            events.push(GameEvent::Spawned { id });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::TICKS_PER_SEC;
    use proptest::prelude::*;

    fn run_ticks(state: &mut GameState, n: u64, events: &mut Vec<GameEvent>) {
        let input = TickInput::default();
        for _ in 0..n {
            tick(state, &input, events);
        }
    }

    #[test]
    fn test_spawn_cadence() {
        let mut state = GameState::new(123, 0);
        let mut events = Vec::new();
        let interval = state.spawn_interval_ticks;
        run_ticks(&mut state, interval * 3, &mut events);
        assert_eq!(state.live_count(), 3);
        let spawns = events
            .iter()
            .filter(|e| matches!(e, GameEvent::Spawned { .. }))
            .count();
        assert_eq!(spawns, 3);
    }

    #[test]
    fn test_capacity_caps_live_set() {
        // Capacity 12, spawn every 0.5s, no clicks: after 6 seconds the live
        // set is exactly 12 (normal ttl is 8s, so nothing expires first).
        let mut state = GameState::new(42, 0);
        state.capacity = 12;
        state.spawn_interval_ticks = TICKS_PER_SEC / 2;
        let mut events = Vec::new();
        run_ticks(&mut state, 6 * TICKS_PER_SEC, &mut events);
        assert_eq!(state.live_count(), 12);
        assert!(!events.iter().any(|e| matches!(e, GameEvent::SpawnSkipped)));
        // One more second: both spawn opportunities land at capacity and are
        // dropped, not queued
        run_ticks(&mut state, TICKS_PER_SEC, &mut events);
        assert_eq!(state.live_count(), 12);
        let skips = events
            .iter()
            .filter(|e| matches!(e, GameEvent::SpawnSkipped))
            .count();
        assert_eq!(skips, 2);
    }

    #[test]
    fn test_targets_expire_on_deadline() {
        let mut state = GameState::new(7, 0);
        let mut events = Vec::new();
        // Longest ttl is 15s; everything spawned in the first second is gone
        // by 16s, and later spawns keep the set from being empty.
        run_ticks(&mut state, 16 * TICKS_PER_SEC, &mut events);
        let expired: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::Expired { id } => Some(*id),
                _ => None,
            })
            .collect();
        assert!(!expired.is_empty());
        for id in &expired {
            assert!(state.target(*id).is_none());
        }
    }

    #[test]
    fn test_click_beats_expiry_same_tick() {
        let mut state = GameState::new(5, 0);
        let mut events = Vec::new();
        let interval = state.spawn_interval_ticks;
        run_ticks(&mut state, interval, &mut events);
        let id = state.targets[0].id;
        // Force the deadline onto the next tick, then click on that tick
        state.targets[0].ttl_ticks = 1;
        let input = TickInput {
            click: Some(id),
            ..Default::default()
        };
        tick(&mut state, &input, &mut events);
        assert!(
            events
                .iter()
                .any(|e| matches!(e, GameEvent::Clicked { id: cid, .. } if *cid == id))
        );
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, GameEvent::Expired { id: eid } if *eid == id))
        );
    }

    #[test]
    fn test_expired_target_click_is_noop() {
        let mut state = GameState::new(5, 0);
        let mut events = Vec::new();
        let interval = state.spawn_interval_ticks;
        run_ticks(&mut state, interval, &mut events);
        let id = state.targets[0].id;
        state.targets[0].ttl_ticks = 1;
        // Let it expire, then click the dead id
        run_ticks(&mut state, 2, &mut events);
        assert!(state.target(id).is_none());
        let score_before = state.score;
        let input = TickInput {
            click: Some(id),
            ..Default::default()
        };
        tick(&mut state, &input, &mut events);
        assert_eq!(state.score, score_before);
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, GameEvent::Clicked { id: cid, .. } if *cid == id))
        );
    }

    #[test]
    fn test_score_is_sum_of_clicked_points() {
        let mut state = GameState::new(9, 0);
        let mut events = Vec::new();
        let mut expected = 0u64;
        let interval = state.spawn_interval_ticks;
        for _ in 0..8 {
            run_ticks(&mut state, interval, &mut events);
            let target = state.targets.first().cloned();
            if let Some(t) = target {
                expected += u64::from(t.points);
                let input = TickInput {
                    click: Some(t.id),
                    ..Default::default()
                };
                tick(&mut state, &input, &mut events);
            }
        }
        assert_eq!(state.score, expected);
    }

    #[test]
    fn test_determinism() {
        let mut state1 = GameState::new(99_999, 0);
        let mut state2 = GameState::new(99_999, 0);
        let mut ev1 = Vec::new();
        let mut ev2 = Vec::new();
        let input = TickInput::default();
        for _ in 0..10 * TICKS_PER_SEC {
            tick(&mut state1, &input, &mut ev1);
            tick(&mut state2, &input, &mut ev2);
        }
        assert_eq!(ev1, ev2);
        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.score, state2.score);
        assert_eq!(state1.targets.len(), state2.targets.len());
        for (a, b) in state1.targets.iter().zip(&state2.targets) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.points, b.points);
            assert_eq!(a.pos, b.pos);
        }
    }

    proptest! {
        /// The live set never exceeds capacity, for any tick/click sequence
        #[test]
        fn prop_capacity_never_exceeded(
            seed in any::<u64>(),
            capacity in 1usize..16,
            clicks in prop::collection::vec(prop::option::of(1u32..64), 0..400),
        ) {
            let mut state = GameState::new(seed, 0);
            state.capacity = capacity;
            state.spawn_interval_ticks = 2;
            let mut events = Vec::new();
            for click in clicks {
                let input = TickInput { click, ..Default::default() };
                tick(&mut state, &input, &mut events);
                prop_assert!(state.live_count() <= capacity);
            }
        }

        /// Every spawned target sees exactly one terminal event
        #[test]
        fn prop_single_terminal_event(
            seed in any::<u64>(),
            clicks in prop::collection::vec(prop::option::of(1u32..32), 0..300),
        ) {
            let mut state = GameState::new(seed, 0);
            state.spawn_interval_ticks = 2;
            let mut events = Vec::new();
            for click in clicks {
                let input = TickInput { click, ..Default::default() };
                tick(&mut state, &input, &mut events);
            }
            // Drain the rest so everything still live expires
            let input = TickInput::default();
            for _ in 0..(16 * TICKS_PER_SEC) {
                tick(&mut state, &input, &mut events);
            }

            let mut terminals = std::collections::HashMap::new();
            for event in &events {
                match event {
                    GameEvent::Clicked { id, .. } | GameEvent::Expired { id } => {
                        *terminals.entry(*id).or_insert(0u32) += 1;
                    }
                    _ => {}
                }
            }
            for event in &events {
                if let GameEvent::Spawned { id } = event {
                    let count = terminals.get(id).copied().unwrap_or(0);
                    if state.target(*id).is_some() {
                        // Spawned during the drain and still live
                        prop_assert_eq!(count, 0);
                    } else {
                        prop_assert_eq!(count, 1);
                    }
                }
            }
        }
    }
}

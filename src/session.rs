//! Session-scoped game runtime
//!
//! One `GameSession` exists per signed-in user and owns everything the
//! session mutates: the sim state, the frame accumulator, and the queue of
//! pending ledger writes. Starting a new session replaces (drops) the old
//! one, which cancels every scheduled expiry by construction - deadlines
//! live inside the state being dropped.
//!
//! The session never performs I/O. Honored clicks become `SyncCommand`s the
//! platform glue drains and executes fire-and-forget; a failed write is
//! logged and dropped, the local score stands.

use crate::backend::types::{ScoreRow, Session, UserId, UserProfile};
use crate::config::Config;
use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::leaderboard::{ActivePlayer, LeaderboardDiffer, RankedEntry, active_players};
use crate::sim::{GameEvent, GameState, TickInput, Viewport, tick};
use std::collections::HashMap;

/// A pending write against the score ledger (best-effort, no retry queue)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncCommand {
    UpsertScore { user_id: UserId, score: u64 },
}

/// Per-session game runtime: sim state + input + pending ledger writes
pub struct GameSession {
    pub session: Session,
    pub state: GameState,
    pub input: TickInput,
    accumulator: f32,
    events: Vec<GameEvent>,
    pending: Vec<SyncCommand>,
}

impl GameSession {
    /// Start a session: fresh live set, local score seeded from the ledger
    /// read (zero when that read failed).
    pub fn start(session: Session, config: &Config, seed: u64, initial_score: u64) -> Self {
        let mut state = GameState::new(seed, initial_score);
        state.spawn_interval_ticks = config.spawn_interval_ticks();
        state.capacity = config.target_capacity;
        log::info!(
            "Session started for {} (seed {seed}, score {initial_score})",
            session.user_id
        );
        Self {
            session,
            state,
            input: TickInput::default(),
            accumulator: 0.0,
            events: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Honor a click right away: the target leaves the live set and the
    /// local score is credited before the ledger write is even scheduled,
    /// so a rapid double-click can never credit twice. A dead id is a no-op.
    pub fn click(&mut self, id: u32) {
        if let Some(outcome) = self.state.click(id) {
            self.events.push(GameEvent::Clicked {
                id,
                points: outcome.points,
                new_score: outcome.new_score,
            });
            self.pending.push(SyncCommand::UpsertScore {
                user_id: self.session.user_id.clone(),
                score: outcome.new_score,
            });
        }
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.input.viewport = Viewport { width, height };
    }

    pub fn score(&self) -> u64 {
        self.state.score
    }

    /// Advance the sim by wall-clock `dt`, running fixed substeps
    /// (accumulator pattern; capped to avoid spiral of death).
    pub fn frame(&mut self, dt: f32) {
        let dt = dt.min(0.1);
        self.accumulator += dt;

        let first_new = self.events.len();
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = self.input.clone();
            tick(&mut self.state, &input, &mut self.events);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // Clear one-shot inputs after processing
            self.input.click = None;
        }

        // Every honored click schedules a ledger write with the new total
        for event in &self.events[first_new..] {
            if let GameEvent::Clicked { new_score, .. } = event {
                self.pending.push(SyncCommand::UpsertScore {
                    user_id: self.session.user_id.clone(),
                    score: *new_score,
                });
            }
        }
    }

    /// Take the events accumulated since the last call (for animation)
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drain pending ledger writes, coalesced to the newest one. One user
    /// per session and upserts overwrite, so only the latest total needs to
    /// reach the ledger.
    pub fn drain_commands(&mut self) -> Vec<SyncCommand> {
        let latest = self.pending.pop();
        self.pending.clear();
        latest.into_iter().collect()
    }

    /// End the session, returning the final local score. Dropping `self`
    /// cancels all scheduled spawns and expiries.
    pub fn stop(self) -> u64 {
        log::info!(
            "Session stopped for {} (final score {})",
            self.session.user_id,
            self.state.score
        );
        self.state.score
    }
}

/// Debounced "leaderboard refresh needed" flag with single-flight semantics.
///
/// Two producers feed it: the fixed-interval poll timer and local score
/// writes. Concurrent triggers collapse into one fetch in flight.
#[derive(Debug)]
pub struct RefreshSignal {
    requested: bool,
    in_flight: bool,
    last_fetch_ms: f64,
    poll_interval_ms: f64,
}

impl RefreshSignal {
    pub fn new(poll_interval_ms: f64) -> Self {
        Self {
            // Fetch immediately on startup
            requested: true,
            in_flight: false,
            last_fetch_ms: f64::NEG_INFINITY,
            poll_interval_ms,
        }
    }

    /// Push producer: something changed locally, a refresh is wanted
    pub fn request(&mut self) {
        self.requested = true;
    }

    /// Poll producer: mark a refresh wanted when the interval has elapsed
    pub fn poll(&mut self, now_ms: f64) {
        if now_ms - self.last_fetch_ms >= self.poll_interval_ms {
            self.requested = true;
        }
    }

    /// Claim the pending request. Returns false while a fetch is in flight
    /// or nothing was requested; on true the caller must eventually call
    /// `finish`.
    pub fn begin(&mut self, now_ms: f64) -> bool {
        if self.in_flight || !self.requested {
            return false;
        }
        self.requested = false;
        self.in_flight = true;
        self.last_fetch_ms = now_ms;
        true
    }

    /// Mark the in-flight fetch done (success or failure)
    pub fn finish(&mut self) {
        self.in_flight = false;
    }
}

/// Leaderboard refresh driver: refresh signal + differ + current view
pub struct LeaderboardFeed {
    differ: LeaderboardDiffer,
    pub refresh: RefreshSignal,
    pub view: Vec<RankedEntry>,
    pub active: Vec<ActivePlayer>,
    activity_window_ms: f64,
    cps_fast_window_ms: f64,
}

impl LeaderboardFeed {
    pub fn new(config: &Config) -> Self {
        Self {
            differ: LeaderboardDiffer::new(),
            refresh: RefreshSignal::new(config.leaderboard_poll_ms),
            view: Vec::new(),
            active: Vec::new(),
            activity_window_ms: config.activity_window_ms,
            cps_fast_window_ms: config.cps_fast_window_ms,
        }
    }

    /// Local score write landed; ask for a refresh
    pub fn notify_local_change(&mut self) {
        self.refresh.request();
    }

    /// True when the caller should start a fetch now
    pub fn should_fetch(&mut self, now_ms: f64) -> bool {
        self.refresh.poll(now_ms);
        self.refresh.begin(now_ms)
    }

    /// Apply a fetched snapshot: diff, recompute activity, release the flag
    pub fn apply(
        &mut self,
        rows: &[ScoreRow],
        profiles: &HashMap<UserId, UserProfile>,
        now_ms: f64,
    ) {
        self.view = self.differ.reconcile(rows, profiles);
        self.active = active_players(
            &self.view,
            now_ms,
            self.activity_window_ms,
            self.cps_fast_window_ms,
        );
        self.refresh.finish();
    }

    /// A fetch failed; keep the stale view and release the flag
    pub fn fetch_failed(&mut self) {
        log::warn!("Leaderboard fetch failed, keeping stale view");
        self.refresh.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_session() -> Session {
        Session {
            user_id: UserId("user-1".into()),
            display_name: Some("Tester".into()),
            avatar_url: None,
            access_token: "tok".into(),
        }
    }

    fn run_seconds(game: &mut GameSession, secs: f32) {
        let frames = (secs / SIM_DT) as u32;
        for _ in 0..frames {
            game.frame(SIM_DT);
        }
    }

    #[test]
    fn test_click_schedules_upsert_with_new_total() {
        let config = Config::default();
        let mut game = GameSession::start(test_session(), &config, 77, 10);
        run_seconds(&mut game, 1.5);
        assert!(game.state.live_count() >= 1);

        let id = game.state.targets[0].id;
        let points = game.state.targets[0].points;
        game.click(id);
        game.frame(SIM_DT);

        let commands = game.drain_commands();
        assert_eq!(
            commands,
            vec![SyncCommand::UpsertScore {
                user_id: UserId("user-1".into()),
                score: 10 + u64::from(points),
            }]
        );
    }

    #[test]
    fn test_commands_coalesce_to_latest() {
        let config = Config::default();
        let mut game = GameSession::start(test_session(), &config, 12, 0);
        run_seconds(&mut game, 3.5);
        assert!(game.state.live_count() >= 3);

        for _ in 0..3 {
            let id = game.state.targets[0].id;
            game.click(id);
            game.frame(SIM_DT);
        }

        let commands = game.drain_commands();
        assert_eq!(commands.len(), 1);
        let SyncCommand::UpsertScore { score, .. } = &commands[0];
        assert_eq!(*score, game.score());
    }

    #[test]
    fn test_stop_drops_all_pending_expiries() {
        let config = Config::default();
        let mut game = GameSession::start(test_session(), &config, 5, 0);
        run_seconds(&mut game, 2.5);
        let final_score = game.stop();
        assert_eq!(final_score, 0);
        // Nothing left that could fire: the state is gone. A new session
        // starts from an empty live set.
        let fresh = GameSession::start(test_session(), &config, 6, 0);
        assert_eq!(fresh.state.live_count(), 0);
    }

    #[test]
    fn test_refresh_signal_single_flight() {
        let mut signal = RefreshSignal::new(2000.0);

        // Startup fetch
        assert!(signal.begin(0.0));
        // Both producers fire while in flight; nothing new may start
        signal.request();
        signal.poll(5000.0);
        assert!(!signal.begin(5000.0));

        signal.finish();
        // The collapsed request is served by exactly one fetch
        assert!(signal.begin(5000.0));
        signal.finish();
        assert!(!signal.begin(5100.0));
    }

    #[test]
    fn test_refresh_signal_poll_cadence() {
        let mut signal = RefreshSignal::new(2000.0);
        assert!(signal.begin(0.0));
        signal.finish();

        signal.poll(1000.0);
        assert!(!signal.begin(1000.0));
        signal.poll(2000.0);
        assert!(signal.begin(2000.0));
        signal.finish();
    }

    #[test]
    fn test_feed_applies_snapshot_and_recovers_from_failure() {
        let config = Config::default();
        let mut feed = LeaderboardFeed::new(&config);
        assert!(feed.should_fetch(0.0));

        let rows = vec![ScoreRow {
            user_id: UserId("a".into()),
            score: 5,
            changed_at_ms: 0.0,
        }];
        feed.apply(&rows, &HashMap::new(), 0.0);
        assert_eq!(feed.view.len(), 1);

        // Failure path releases the single-flight flag
        feed.notify_local_change();
        assert!(feed.should_fetch(10.0));
        feed.fetch_failed();
        assert_eq!(feed.view.len(), 1);
        feed.notify_local_change();
        assert!(feed.should_fetch(20.0));
    }
}

//! Orb Rush entry point
//!
//! Handles platform-specific initialization. On wasm32 this is the browser
//! glue: auth bootstrap, DOM rendering, and the requestAnimationFrame loop.
//! On native it runs a headless demo session against the in-memory ledger.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::spawn_local;
    use web_sys::{Document, Element, MouseEvent};

    use orb_rush::backend::auth::{
        authorize_url, clear_session, load_session, parse_auth_fragment, save_session,
    };
    use orb_rush::backend::{AuthProvider, RestClient, Session, UserId, UserProfile};
    use orb_rush::consts::PALETTE;
    use orb_rush::session::{GameSession, LeaderboardFeed, SyncCommand};
    use orb_rush::sim::{GameEvent, TargetKind};
    use orb_rush::Config;

    /// App instance holding all browser-side state
    struct App {
        config: Config,
        client: Rc<RestClient>,
        game: Option<GameSession>,
        feed: LeaderboardFeed,
        last_time: f64,
        board_dirty: bool,
    }

    impl App {
        fn new(config: Config, client: Rc<RestClient>) -> Self {
            let feed = LeaderboardFeed::new(&config);
            Self {
                config,
                client,
                game: None,
                feed,
                last_time: 0.0,
                board_dirty: false,
            }
        }
    }

    fn document() -> Document {
        web_sys::window().unwrap().document().unwrap()
    }

    /// Toggle an overlay/panel by id via the `hidden` class
    fn set_visible(id: &str, visible: bool) {
        if let Some(el) = document().get_element_by_id(id) {
            let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
        }
    }

    /// Read a backend setting the hosting page sets as a window global
    fn page_global(name: &str) -> Option<String> {
        let window = web_sys::window()?;
        js_sys::Reflect::get(&window, &JsValue::from_str(name))
            .ok()
            .and_then(|v| v.as_string())
            .filter(|s| !s.is_empty())
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Orb Rush starting...");

        let Some(base_url) = page_global("ORB_RUSH_BACKEND_URL") else {
            log::error!("ORB_RUSH_BACKEND_URL not set on the page; cannot start");
            return;
        };
        let Some(anon_key) = page_global("ORB_RUSH_ANON_KEY") else {
            log::error!("ORB_RUSH_ANON_KEY not set on the page; cannot start");
            return;
        };

        let config = Config::load();
        let client = Rc::new(RestClient::new(base_url.clone(), anon_key.clone()));

        // Hide loading indicator
        set_visible("loading", false);

        // Session bootstrap: a fresh OAuth redirect carries the token in the
        // URL fragment; otherwise fall back to the cached session. Any
        // failure routes to the login surface.
        let session = match bootstrap_session(&client).await {
            Some(session) => Some(session),
            None => load_session(),
        };

        // Signed-in requests carry the user's token for row-level security
        let client = match &session {
            Some(session) => Rc::new(
                RestClient::new(base_url, anon_key)
                    .with_access_token(session.access_token.clone()),
            ),
            None => client,
        };

        let app = Rc::new(RefCell::new(App::new(config, client.clone())));

        setup_login_buttons(client.base_url().to_owned());
        setup_signout_button(app.clone());
        setup_click_handler(app.clone());

        match session {
            Some(session) => start_game(app.clone(), session).await,
            None => show_login(),
        }

        request_animation_frame(app);

        log::info!("Orb Rush running!");
    }

    /// Handle a returning OAuth redirect: parse the fragment token, resolve
    /// the user behind it, cache the session, and scrub the URL.
    async fn bootstrap_session(client: &RestClient) -> Option<Session> {
        let window = web_sys::window()?;
        let fragment = window.location().hash().ok()?;
        let token = parse_auth_fragment(&fragment)?;

        // Remove the token from the address bar
        if let Ok(history) = window.history() {
            let _ = history.replace_state_with_url(&JsValue::NULL, "", Some("./"));
        }

        match client.auth_user(&token).await {
            Ok(session) => {
                save_session(&session);
                Some(session)
            }
            Err(err) => {
                log::warn!("Auth user fetch failed, treating as signed out: {err}");
                None
            }
        }
    }

    fn show_login() {
        set_visible("login", true);
        set_visible("game-area", false);
        set_visible("hud", false);
    }

    async fn start_game(app: Rc<RefCell<App>>, session: Session) {
        let client = app.borrow().client.clone();

        // Directory upsert is idempotent and best-effort
        if session.display_name.is_some() {
            let client = client.clone();
            let profile = session.profile();
            spawn_local(async move {
                if let Err(err) = client.upsert_user(&profile).await {
                    log::warn!("User upsert failed: {err}");
                }
            });
        }

        // Seed the local score from the ledger; zero when the read fails
        let initial_score = match client.get_score(&session.user_id).await {
            Ok(score) => score.unwrap_or(0),
            Err(err) => {
                log::warn!("Score read failed, starting from 0: {err}");
                0
            }
        };

        {
            let mut app = app.borrow_mut();
            let seed = js_sys::Date::now() as u64;
            // Replacing any previous session drops its live set and timers
            let game = GameSession::start(session, &app.config, seed, initial_score);
            if let Some(el) = document().get_element_by_id("hud-name") {
                el.set_text_content(Some(game.session.name()));
            }
            app.game = Some(game);
        }

        set_visible("login", false);
        set_visible("game-area", true);
        set_visible("hud", true);
        clear_target_elements();
        update_score_hud(&app);
    }

    fn setup_login_buttons(base_url: String) {
        for (button_id, provider) in [
            ("login-discord", AuthProvider::Discord),
            ("login-google", AuthProvider::Google),
        ] {
            let base_url = base_url.clone();
            if let Some(btn) = document().get_element_by_id(button_id) {
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                    let window = web_sys::window().unwrap();
                    let origin = window.location().origin().unwrap_or_default();
                    let url = authorize_url(&base_url, provider, &origin);
                    log::info!("Signing in with {}...", provider.as_str());
                    let _ = window.location().assign(&url);
                });
                let _ =
                    btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }
    }

    fn setup_signout_button(app: Rc<RefCell<App>>) {
        if let Some(btn) = document().get_element_by_id("signout-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut app = app.borrow_mut();
                if let Some(game) = app.game.take() {
                    // Drops the live set and every pending expiry with it
                    game.stop();
                }
                clear_session();
                clear_target_elements();
                show_login();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// One delegated click handler on the game area; each target element
    /// carries its entity id in a data attribute.
    fn setup_click_handler(app: Rc<RefCell<App>>) {
        if let Some(area) = document().get_element_by_id("game-area") {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let Some(target) = event
                    .target()
                    .and_then(|t| t.dyn_into::<Element>().ok())
                    .and_then(|el| el.closest("[data-target-id]").ok().flatten())
                else {
                    return;
                };
                let Some(id) = target
                    .get_attribute("data-target-id")
                    .and_then(|s| s.parse::<u32>().ok())
                else {
                    return;
                };
                let mut app = app.borrow_mut();
                if let Some(game) = app.game.as_mut() {
                    game.click(id);
                }
            });
            let _ =
                area.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            frame(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame(app: Rc<RefCell<App>>, time: f64) {
        let now_ms = js_sys::Date::now();
        let mut commands: Vec<SyncCommand> = Vec::new();
        let mut events: Vec<GameEvent> = Vec::new();

        {
            let mut app_ref = app.borrow_mut();
            let dt = if app_ref.last_time > 0.0 {
                ((time - app_ref.last_time) / 1000.0) as f32
            } else {
                0.0
            };
            app_ref.last_time = time;

            if let Some(game) = app_ref.game.as_mut() {
                let window = web_sys::window().unwrap();
                let width = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(1280.0);
                let height = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(720.0);
                game.set_viewport(width as f32, height as f32);

                game.frame(dt);
                events = game.take_events();
                commands = game.drain_commands();
            }
        }

        if !events.is_empty() {
            apply_events(&app, &events);
        }
        for command in commands {
            dispatch_command(&app, command);
        }
        drive_leaderboard(&app, now_ms);

        {
            let mut app_ref = app.borrow_mut();
            if app_ref.board_dirty {
                app_ref.board_dirty = false;
                let you = app_ref
                    .game
                    .as_ref()
                    .map(|g| g.session.user_id.clone());
                render_leaderboard(&app_ref.feed, you.as_ref());
            }
        }

        request_animation_frame(app);
    }

    /// Sync the DOM with this frame's sim events
    fn apply_events(app: &Rc<RefCell<App>>, events: &[GameEvent]) {
        let mut score_changed = false;
        for event in events {
            match event {
                GameEvent::Spawned { id } => spawn_target_element(app, *id),
                GameEvent::Expired { id } => remove_target_element(*id),
                GameEvent::Clicked { id, .. } => {
                    remove_target_element(*id);
                    score_changed = true;
                }
                GameEvent::SpawnSkipped => {
                    log::debug!("At capacity, spawn dropped");
                }
            }
        }
        if score_changed {
            update_score_hud(app);
        }
    }

    fn spawn_target_element(app: &Rc<RefCell<App>>, id: u32) {
        let app_ref = app.borrow();
        let Some(game) = app_ref.game.as_ref() else {
            return;
        };
        let Some(target) = game.state.target(id) else {
            return;
        };
        let document = document();
        let Some(area) = document.get_element_by_id("game-area") else {
            return;
        };
        let Ok(el) = document.create_element("div") else {
            return;
        };
        el.set_class_name(&format!("target target-{}", target.kind.as_str()));
        let _ = el.set_attribute("data-target-id", &id.to_string());
        let _ = el.set_attribute(
            "style",
            &format!(
                "left:{}px;top:{}px;width:{}px;height:{}px;background:{};",
                target.pos.x,
                target.pos.y,
                target.size,
                target.size,
                PALETTE[target.color],
            ),
        );
        let icon = match target.kind {
            TargetKind::Normal => "\u{1F3AF}",
            TargetKind::Big => "\u{1F525}",
            TargetKind::Bonus => "\u{26A1}",
        };
        el.set_text_content(Some(&format!("{icon} +{}", target.points)));
        let _ = area.append_child(&el);
    }

    fn remove_target_element(id: u32) {
        let selector = format!("[data-target-id=\"{id}\"]");
        if let Ok(Some(el)) = document().query_selector(&selector) {
            el.remove();
        }
    }

    fn clear_target_elements() {
        if let Some(area) = document().get_element_by_id("game-area") {
            area.set_inner_html("");
        }
    }

    fn update_score_hud(app: &Rc<RefCell<App>>) {
        let app_ref = app.borrow();
        if let Some(game) = app_ref.game.as_ref() {
            if let Some(el) = document().get_element_by_id("hud-score") {
                el.set_text_content(Some(&game.score().to_string()));
            }
        }
    }

    /// Execute a pending ledger write fire-and-forget; on failure the local
    /// score stands and we just log.
    fn dispatch_command(app: &Rc<RefCell<App>>, command: SyncCommand) {
        let SyncCommand::UpsertScore { user_id, score } = command;
        let client = app.borrow().client.clone();
        // Local change is one of the two refresh producers
        app.borrow_mut().feed.notify_local_change();
        spawn_local(async move {
            if let Err(err) = client.upsert_score(&user_id, score).await {
                log::warn!("Score write failed (score not saved this click): {err}");
            }
        });
    }

    /// Poll producer + single-flight fetch of the top-N snapshot
    fn drive_leaderboard(app: &Rc<RefCell<App>>, now_ms: f64) {
        let should_fetch = app.borrow_mut().feed.should_fetch(now_ms);
        if !should_fetch {
            return;
        }
        let client = app.borrow().client.clone();
        let top_n = app.borrow().config.top_n;
        let app = app.clone();
        spawn_local(async move {
            match client.top_scores(top_n).await {
                Ok(rows) => {
                    let ids: Vec<UserId> = rows.iter().map(|r| r.user_id.clone()).collect();
                    // Missing profiles degrade to placeholder names
                    let profiles: HashMap<UserId, UserProfile> =
                        match client.profiles(&ids).await {
                            Ok(list) => list.into_iter().map(|p| (p.id.clone(), p)).collect(),
                            Err(err) => {
                                log::warn!("Profile fetch failed: {err}");
                                HashMap::new()
                            }
                        };
                    let mut app = app.borrow_mut();
                    app.feed.apply(&rows, &profiles, js_sys::Date::now());
                    app.board_dirty = true;
                }
                Err(err) => {
                    log::warn!("Leaderboard fetch failed: {err}");
                    app.borrow_mut().feed.fetch_failed();
                }
            }
        });
    }

    /// Rebuild the leaderboard list: rank icon, name, score, and the CSS
    /// hooks the rank-change/active animations key off
    fn render_leaderboard(feed: &LeaderboardFeed, you: Option<&UserId>) {
        let document = document();
        let Some(list) = document.get_element_by_id("leaderboard") else {
            return;
        };
        list.set_inner_html("");

        for entry in &feed.view {
            let Ok(li) = document.create_element("li") else {
                continue;
            };
            let is_active = feed.active.iter().any(|p| p.user_id == entry.user_id);
            let mut class = format!("entry rank-{}", entry.change.as_str());
            if is_active {
                class.push_str(" active");
            }
            if you == Some(&entry.user_id) {
                class.push_str(" you");
            }
            li.set_class_name(&class);

            let rank_icon = match entry.rank {
                1 => "\u{1F947}".to_owned(),
                2 => "\u{1F948}".to_owned(),
                3 => "\u{1F949}".to_owned(),
                n => n.to_string(),
            };
            let delta = if entry.score_delta > 0 {
                format!(" (+{})", entry.score_delta)
            } else {
                String::new()
            };
            li.set_text_content(Some(&format!(
                "{rank_icon} {} \u{2014} {}{delta}",
                entry.name, entry.score
            )));
            let _ = list.append_child(&li);
        }

        if let Some(el) = document.get_element_by_id("active-count") {
            el.set_text_content(Some(&feed.active.len().to_string()));
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_app::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Orb Rush (native) starting...");
    demo::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless demo: a scripted session against the in-memory ledger.
#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::collections::HashMap;

    use orb_rush::backend::types::{Session, UserId, UserProfile};
    use orb_rush::backend::MemoryLedger;
    use orb_rush::consts::SIM_DT;
    use orb_rush::session::{GameSession, LeaderboardFeed, SyncCommand};
    use orb_rush::Config;

    pub fn run() {
        let config = Config::default();
        let mut ledger = MemoryLedger::new();

        // A couple of rival players already on the board
        for (id, name, score) in [("bot-ada", "Ada", 40u64), ("bot-lin", "Lin", 25)] {
            let user = UserId(id.into());
            ledger.upsert_score(&user, score, 0.0);
            ledger.upsert_user(UserProfile {
                id: user,
                name: Some(name.into()),
                avatar_url: None,
            });
        }

        let session = Session {
            user_id: UserId("demo-player".into()),
            display_name: Some("Demo Player".into()),
            avatar_url: None,
            access_token: String::new(),
        };
        let initial_score = ledger.get_score(&session.user_id).unwrap_or(0);
        let mut game = GameSession::start(session, &config, 0xC11C5, initial_score);
        let mut feed = LeaderboardFeed::new(&config);

        // Simulate 20 seconds; click the oldest live target twice a second
        let mut now_ms = 0.0f64;
        let total_frames = (20.0 / SIM_DT) as u32;
        for frame in 0..total_frames {
            game.frame(SIM_DT);
            now_ms += f64::from(SIM_DT) * 1000.0;

            if frame % 30 == 0 {
                if let Some(target) = game.state.targets.first() {
                    let id = target.id;
                    game.click(id);
                }
            }

            for command in game.drain_commands() {
                let SyncCommand::UpsertScore { user_id, score } = command;
                ledger.upsert_score(&user_id, score, now_ms);
                feed.notify_local_change();
            }

            if feed.should_fetch(now_ms) {
                let rows = ledger.top_scores(config.top_n);
                let ids: Vec<UserId> = rows.iter().map(|r| r.user_id.clone()).collect();
                let profiles: HashMap<UserId, UserProfile> = ledger.profiles(&ids);
                feed.apply(&rows, &profiles, now_ms);
            }
        }

        println!("\nFinal leaderboard after 20s:");
        for entry in &feed.view {
            let marker = match entry.change.as_str() {
                "up" => "^",
                "down" => "v",
                _ => " ",
            };
            println!(
                "  {:>2}. {marker} {:<12} {:>5}  (delta {:+})",
                entry.rank, entry.name, entry.score, entry.score_delta
            );
        }
        let final_score = game.stop();
        println!("Demo player final score: {final_score}");
    }
}

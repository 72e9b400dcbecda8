//! Star Invaders entry point
//!
//! On the web this wires the engine to `<canvas id="stars">`, the DOM and
//! the network. Natively it runs a short headless demo.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{Element, HtmlCanvasElement, KeyboardEvent, MouseEvent};

    use star_invaders::audio::AudioManager;
    use star_invaders::engine::Effect;
    use star_invaders::platform::hud::Hud;
    use star_invaders::platform::storage::{CookieStore, LocalStore};
    use star_invaders::platform::{
        CHROME_SELECTOR, FORM_SELECTOR, GAME_MIN_WIDTH_QUERY, REDUCED_MOTION_QUERY, net,
    };
    use star_invaders::renderer::starfield::STAR_COUNT;
    use star_invaders::renderer::{AmbientDrift, CanvasSurface, Starfield};
    use star_invaders::sim::{KeyInput, TickInput};
    use star_invaders::{Engine, EngineConfig};

    /// Everything the page loop owns
    struct Game {
        engine: Engine,
        surface: CanvasSurface,
        stars: Starfield,
        hud: Hud,
        /// Only the game page has sound
        audio: Option<AudioManager>,
        /// Touch screens wander instead of following a pointer
        drift: Option<AmbientDrift>,
        /// Wide enough for the game (otherwise starfield only)
        enabled: bool,
        pointer: Option<Vec2>,
    }

    impl Game {
        fn viewport() -> Vec2 {
            let Some(window) = web_sys::window() else {
                return Vec2::ZERO;
            };
            let dim = |v: Result<JsValue, JsValue>| {
                v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as f32
            };
            Vec2::new(dim(window.inner_width()), dim(window.inner_height()))
        }

        fn frame(&mut self, now: f64) -> Vec<Effect> {
            let size = Self::viewport();
            self.surface.resize(size.x as u32, size.y as u32);
            self.engine.resize(size.x, size.y);

            if let Some(drift) = self.drift.as_mut() {
                self.stars.look = drift.next(size);
            }

            let input = TickInput {
                pointer: self.pointer,
            };
            let effects = self.engine.frame(&input, now);
            self.engine.draw(&mut self.surface, &self.stars, now);
            self.hud.update(&self.engine.hud());

            if let Some(audio) = self.audio.as_mut() {
                audio.apply_settings(self.engine.settings());
                for effect in &effects {
                    if let Effect::Sound(sound) = effect {
                        audio.play(*sound);
                    }
                }
                audio.sync_music(self.engine.music_should_play());
            }
            effects
        }

        /// Audio can only start after a user gesture
        fn wake_audio(&self) {
            if let Some(audio) = &self.audio {
                audio.resume();
            }
        }
    }

    fn now() -> f64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or_else(js_sys::Date::now)
    }

    fn target_within(event: &web_sys::Event, selector: &str) -> bool {
        event
            .target()
            .and_then(|t| t.dyn_into::<Element>().ok())
            .and_then(|el| el.closest(selector).ok().flatten())
            .is_some()
    }

    /// Dedicated game page: no content in `main#content`
    fn is_game_page(document: &web_sys::Document) -> bool {
        match document.query_selector("main#content").ok().flatten() {
            Some(main) => main.child_element_count() == 0,
            None => true,
        }
    }

    fn decode_key(event: &KeyboardEvent) -> KeyInput {
        let key = event.key();
        if event.ctrl_key() && key.eq_ignore_ascii_case("g") {
            return KeyInput::HardReset;
        }
        match key.as_str() {
            " " => KeyInput::Space,
            "Enter" => KeyInput::Enter,
            "Backspace" => KeyInput::Backspace,
            _ => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyInput::Char(c),
                    _ => KeyInput::Other,
                }
            }
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            return;
        }

        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        let Some(canvas) = document
            .get_element_by_id("stars")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::info!("No #stars canvas, nothing to do");
            return;
        };
        let Some(surface) = CanvasSurface::new(canvas.clone()) else {
            log::warn!("Canvas has no 2D context, staying off");
            return;
        };
        // Clicks fall through to the page
        canvas.style().set_property("pointer-events", "none").ok();

        let media_matches = |query: &str| {
            window
                .match_media(query)
                .ok()
                .flatten()
                .is_some_and(|mq| mq.matches())
        };
        let enabled = media_matches(GAME_MIN_WIDTH_QUERY);
        let reduced_motion = media_matches(REDUCED_MOTION_QUERY);
        let game_page = is_game_page(&document);
        let touch = js_sys::Reflect::has(&window, &JsValue::from_str("ontouchstart")).unwrap_or(false);

        let size = Game::viewport();
        let seed = js_sys::Date::now() as u64;
        let config = EngineConfig {
            game_page,
            width: size.x,
            height: size.y,
            seed,
        };
        let mut engine = Engine::new(
            config,
            Box::new(LocalStore::open()),
            Box::new(CookieStore::open()),
            now(),
        );
        if reduced_motion {
            engine.prefer_reduced_motion();
        }
        log::info!(
            "Star Invaders ready (game page: {game_page}, enabled: {enabled}, seed: {seed})"
        );

        let mut stars = Starfield::new(STAR_COUNT, seed);
        stars.look = size / 2.0;
        let drift = touch.then(AmbientDrift::default);

        let game = Rc::new(RefCell::new(Game {
            engine,
            surface,
            stars,
            hud: Hud::new(document.clone()),
            audio: game_page.then(AudioManager::new),
            drift,
            enabled,
            pointer: None,
        }));

        setup_input_handlers(&document, game.clone());
        request_animation_frame(game);
    }

    fn setup_input_handlers(document: &web_sys::Document, game: Rc<RefCell<Game>>) {
        // Pointer position
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                let pos = Vec2::new(event.client_x() as f32, event.client_y() as f32);
                g.stars.look = pos;
                if g.enabled {
                    g.pointer = Some(pos);
                }
            });
            let _ = document
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Click: pause button, or shoot unless it landed on page chrome
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                if !g.enabled {
                    return;
                }
                g.wake_audio();
                if target_within(&event, "#game-pause") {
                    g.engine.toggle_pause(now());
                    return;
                }
                if target_within(&event, CHROME_SELECTOR) {
                    return;
                }
                g.engine.shoot();
            });
            let _ = document
                .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                if !g.enabled {
                    return;
                }
                let key = decode_key(&event);
                // Space on a form control keeps its meaning while playing
                if key == KeyInput::Space
                    && !g.engine.state().is_game_over()
                    && target_within(&event, FORM_SELECTOR)
                {
                    return;
                }
                g.wake_audio();
                let over = g.engine.state().is_game_over();
                if g.engine.key(key, now()) || over {
                    event.prevent_default();
                }
            });
            let _ = document
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Run network effects; sounds are handled inside the frame
    fn dispatch(game: &Rc<RefCell<Game>>, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::FetchLeaderboard { epoch } => {
                    let game = game.clone();
                    wasm_bindgen_futures::spawn_local(async move {
                        let result = net::fetch_leaderboard().await;
                        game.borrow_mut().engine.on_leaderboard_loaded(epoch, result);
                    });
                }
                Effect::SubmitScore { epoch, request } => {
                    let game = game.clone();
                    wasm_bindgen_futures::spawn_local(async move {
                        let result = net::submit_score(&request).await;
                        game.borrow_mut().engine.on_score_submitted(epoch, result);
                    });
                }
                Effect::Sound(_) => {}
            }
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        let effects = game.borrow_mut().frame(time);
        dispatch(&game, effects);
        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Star Invaders (native) starting headless demo...");
    log::info!("The playable version is the wasm build");
    demo::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Scripted run against an in-memory store
#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use glam::Vec2;

    use star_invaders::engine::Effect;
    use star_invaders::persistence::{MemoryStore, NullStore};
    use star_invaders::sim::{KeyInput, TickInput};
    use star_invaders::{Engine, EngineConfig};

    const FRAME_MS: f64 = 1000.0 / 60.0;
    const FRAMES: u32 = 60 * 120;

    pub fn run() {
        let config = EngineConfig {
            game_page: true,
            seed: 42,
            ..EngineConfig::default()
        };
        let mut engine = Engine::new(config, Box::new(MemoryStore::new()), Box::new(NullStore), 0.0);

        let mut shots = 0u32;
        let mut submitted = false;
        for frame in 0..FRAMES {
            let now = frame as f64 * FRAME_MS;
            // Sweep the ship along the bottom
            let x = 400.0 + (frame as f32 * 0.02).sin() * 300.0;
            let input = TickInput {
                pointer: Some(Vec2::new(x, 540.0)),
            };
            for effect in engine.frame(&input, now) {
                match effect {
                    Effect::FetchLeaderboard { epoch } => {
                        engine.on_leaderboard_loaded(epoch, Ok(Vec::new()));
                        for c in "DEMO".chars() {
                            engine.key(KeyInput::Char(c), now);
                        }
                        engine.key(KeyInput::Enter, now);
                    }
                    Effect::SubmitScore { request, .. } => {
                        log::info!("Would submit {} for {}", request.score, request.name);
                        submitted = true;
                    }
                    Effect::Sound(_) => {}
                }
            }
            if frame % 6 == 0 && engine.shoot() {
                shots += 1;
            }
            if submitted {
                break;
            }
        }

        let hud = engine.hud();
        log::info!(
            "Demo finished: {shots} shots, score {}, level {}, lives {}",
            hud.score,
            hud.level,
            hud.lives
        );
    }
}

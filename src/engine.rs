//! Frame driver
//!
//! `Engine` owns the `GameState`, the settings and both stores. Every repaint
//! the host calls `frame`, which ticks the simulation, drains the events the
//! tick raised, persists when the run changed and hands back the side effects
//! (network requests, sounds) the host has to carry out.

use crate::audio::SoundEffect;
use crate::consts::*;
use crate::error::NetworkError;
use crate::highscores::{LeaderboardEntry, ScoresResponse, SubmitRequest};
use crate::persistence::{KeyValueStore, load_identity, save_identity};
use crate::persistence::snapshot::{load_snapshot, save_snapshot};
use crate::renderer::{Starfield, Surface, draw_frame};
use crate::settings::Settings;
use crate::sim::{GameEvent, GameState, KeyInput, TickInput, gameover, shoot, tick};

/// Per-page facts supplied by the host
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Dedicated game page: leaderboard, name entry, countdown and audio
    pub game_page: bool,
    pub width: f32,
    pub height: f32,
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            game_page: false,
            width: 800.0,
            height: 600.0,
            seed: 0,
        }
    }
}

/// Work the host performs on the engine's behalf
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// GET the board, then call `on_leaderboard_loaded` with `epoch`
    FetchLeaderboard { epoch: u32 },
    /// POST the score, then call `on_score_submitted` with `epoch`
    SubmitScore { epoch: u32, request: SubmitRequest },
    Sound(SoundEffect),
}

/// Readouts for the page around the canvas
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HudView {
    /// Hidden until the pointer arms the game
    pub visible: bool,
    pub score: u64,
    pub level: u32,
    pub lives: u8,
    pub paused: bool,
    pub game_over: bool,
    pub muted: bool,
}

impl HudView {
    pub fn level_text(&self) -> String {
        format!("Level {}", self.level)
    }

    pub fn pause_glyph(&self) -> &'static str {
        if self.paused { "\u{25B6}" } else { "\u{23F8}" }
    }

    pub fn pause_hint(&self) -> &'static str {
        if self.paused {
            "Space Resume"
        } else {
            "Space Pause"
        }
    }

    pub fn mute_glyph(&self) -> &'static str {
        if self.muted { "\u{1F507}" } else { "\u{1F50A}" }
    }
}

pub struct Engine {
    state: GameState,
    settings: Settings,
    /// Snapshot, settings and identity
    store: Box<dyn KeyValueStore>,
    /// Identity fallback
    cookies: Box<dyn KeyValueStore>,
    last_heartbeat: f64,
    effects: Vec<Effect>,
}

impl Engine {
    /// Build the engine and pick up whatever the stores remember
    pub fn new(
        config: EngineConfig,
        store: Box<dyn KeyValueStore>,
        cookies: Box<dyn KeyValueStore>,
        now: f64,
    ) -> Self {
        let mut state = GameState::new(config.width, config.height, config.game_page, config.seed);
        state.identity = load_identity(store.as_ref(), cookies.as_ref());
        let settings = Settings::load(store.as_ref());

        match load_snapshot(store.as_ref()) {
            Ok(Some(snapshot)) => snapshot.restore(&mut state, now),
            Ok(None) => log::info!("No saved run, starting fresh"),
            Err(err) => log::warn!("Ignoring saved run: {err}"),
        }
        // Restoring raises events that only mirror what is already stored
        state.events.clear();

        Self {
            state,
            settings,
            store,
            cookies,
            last_heartbeat: now,
            effects: Vec::new(),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// System asks for reduced motion. Layers on top of the stored choice.
    pub fn prefer_reduced_motion(&mut self) {
        if !self.settings.reduced_motion {
            log::info!("Reduced motion requested by the system");
            self.settings.reduced_motion = true;
        }
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.state.width = width;
        self.state.height = height;
    }

    /// One repaint: tick, react, persist. Returns the host's work.
    pub fn frame(&mut self, input: &TickInput, now: f64) -> Vec<Effect> {
        tick(&mut self.state, input, now);
        self.process_events();

        if self.state.is_active() && now - self.last_heartbeat >= HEARTBEAT_MS {
            self.last_heartbeat = now;
            self.persist_run();
        }
        self.take_effects()
    }

    /// Effects raised by input handlers since the last frame
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    /// Pointer click
    pub fn shoot(&mut self) -> bool {
        let fired = shoot(&mut self.state);
        self.process_events();
        fired
    }

    pub fn toggle_pause(&mut self, now: f64) {
        self.state.toggle_pause(now);
        self.process_events();
    }

    /// Key press. Returns true when the key was used (the host then
    /// suppresses the browser default).
    pub fn key(&mut self, key: KeyInput, now: f64) -> bool {
        let consumed = match key {
            KeyInput::HardReset => {
                gameover::restart(&mut self.state, now);
                true
            }
            _ if self.state.is_game_over() => gameover::handle_key(&mut self.state, key, now),
            KeyInput::Space => {
                self.state.toggle_pause(now);
                true
            }
            KeyInput::Char('m' | 'M') if self.state.game_page => {
                let muted = self.settings.toggle_mute();
                self.state.events.push(GameEvent::MuteChanged(muted));
                true
            }
            _ => false,
        };
        self.process_events();
        consumed
    }

    pub fn on_leaderboard_loaded(
        &mut self,
        epoch: u32,
        result: Result<Vec<LeaderboardEntry>, NetworkError>,
    ) {
        gameover::on_leaderboard(&mut self.state, epoch, result);
        self.process_events();
    }

    pub fn on_score_submitted(&mut self, epoch: u32, result: Result<ScoresResponse, NetworkError>) {
        gameover::on_submitted(&mut self.state, epoch, result);
        self.process_events();
    }

    /// Loop only while actually playing on the game page
    pub fn music_should_play(&self) -> bool {
        self.state.game_page && self.state.is_active() && !self.settings.muted
    }

    fn sfx_enabled(&self) -> bool {
        self.state.game_page && !self.settings.muted
    }

    pub fn hud(&self) -> HudView {
        HudView {
            visible: self.state.is_armed(),
            score: self.state.run.score,
            level: self.state.level(),
            lives: self.state.run.lives,
            paused: self.state.clock.is_paused(),
            game_over: self.state.is_game_over(),
            muted: self.settings.muted,
        }
    }

    pub fn draw(&self, surface: &mut dyn Surface, stars: &Starfield, now: f64) {
        draw_frame(surface, &self.state, stars, &self.settings, now);
    }

    /// React to everything the simulation raised
    fn process_events(&mut self) {
        let events = std::mem::take(&mut self.state.events);
        if events.is_empty() {
            return;
        }
        let mut dirty = false;

        for event in &events {
            dirty |= event.changes_run();
            if self.sfx_enabled() {
                if let Some(effect) = SoundEffect::for_event(event) {
                    self.effects.push(Effect::Sound(effect));
                }
            }
            match event {
                GameEvent::FetchLeaderboard { epoch } => {
                    self.effects.push(Effect::FetchLeaderboard { epoch: *epoch });
                }
                GameEvent::SubmitScore { epoch, name, score } => {
                    let request = SubmitRequest {
                        name: name.clone(),
                        score: *score,
                        token: self.state.identity.token.clone(),
                    };
                    self.effects.push(Effect::SubmitScore {
                        epoch: *epoch,
                        request,
                    });
                }
                GameEvent::IdentityChanged => self.persist_identity(),
                GameEvent::MuteChanged(muted) => {
                    log::info!("Audio {}", if *muted { "muted" } else { "unmuted" });
                    if let Err(err) = self.settings.save(self.store.as_mut()) {
                        log::warn!("Failed to save settings: {err}");
                    }
                }
                GameEvent::NukeDetonated { destroyed, points } => {
                    log::debug!("Nuke destroyed {destroyed} aliens for {points} points");
                }
                _ => {}
            }
        }

        if dirty {
            self.persist_run();
        }
    }

    fn persist_run(&mut self) {
        if let Err(err) = save_snapshot(self.store.as_mut(), &self.state) {
            log::warn!("Failed to save run: {err}");
        }
    }

    fn persist_identity(&mut self) {
        if let Err(err) = save_identity(self.store.as_mut(), self.cookies.as_mut(), &self.state.identity)
        {
            log::warn!("Failed to save player identity: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use glam::Vec2;

    use super::*;
    use crate::error::StorageError;
    use crate::persistence::{IDENTITY_KEY, MemoryStore, NullStore, SNAPSHOT_KEY};
    use crate::sim::{AlienKind, GamePhase, Stage};

    /// Memory store that counts snapshot writes
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        snapshot_writes: Rc<Cell<usize>>,
    }

    impl KeyValueStore for CountingStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            if key == SNAPSHOT_KEY {
                self.snapshot_writes.set(self.snapshot_writes.get() + 1);
            }
            self.inner.set(key, value)
        }
    }

    fn config(game_page: bool) -> EngineConfig {
        EngineConfig {
            game_page,
            seed: 5,
            ..EngineConfig::default()
        }
    }

    fn engine(game_page: bool) -> Engine {
        Engine::new(
            config(game_page),
            Box::new(MemoryStore::new()),
            Box::new(MemoryStore::new()),
            0.0,
        )
    }

    fn pointer() -> TickInput {
        TickInput {
            pointer: Some(Vec2::new(400.0, 500.0)),
        }
    }

    fn copy_key(from: &dyn KeyValueStore, key: &str) -> MemoryStore {
        let mut store = MemoryStore::new();
        if let Some(value) = from.get(key).unwrap() {
            store.set(key, &value).unwrap();
        }
        store
    }

    #[test]
    fn test_snapshot_round_trip_through_fresh_engine() {
        let mut first = engine(true);
        first.frame(&pointer(), 0.0);
        first.state.run.score = 73;
        first.state.run.lives = 3;
        first.state.run.dual_shot = true;
        for (kind, x) in [
            (AlienKind::Grunt, 100.0),
            (AlienKind::Grunt, 200.0),
            (AlienKind::Gunner, 300.0),
            (AlienKind::Healer, 400.0),
        ] {
            crate::sim::spawn::place(&mut first.state, kind, Vec2::new(x, 50.0), 0.0);
        }
        first.persist_run();

        let store = copy_key(first.store(), SNAPSHOT_KEY);
        let second = Engine::new(config(true), Box::new(store), Box::new(NullStore), 10.0);
        let run = &second.state().run;
        assert_eq!((run.score, run.lives, run.dual_shot, run.power_shot), (73, 3, true, false));
        let entities = &second.state().entities;
        assert_eq!(entities.live_count(AlienKind::Grunt), 2);
        assert_eq!(entities.live_count(AlienKind::Gunner), 1);
        assert_eq!(entities.live_count(AlienKind::Healer), 1);
    }

    #[test]
    fn test_heartbeat_only_while_active() {
        let store = CountingStore::default();
        let writes = store.snapshot_writes.clone();
        let mut engine = Engine::new(config(false), Box::new(store), Box::new(NullStore), 0.0);

        // Not armed yet: no heartbeat
        engine.frame(&TickInput::default(), 6000.0);
        assert_eq!(writes.get(), 0);

        // Arming frame is already 5 s past construction
        engine.frame(&pointer(), 6001.0);
        assert_eq!(writes.get(), 1);
        engine.frame(&pointer(), 11_000.0);
        assert_eq!(writes.get(), 1);
        engine.frame(&pointer(), 11_001.0);
        assert_eq!(writes.get(), 2);

        // Pausing persists once, then no heartbeats while paused
        engine.toggle_pause(11_002.0);
        assert_eq!(writes.get(), 3);
        engine.frame(&pointer(), 30_000.0);
        assert_eq!(writes.get(), 3);
    }

    #[test]
    fn test_scoring_persists_in_the_same_frame() {
        let store = CountingStore::default();
        let writes = store.snapshot_writes.clone();
        let mut engine = Engine::new(config(false), Box::new(store), Box::new(NullStore), 0.0);
        engine.frame(&pointer(), 0.0);

        crate::sim::spawn::place(&mut engine.state, AlienKind::Grunt, Vec2::new(400.0, 470.0), 0.0);
        assert!(engine.shoot());
        // Shot alone does not dirty the run
        assert_eq!(writes.get(), 0);
        engine.frame(&pointer(), 16.0);
        assert_eq!(engine.state().run.score, 1);
        assert_eq!(writes.get(), 1);
    }

    #[test]
    fn test_game_over_flow_submits_with_token() {
        let mut engine = engine(true);
        engine.state.identity.token = Some("tok".into());
        engine.frame(&pointer(), 0.0);
        engine.state.run.score = 120;
        engine.state.run.lives = 1;
        engine.state.lose_life(1000.0);
        engine.process_events();
        assert!(engine.state().is_game_over());
        assert!(!engine.music_should_play());

        let effects = engine.frame(&pointer(), 3000.0);
        let epoch = match effects.as_slice() {
            [Effect::FetchLeaderboard { epoch }] => *epoch,
            other => panic!("expected one fetch, got {other:?}"),
        };
        engine.on_leaderboard_loaded(epoch, Ok(vec![]));

        for c in ['a', 'c', '!', 'e'] {
            engine.key(KeyInput::Char(c), 3100.0);
        }
        engine.key(KeyInput::Enter, 3200.0);
        let effects = engine.take_effects();
        assert_eq!(
            effects,
            vec![Effect::SubmitScore {
                epoch,
                request: SubmitRequest {
                    name: "ACE".into(),
                    score: 120,
                    token: Some("tok".into()),
                },
            }]
        );
        // Name remembered in storage
        let saved = engine.store().get(IDENTITY_KEY).unwrap().unwrap();
        assert!(saved.contains("ACE"));

        // Any key restarts into the countdown
        assert!(engine.key(KeyInput::Other, 4000.0));
        assert!(matches!(engine.state().phase, GamePhase::Countdown { .. }));
        assert_eq!(engine.state().run.lives, MAX_LIVES);
    }

    #[test]
    fn test_stale_leaderboard_is_dropped() {
        let mut engine = engine(true);
        engine.frame(&pointer(), 0.0);
        engine.state.run.score = 10;
        engine.state.run.lives = 1;
        engine.state.lose_life(0.0);
        engine.process_events();
        engine.frame(&pointer(), 2500.0);

        engine.on_leaderboard_loaded(
            999,
            Ok(vec![LeaderboardEntry {
                name: "OLD".into(),
                score: 5,
            }]),
        );
        assert!(engine.state().leaderboard.is_empty());
        let GamePhase::GameOver(over) = &engine.state().phase else {
            panic!("expected game over");
        };
        assert_eq!(over.stage, Stage::Fetching);
    }

    #[test]
    fn test_off_game_page_any_key_restarts_without_fetch() {
        let mut engine = engine(false);
        engine.frame(&pointer(), 0.0);
        engine.state.run.lives = 1;
        engine.state.lose_life(0.0);
        engine.process_events();
        let effects = engine.frame(&pointer(), 5000.0);
        assert!(effects.is_empty());

        assert!(engine.key(KeyInput::Char('x'), 5100.0));
        assert!(engine.state().is_playing());
        assert_eq!(engine.state().run.lives, MAX_LIVES);
    }

    #[test]
    fn test_hard_reset_from_play() {
        let mut engine = engine(false);
        engine.frame(&pointer(), 0.0);
        engine.state.run.score = 300;
        assert!(engine.key(KeyInput::HardReset, 100.0));
        assert_eq!(engine.state().run.score, 0);
        assert_eq!(engine.hud().level, 1);
    }

    #[test]
    fn test_sounds_gated_by_page_and_mute() {
        let mut off_page = engine(false);
        off_page.frame(&pointer(), 0.0);
        off_page.shoot();
        assert!(off_page.take_effects().is_empty());

        let mut on_page = engine(true);
        on_page.frame(&pointer(), 0.0);
        on_page.shoot();
        assert_eq!(on_page.take_effects(), vec![Effect::Sound(SoundEffect::Shoot)]);

        assert!(on_page.key(KeyInput::Char('m'), 10.0));
        assert!(on_page.hud().muted);
        on_page.shoot();
        assert!(on_page.take_effects().is_empty());
        // Mute survives a reload
        let saved = Settings::load(on_page.store());
        assert!(saved.muted);
    }

    #[test]
    fn test_music_follows_play_state() {
        let mut engine = engine(true);
        assert!(!engine.music_should_play());
        engine.frame(&pointer(), 0.0);
        assert!(engine.music_should_play());
        engine.key(KeyInput::Space, 10.0);
        assert!(!engine.music_should_play());
        assert!(engine.hud().paused);
        engine.key(KeyInput::Space, 20.0);
        assert!(engine.music_should_play());
        engine.key(KeyInput::Char('M'), 30.0);
        assert!(!engine.music_should_play());
    }

    #[test]
    fn test_system_reduced_motion_disables_flash() {
        let mut engine = engine(true);
        assert!(engine.settings().effective_flash());
        engine.prefer_reduced_motion();
        assert!(!engine.settings().effective_flash());
        // Only the player's own choices are written back
        assert_eq!(Settings::load(engine.store()), Settings::default());
    }

    #[test]
    fn test_unreadable_snapshot_starts_fresh() {
        let mut store = MemoryStore::new();
        store.set(SNAPSHOT_KEY, "{{{").unwrap();
        let engine = Engine::new(config(true), Box::new(store), Box::new(NullStore), 0.0);
        assert_eq!(engine.state().run.lives, MAX_LIVES);
        assert_eq!(engine.state().run.score, 0);
        assert!(engine.state().is_playing());
    }
}

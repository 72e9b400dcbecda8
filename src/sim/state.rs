//! Game state and core simulation types
//!
//! Everything the frame driver mutates during a tick lives in `GameState`.
//! The persisted subset is extracted by `persistence::Snapshot`.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::clock::{PauseClock, TimeShift};
use super::gameover::GameOver;
use super::spawn::{SpawnScheduler, level_for_score};
use crate::consts::*;
use crate::highscores::Leaderboard;
use crate::persistence::Identity;

/// Closed set of alien variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlienKind {
    Grunt,
    Elite,
    Healer,
    Gunner,
    Nuke,
    #[serde(rename = "shield")]
    ShieldPickup,
}

/// Horizontal motion model
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Motion {
    /// Linear drift, reflected at the side margins
    Drift,
    /// `x += sin(t) * amp`, `t += step`
    Sine { step: f32, amp: f32 },
    /// Sine plus drift (gunners)
    SineDrift { step: f32, amp: f32 },
    /// `x += sin(t) * amp + cos(t2) * amp2`
    Weave {
        step: f32,
        step2: f32,
        amp: f32,
        amp2: f32,
    },
}

/// Shape used for ship contact tests
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Contact {
    /// Full width/height box, overlapped against the ship box
    Box { w: f32, h: f32 },
    /// Circular pickup zone around the ship
    Radius(f32),
}

impl AlienKind {
    pub const ALL: [AlienKind; 6] = [
        AlienKind::Grunt,
        AlienKind::Elite,
        AlienKind::Healer,
        AlienKind::Gunner,
        AlienKind::Nuke,
        AlienKind::ShieldPickup,
    ];

    /// Base fall speed range (px per tick before the level multiplier)
    pub fn speed_range(self) -> (f32, f32) {
        match self {
            AlienKind::Grunt => (0.3, 0.8),
            AlienKind::Elite => (0.8, 1.4),
            AlienKind::Healer => (0.4, 0.7),
            AlienKind::Gunner => (0.25, 0.45),
            AlienKind::Nuke | AlienKind::ShieldPickup => (0.5, 0.8),
        }
    }

    /// Symmetric horizontal drift range
    pub fn drift_range(self) -> f32 {
        match self {
            AlienKind::Grunt => 0.15,
            AlienKind::Gunner => 0.2,
            _ => 0.0,
        }
    }

    pub fn motion(self) -> Motion {
        match self {
            AlienKind::Grunt => Motion::Drift,
            AlienKind::Elite => Motion::Sine {
                step: 0.06,
                amp: 2.5,
            },
            AlienKind::Healer => Motion::Weave {
                step: 0.03,
                step2: 0.07,
                amp: 3.0,
                amp2: 1.5,
            },
            AlienKind::Gunner => Motion::SineDrift {
                step: 0.04,
                amp: 1.5,
            },
            AlienKind::Nuke | AlienKind::ShieldPickup => Motion::Sine {
                step: 0.05,
                amp: 2.0,
            },
        }
    }

    /// Half extents for player bullet hits. `None` = bullets pass through.
    pub fn hit_extents(self) -> Option<(f32, f32)> {
        match self {
            AlienKind::Grunt => Some((14.0, 12.0)),
            AlienKind::Elite => Some((8.0, 6.0)),
            AlienKind::Healer => Some((7.0, 6.0)),
            AlienKind::Gunner => Some((12.0, 10.0)),
            AlienKind::Nuke => Some((10.0, 10.0)),
            AlienKind::ShieldPickup => None,
        }
    }

    pub fn contact(self) -> Contact {
        match self {
            AlienKind::Grunt => Contact::Box { w: 14.0, h: 12.0 },
            AlienKind::Elite => Contact::Box { w: 5.0, h: 5.0 },
            AlienKind::Gunner => Contact::Box { w: 12.0, h: 10.0 },
            AlienKind::Healer => Contact::Radius(12.0),
            AlienKind::Nuke | AlienKind::ShieldPickup => Contact::Radius(16.0),
        }
    }

    pub fn points(self) -> u64 {
        match self {
            AlienKind::Grunt => 1,
            AlienKind::Gunner => 5,
            AlienKind::Elite => 10,
            AlienKind::Healer | AlienKind::Nuke | AlienKind::ShieldPickup => 0,
        }
    }

    /// Grunts, elites and gunners: hurt the ship, cost a life on escape,
    /// die to nukes and shields for points
    pub fn is_hostile(self) -> bool {
        matches!(self, AlienKind::Grunt | AlienKind::Elite | AlienKind::Gunner)
    }

    pub fn is_pickup(self) -> bool {
        matches!(self, AlienKind::Nuke | AlienKind::ShieldPickup)
    }
}

/// An alien entity
#[derive(Debug, Clone, PartialEq)]
pub struct Alien {
    pub kind: AlienKind,
    pub pos: Vec2,
    pub speed: f32,
    pub drift: f32,
    /// Phase accumulators
    pub t: f32,
    pub t2: f32,
    pub alive: bool,
    /// Gunners only: when the last aimed shot left
    pub last_shot: f64,
}

impl Alien {
    pub fn new(kind: AlienKind, pos: Vec2, speed: f32, drift: f32) -> Self {
        Self {
            kind,
            pos,
            speed,
            drift,
            t: 0.0,
            t2: 0.0,
            alive: true,
            last_shot: 0.0,
        }
    }

    /// Random alien of `kind` at height `y`, somewhere across the top
    pub fn spawn(kind: AlienKind, rng: &mut Pcg32, width: f32, y: f32, now: f64) -> Self {
        let span = (width - SPAWN_MARGIN * 2.0).max(1.0);
        let x = SPAWN_MARGIN + rng.random::<f32>() * span;
        let (lo, hi) = kind.speed_range();
        let speed = lo + rng.random::<f32>() * (hi - lo);
        let drift_range = kind.drift_range();
        let drift = if drift_range > 0.0 {
            (rng.random::<f32>() - 0.5) * drift_range * 2.0
        } else {
            0.0
        };
        let mut alien = Alien::new(kind, Vec2::new(x, y), speed, drift);
        alien.t = rng.random::<f32>() * std::f32::consts::TAU;
        alien.t2 = rng.random::<f32>() * std::f32::consts::TAU;
        alien.last_shot = now;
        alien
    }
}

/// A player bullet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bullet {
    pub pos: Vec2,
    pub speed: f32,
    pub power: bool,
}

/// An aimed enemy bullet, velocity fixed at emission
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyBullet {
    pub pos: Vec2,
    pub vel: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// 0-1, decreases every tick
    pub life: f32,
}

/// Radial burst of particles
#[derive(Debug, Clone, PartialEq)]
pub struct Explosion {
    pub particles: [Particle; EXPLOSION_PARTICLES],
}

impl Explosion {
    pub fn new(pos: Vec2, rng: &mut Pcg32) -> Self {
        let particles = std::array::from_fn(|i| {
            let angle = i as f32 / EXPLOSION_PARTICLES as f32 * std::f32::consts::TAU;
            let speed = 1.0 + rng.random::<f32>() * 2.0;
            Particle {
                pos,
                vel: Vec2::new(angle.cos(), angle.sin()) * speed,
                life: 1.0,
            }
        });
        Self { particles }
    }

    /// Advance one tick. Returns false once every particle is spent.
    pub fn update(&mut self) -> bool {
        let mut alive = false;
        for p in &mut self.particles {
            p.pos += p.vel;
            p.life -= PARTICLE_DECAY;
            if p.life > 0.0 {
                alive = true;
            }
        }
        alive
    }
}

/// All live entities. Pure data.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    pub aliens: Vec<Alien>,
    pub bullets: Vec<Bullet>,
    pub enemy_bullets: Vec<EnemyBullet>,
    pub explosions: Vec<Explosion>,
}

impl EntityStore {
    pub fn clear(&mut self) {
        self.aliens.clear();
        self.bullets.clear();
        self.enemy_bullets.clear();
        self.explosions.clear();
    }

    pub fn live_count(&self, kind: AlienKind) -> usize {
        self.aliens
            .iter()
            .filter(|a| a.alive && a.kind == kind)
            .count()
    }
}

/// Score, lives and power-ups for the current run
#[derive(Debug, Clone, PartialEq)]
pub struct RunState {
    pub score: u64,
    pub lives: u8,
    pub dual_shot: bool,
    pub power_shot: bool,
    /// Shield is active while `now` is before this
    pub shield_expiry: Option<f64>,
    pub invulnerable_until: f64,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            score: 0,
            lives: MAX_LIVES,
            dual_shot: false,
            power_shot: false,
            shield_expiry: None,
            invulnerable_until: 0.0,
        }
    }
}

impl RunState {
    /// Derived from score, never stored
    pub fn level(&self) -> u32 {
        level_for_score(self.score)
    }

    pub fn shield_active(&self, now: f64) -> bool {
        self.shield_expiry.is_some_and(|t| now < t)
    }

    pub fn is_invulnerable(&self, now: f64) -> bool {
        now < self.invulnerable_until
    }

    pub fn clear_powerups(&mut self) {
        self.dual_shot = false;
        self.power_shot = false;
    }
}

impl TimeShift for RunState {
    fn shift_time(&mut self, delta_ms: f64) {
        if self.invulnerable_until > 0.0 {
            self.invulnerable_until += delta_ms;
        }
        if let Some(expiry) = self.shield_expiry.as_mut() {
            *expiry += delta_ms;
        }
    }
}

/// Top-level mode of the engine
#[derive(Debug, Clone, PartialEq)]
pub enum GamePhase {
    /// Frozen 3-2-1 before play resumes on the game page
    Countdown { ends_at: f64 },
    /// Active gameplay (pause is tracked by `PauseClock`)
    Playing,
    /// Lives ran out
    GameOver(GameOver),
}

/// Side effects raised during a tick or input handler, drained by the frame driver
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Shot,
    AlienDestroyed { kind: AlienKind, points: u64 },
    Healed,
    ShipHit,
    ShieldArmed,
    ShieldAbsorbed,
    NukeDetonated { destroyed: usize, points: u64 },
    /// Alien crossed the bottom edge
    Escaped { kind: AlienKind },
    LevelUp(u32),
    Paused,
    Resumed,
    GameOver { final_score: u64 },
    FetchLeaderboard { epoch: u32 },
    SubmitScore { epoch: u32, name: String, score: u64 },
    IdentityChanged,
    Restarted,
    MuteChanged(bool),
}

impl GameEvent {
    /// Whether the run snapshot must be rewritten
    pub fn changes_run(&self) -> bool {
        matches!(
            self,
            GameEvent::AlienDestroyed { .. }
                | GameEvent::Healed
                | GameEvent::ShipHit
                | GameEvent::NukeDetonated { .. }
                | GameEvent::Escaped { .. }
                | GameEvent::Paused
                | GameEvent::Resumed
                | GameEvent::GameOver { .. }
                | GameEvent::Restarted
        )
    }
}

/// Complete engine state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Viewport size in px
    pub width: f32,
    pub height: f32,
    /// Dedicated game page (name entry, countdown, audio)
    pub game_page: bool,
    /// Ship position; `None` until the pointer is first seen
    pub pointer: Option<Vec2>,
    pub run: RunState,
    pub entities: EntityStore,
    pub scheduler: SpawnScheduler,
    pub clock: PauseClock,
    pub phase: GamePhase,
    pub leaderboard: Leaderboard,
    pub identity: Identity,
    /// Full screen flash after a nuke
    pub flash_until: f64,
    /// Pending side effects
    pub events: Vec<GameEvent>,
    pub rng: Pcg32,
    next_epoch: u32,
}

impl GameState {
    pub fn new(width: f32, height: f32, game_page: bool, seed: u64) -> Self {
        Self {
            width,
            height,
            game_page,
            pointer: None,
            run: RunState::default(),
            entities: EntityStore::default(),
            scheduler: SpawnScheduler::default(),
            clock: PauseClock::default(),
            phase: GamePhase::Playing,
            leaderboard: Leaderboard::new(),
            identity: Identity::default(),
            flash_until: 0.0,
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            next_epoch: 1,
        }
    }

    pub fn level(&self) -> u32 {
        self.run.level()
    }

    pub fn is_armed(&self) -> bool {
        self.pointer.is_some()
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.phase, GamePhase::Playing)
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self.phase, GamePhase::GameOver(_))
    }

    /// Playing, unpaused and armed: the simulation advances
    pub fn is_active(&self) -> bool {
        self.is_armed() && self.is_playing() && !self.clock.is_paused()
    }

    pub fn allocate_epoch(&mut self) -> u32 {
        let epoch = self.next_epoch;
        self.next_epoch = self.next_epoch.wrapping_add(1);
        epoch
    }

    pub fn explode(&mut self, pos: Vec2) {
        let explosion = Explosion::new(pos, &mut self.rng);
        self.entities.explosions.push(explosion);
    }

    /// Pause gameplay. Refused outside active play.
    pub fn pause(&mut self, now: f64) -> bool {
        if !self.is_playing() || self.run.lives == 0 {
            return false;
        }
        if self.clock.pause(now) {
            self.events.push(GameEvent::Paused);
            return true;
        }
        false
    }

    /// Resume and shift every in-game timestamp by the paused duration
    pub fn resume(&mut self, now: f64) -> bool {
        match self.clock.resume(now) {
            Some(elapsed) => {
                self.shift_time(elapsed);
                self.events.push(GameEvent::Resumed);
                true
            }
            None => false,
        }
    }

    pub fn toggle_pause(&mut self, now: f64) {
        if self.clock.is_paused() {
            self.resume(now);
        } else {
            self.pause(now);
        }
    }

    /// Add points, reporting level changes
    pub fn award(&mut self, points: u64) {
        if points == 0 {
            return;
        }
        let before = self.level();
        self.run.score = self.run.score.saturating_add(points);
        let after = self.level();
        if after != before {
            log::info!("Level {after}");
            self.events.push(GameEvent::LevelUp(after));
        }
    }

    pub fn heal(&mut self) {
        self.run.lives = (self.run.lives + 1).min(MAX_LIVES);
        self.events.push(GameEvent::Healed);
    }

    /// Take one life. Enters game over at zero.
    pub fn lose_life(&mut self, now: f64) {
        if self.run.lives == 0 {
            return;
        }
        self.run.lives -= 1;
        if self.run.lives == 0 {
            super::gameover::enter_game_over(self, now);
        }
    }
}

impl TimeShift for GameState {
    fn shift_time(&mut self, delta_ms: f64) {
        self.scheduler.shift_time(delta_ms);
        self.run.shift_time(delta_ms);
        for alien in &mut self.entities.aliens {
            alien.shift_time(delta_ms);
        }
    }
}

impl TimeShift for Alien {
    fn shift_time(&mut self, delta_ms: f64) {
        if self.kind == AlienKind::Gunner && self.last_shot > 0.0 {
            self.last_shot += delta_ms;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_is_derived_from_score() {
        let mut run = RunState::default();
        assert_eq!(run.level(), 1);
        run.score = 49;
        assert_eq!(run.level(), 1);
        run.score = 50;
        assert_eq!(run.level(), 2);
        run.score = 1049;
        assert_eq!(run.level(), 21);
    }

    #[test]
    fn test_kind_tables() {
        assert_eq!(AlienKind::Grunt.points(), 1);
        assert_eq!(AlienKind::Gunner.points(), 5);
        assert_eq!(AlienKind::Elite.points(), 10);
        assert!(AlienKind::ShieldPickup.hit_extents().is_none());
        for kind in AlienKind::ALL {
            assert_eq!(kind.is_hostile(), kind.points() > 0);
            let (lo, hi) = kind.speed_range();
            assert!(lo > 0.0 && lo < hi);
        }
    }

    #[test]
    fn test_explosion_decays_and_expires() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut explosion = Explosion::new(Vec2::new(100.0, 100.0), &mut rng);
        assert_eq!(explosion.particles.len(), EXPLOSION_PARTICLES);
        let mut ticks = 0;
        while explosion.update() {
            ticks += 1;
            assert!(ticks < 100);
        }
        // 1.0 / 0.03 rounds up to 34 updates
        assert_eq!(ticks, 33);
        assert!(explosion.particles.iter().all(|p| p.life <= 0.0));
    }

    #[test]
    fn test_lose_life_enters_game_over_at_zero() {
        let mut state = GameState::new(800.0, 600.0, true, 1);
        state.run.lives = 1;
        state.lose_life(1000.0);
        assert_eq!(state.run.lives, 0);
        assert!(state.is_game_over());
        // Never goes negative
        state.lose_life(1001.0);
        assert_eq!(state.run.lives, 0);
    }

    #[test]
    fn test_resume_shifts_run_and_gunner_timers() {
        let mut state = GameState::new(800.0, 600.0, true, 1);
        state.run.invulnerable_until = 3000.0;
        state.run.shield_expiry = Some(12_000.0);
        let mut armed = Alien::new(AlienKind::Gunner, Vec2::new(100.0, 100.0), 1.0, 0.0);
        armed.last_shot = 1500.0;
        let fresh = Alien::new(AlienKind::Gunner, Vec2::new(200.0, 100.0), 1.0, 0.0);
        state.entities.aliens.push(armed);
        state.entities.aliens.push(fresh);

        assert!(state.pause(2000.0));
        assert!(state.resume(9000.0));
        assert_eq!(state.run.invulnerable_until, 10_000.0);
        assert_eq!(state.run.shield_expiry, Some(19_000.0));
        assert_eq!(state.entities.aliens[0].last_shot, 8500.0);
        assert_eq!(state.entities.aliens[1].last_shot, 0.0);
    }

    #[test]
    fn test_resume_leaves_unset_timers_alone() {
        let mut state = GameState::new(800.0, 600.0, true, 1);
        assert!(state.pause(500.0));
        assert!(state.resume(4500.0));
        assert_eq!(state.run.invulnerable_until, 0.0);
        assert_eq!(state.run.shield_expiry, None);
        // Not paused: nothing to shift
        assert!(!state.resume(9000.0));
    }

    #[test]
    fn test_heal_caps_at_max() {
        let mut state = GameState::new(800.0, 600.0, true, 1);
        state.heal();
        assert_eq!(state.run.lives, MAX_LIVES);
        state.run.lives = 2;
        state.heal();
        assert_eq!(state.run.lives, 3);
    }
}

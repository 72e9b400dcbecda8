//! Spawn scheduling
//!
//! Difficulty is a pure function of score. Six independent streams compare
//! their last-fired timestamp against the current clock every tick.

use glam::Vec2;

use super::clock::TimeShift;
use super::state::{Alien, AlienKind, GameState};
use crate::consts::*;

/// `floor(score / 50) + 1`
pub fn level_for_score(score: u64) -> u32 {
    u32::try_from(score / POINTS_PER_LEVEL)
        .unwrap_or(u32::MAX - 1)
        .saturating_add(1)
}

/// Vertical speed multiplier, capped at 3x
pub fn speed_mul(level: u32) -> f32 {
    (1.0 + level.saturating_sub(1) as f32 * 0.1).min(3.0)
}

pub fn wave_interval(level: u32) -> f64 {
    if level <= MAX_WAVE_SIZE {
        return WAVE_INTERVAL_MS;
    }
    (WAVE_INTERVAL_MS - (level - MAX_WAVE_SIZE) as f64 * 100.0).max(WAVE_INTERVAL_MIN_MS)
}

pub fn wave_size(level: u32) -> u32 {
    level.min(MAX_WAVE_SIZE)
}

/// `None` below the gunner level gate
pub fn gunner_interval(level: u32) -> Option<f64> {
    if level < GUNNER_MIN_LEVEL {
        return None;
    }
    let steps = ((level - GUNNER_MIN_LEVEL) / 3) as f64;
    Some((30_000.0 - steps * 3000.0).max(8000.0))
}

/// Cadence of a gunner's aimed shots
pub fn gunner_fire_interval(level: u32) -> f64 {
    (3000.0 - level as f64 * 50.0).max(1500.0)
}

/// Which streams fired on this poll
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Spawns {
    /// Grunts in the wave (0 = no wave)
    pub wave: u32,
    pub elite: bool,
    pub healer: bool,
    pub gunner: bool,
    pub nuke: bool,
    pub shield: bool,
}

impl Spawns {
    pub fn is_empty(&self) -> bool {
        *self == Spawns::default()
    }
}

/// Last-fired timestamps for every stream
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpawnScheduler {
    armed: bool,
    pub last_wave: f64,
    pub last_elite: f64,
    pub last_healer: f64,
    pub last_gunner: f64,
    pub last_nuke: f64,
    pub last_shield: f64,
    /// Level that already received its nuke / shield
    pub nuke_level: Option<u32>,
    pub shield_level: Option<u32>,
}

impl SpawnScheduler {
    /// Start every stream's cooldown at `now`
    pub fn arm(&mut self, now: f64) {
        self.armed = true;
        self.last_wave = now;
        self.last_elite = now;
        self.last_healer = now;
        self.last_gunner = now;
        self.last_nuke = now;
        self.last_shield = now;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Forget everything (new run)
    pub fn reset(&mut self, now: f64) {
        *self = SpawnScheduler::default();
        self.arm(now);
    }

    /// Test every stream against `now`. The first poll only arms.
    pub fn poll(&mut self, level: u32, now: f64) -> Spawns {
        let mut spawns = Spawns::default();
        if !self.armed {
            self.arm(now);
            return spawns;
        }

        let gunner_due = gunner_interval(level).is_some_and(|i| now - self.last_gunner >= i);
        if gunner_due {
            self.last_gunner = now;
            spawns.gunner = true;
        }
        if now - self.last_healer >= HEALER_INTERVAL_MS {
            self.last_healer = now;
            spawns.healer = true;
        }
        if now - self.last_elite >= ELITE_INTERVAL_MS {
            self.last_elite = now;
            spawns.elite = true;
        }
        if level >= NUKE_MIN_LEVEL
            && self.nuke_level != Some(level)
            && now - self.last_nuke >= NUKE_INTERVAL_MS
        {
            self.last_nuke = now;
            self.nuke_level = Some(level);
            spawns.nuke = true;
        }
        if level >= SHIELD_MIN_LEVEL
            && level % 2 == 0
            && self.shield_level != Some(level)
            && now - self.last_shield >= SHIELD_INTERVAL_MS
        {
            self.last_shield = now;
            self.shield_level = Some(level);
            spawns.shield = true;
        }
        if now - self.last_wave >= wave_interval(level) {
            self.last_wave = now;
            spawns.wave = wave_size(level);
        }
        spawns
    }
}

impl TimeShift for SpawnScheduler {
    fn shift_time(&mut self, delta_ms: f64) {
        // Unarmed streams get their times from `arm`
        if !self.armed {
            return;
        }
        self.last_wave += delta_ms;
        self.last_elite += delta_ms;
        self.last_healer += delta_ms;
        self.last_gunner += delta_ms;
        self.last_nuke += delta_ms;
        self.last_shield += delta_ms;
    }
}

/// Poll the scheduler and materialize whatever fired
pub fn spawn_due(state: &mut GameState, now: f64) -> Spawns {
    let level = state.level();
    let spawns = state.scheduler.poll(level, now);
    if spawns.is_empty() {
        return spawns;
    }

    let width = state.width;
    let single = |state: &mut GameState, kind: AlienKind| {
        let alien = Alien::spawn(kind, &mut state.rng, width, SPAWN_Y, now);
        state.entities.aliens.push(alien);
    };
    if spawns.gunner {
        single(state, AlienKind::Gunner);
    }
    if spawns.healer {
        single(state, AlienKind::Healer);
    }
    if spawns.elite {
        single(state, AlienKind::Elite);
    }
    if spawns.nuke {
        log::debug!("Nuke pickup spawned at level {level}");
        single(state, AlienKind::Nuke);
    }
    if spawns.shield {
        log::debug!("Shield pickup spawned at level {level}");
        single(state, AlienKind::ShieldPickup);
    }

    if spawns.wave > 0 {
        for i in 0..spawns.wave {
            let y = SPAWN_Y - i as f32 * WAVE_STAGGER;
            let grunt = Alien::spawn(AlienKind::Grunt, &mut state.rng, width, y, now);
            state.entities.aliens.push(grunt);
        }
        enforce_population_cap(&mut state.entities.aliens);
    }
    spawns
}

/// Drop one already-resolved alien once the store grows past the cap
fn enforce_population_cap(aliens: &mut Vec<Alien>) {
    if aliens.len() <= ALIEN_POPULATION_CAP {
        return;
    }
    if let Some(idx) = aliens.iter().position(|a| !a.alive) {
        aliens.remove(idx);
    }
}

/// Place a specific alien (restores, tests)
pub fn place(state: &mut GameState, kind: AlienKind, pos: Vec2, now: f64) {
    let mut alien = Alien::spawn(kind, &mut state.rng, state.width, pos.y, now);
    alien.pos = pos;
    state.entities.aliens.push(alien);
}

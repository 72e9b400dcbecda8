//! Star Invaders - a starfield that turns into an arcade shooter
//!
//! Core modules:
//! - `sim`: Gameplay simulation (spawning, movement, collisions, game over flow)
//! - `engine`: Per-frame driver tying simulation, persistence and side effects together
//! - `persistence`: Snapshot and player identity storage
//! - `highscores`: Leaderboard cache and server wire types
//! - `audio`: Chiptune composition, offline synth and Web Audio playback
//! - `renderer`: Drawing through a minimal 2D surface abstraction
//! - `platform`: Browser glue (network, DOM readouts)

pub mod audio;
pub mod engine;
pub mod error;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use engine::{Engine, EngineConfig, HudView};
pub use error::{NetworkError, StorageError};
pub use highscores::{Leaderboard, LeaderboardEntry};
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Lives cap (and starting lives)
    pub const MAX_LIVES: u8 = 5;
    /// Score needed per level
    pub const POINTS_PER_LEVEL: u64 = 50;

    /// Stream cadences (ms)
    pub const WAVE_INTERVAL_MS: f64 = 3000.0;
    pub const WAVE_INTERVAL_MIN_MS: f64 = 800.0;
    pub const ELITE_INTERVAL_MS: f64 = 15_000.0;
    pub const HEALER_INTERVAL_MS: f64 = 45_000.0;
    pub const NUKE_INTERVAL_MS: f64 = 20_000.0;
    pub const SHIELD_INTERVAL_MS: f64 = 20_000.0;
    /// Grunts per wave stop growing past this level
    pub const MAX_WAVE_SIZE: u32 = 21;
    /// Level gates
    pub const GUNNER_MIN_LEVEL: u32 = 3;
    pub const NUKE_MIN_LEVEL: u32 = 10;
    pub const SHIELD_MIN_LEVEL: u32 = 20;
    /// Store size above which one dead alien is dropped per wave
    pub const ALIEN_POPULATION_CAP: usize = 14;

    /// Ship geometry (contact box, full size)
    pub const SHIP_WIDTH: f32 = 15.0;
    pub const SHIP_HEIGHT: f32 = 12.0;
    /// Enemy bullet vs ship half extents
    pub const SHIP_HIT_HALF_W: f32 = 12.0;
    pub const SHIP_HIT_HALF_H: f32 = 10.0;
    /// Invulnerability after taking damage
    pub const INVULN_MS: f64 = 1500.0;

    /// Player bullets
    pub const BULLET_SPEED: f32 = 8.0;
    pub const BULLET_SPAWN_OFFSET: f32 = 15.0;
    pub const DUAL_SHOT_SPREAD: f32 = 8.0;
    /// Extra half-width granted to power bullets
    pub const POWER_BULLET_BONUS: f32 = 4.0;

    /// Enemy bullets
    pub const ENEMY_BULLET_SPEED: f32 = 3.5;
    /// Gunners only fire while above this fraction of the viewport
    pub const GUNNER_FIRE_ZONE: f32 = 0.7;

    /// Shield pickup effect
    pub const SHIELD_DURATION_MS: f64 = 10_000.0;
    pub const SHIELD_FLICKER_MS: f64 = 2000.0;
    pub const SHIELD_RADIUS: f32 = 60.0;

    /// Explosions
    pub const EXPLOSION_PARTICLES: usize = 8;
    pub const PARTICLE_DECAY: f32 = 0.03;

    /// Playfield margins
    pub const SIDE_MARGIN: f32 = 20.0;
    pub const SPAWN_MARGIN: f32 = 40.0;
    pub const SPAWN_Y: f32 = -30.0;
    pub const WAVE_STAGGER: f32 = 20.0;
    pub const ESCAPE_MARGIN: f32 = 40.0;
    pub const OFFSCREEN_MARGIN: f32 = 10.0;

    /// Persistence heartbeat while playing
    pub const HEARTBEAT_MS: f64 = 5000.0;

    /// Game over flow
    pub const DYING_MS: f64 = 2000.0;
    pub const COUNTDOWN_MS: f64 = 3000.0;
    pub const NUKE_FLASH_MS: f64 = 400.0;

    /// Leaderboard limits
    pub const LEADERBOARD_SIZE: usize = 5;
    pub const MAX_NAME_LEN: usize = 16;
}

/// Squared distance check, avoids the square root
#[inline]
pub fn within_radius(a: Vec2, b: Vec2, radius: f32) -> bool {
    a.distance_squared(b) < radius * radius
}

/// Axis-aligned overlap using half extents
#[inline]
pub fn within_box(a: Vec2, b: Vec2, half_w: f32, half_h: f32) -> bool {
    (a.x - b.x).abs() < half_w && (a.y - b.y).abs() < half_h
}

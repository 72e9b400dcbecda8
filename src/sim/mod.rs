//! Gameplay simulation
//!
//! Pure and platform-free. The host passes `now` (ms) into every call and
//! the simulation never reads a clock itself. Given the same seed and the
//! same inputs a run replays identically.

pub mod clock;
pub mod collision;
pub mod gameover;
pub mod spawn;
pub mod state;
pub mod tick;

pub use clock::{PauseClock, TimeShift};
pub use gameover::{GameOver, KeyInput, Stage};
pub use spawn::{SpawnScheduler, Spawns, level_for_score};
pub use state::{
    Alien, AlienKind, Bullet, EnemyBullet, EntityStore, Explosion, GameEvent, GamePhase,
    GameState, RunState,
};
pub use tick::{TickInput, shoot, tick};

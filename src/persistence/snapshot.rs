//! Run snapshot: the subset of state that survives a page reload
//!
//! Reading is lenient. Numbers are clamped into range and each alien row
//! is parsed on its own, so one bad row does not cost the whole run.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{KeyValueStore, SNAPSHOT_KEY, read_json, write_json};
use crate::consts::MAX_LIVES;
use crate::error::StorageError;
use crate::sim::gameover::enter_game_over;
use crate::sim::spawn::SpawnScheduler;
use crate::sim::state::{Alien, AlienKind, GamePhase, GameState, RunState};

/// One live alien
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedAlien {
    pub kind: AlienKind,
    pub x: f32,
    pub y: f32,
    pub speed: f32,
    #[serde(default)]
    pub drift: f32,
    #[serde(default)]
    pub t: f32,
    #[serde(default)]
    pub t2: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub score: u64,
    pub lives: u8,
    pub dual_shot: bool,
    pub power_shot: bool,
    pub paused: bool,
    pub aliens: Vec<PersistedAlien>,
}

/// What is actually on disk, before validation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSnapshot {
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    lives: Option<f64>,
    #[serde(default)]
    dual_shot: bool,
    #[serde(default)]
    power_shot: bool,
    #[serde(default)]
    paused: bool,
    #[serde(default)]
    aliens: Vec<serde_json::Value>,
}

/// Alien row, also accepting the older flag-style rows (`elite: true`, ...)
#[derive(Debug, Deserialize)]
struct RawAlien {
    #[serde(default)]
    kind: Option<AlienKind>,
    #[serde(default)]
    elite: bool,
    #[serde(default)]
    healer: bool,
    #[serde(default)]
    gunner: bool,
    x: f32,
    y: f32,
    speed: f32,
    #[serde(default)]
    drift: Option<f32>,
    #[serde(default)]
    t: Option<f32>,
    #[serde(default)]
    t2: Option<f32>,
}

impl RawAlien {
    fn into_persisted(self) -> Option<PersistedAlien> {
        let kind = self.kind.unwrap_or(if self.healer {
            AlienKind::Healer
        } else if self.gunner {
            AlienKind::Gunner
        } else if self.elite {
            AlienKind::Elite
        } else {
            AlienKind::Grunt
        });
        let finite = [self.x, self.y, self.speed].iter().all(|v| v.is_finite());
        finite.then(|| PersistedAlien {
            kind,
            x: self.x,
            y: self.y,
            speed: self.speed,
            drift: self.drift.filter(|d| d.is_finite()).unwrap_or(0.0),
            t: self.t.filter(|t| t.is_finite()).unwrap_or(0.0),
            t2: self.t2.filter(|t| t.is_finite()).unwrap_or(0.0),
        })
    }
}

impl Snapshot {
    /// Capture the live run
    pub fn capture(state: &GameState) -> Self {
        let run = &state.run;
        Self {
            score: run.score,
            lives: run.lives,
            dual_shot: run.dual_shot,
            power_shot: run.power_shot,
            paused: state.clock.is_paused(),
            aliens: state
                .entities
                .aliens
                .iter()
                .filter(|a| a.alive)
                .map(|a| PersistedAlien {
                    kind: a.kind,
                    x: a.pos.x,
                    y: a.pos.y,
                    speed: a.speed,
                    drift: a.drift,
                    t: a.t,
                    t2: a.t2,
                })
                .collect(),
        }
    }

    /// Parse and clamp a stored snapshot
    pub fn parse(json: &str) -> Result<Self, StorageError> {
        let raw: RawSnapshot =
            serde_json::from_str(json).map_err(|e| StorageError::Deserialize {
                key: SNAPSHOT_KEY.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawSnapshot) -> Self {
        let score = raw
            .score
            .filter(|s| s.is_finite())
            .map(|s| s.max(0.0).floor() as u64)
            .unwrap_or(0);
        let lives = raw
            .lives
            .filter(|l| l.is_finite())
            .map(|l| l.clamp(0.0, MAX_LIVES as f64) as u8)
            .unwrap_or(MAX_LIVES);

        let total = raw.aliens.len();
        let aliens: Vec<PersistedAlien> = raw
            .aliens
            .into_iter()
            .filter_map(|row| serde_json::from_value::<RawAlien>(row).ok())
            .filter_map(RawAlien::into_persisted)
            .collect();
        if aliens.len() < total {
            log::debug!("Skipped {} unreadable alien rows", total - aliens.len());
        }

        Self {
            score,
            lives,
            dual_shot: raw.dual_shot,
            power_shot: raw.power_shot,
            paused: raw.paused,
            aliens,
        }
    }

    /// Replace the run in `state` with this snapshot.
    ///
    /// Streams stay unarmed until the first armed tick polls them, and gunners
    /// reload from `now`. Zero lives goes straight to game over. A paused
    /// snapshot comes back paused.
    pub fn restore(&self, state: &mut GameState, now: f64) {
        state.entities.clear();
        state.run = RunState {
            score: self.score,
            lives: self.lives,
            dual_shot: self.dual_shot,
            power_shot: self.power_shot,
            ..RunState::default()
        };
        state.clock.clear();
        state.scheduler = SpawnScheduler::default();
        state.phase = GamePhase::Playing;

        for row in &self.aliens {
            let mut alien = Alien::new(row.kind, Vec2::new(row.x, row.y), row.speed, row.drift);
            alien.t = row.t;
            alien.t2 = row.t2;
            alien.last_shot = now;
            state.entities.aliens.push(alien);
        }

        if self.lives == 0 {
            enter_game_over(state, now);
        } else if self.paused {
            state.clock.pause(now);
        }
        log::info!(
            "Restored run: score {}, lives {}, {} aliens",
            self.score,
            self.lives,
            self.aliens.len()
        );
    }
}

pub fn save_snapshot(store: &mut dyn KeyValueStore, state: &GameState) -> Result<(), StorageError> {
    write_json(store, SNAPSHOT_KEY, &Snapshot::capture(state))
}

/// `Ok(None)` when nothing was stored yet
pub fn load_snapshot(store: &dyn KeyValueStore) -> Result<Option<Snapshot>, StorageError> {
    let Some(raw) = read_json::<RawSnapshot>(store, SNAPSHOT_KEY)? else {
        return Ok(None);
    };
    Ok(Some(Snapshot::from_raw(raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::sim::spawn::place;
    use crate::sim::tick::{TickInput, tick};

    #[test]
    fn test_capture_restore_keeps_run() {
        let mut state = GameState::new(800.0, 600.0, false, 9);
        state.run.score = 120;
        state.run.lives = 3;
        state.run.power_shot = true;
        place(&mut state, AlienKind::Gunner, Vec2::new(200.0, 100.0), 0.0);
        place(&mut state, AlienKind::Grunt, Vec2::new(300.0, 150.0), 0.0);
        state.entities.aliens[1].alive = false;

        let mut store = MemoryStore::new();
        save_snapshot(&mut store, &state).unwrap();
        let snapshot = load_snapshot(&store).unwrap().unwrap();
        assert_eq!(snapshot.aliens.len(), 1, "dead aliens are not saved");

        let mut restored = GameState::new(800.0, 600.0, false, 10);
        snapshot.restore(&mut restored, 50_000.0);
        assert_eq!(restored.run.score, 120);
        assert_eq!(restored.run.lives, 3);
        assert!(restored.run.power_shot && !restored.run.dual_shot);
        assert_eq!(restored.level(), 3);
        let gunner = &restored.entities.aliens[0];
        assert_eq!(gunner.kind, AlienKind::Gunner);
        assert_eq!(gunner.pos, Vec2::new(200.0, 100.0));
        assert_eq!(gunner.last_shot, 50_000.0);
        assert!(!restored.scheduler.is_armed());
    }

    #[test]
    fn test_restored_streams_arm_on_first_pointer() {
        let snap = Snapshot::parse(r#"{"score":400,"lives":3}"#).unwrap();
        let mut state = GameState::new(800.0, 600.0, true, 1);
        snap.restore(&mut state, 1000.0);

        // Long idle before the pointer shows up: nothing is overdue
        tick(&mut state, &TickInput::default(), 120_000.0);
        assert!(!state.scheduler.is_armed());
        let input = TickInput {
            pointer: Some(Vec2::new(400.0, 500.0)),
        };
        tick(&mut state, &input, 200_000.0);
        assert!(state.scheduler.is_armed());
        assert_eq!(state.scheduler.last_wave, 200_000.0);
        assert_eq!(state.scheduler.last_nuke, 200_000.0);
        assert!(state.entities.aliens.is_empty());
    }

    #[test]
    fn test_parse_clamps_out_of_range() {
        let snap = Snapshot::parse(r#"{"score":-12,"lives":9,"aliens":[]}"#).unwrap();
        assert_eq!(snap.score, 0);
        assert_eq!(snap.lives, MAX_LIVES);
        let snap = Snapshot::parse(r#"{"score":"lots","lives":-1}"#);
        assert!(snap.is_err(), "wrong type for score");
        let snap = Snapshot::parse(r#"{"lives":-1}"#).unwrap();
        assert_eq!(snap.lives, 0);
    }

    #[test]
    fn test_bad_alien_rows_are_skipped_individually() {
        let json = r#"{"score":5,"lives":4,"aliens":[
            {"kind":"elite","x":10,"y":20,"speed":1.0,"t":0.5},
            {"kind":"dragon","x":10,"y":20,"speed":1.0},
            {"x":"?","y":20,"speed":1.0},
            {"gunner":true,"x":30,"y":40,"speed":0.3,"drift":0.1},
            {"x":50,"y":60,"speed":0.5}
        ]}"#;
        let snap = Snapshot::parse(json).unwrap();
        let kinds: Vec<AlienKind> = snap.aliens.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![AlienKind::Elite, AlienKind::Gunner, AlienKind::Grunt]);
        assert_eq!(snap.aliens[0].t, 0.5);
    }

    #[test]
    fn test_zero_lives_restores_into_game_over() {
        let snap = Snapshot::parse(r#"{"score":77,"lives":0}"#).unwrap();
        let mut state = GameState::new(800.0, 600.0, true, 1);
        snap.restore(&mut state, 1000.0);
        assert!(state.is_game_over());
        assert!(!state.clock.is_paused());
    }

    #[test]
    fn test_paused_snapshot_restores_paused() {
        let snap = Snapshot::parse(r#"{"score":7,"lives":2,"paused":true}"#).unwrap();
        let mut state = GameState::new(800.0, 600.0, true, 1);
        snap.restore(&mut state, 1000.0);
        assert!(state.clock.is_paused());
        assert!(state.resume(4000.0));
        assert!(!state.scheduler.is_armed());
    }

    #[test]
    fn test_missing_snapshot() {
        let store = MemoryStore::new();
        assert_eq!(load_snapshot(&store), Ok(None));
    }
}

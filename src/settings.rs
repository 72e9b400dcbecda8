//! Player preferences
//!
//! Persisted separately from the run snapshot.

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::persistence::{KeyValueStore, read_json, write_json};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Silences music and sound effects
    pub muted: bool,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,

    // === Accessibility ===
    /// No nuke flash, no starfield parallax
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            muted: false,
            music_volume: 0.5,
            sfx_volume: 0.7,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "vv-invaders-settings";

    /// Stored settings, or defaults when missing or unreadable
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match read_json::<Settings>(store, Self::STORAGE_KEY) {
            Ok(Some(settings)) => {
                log::info!("Loaded settings");
                settings.clamped()
            }
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(err) => {
                log::warn!("Settings unreadable, using defaults: {err}");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), StorageError> {
        write_json(store, Self::STORAGE_KEY, self)
    }

    /// Flip mute, returning the new state
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    /// Effective music gain (0 when muted)
    pub fn music_gain(&self) -> f32 {
        if self.muted { 0.0 } else { self.music_volume }
    }

    /// Effective effects gain (0 when muted)
    pub fn sfx_gain(&self) -> f32 {
        if self.muted { 0.0 } else { self.sfx_volume }
    }

    /// Full-screen nuke flash (respects reduced_motion)
    pub fn effective_flash(&self) -> bool {
        !self.reduced_motion
    }

    fn clamped(mut self) -> Self {
        self.music_volume = clamp_unit(self.music_volume);
        self.sfx_volume = clamp_unit(self.sfx_volume);
        self
    }
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_missing_fields_use_defaults() {
        let mut store = MemoryStore::new();
        store
            .set(Settings::STORAGE_KEY, r#"{"muted":true,"music_volume":4.0}"#)
            .unwrap();
        let settings = Settings::load(&store);
        assert!(settings.muted);
        assert_eq!(settings.music_volume, 1.0);
        assert_eq!(settings.sfx_volume, Settings::default().sfx_volume);
        assert_eq!(settings.music_gain(), 0.0);
    }

    #[test]
    fn test_gains_follow_mute() {
        let mut settings = Settings {
            music_volume: 0.3,
            sfx_volume: 0.9,
            ..Settings::default()
        };
        assert_eq!(settings.music_gain(), 0.3);
        assert_eq!(settings.sfx_gain(), 0.9);
        settings.toggle_mute();
        assert_eq!(settings.music_gain(), 0.0);
        assert_eq!(settings.sfx_gain(), 0.0);
    }

    #[test]
    fn test_toggle_and_save() {
        let mut store = MemoryStore::new();
        let mut settings = Settings::default();
        assert!(settings.toggle_mute());
        settings.save(&mut store).unwrap();
        assert!(Settings::load(&store).muted);
        assert!(!settings.toggle_mute());
    }

    #[test]
    fn test_garbage_falls_back() {
        let mut store = MemoryStore::new();
        store.set(Settings::STORAGE_KEY, "[1,2]").unwrap();
        assert_eq!(Settings::load(&store), Settings::default());
    }
}

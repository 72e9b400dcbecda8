//! Soundtrack and sound effects
//!
//! The soundtrack is composed in `composition`, rendered offline by `synth`
//! and played through Web Audio by `AudioManager` on the web build.

pub mod composition;
pub mod synth;

#[cfg(target_arch = "wasm32")]
mod manager;
#[cfg(target_arch = "wasm32")]
pub use manager::AudioManager;

use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Descending blip on every shot
    Shoot,
    /// Decaying noise burst on damage and kills
    Impact,
}

impl SoundEffect {
    /// Effect raised by a gameplay event, if any
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::Shot => Some(SoundEffect::Shoot),
            GameEvent::AlienDestroyed { .. }
            | GameEvent::ShipHit
            | GameEvent::ShieldAbsorbed
            | GameEvent::NukeDetonated { .. } => Some(SoundEffect::Impact),
            GameEvent::Escaped { kind } if kind.is_hostile() => Some(SoundEffect::Impact),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::AlienKind;

    #[test]
    fn test_effect_mapping() {
        assert_eq!(SoundEffect::for_event(&GameEvent::Shot), Some(SoundEffect::Shoot));
        assert_eq!(
            SoundEffect::for_event(&GameEvent::ShipHit),
            Some(SoundEffect::Impact)
        );
        assert_eq!(
            SoundEffect::for_event(&GameEvent::Escaped {
                kind: AlienKind::Healer
            }),
            None
        );
        assert_eq!(
            SoundEffect::for_event(&GameEvent::Escaped {
                kind: AlienKind::Grunt
            }),
            Some(SoundEffect::Impact)
        );
        assert_eq!(SoundEffect::for_event(&GameEvent::Paused), None);
    }
}

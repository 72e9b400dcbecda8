//! Parallax starfield behind everything

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::{Surface, palette};

pub const STAR_COUNT: usize = 120;
/// How far the nearest layer shifts with the pointer (fraction of the view)
const PARALLAX: f32 = 0.03;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    /// Normalized 0-1 position
    pub pos: Vec2,
    /// Depth 0 (far) to 1 (near)
    pub z: f32,
    pub size: f32,
}

#[derive(Debug, Clone)]
pub struct Starfield {
    pub stars: Vec<Star>,
    /// Where the stars lean when there is no ship (ambient drift, last mouse position)
    pub look: Vec2,
}

impl Starfield {
    pub fn new(count: usize, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let stars = (0..count)
            .map(|_| Star {
                pos: Vec2::new(rng.random(), rng.random()),
                z: rng.random(),
                size: 0.5 + rng.random::<f32>() * 1.5,
            })
            .collect();
        Self {
            stars,
            look: Vec2::ZERO,
        }
    }

    /// Screen position of `star` with the view leaning towards `look`
    pub fn project(star: &Star, look: Vec2, size: Vec2) -> Vec2 {
        let lean = if size.x > 0.0 && size.y > 0.0 {
            (look / size - 0.5) * 2.0
        } else {
            Vec2::ZERO
        };
        let p = (star.pos + lean * star.z * PARALLAX) * size;
        Vec2::new(p.x.rem_euclid(size.x.max(1.0)), p.y.rem_euclid(size.y.max(1.0)))
    }

    pub fn draw(&self, surface: &mut dyn Surface, pointer: Option<Vec2>, size: Vec2, still: bool) {
        let look = if still {
            size / 2.0
        } else {
            pointer.unwrap_or(self.look)
        };
        for star in &self.stars {
            let alpha = 0.15 + star.z * 0.25;
            let radius = star.size * (0.5 + star.z * 0.5);
            let pos = Self::project(star, look, size);
            surface.fill_circle(pos, radius, palette::STAR.with_alpha(alpha));
        }
    }
}

/// Slow Lissajous wander used on touch screens, where there is no pointer
#[derive(Debug, Clone, Copy, Default)]
pub struct AmbientDrift {
    t: f32,
}

impl AmbientDrift {
    pub fn next(&mut self, size: Vec2) -> Vec2 {
        self.t += 0.002;
        Vec2::new(
            size.x * (0.5 + self.t.sin() * 0.15),
            size.y * (0.5 + (self.t * 0.7).cos() * 0.1),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_look_has_no_parallax() {
        let size = Vec2::new(800.0, 600.0);
        let star = Star {
            pos: Vec2::new(0.25, 0.5),
            z: 1.0,
            size: 1.0,
        };
        assert_eq!(Starfield::project(&star, size / 2.0, size), Vec2::new(200.0, 300.0));

        // Leaning right shifts near stars by up to 3% of the width
        let moved = Starfield::project(&star, Vec2::new(800.0, 300.0), size);
        assert!((moved.x - 224.0).abs() < 1e-3);
    }

    #[test]
    fn test_projection_wraps() {
        let size = Vec2::new(100.0, 100.0);
        let star = Star {
            pos: Vec2::new(0.99, 0.0),
            z: 1.0,
            size: 1.0,
        };
        let p = Starfield::project(&star, Vec2::new(100.0, 0.0), size);
        assert!(p.x >= 0.0 && p.x < 100.0);
        assert!(p.y >= 0.0 && p.y < 100.0);
    }

    #[test]
    fn test_field_is_seeded() {
        let a = Starfield::new(STAR_COUNT, 9);
        let b = Starfield::new(STAR_COUNT, 9);
        assert_eq!(a.stars, b.stars);
        assert_eq!(a.stars.len(), STAR_COUNT);
        assert!(a.stars.iter().all(|s| (0.0..1.0).contains(&s.z)));
    }

    #[test]
    fn test_drift_stays_near_center() {
        let mut drift = AmbientDrift::default();
        let size = Vec2::new(1000.0, 1000.0);
        for _ in 0..5000 {
            let p = drift.next(size);
            assert!((350.0..=650.0).contains(&p.x));
            assert!((400.0..=600.0).contains(&p.y));
        }
    }
}

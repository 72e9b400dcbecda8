//! Drawing
//!
//! `draw_frame` is a read-only pass over `GameState` onto any `Surface`.
//! The web build implements `Surface` for a canvas 2D context; tests use a
//! recording surface.

#[cfg(target_arch = "wasm32")]
pub mod canvas;
pub mod sprites;
pub mod starfield;

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasSurface;
pub use starfield::{AmbientDrift, Starfield};

use glam::Vec2;

use crate::consts::*;
use crate::settings::Settings;
use crate::sim::{Alien, AlienKind, GameOver, GamePhase, GameState, Stage};
use sprites::Sprite;

/// Straight RGBA, components in 0-1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    /// CSS `rgba()` string for canvas styles
    pub fn css(&self) -> String {
        let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "rgba({}, {}, {}, {:.3})",
            c(self.r),
            c(self.g),
            c(self.b),
            self.a.clamp(0.0, 1.0)
        )
    }

    /// Linear blend towards `other`
    pub fn mix(self, other: Color, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }
}

pub mod palette {
    use super::Color;

    pub const STAR: Color = Color::rgb(0.85, 0.88, 1.0);
    pub const SHIP: Color = Color::rgb(0.45, 0.85, 1.0);
    pub const SHIP_POWER: Color = Color::rgb(1.0, 0.72, 0.3);
    pub const GRUNT: Color = Color::rgb(0.55, 0.95, 0.55);
    pub const ELITE: Color = Color::rgb(1.0, 0.45, 0.85);
    pub const HEALER: Color = Color::rgb(1.0, 0.35, 0.4);
    pub const GUNNER: Color = Color::rgb(1.0, 0.6, 0.2);
    pub const NUKE: Color = Color::rgb(1.0, 0.9, 0.2);
    pub const SHIELD: Color = Color::rgb(0.35, 0.7, 1.0);
    pub const BULLET: Color = Color::rgb(0.9, 1.0, 1.0);
    pub const POWER_BULLET: Color = Color::rgb(1.0, 0.75, 0.25);
    pub const ENEMY_BULLET: Color = Color::rgb(1.0, 0.3, 0.25);
    pub const FLASH: Color = Color::rgb(1.0, 1.0, 0.95);
    pub const TITLE: Color = Color::rgb(1.0, 0.3, 0.35);
    pub const TEXT: Color = Color::rgb(0.9, 0.92, 1.0);
    pub const HIGHLIGHT: Color = Color::rgb(1.0, 0.85, 0.3);
    pub const DIM: Color = Color::rgb(0.5, 0.55, 0.7);
}

/// Minimal immediate-mode 2D target
pub trait Surface {
    /// Drawable size in px
    fn size(&self) -> Vec2;
    fn clear(&mut self);
    fn fill_rect(&mut self, pos: Vec2, size: Vec2, color: Color);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color);
    fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: Color);

    /// Width of block-font text at `px` screen pixels per font cell
    fn measure_text(&self, text: &str, px: f32) -> f32 {
        sprites::text_width(text, px)
    }
}

/// Block-font text horizontally centered on `center_x`
fn text_centered(surface: &mut dyn Surface, text: &str, center_x: f32, y: f32, px: f32, color: Color) {
    let w = surface.measure_text(text, px);
    sprites::draw_text(surface, text, Vec2::new(center_x - w / 2.0, y), px, |_, _| color);
}

fn alien_look(kind: AlienKind) -> (Sprite, f32, Color) {
    match kind {
        AlienKind::Grunt => (sprites::GRUNT, 3.0, palette::GRUNT),
        AlienKind::Elite => (sprites::ELITE, 3.0, palette::ELITE),
        AlienKind::Healer => (sprites::HEART, 2.5, palette::HEALER),
        AlienKind::Gunner => (sprites::GUNNER, 3.5, palette::GUNNER),
        AlienKind::Nuke => (sprites::NUKE, 3.0, palette::NUKE),
        AlienKind::ShieldPickup => (sprites::SHIELD, 3.0, palette::SHIELD),
    }
}

/// Draw one complete frame
pub fn draw_frame(
    surface: &mut dyn Surface,
    state: &GameState,
    stars: &Starfield,
    settings: &Settings,
    now: f64,
) {
    surface.clear();
    let size = surface.size();
    stars.draw(surface, state.pointer, size, settings.reduced_motion);

    // Ambient until the pointer shows up
    if !state.is_armed() {
        return;
    }

    let paused = state.clock.is_paused();
    let dim = if paused { 0.45 } else { 1.0 };

    for alien in state.entities.aliens.iter().filter(|a| a.alive) {
        draw_alien(surface, alien, dim);
    }
    draw_bullets(surface, state, dim);
    draw_explosions(surface, state);

    match &state.phase {
        GamePhase::Playing => draw_ship(surface, state, now, dim),
        GamePhase::Countdown { ends_at } => {
            draw_ship(surface, state, now, dim);
            draw_countdown(surface, *ends_at - now, size);
        }
        GamePhase::GameOver(over) => draw_game_over(surface, state, over, now, size),
    }

    if now < state.flash_until && settings.effective_flash() {
        let left = ((state.flash_until - now) / NUKE_FLASH_MS) as f32;
        surface.fill_rect(Vec2::ZERO, size, palette::FLASH.with_alpha(left * 0.6));
    }

    if paused && state.is_playing() {
        text_centered(surface, "PAUSED", size.x / 2.0, size.y / 2.0 - 10.0, 4.0, palette::TEXT);
    }
}

fn draw_alien(surface: &mut dyn Surface, alien: &Alien, dim: f32) {
    let (sprite, px, color) = alien_look(alien.kind);
    sprites::draw_sprite(surface, sprite, alien.pos, px, color.with_alpha(dim));
}

fn draw_bullets(surface: &mut dyn Surface, state: &GameState, dim: f32) {
    for bullet in &state.entities.bullets {
        let (w, h, color) = if bullet.power {
            (6.0, 12.0, palette::POWER_BULLET)
        } else {
            (2.0, 8.0, palette::BULLET)
        };
        let pos = bullet.pos - Vec2::new(w / 2.0, h / 2.0);
        surface.fill_rect(pos, Vec2::new(w, h), color.with_alpha(dim));
    }
    for bullet in &state.entities.enemy_bullets {
        surface.fill_circle(bullet.pos, 3.0, palette::ENEMY_BULLET.with_alpha(dim));
    }
}

fn draw_explosions(surface: &mut dyn Surface, state: &GameState) {
    for explosion in &state.entities.explosions {
        for p in explosion.particles.iter().filter(|p| p.life > 0.0) {
            let size = Vec2::splat(3.0 * p.life + 1.0);
            surface.fill_rect(p.pos - size / 2.0, size, palette::HIGHLIGHT.with_alpha(p.life));
        }
    }
}

fn draw_ship(surface: &mut dyn Surface, state: &GameState, now: f64, dim: f32) {
    let Some(ship) = state.pointer else { return };
    if state.run.lives == 0 {
        return;
    }
    let run = &state.run;

    let color = if run.power_shot {
        palette::SHIP_POWER
    } else {
        palette::SHIP
    };
    sprites::draw_sprite(surface, sprites::SHIP, ship, 3.0, color.with_alpha(dim));

    // Pulsing box while invulnerable
    if run.is_invulnerable(now) {
        let alpha = 0.15 + 0.15 * (now * 0.02).sin() as f32;
        let half = Vec2::new(18.0, 14.0);
        surface.fill_rect(ship - half, half * 2.0, palette::SHIP.with_alpha(alpha * dim));
    }

    if let Some(expiry) = run.shield_expiry {
        let left = expiry - now;
        // Flicker through the last seconds
        let visible = left > SHIELD_FLICKER_MS || (now / 120.0) as i64 % 2 == 0;
        if left > 0.0 && visible {
            surface.stroke_circle(ship, SHIELD_RADIUS, 2.0, palette::SHIELD.with_alpha(0.8 * dim));
            surface.fill_circle(ship, SHIELD_RADIUS, palette::SHIELD.with_alpha(0.08 * dim));
        }
    }
}

fn draw_countdown(surface: &mut dyn Surface, remaining_ms: f64, size: Vec2) {
    let digit = (remaining_ms / 1000.0).ceil().clamp(1.0, 3.0) as u32;
    text_centered(surface, &digit.to_string(), size.x / 2.0, size.y / 2.0 - 25.0, 10.0, palette::TEXT);
}

fn draw_game_over(surface: &mut dyn Surface, state: &GameState, over: &GameOver, now: f64, size: Vec2) {
    let cx = size.x / 2.0;
    let top = size.y * 0.2;

    // Title wave
    let title = "GAME OVER";
    let px = 6.0;
    let w = surface.measure_text(title, px);
    let phase = (now - over.started_at) as f32 / 200.0;
    sprites::draw_text(surface, title, Vec2::new(cx - w / 2.0, top), px, |i, _| {
        let t = ((phase + i as f32 * 0.6).sin() + 1.0) / 2.0;
        palette::TITLE.mix(palette::HIGHLIGHT, t)
    });
    text_centered(
        surface,
        &format!("SCORE {}", over.final_score),
        cx,
        top + 50.0,
        3.0,
        palette::TEXT,
    );

    if !state.game_page {
        return;
    }

    let board_top = top + 100.0;
    match &over.stage {
        Stage::Dying | Stage::Fetching => {}
        Stage::NameEntry { name } => {
            draw_leaderboard(surface, state, None, cx, board_top);
            let y = board_top + 40.0 + LEADERBOARD_SIZE as f32 * 24.0;
            text_centered(surface, "ENTER NAME", cx, y, 3.0, palette::HIGHLIGHT);
            let cursor = if (now / 400.0) as i64 % 2 == 0 { "_" } else { " " };
            text_centered(surface, &format!("{name}{cursor}"), cx, y + 30.0, 4.0, palette::TEXT);
        }
        Stage::IdleDisplay => {
            let own = state.identity.name.as_deref();
            draw_leaderboard(surface, state, own, cx, board_top);
            if (now / 500.0) as i64 % 2 == 0 {
                let y = board_top + 50.0 + LEADERBOARD_SIZE as f32 * 24.0;
                text_centered(surface, "PRESS ANY KEY", cx, y, 3.0, palette::DIM);
            }
        }
    }
}

fn draw_leaderboard(surface: &mut dyn Surface, state: &GameState, own: Option<&str>, cx: f32, top: f32) {
    text_centered(surface, "HIGH SCORES", cx, top, 3.0, palette::HIGHLIGHT);
    if state.leaderboard.is_empty() {
        text_centered(surface, "NO SCORES YET", cx, top + 30.0, 2.0, palette::DIM);
        return;
    }
    for (i, entry) in state.leaderboard.entries.iter().enumerate() {
        let color = if own == Some(entry.name.as_str()) {
            palette::HIGHLIGHT
        } else {
            palette::TEXT
        };
        let line = format!("{}. {:<16} {:>6}", i + 1, entry.name, entry.score);
        text_centered(surface, &line, cx, top + 30.0 + i as f32 * 24.0, 2.0, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highscores::LeaderboardEntry;
    use crate::sim::Bullet;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Op {
        Clear,
        Rect(Vec2, Vec2, Color),
        Circle(Vec2, f32, Color),
        Ring(Vec2, f32, Color),
    }

    /// Records every call
    #[derive(Default)]
    pub struct Recorder {
        pub ops: Vec<Op>,
    }

    impl Recorder {
        fn count(&self, pred: impl Fn(&Op) -> bool) -> usize {
            self.ops.iter().filter(|op| pred(op)).count()
        }

        fn has_color(&self, color: Color) -> bool {
            self.ops.iter().any(|op| match op {
                Op::Rect(_, _, c) | Op::Circle(_, _, c) | Op::Ring(_, _, c) => {
                    c.r == color.r && c.g == color.g && c.b == color.b
                }
                Op::Clear => false,
            })
        }
    }

    impl Surface for Recorder {
        fn size(&self) -> Vec2 {
            Vec2::new(800.0, 600.0)
        }
        fn clear(&mut self) {
            self.ops.push(Op::Clear);
        }
        fn fill_rect(&mut self, pos: Vec2, size: Vec2, color: Color) {
            self.ops.push(Op::Rect(pos, size, color));
        }
        fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
            self.ops.push(Op::Circle(center, radius, color));
        }
        fn stroke_circle(&mut self, center: Vec2, radius: f32, _width: f32, color: Color) {
            self.ops.push(Op::Ring(center, radius, color));
        }
    }

    fn armed() -> GameState {
        let mut state = GameState::new(800.0, 600.0, true, 3);
        state.pointer = Some(Vec2::new(400.0, 500.0));
        state
    }

    #[test]
    fn test_unarmed_draws_only_stars() {
        let state = GameState::new(800.0, 600.0, true, 3);
        let stars = Starfield::new(10, 1);
        let mut surface = Recorder::default();
        draw_frame(&mut surface, &state, &stars, &Settings::default(), 0.0);
        assert_eq!(surface.ops[0], Op::Clear);
        assert!(!surface.has_color(palette::SHIP));
        assert_eq!(surface.ops.len(), 1 + 10);
    }

    #[test]
    fn test_ship_aliens_and_bullets_drawn() {
        let mut state = armed();
        state
            .entities
            .aliens
            .push(Alien::new(AlienKind::Gunner, Vec2::new(100.0, 100.0), 0.3, 0.0));
        state.entities.bullets.push(Bullet {
            pos: Vec2::new(400.0, 300.0),
            speed: BULLET_SPEED,
            power: true,
        });
        let mut surface = Recorder::default();
        draw_frame(&mut surface, &state, &Starfield::new(0, 1), &Settings::default(), 0.0);
        assert!(surface.has_color(palette::SHIP));
        assert!(surface.has_color(palette::GUNNER));
        assert!(surface.has_color(palette::POWER_BULLET));
    }

    #[test]
    fn test_shield_ring_flickers_near_expiry() {
        let mut state = armed();
        state.run.shield_expiry = Some(10_000.0);
        let rings = |now: f64| {
            let mut surface = Recorder::default();
            draw_frame(&mut surface, &state, &Starfield::new(0, 1), &Settings::default(), now);
            surface.count(|op| matches!(op, Op::Ring(..)))
        };
        assert_eq!(rings(1000.0), 1);
        // Inside the flicker window the ring alternates
        let shown: usize = (0..20).map(|i| rings(8100.0 + i as f64 * 60.0)).sum();
        assert!(shown > 0 && shown < 20);
        assert_eq!(rings(10_000.0), 0);
    }

    #[test]
    fn test_flash_respects_reduced_motion() {
        let mut state = armed();
        state.flash_until = 400.0;
        let mut surface = Recorder::default();
        draw_frame(&mut surface, &state, &Starfield::new(0, 1), &Settings::default(), 100.0);
        assert!(surface.has_color(palette::FLASH));

        let settings = Settings {
            reduced_motion: true,
            ..Settings::default()
        };
        let mut surface = Recorder::default();
        draw_frame(&mut surface, &state, &Starfield::new(0, 1), &settings, 100.0);
        assert!(!surface.has_color(palette::FLASH));
    }

    #[test]
    fn test_game_over_screens() {
        let mut state = armed();
        state.run.score = 42;
        state.run.lives = 1;
        state.lose_life(0.0);
        let GamePhase::GameOver(over) = &mut state.phase else {
            panic!("expected game over");
        };
        over.stage = Stage::IdleDisplay;
        state.leaderboard.replace(vec![LeaderboardEntry {
            name: "ACE".into(),
            score: 90,
        }]);

        let mut surface = Recorder::default();
        draw_frame(&mut surface, &state, &Starfield::new(0, 1), &Settings::default(), 0.0);
        assert!(surface.has_color(palette::HIGHLIGHT));
        // Ship is gone
        assert!(!surface.has_color(palette::SHIP));
        assert!(surface.count(|op| matches!(op, Op::Rect(..))) > 100);
    }
}

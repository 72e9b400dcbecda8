//! Per-frame simulation tick
//!
//! Order: spawn → move aliens → move bullets → collide → explosions → sweep.
//! Motion is a fixed amount per tick, so play speed follows the frame rate.

use glam::Vec2;

use super::collision;
use super::gameover;
use super::spawn::{gunner_fire_interval, spawn_due, speed_mul};
use super::state::{
    Alien, AlienKind, Bullet, EnemyBullet, GameEvent, GamePhase, GameState, Motion,
};
use crate::consts::*;

/// Drift given to a stationary alien when it touches a margin
const BOUNCE_DRIFT: f32 = 0.3;
/// Enemy bullets leave from below the gunner's center
const GUNNER_MUZZLE_OFFSET: f32 = 10.0;

/// Inputs sampled by the host for a single tick
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Latest pointer position, if the pointer moved or is known
    pub pointer: Option<Vec2>,
}

/// Advance the game by one frame
pub fn tick(state: &mut GameState, input: &TickInput, now: f64) {
    if let Some(pointer) = input.pointer {
        if state.pointer.is_none() {
            log::info!("Pointer detected, game armed");
        }
        state.pointer = Some(pointer);
    }
    // Pure starfield until the pointer shows up
    if !state.is_armed() {
        return;
    }

    match state.phase {
        GamePhase::GameOver(_) => {
            gameover::advance(state, now);
            return;
        }
        GamePhase::Countdown { ends_at } => {
            if now < ends_at {
                return;
            }
            state.phase = GamePhase::Playing;
            state.scheduler.arm(now);
        }
        GamePhase::Playing => {}
    }
    if state.clock.is_paused() {
        return;
    }

    if state.run.lives > 0 {
        spawn_due(state, now);
    }
    move_aliens(state, now);
    move_bullets(state);
    move_enemy_bullets(state);
    collision::resolve(state, now);
    state.entities.explosions.retain_mut(|e| e.update());
    state.entities.aliens.retain(|a| a.alive);
}

/// Fire from the ship. Refused unless actively playing.
pub fn shoot(state: &mut GameState) -> bool {
    if !state.is_active() || state.run.lives == 0 {
        return false;
    }
    let Some(ship) = state.pointer else {
        return false;
    };
    let origin = ship - Vec2::new(0.0, BULLET_SPAWN_OFFSET);
    let bullet = |dx: f32, power: bool| Bullet {
        pos: origin + Vec2::new(dx, 0.0),
        speed: BULLET_SPEED,
        power,
    };

    let bullets = &mut state.entities.bullets;
    if state.run.dual_shot {
        bullets.push(bullet(-DUAL_SHOT_SPREAD, false));
        bullets.push(bullet(DUAL_SHOT_SPREAD, false));
    }
    if state.run.power_shot {
        bullets.push(bullet(0.0, true));
    }
    if !state.run.dual_shot && !state.run.power_shot {
        bullets.push(bullet(0.0, false));
    }
    state.events.push(GameEvent::Shot);
    true
}

fn move_aliens(state: &mut GameState, now: f64) {
    let level = state.level();
    let mul = speed_mul(level);
    let fire_interval = gunner_fire_interval(level);
    let (width, height) = (state.width, state.height);
    let target = state.pointer;

    let entities = &mut state.entities;
    let mut escaped = Vec::new();
    for alien in entities.aliens.iter_mut().filter(|a| a.alive) {
        alien.pos.y += alien.speed * mul;
        apply_motion(alien);

        if alien.kind == AlienKind::Gunner {
            if let Some(target) = target {
                if let Some(shot) = gunner_fire(alien, target, fire_interval, height, now) {
                    entities.enemy_bullets.push(shot);
                }
            }
        }

        bounce(alien, width);
        if alien.pos.y > height + ESCAPE_MARGIN {
            alien.alive = false;
            escaped.push(alien.kind);
        }
    }

    for kind in escaped {
        if kind.is_hostile() {
            state.run.clear_powerups();
            state.lose_life(now);
        }
        state.events.push(GameEvent::Escaped { kind });
    }
}

/// Horizontal motion for one tick
pub fn apply_motion(alien: &mut Alien) {
    match alien.kind.motion() {
        Motion::Drift => alien.pos.x += alien.drift,
        Motion::Sine { step, amp } => {
            alien.t += step;
            alien.pos.x += alien.t.sin() * amp;
        }
        Motion::SineDrift { step, amp } => {
            alien.t += step;
            alien.pos.x += alien.t.sin() * amp + alien.drift;
        }
        Motion::Weave {
            step,
            step2,
            amp,
            amp2,
        } => {
            alien.t += step;
            alien.t2 += step2;
            alien.pos.x += alien.t.sin() * amp + alien.t2.cos() * amp2;
        }
    }
}

/// Clamp to the side margins and reflect the drift inward
fn bounce(alien: &mut Alien, width: f32) {
    let drift = if alien.drift == 0.0 {
        BOUNCE_DRIFT
    } else {
        alien.drift.abs()
    };
    if alien.pos.x < SIDE_MARGIN {
        alien.pos.x = SIDE_MARGIN;
        alien.drift = drift;
    }
    if alien.pos.x > width - SIDE_MARGIN {
        alien.pos.x = width - SIDE_MARGIN;
        alien.drift = -drift;
    }
}

/// Aimed shot at the ship, velocity fixed at emission
fn gunner_fire(
    alien: &mut Alien,
    target: Vec2,
    interval: f64,
    height: f32,
    now: f64,
) -> Option<EnemyBullet> {
    let in_zone = alien.pos.y > 0.0 && alien.pos.y < height * GUNNER_FIRE_ZONE;
    if !in_zone || now - alien.last_shot < interval {
        return None;
    }
    alien.last_shot = now;
    let dir = (target - alien.pos).try_normalize()?;
    Some(EnemyBullet {
        pos: alien.pos + Vec2::new(0.0, GUNNER_MUZZLE_OFFSET),
        vel: dir * ENEMY_BULLET_SPEED,
    })
}

fn move_bullets(state: &mut GameState) {
    for bullet in &mut state.entities.bullets {
        bullet.pos.y -= bullet.speed;
    }
    state
        .entities
        .bullets
        .retain(|b| b.pos.y >= -OFFSCREEN_MARGIN);
}

fn move_enemy_bullets(state: &mut GameState) {
    let (w, h) = (state.width, state.height);
    for bullet in &mut state.entities.enemy_bullets {
        bullet.pos += bullet.vel;
    }
    state.entities.enemy_bullets.retain(|b| {
        b.pos.x >= -OFFSCREEN_MARGIN
            && b.pos.x <= w + OFFSCREEN_MARGIN
            && b.pos.y >= -OFFSCREEN_MARGIN
            && b.pos.y <= h + OFFSCREEN_MARGIN
    });
}

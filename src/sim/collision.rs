//! Collision detection and scoring
//!
//! Everything is an axis-aligned box test on half extents, except pickups
//! and the shield which use squared-distance circles. Resolution order per
//! tick:
//!
//! 1. player bullets vs aliens
//! 2. pickups touching the ship
//! 3. shield sweep (replaces the contact check while active)
//! 4. enemy bullets vs ship
//! 5. alien vs ship contact

use glam::Vec2;

use super::state::{Alien, AlienKind, Bullet, Contact, GameEvent, GameState};
use crate::consts::*;
use crate::{within_box, within_radius};

/// Run every collision pass for this tick
pub fn resolve(state: &mut GameState, now: f64) {
    if !state.is_playing() {
        return;
    }
    bullets_vs_aliens(state, now);

    let Some(ship) = state.pointer else {
        return;
    };
    if state.run.lives == 0 || !state.is_playing() {
        return;
    }
    pickups_vs_ship(state, ship, now);

    let shielded = state.run.shield_active(now);
    if shielded {
        shield_sweep(state, ship);
    }
    enemy_bullets_vs_ship(state, ship, now);
    if !shielded {
        aliens_vs_ship(state, ship, now);
    }
}

/// Player bullet hit test. Power bullets are wider.
pub fn bullet_hits(bullet: &Bullet, alien: &Alien) -> bool {
    let Some((half_w, half_h)) = alien.kind.hit_extents() else {
        return false;
    };
    let half_w = if bullet.power {
        half_w + POWER_BULLET_BONUS
    } else {
        half_w
    };
    within_box(bullet.pos, alien.pos, half_w, half_h)
}

/// Ship contact test for the alien's contact shape
pub fn touches_ship(alien: &Alien, ship: Vec2) -> bool {
    match alien.kind.contact() {
        Contact::Box { w, h } => within_box(
            alien.pos,
            ship,
            (SHIP_WIDTH + w) / 2.0,
            (SHIP_HEIGHT + h) / 2.0,
        ),
        Contact::Radius(r) => within_radius(alien.pos, ship, r),
    }
}

fn bullets_vs_aliens(state: &mut GameState, now: f64) {
    let mut i = 0;
    while i < state.entities.bullets.len() {
        let bullet = state.entities.bullets[i];
        let target = state
            .entities
            .aliens
            .iter()
            .position(|a| a.alive && bullet_hits(&bullet, a));
        match target {
            Some(idx) => {
                state.entities.bullets.remove(i);
                shoot_down(state, idx, now);
            }
            None => i += 1,
        }
    }
}

/// An alien was hit by a player bullet
fn shoot_down(state: &mut GameState, idx: usize, now: f64) {
    let alien = &mut state.entities.aliens[idx];
    alien.alive = false;
    let (kind, pos) = (alien.kind, alien.pos);

    match kind {
        AlienKind::Nuke => detonate(state, pos, now),
        AlienKind::Healer => {
            state.explode(pos);
            state.heal();
        }
        AlienKind::Grunt | AlienKind::Elite | AlienKind::Gunner => {
            state.explode(pos);
            match kind {
                AlienKind::Elite => state.run.dual_shot = true,
                AlienKind::Gunner => state.run.power_shot = true,
                _ => {}
            }
            let points = kind.points();
            state.award(points);
            state.events.push(GameEvent::AlienDestroyed { kind, points });
        }
        AlienKind::ShieldPickup => {}
    }
}

fn pickups_vs_ship(state: &mut GameState, ship: Vec2, now: f64) {
    let mut idx = 0;
    while idx < state.entities.aliens.len() {
        let alien = &state.entities.aliens[idx];
        let collect = alien.alive
            && matches!(alien.kind, AlienKind::Healer | AlienKind::Nuke | AlienKind::ShieldPickup)
            && touches_ship(alien, ship);
        if collect {
            let (kind, pos) = (alien.kind, alien.pos);
            state.entities.aliens[idx].alive = false;
            match kind {
                AlienKind::Healer => {
                    state.explode(pos);
                    state.heal();
                }
                AlienKind::Nuke => detonate(state, pos, now),
                _ => arm_shield(state, now),
            }
        }
        idx += 1;
    }
}

/// Clear every non-pickup alien on screen, all enemy bullets, and flash
pub fn detonate(state: &mut GameState, origin: Vec2, now: f64) {
    state.explode(origin);
    let mut destroyed = 0;
    let mut points = 0;
    let mut blasts = Vec::new();
    let height = state.height;
    for alien in &mut state.entities.aliens {
        let on_screen = alien.pos.y >= 0.0 && alien.pos.y <= height;
        if !alien.alive || alien.kind.is_pickup() || !on_screen {
            continue;
        }
        alien.alive = false;
        destroyed += 1;
        points += alien.kind.points();
        blasts.push(alien.pos);
    }
    for pos in blasts {
        state.explode(pos);
    }
    state.entities.enemy_bullets.clear();
    state.flash_until = now + NUKE_FLASH_MS;
    state.award(points);
    log::debug!("Nuke destroyed {destroyed} aliens for {points} points");
    state.events.push(GameEvent::NukeDetonated { destroyed, points });
}

fn arm_shield(state: &mut GameState, now: f64) {
    state.run.shield_expiry = Some(now + SHIELD_DURATION_MS);
    log::debug!("Shield armed until {}", now + SHIELD_DURATION_MS);
    state.events.push(GameEvent::ShieldArmed);
}

/// Ram every hostile alien inside the shield
fn shield_sweep(state: &mut GameState, ship: Vec2) {
    let mut rammed = Vec::new();
    for alien in &mut state.entities.aliens {
        if alien.alive && alien.kind.is_hostile() && within_radius(alien.pos, ship, SHIELD_RADIUS)
        {
            alien.alive = false;
            rammed.push((alien.kind, alien.pos));
        }
    }
    for (kind, pos) in rammed {
        state.explode(pos);
        let points = kind.points();
        state.award(points);
        state.events.push(GameEvent::AlienDestroyed { kind, points });
    }
}

fn enemy_bullets_vs_ship(state: &mut GameState, ship: Vec2, now: f64) {
    if state.run.shield_active(now) {
        let before = state.entities.enemy_bullets.len();
        state
            .entities
            .enemy_bullets
            .retain(|b| !within_radius(b.pos, ship, SHIELD_RADIUS));
        if state.entities.enemy_bullets.len() < before {
            state.events.push(GameEvent::ShieldAbsorbed);
        }
        return;
    }
    if state.run.is_invulnerable(now) {
        return;
    }
    let hit = state
        .entities
        .enemy_bullets
        .iter()
        .position(|b| within_box(b.pos, ship, SHIP_HIT_HALF_W, SHIP_HIT_HALF_H));
    if let Some(idx) = hit {
        state.entities.enemy_bullets.remove(idx);
        state.explode(ship);
        damage_ship(state, now);
    }
}

fn aliens_vs_ship(state: &mut GameState, ship: Vec2, now: f64) {
    if state.run.is_invulnerable(now) {
        return;
    }
    let hit = state
        .entities
        .aliens
        .iter()
        .position(|a| a.alive && a.kind.is_hostile() && touches_ship(a, ship));
    if let Some(idx) = hit {
        let alien = &mut state.entities.aliens[idx];
        alien.alive = false;
        let pos = alien.pos;
        state.explode(pos);
        state.run.clear_powerups();
        damage_ship(state, now);
    }
}

fn damage_ship(state: &mut GameState, now: f64) {
    state.run.invulnerable_until = now + INVULN_MS;
    state.events.push(GameEvent::ShipHit);
    state.lose_life(now);
}

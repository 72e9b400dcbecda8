//! Post-death flow: title flash, leaderboard fetch, name entry, restart
//!
//! `Dying → Fetching → (NameEntry | IdleDisplay) → restart`. Network results
//! come back through `on_leaderboard` / `on_submitted` tagged with the epoch
//! of the game over that asked for them. A mismatched epoch is dropped.

use super::state::{GameEvent, GamePhase, GameState, RunState};
use crate::consts::*;
use crate::error::NetworkError;
use crate::highscores::{LeaderboardEntry, ScoresResponse, normalize_name_char};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// "GAME OVER" title for `DYING_MS`
    Dying,
    /// Leaderboard request in flight
    Fetching,
    /// Typing a name for a qualifying score
    NameEntry { name: String },
    /// Board shown, waiting for any key
    IdleDisplay,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameOver {
    pub started_at: f64,
    pub final_score: u64,
    pub epoch: u32,
    pub stage: Stage,
}

/// Discrete key input, already decoded by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Backspace,
    Enter,
    Space,
    /// Ctrl+G
    HardReset,
    Other,
}

pub fn enter_game_over(state: &mut GameState, now: f64) {
    let epoch = state.allocate_epoch();
    let final_score = state.run.score;
    state.clock.clear();
    state.phase = GamePhase::GameOver(GameOver {
        started_at: now,
        final_score,
        epoch,
        stage: Stage::Dying,
    });
    log::info!("Game over with score {final_score}");
    state.events.push(GameEvent::GameOver { final_score });
}

/// Time-driven transitions. Called every frame while in game over.
pub fn advance(state: &mut GameState, now: f64) {
    if !state.game_page {
        return;
    }
    let GamePhase::GameOver(over) = &mut state.phase else {
        return;
    };
    if over.stage == Stage::Dying && now - over.started_at >= DYING_MS {
        over.stage = Stage::Fetching;
        let epoch = over.epoch;
        state.events.push(GameEvent::FetchLeaderboard { epoch });
    }
}

/// Leaderboard fetch finished
pub fn on_leaderboard(
    state: &mut GameState,
    epoch: u32,
    result: Result<Vec<LeaderboardEntry>, NetworkError>,
) {
    let GamePhase::GameOver(over) = &state.phase else {
        log::debug!("Ignoring leaderboard for epoch {epoch}: no longer in game over");
        return;
    };
    if over.epoch != epoch || over.stage != Stage::Fetching {
        log::debug!("Ignoring stale leaderboard for epoch {epoch}");
        return;
    }
    let final_score = over.final_score;

    match result {
        Ok(entries) => state.leaderboard.replace(entries),
        Err(err) => {
            log::warn!("Leaderboard fetch failed: {err}");
            state.leaderboard.clear();
        }
    }

    let qualifies = state.game_page
        && state
            .leaderboard
            .qualifies(final_score, state.identity.name.as_deref());
    if let GamePhase::GameOver(over) = &mut state.phase {
        over.stage = if qualifies {
            Stage::NameEntry {
                name: String::new(),
            }
        } else {
            Stage::IdleDisplay
        };
    }
}

/// Score submission finished. A success replaces the board wholesale.
/// A failure keeps the optimistic local merge.
pub fn on_submitted(state: &mut GameState, epoch: u32, result: Result<ScoresResponse, NetworkError>) {
    let response = match result {
        Ok(response) => response,
        Err(err) => {
            log::warn!("Score submit failed: {err}");
            return;
        }
    };
    if let Some(token) = response.token {
        if state.identity.token.as_deref() != Some(token.as_str()) {
            state.identity.token = Some(token);
            state.events.push(GameEvent::IdentityChanged);
        }
    }
    let current = match &state.phase {
        GamePhase::GameOver(over) => over.epoch == epoch,
        _ => false,
    };
    if current {
        state.leaderboard.replace(response.scores);
    } else {
        log::debug!("Submit response for epoch {epoch} arrived after restart");
    }
}

/// Keys while in game over. Returns true when the key was consumed.
pub fn handle_key(state: &mut GameState, key: KeyInput, now: f64) -> bool {
    let game_page = state.game_page;
    let GamePhase::GameOver(over) = &mut state.phase else {
        return false;
    };

    if !game_page {
        restart(state, now);
        return true;
    }

    let mut submission = None;
    let mut restart_run = false;
    match &mut over.stage {
        Stage::Dying | Stage::Fetching => {}
        Stage::IdleDisplay => restart_run = true,
        Stage::NameEntry { name } => match key {
            KeyInput::Enter if !name.is_empty() => submission = Some(std::mem::take(name)),
            KeyInput::Backspace => {
                name.pop();
            }
            KeyInput::Char(c) => {
                if let Some(c) = normalize_name_char(c) {
                    if name.chars().count() < MAX_NAME_LEN {
                        name.push(c);
                    }
                }
            }
            _ => {}
        },
    }

    if let Some(name) = submission {
        over.stage = Stage::IdleDisplay;
        let (epoch, score) = (over.epoch, over.final_score);
        submit(state, epoch, name, score);
    } else if restart_run {
        restart(state, now);
    }
    true
}

/// Optimistic local merge, then ask the host to post it
fn submit(state: &mut GameState, epoch: u32, name: String, score: u64) {
    log::info!("Submitting {score} as {name}");
    state.leaderboard.merge_submission(&name, score);
    state.identity.name = Some(name.clone());
    state.events.push(GameEvent::IdentityChanged);
    state.events.push(GameEvent::SubmitScore { epoch, name, score });
}

/// Fresh run. Used by the post-game key press and by Ctrl+G from any state.
pub fn restart(state: &mut GameState, now: f64) {
    state.entities.clear();
    state.run = RunState::default();
    state.clock.clear();
    state.scheduler.reset(now);
    state.flash_until = 0.0;
    state.phase = if state.game_page {
        GamePhase::Countdown {
            ends_at: now + COUNTDOWN_MS,
        }
    } else {
        GamePhase::Playing
    };
    log::info!("Run restarted");
    state.events.push(GameEvent::Restarted);
}

//! Browser glue
//!
//! - `storage`: `localStorage` and `document.cookie` behind `KeyValueStore`
//! - `net`: the highscore endpoint over `fetch`
//! - `hud`: writes `HudView` into the page's readout elements
//!
//! Everything here is wasm-only; the engine itself never touches the DOM.

#[cfg(target_arch = "wasm32")]
pub mod hud;
#[cfg(target_arch = "wasm32")]
pub mod net;
#[cfg(target_arch = "wasm32")]
pub mod storage;

/// Minimum viewport width for the game (narrower screens keep the starfield only)
pub const GAME_MIN_WIDTH_QUERY: &str = "(min-width: 560px)";
/// Clicks on page chrome never shoot
pub const CHROME_SELECTOR: &str = "a, button, nav, input, select, textarea";
/// Space over form controls keeps its default behavior
pub const FORM_SELECTOR: &str = "input, textarea, select, button";
/// System preference that turns off the nuke flash and parallax
pub const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

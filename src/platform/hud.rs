//! DOM readouts around the canvas
//!
//! The page provides `#game-score`, `#game-level`, `#game-lives`,
//! `#game-pause` (plus `-hint` / `-wrap`), `#game-mute` and `.game-restart`.
//! Any of them may be missing. Writes only happen when the view changed.

use web_sys::{Document, HtmlElement};
use wasm_bindgen::JsCast;

use crate::consts::MAX_LIVES;
use crate::engine::HudView;

pub struct Hud {
    document: Document,
    last: Option<HudView>,
}

impl Hud {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            last: None,
        }
    }

    fn element(&self, id: &str) -> Option<HtmlElement> {
        self.document
            .get_element_by_id(id)
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    }

    fn set_text(&self, id: &str, text: &str) {
        if let Some(el) = self.element(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_shown(el: &HtmlElement, shown: bool) {
        let display = if shown { "" } else { "none" };
        el.style().set_property("display", display).ok();
    }

    pub fn update(&mut self, view: &HudView) {
        if self.last.as_ref() == Some(view) {
            return;
        }

        if let Some(score) = self.element("game-score") {
            score.set_text_content(Some(&view.score.to_string()));
            if let Some(parent) = score
                .parent_element()
                .and_then(|p| p.dyn_into::<HtmlElement>().ok())
            {
                Self::set_shown(&parent, view.visible);
            }
        }
        self.set_text("game-level", &view.level_text());

        if let Some(lives) = self.element("game-lives") {
            let hearts: String = (0..MAX_LIVES)
                .map(|i| {
                    if i < view.lives {
                        "<span>\u{2665}</span>"
                    } else {
                        "<span style=\"opacity:0.2\">\u{2665}</span>"
                    }
                })
                .collect();
            lives.set_inner_html(&hearts);
            Self::set_shown(&lives, view.visible);
        }

        self.set_text("game-pause", view.pause_glyph());
        if let Some(pause) = self.element("game-pause") {
            let size = if view.paused { "calc(var(--unit) * 8)" } else { "" };
            pause.style().set_property("font-size", size).ok();
        }
        self.set_text("game-pause-hint", view.pause_hint());
        if let Some(wrap) = self.element("game-pause-wrap") {
            Self::set_shown(&wrap, view.visible && !view.game_over);
        }
        self.set_text("game-mute", view.mute_glyph());

        if let Ok(Some(restart)) = self.document.query_selector(".game-restart") {
            if let Ok(restart) = restart.dyn_into::<HtmlElement>() {
                let text = if view.game_over { "" } else { "Ctrl+G Restart" };
                restart.set_text_content(Some(text));
                Self::set_shown(&restart, view.visible);
            }
        }

        self.last = Some(view.clone());
    }
}

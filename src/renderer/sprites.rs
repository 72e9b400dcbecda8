//! Pixel-art sprites and the 5x5 block font

use glam::Vec2;

use super::{Color, Surface};

pub type Sprite = &'static [&'static str];

pub const SHIP: Sprite = &[
    "    ##    ",
    "   ####   ",
    "   ####   ",
    "  ######  ",
    " ######## ",
    " # #### # ",
    " #  ##  # ",
    "   #  #   ",
];

pub const GRUNT: Sprite = &[
    "  #   #  ",
    "   # #   ",
    "  #####  ",
    " ## # ## ",
    "#########",
    "# ##### #",
    "# #   # #",
    "   ## #  ",
];

pub const ELITE: Sprite = &[" # # ", "## ##", "# # #", "## ##", " # # "];

pub const HEART: Sprite = &[
    " ## ## ", "#######", "#######", " ##### ", "  ###  ", "   #   ",
];

pub const GUNNER: Sprite = &[
    " # # # ", "## # ##", "#######", " ## ## ", "  ###  ", " #   # ",
];

pub const NUKE: Sprite = &[
    "  ###  ", " ##### ", "## # ##", "#######", "## # ##", " ##### ", "  ###  ",
];

pub const SHIELD: Sprite = &[
    "#######", "#  #  #", "# ### #", "#  #  #", " #   # ", "  # #  ", "   #   ",
];

/// Draw `sprite` centered on `center`, `px` screen pixels per cell
pub fn draw_sprite(surface: &mut dyn Surface, sprite: Sprite, center: Vec2, px: f32, color: Color) {
    let size = sprite_size(sprite, px);
    let origin = center - size / 2.0;
    for (row, line) in sprite.iter().enumerate() {
        for (col, cell) in line.bytes().enumerate() {
            if cell == b'#' {
                let pos = origin + Vec2::new(col as f32, row as f32) * px;
                surface.fill_rect(pos, Vec2::splat(px), color);
            }
        }
    }
}

pub fn sprite_size(sprite: Sprite, px: f32) -> Vec2 {
    let cols = sprite.first().map_or(0, |l| l.len());
    Vec2::new(cols as f32, sprite.len() as f32) * px
}

/// 5x5 glyph rows for `c`
pub fn glyph(c: char) -> Option<[&'static str; 5]> {
    let rows = match c.to_ascii_uppercase() {
        'A' => [" ### ", "#   #", "#####", "#   #", "#   #"],
        'B' => ["#### ", "#   #", "#### ", "#   #", "#### "],
        'C' => [" ####", "#    ", "#    ", "#    ", " ####"],
        'D' => ["#### ", "#   #", "#   #", "#   #", "#### "],
        'E' => ["#####", "#    ", "#### ", "#    ", "#####"],
        'F' => ["#####", "#    ", "#### ", "#    ", "#    "],
        'G' => ["#####", "#    ", "# ###", "#   #", "#####"],
        'H' => ["#   #", "#   #", "#####", "#   #", "#   #"],
        'I' => [" ### ", "  #  ", "  #  ", "  #  ", " ### "],
        'J' => ["#####", "    #", "    #", "#   #", " ### "],
        'K' => ["#   #", "#  # ", "###  ", "#  # ", "#   #"],
        'L' => ["#    ", "#    ", "#    ", "#    ", "#####"],
        'M' => ["#   #", "## ##", "# # #", "#   #", "#   #"],
        'N' => ["#   #", "##  #", "# # #", "#  ##", "#   #"],
        'O' => [" ### ", "#   #", "#   #", "#   #", " ### "],
        'P' => ["#### ", "#   #", "#### ", "#    ", "#    "],
        'Q' => [" ### ", "#   #", "# # #", "#  # ", " ## #"],
        'R' => ["#### ", "#   #", "#### ", "#  # ", "#   #"],
        'S' => [" ####", "#    ", " ### ", "    #", "#### "],
        'T' => ["#####", "  #  ", "  #  ", "  #  ", "  #  "],
        'U' => ["#   #", "#   #", "#   #", "#   #", " ### "],
        'V' => ["#   #", "#   #", " # # ", " # # ", "  #  "],
        'W' => ["#   #", "#   #", "# # #", "## ##", "#   #"],
        'X' => ["#   #", " # # ", "  #  ", " # # ", "#   #"],
        'Y' => ["#   #", " # # ", "  #  ", "  #  ", "  #  "],
        'Z' => ["#####", "   # ", "  #  ", " #   ", "#####"],
        '0' => [" ### ", "#  ##", "# # #", "##  #", " ### "],
        '1' => ["  #  ", " ##  ", "  #  ", "  #  ", " ### "],
        '2' => [" ### ", "#   #", "  ## ", " #   ", "#####"],
        '3' => ["#### ", "    #", " ### ", "    #", "#### "],
        '4' => ["#   #", "#   #", "#####", "    #", "    #"],
        '5' => ["#####", "#    ", "#### ", "    #", "#### "],
        '6' => [" ### ", "#    ", "#### ", "#   #", " ### "],
        '7' => ["#####", "    #", "   # ", "  #  ", "  #  "],
        '8' => [" ### ", "#   #", " ### ", "#   #", " ### "],
        '9' => [" ### ", "#   #", " ####", "    #", " ### "],
        ' ' => ["     ", "     ", "     ", "     ", "     "],
        '.' => ["     ", "     ", "     ", "     ", "  #  "],
        '-' => ["     ", "     ", " ### ", "     ", "     "],
        '_' => ["     ", "     ", "     ", "     ", "#####"],
        _ => return None,
    };
    Some(rows)
}

/// Width of `text` in the block font (one cell gap between glyphs)
pub fn text_width(text: &str, px: f32) -> f32 {
    let n = text.chars().count() as f32;
    if n == 0.0 {
        return 0.0;
    }
    n * 6.0 * px - px
}

/// Draw block-font text with its top-left at `origin`. `color` may vary per glyph.
pub fn draw_text(
    surface: &mut dyn Surface,
    text: &str,
    origin: Vec2,
    px: f32,
    mut color: impl FnMut(usize, Vec2) -> Color,
) {
    for (i, c) in text.chars().enumerate() {
        let Some(rows) = glyph(c) else { continue };
        let glyph_origin = origin + Vec2::new(i as f32 * 6.0 * px, 0.0);
        for (row, line) in rows.iter().enumerate() {
            for (col, cell) in line.bytes().enumerate() {
                if cell == b'#' {
                    let pos = glyph_origin + Vec2::new(col as f32, row as f32) * px;
                    surface.fill_rect(pos, Vec2::splat(px), color(i, pos));
                }
            }
        }
    }
}

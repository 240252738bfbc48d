//! Screen layout: scene on the left, chat/status/context/input on the right.

use crate::types::{DEFAULT_TERM_HEIGHT, DEFAULT_TERM_WIDTH, MAX_INPUT_LINES, SCENE_COLS, SCENE_ROWS};

/// Smallest usable terminal; smaller reports are clamped up to this.
pub const MIN_WIDTH: u16 = 20;
pub const MIN_HEIGHT: u16 = 6;

/// Columns the side column keeps before the scene may take any width.
pub const SIDE_MIN_WIDTH: u16 = 32;

/// Prompt drawn in front of the first input line.
pub const PROMPT: &str = "> ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub w: u16,
    pub h: u16,
}

impl Rect {
    pub const fn new(x: u16, y: u16, w: u16, h: u16) -> Self {
        Self { x, y, w, h }
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
}

/// Terminal size to lay out against. Zero reports fall back to 80x24.
pub fn effective_size(width: u16, height: u16) -> (u16, u16) {
    if width == 0 || height == 0 {
        return (DEFAULT_TERM_WIDTH, DEFAULT_TERM_HEIGHT);
    }
    (width.max(MIN_WIDTH), height.max(MIN_HEIGHT))
}

/// Terminal rows one tile occupies (two pixel rows per glyph row).
pub fn glyph_height(tile_size: usize) -> usize {
    tile_size.div_ceil(2).max(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Layout {
    pub width: u16,
    pub height: u16,
    pub scene: Rect,
    pub chat: Rect,
    pub status: Rect,
    pub context: Rect,
    pub input: Rect,
}

impl Layout {
    pub fn compute(width: u16, height: u16, tile_size: usize, input_lines: usize) -> Self {
        let (w, h) = effective_size(width, height);
        let tile = tile_size.max(1);
        let glyph_h = glyph_height(tile);

        let room = w.saturating_sub(SIDE_MIN_WIDTH + 1) as usize;
        let scene_cols = (room / tile).min(SCENE_COLS);
        let scene_rows = (h as usize / glyph_h).min(SCENE_ROWS);
        let scene = if scene_cols == 0 || scene_rows == 0 {
            Rect::default()
        } else {
            Rect::new(0, 0, (scene_cols * tile) as u16, (scene_rows * glyph_h) as u16)
        };

        let side_x = if scene.is_empty() { 0 } else { scene.w + 1 };
        let side_w = w - side_x;
        let input_h = (input_lines.clamp(1, MAX_INPUT_LINES) as u16).min(h - 4);
        let chat_h = h - input_h - 2;

        Self {
            width: w,
            height: h,
            scene,
            chat: Rect::new(side_x, 0, side_w, chat_h),
            status: Rect::new(side_x, chat_h, side_w, 1),
            context: Rect::new(side_x, chat_h + 1, side_w, 1),
            input: Rect::new(side_x, chat_h + 2, side_w, input_h),
        }
    }

    /// Wrap width for the input editor. The last column stays free for the
    /// cursor that sits after a full line.
    pub fn input_text_width(&self) -> usize {
        (self.input.w as usize)
            .saturating_sub(PROMPT.chars().count() + 1)
            .max(1)
    }

    /// Whole scene tiles that fit the scene rect.
    pub fn scene_tiles(&self, tile_size: usize) -> (usize, usize) {
        let tile = tile_size.max(1);
        (
            self.scene.w as usize / tile,
            self.scene.h as usize / glyph_height(tile),
        )
    }
}

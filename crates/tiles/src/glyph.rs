//! Glyph rows: pixel grids encoded as terminal-ready colored strings.
//!
//! Each output row covers two pixel rows. The glyph is an upper half block
//! (`▀`): its foreground color is the upper pixel and its background color is
//! the lower pixel. Colors are only re-emitted when they change along the row,
//! and every row ends with a color reset so rows can be printed independently.

use std::collections::HashMap;
use std::rc::Rc;

use crossterm::style::{Color, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::Command;

use crate::atlas::{AssetLoadError, TileStore};
use crate::pixel::{composite_onto_background, mirror_horizontally, PixelGrid};
use crate::types::{is_foreground_tile, Rgba, TileIndex, ALPHA_THRESHOLD};

/// Upper half block.
pub const HALF_BLOCK: char = '▀';

/// Rendered rows of one tile (or any pixel grid).
pub type GlyphRows = Rc<[String]>;

/// Cache key for [`TileRenderCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlyphKey {
    pub tile: TileIndex,
    pub mirrored: bool,
    /// Ground to composite a foreground tile onto; `None` means the cache's
    /// default backdrop. Ignored for background tiles.
    pub backdrop: Option<TileIndex>,
}

impl GlyphKey {
    pub fn new(tile: TileIndex, mirrored: bool) -> Self {
        Self {
            tile,
            mirrored,
            backdrop: None,
        }
    }

    pub fn on(tile: TileIndex, mirrored: bool, backdrop: TileIndex) -> Self {
        Self {
            tile,
            mirrored,
            backdrop: Some(backdrop),
        }
    }
}

fn push_ansi(out: &mut String, cmd: impl Command) {
    // Writing into a String cannot fail.
    let _ = cmd.write_ansi(out);
}

fn rgb(px: Rgba) -> Color {
    Color::Rgb {
        r: px.r,
        g: px.g,
        b: px.b,
    }
}

/// Encode one glyph row from pixel rows `2 * row` and `2 * row + 1`.
///
/// A missing lower row (odd heights) renders black.
pub fn render_glyph_row(grid: &PixelGrid, row: usize) -> String {
    let mut out = String::with_capacity(grid.width() * 24);
    let mut fg: Option<Rgba> = None;
    let mut bg: Option<Rgba> = None;
    let upper_y = row * 2;
    let lower_y = upper_y + 1;
    for x in 0..grid.width() {
        let upper = grid.get(x, upper_y);
        let lower = if lower_y < grid.height() {
            grid.get(x, lower_y)
        } else {
            Rgba::BLACK
        };
        if fg != Some(upper) {
            push_ansi(&mut out, SetForegroundColor(rgb(upper)));
            fg = Some(upper);
        }
        if bg != Some(lower) {
            push_ansi(&mut out, SetBackgroundColor(rgb(lower)));
            bg = Some(lower);
        }
        out.push(HALF_BLOCK);
    }
    push_ansi(&mut out, ResetColor);
    out
}

/// Encode a whole grid, one string per pair of pixel rows.
pub fn render_to_glyph_rows(grid: &PixelGrid) -> Vec<String> {
    let rows = grid.height().div_ceil(2);
    (0..rows).map(|r| render_glyph_row(grid, r)).collect()
}

/// Memo of rendered glyph rows keyed by `(tile, mirrored, backdrop)`.
///
/// The atlas is immutable after load, so entries are never invalidated.
#[derive(Debug)]
pub struct TileRenderCache {
    backdrop: TileIndex,
    rows: HashMap<GlyphKey, GlyphRows>,
}

impl TileRenderCache {
    /// `backdrop` is the ground tile foreground tiles are composited onto when a
    /// key does not name one.
    pub fn new(backdrop: TileIndex) -> Self {
        Self {
            backdrop,
            rows: HashMap::new(),
        }
    }

    pub fn backdrop(&self) -> TileIndex {
        self.backdrop
    }

    /// Cached rows for `key`, if already rendered.
    pub fn get(&self, key: GlyphKey) -> Option<GlyphRows> {
        self.rows.get(&key).cloned()
    }

    /// Rows for `key`, rendering and caching them on a miss.
    pub fn rows(&mut self, store: &mut TileStore, key: GlyphKey) -> Result<GlyphRows, AssetLoadError> {
        if let Some(rows) = self.rows.get(&key) {
            return Ok(Rc::clone(rows));
        }
        let pixels = self.resolve_pixels(store, key)?;
        let rows: GlyphRows = render_to_glyph_rows(&pixels).into();
        self.rows.insert(key, Rc::clone(&rows));
        Ok(rows)
    }

    /// Final pixels for `key`: extracted, mirrored if asked, and composited onto
    /// its backdrop when it is a foreground tile.
    pub fn resolve_pixels(&self, store: &mut TileStore, key: GlyphKey) -> Result<PixelGrid, AssetLoadError> {
        let tile = store.tile(key.tile)?;
        let pixels = if key.mirrored {
            mirror_horizontally(&tile)
        } else {
            (*tile).clone()
        };
        if !is_foreground_tile(key.tile) {
            return Ok(pixels);
        }
        let ground = store.tile(key.backdrop.unwrap_or(self.backdrop))?;
        Ok(composite_onto_background(&pixels, &ground, ALPHA_THRESHOLD))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Strip ANSI escape sequences, leaving only printed characters.
pub fn visible_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            // CSI: ESC [ params final-byte
            if chars.next() == Some('[') {
                for c in chars.by_ref() {
                    if ('@'..='~').contains(&c) {
                        break;
                    }
                }
            }
            continue;
        }
        out.push(ch);
    }
    out
}

//! SceneView: renders a [`SceneGrid`] into terminal rows.
//!
//! Plain cells come straight from the [`TileRenderCache`]. Cells touched by a
//! lifted sprite or an overlay are composed per pixel for the current frame and
//! rendered uncached:
//!
//! - a lifted sprite is drawn `lift_px` pixels above its logical cell, so its
//!   ground shows through at the bottom and its head spills into the bottom
//!   rows of the cell above
//! - overlay icons are downscaled 2:1 into the top-right quadrant of the
//!   sprite's cell

use std::collections::HashMap;

use tui_parley_core::{build_grid, Occupant, SceneGrid, SpriteEngine};
use tui_parley_tiles::{
    blit, downscale_half, mirror_horizontally, render_to_glyph_rows, AssetLoadError, GlyphKey,
    PixelGrid, TileRenderCache, TileStore,
};

use crate::layout::glyph_height;
use crate::types::{tiles, Rgba, TileIndex, ALPHA_THRESHOLD, SCENE_COLS, SCENE_ROWS, TILE_SIZE};

/// Glyph-cache key for a cell's resting content.
fn cell_key(grid: &SceneGrid, row: usize, col: usize) -> Option<GlyphKey> {
    let cell = grid.get(row, col)?;
    Some(match &cell.top {
        Some(top) => {
            let t = top.tile();
            GlyphKey::on(t.tile, t.mirrored, cell.ground)
        }
        None => GlyphKey::new(cell.ground, false),
    })
}

fn sprite_pixels(store: &mut TileStore, tile: TileIndex, mirrored: bool) -> Result<PixelGrid, AssetLoadError> {
    let raw = store.tile(tile)?;
    Ok(if mirrored {
        mirror_horizontally(&raw)
    } else {
        (*raw).clone()
    })
}

/// Per-frame pixel compositions for cells that cannot come from the cache.
fn compose_cells(
    store: &mut TileStore,
    cache: &TileRenderCache,
    grid: &SceneGrid,
    engine: &SpriteEngine,
) -> Result<HashMap<(usize, usize), PixelGrid>, AssetLoadError> {
    let size = store.tile_size();
    let mut composed: HashMap<(usize, usize), PixelGrid> = HashMap::new();

    // Cells holding a drawn sprite, top rows first so a spill lands on top of
    // whatever the cell above already composed.
    let mut drawn: Vec<(usize, usize, &Occupant)> = Vec::new();
    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            if let Some(top) = grid.get(row, col).and_then(|c| c.top.as_ref()) {
                if top.sprite_id().is_some() {
                    drawn.push((row, col, top));
                }
            }
        }
    }

    for (row, col, top) in drawn {
        let Some(id) = top.sprite_id() else { continue };
        let lift = engine.pose(id).lift_px.min(size);
        let overlays = engine.overlays(id);
        if lift == 0 && overlays.is_empty() {
            continue;
        }
        let tile = top.tile();
        let Some(cell) = grid.get(row, col) else { continue };

        let mut pixels = if lift == 0 {
            match composed.remove(&(row, col)) {
                Some(p) => p,
                None => cache.resolve_pixels(store, GlyphKey::on(tile.tile, tile.mirrored, cell.ground))?,
            }
        } else {
            let mut base = cache.resolve_pixels(store, GlyphKey::new(cell.ground, false))?;
            let body = sprite_pixels(store, tile.tile, tile.mirrored)?;
            blit(&mut base, &body, 0, -(lift as isize), ALPHA_THRESHOLD);
            if row > 0 {
                let mut above = match composed.remove(&(row - 1, col)) {
                    Some(p) => p,
                    None => match cell_key(grid, row - 1, col) {
                        Some(key) => cache.resolve_pixels(store, key)?,
                        None => PixelGrid::square(size, Rgba::BLACK),
                    },
                };
                blit(&mut above, &body, 0, (size - lift) as isize, ALPHA_THRESHOLD);
                composed.insert((row - 1, col), above);
            }
            base
        };

        for flag in overlays {
            let icon = downscale_half(&*store.tile(flag.icon())?);
            let x = size.saturating_sub(icon.width());
            blit(&mut pixels, &icon, x as isize, 0, ALPHA_THRESHOLD);
        }
        composed.insert((row, col), pixels);
    }
    Ok(composed)
}

/// Render the top-left `cols x rows` tiles of `grid`, one string per terminal
/// row.
pub fn render_grid_rows(
    store: &mut TileStore,
    cache: &mut TileRenderCache,
    grid: &SceneGrid,
    engine: &SpriteEngine,
    cols: usize,
    rows: usize,
) -> Result<Vec<String>, AssetLoadError> {
    let cols = cols.min(grid.cols());
    let rows = rows.min(grid.rows());
    let glyph_h = glyph_height(store.tile_size());

    let composed: HashMap<(usize, usize), Vec<String>> = compose_cells(store, cache, grid, engine)?
        .into_iter()
        .map(|(at, pixels)| (at, render_to_glyph_rows(&pixels)))
        .collect();

    let mut out = Vec::with_capacity(rows * glyph_h);
    for row in 0..rows {
        let mut cells = Vec::with_capacity(cols);
        for col in 0..cols {
            cells.push(match composed.get(&(row, col)) {
                Some(lines) => CellRows::Composed(lines),
                None => match cell_key(grid, row, col) {
                    Some(key) => CellRows::Cached(cache.rows(store, key)?),
                    None => CellRows::Empty,
                },
            });
        }
        for gy in 0..glyph_h {
            let mut line = String::new();
            for cell in &cells {
                line.push_str(cell.line(gy));
            }
            out.push(line);
        }
    }
    Ok(out)
}

enum CellRows<'a> {
    Cached(tui_parley_tiles::GlyphRows),
    Composed(&'a [String]),
    Empty,
}

impl CellRows<'_> {
    fn line(&self, gy: usize) -> &str {
        match self {
            CellRows::Cached(rows) => rows.get(gy).map(String::as_str).unwrap_or(""),
            CellRows::Composed(rows) => rows.get(gy).map(String::as_str).unwrap_or(""),
            CellRows::Empty => "",
        }
    }
}

/// Render the whole scene as one string, rows joined by `\n` with no trailing
/// newline.
pub fn render_grid(
    store: &mut TileStore,
    cache: &mut TileRenderCache,
    grid: &SceneGrid,
    engine: &SpriteEngine,
) -> Result<String, AssetLoadError> {
    Ok(render_grid_rows(store, cache, grid, engine, SCENE_COLS, SCENE_ROWS)?.join("\n"))
}

/// Owner of the tile store and glyph cache for the scene pane.
///
/// A scene without tiles (atlas failed to load, or a later tile lookup
/// failed) renders a one-line notice instead.
#[derive(Debug)]
pub struct SceneView {
    tiles: Option<(TileStore, TileRenderCache)>,
    notice: String,
}

impl SceneView {
    pub fn new(store: TileStore) -> Self {
        Self {
            tiles: Some((store, TileRenderCache::new(tiles::GRASS_SPARSE))),
            notice: String::new(),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            tiles: None,
            notice: reason.into(),
        }
    }

    pub fn from_load(result: Result<TileStore, AssetLoadError>) -> Self {
        match result {
            Ok(store) => Self::new(store),
            Err(e) => {
                log::warn!("scene disabled: {}", e);
                Self::unavailable(e.to_string())
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.tiles.is_some()
    }

    /// Why the scene is not drawn, if it is not.
    pub fn notice(&self) -> Option<&str> {
        (!self.is_available()).then_some(self.notice.as_str())
    }

    pub fn tile_size(&self) -> usize {
        self.tiles
            .as_ref()
            .map(|(store, _)| store.tile_size())
            .unwrap_or(TILE_SIZE)
    }

    pub fn cache(&self) -> Option<&TileRenderCache> {
        self.tiles.as_ref().map(|(_, cache)| cache)
    }

    /// Rows for the scene pane at the engine's current state.
    ///
    /// A render failure disables the scene for the rest of the session. The
    /// notice row is fitted to the pane width, `cols` tiles wide.
    pub fn render_rows(&mut self, engine: &SpriteEngine, cols: usize, rows: usize) -> Vec<String> {
        if let Some((store, cache)) = self.tiles.as_mut() {
            let grid = build_grid(engine.sprites());
            match render_grid_rows(store, cache, &grid, engine, cols, rows) {
                Ok(lines) => return lines,
                Err(e) => {
                    log::warn!("scene render failed, disabling scene: {}", e);
                    self.notice = e.to_string();
                    self.tiles = None;
                }
            }
        }
        let width = cols * self.tile_size();
        vec![fit_width(&format!("scene unavailable: {}", self.notice), width)]
    }
}

/// Clip or space-pad `text` to exactly `width` columns.
fn fit_width(text: &str, width: usize) -> String {
    let mut line: String = text.chars().take(width).collect();
    let used = line.chars().count();
    line.extend(std::iter::repeat(' ').take(width - used));
    line
}

#![allow(dead_code)]

use image::{Rgba, RgbaImage};

use tui_parley::adapter::HookCall;
use tui_parley::term::{RecordingSurface, SceneView};
use tui_parley::tiles::{Atlas, TileStore};
use tui_parley::types::is_foreground_tile;
use tui_parley::App;

pub const TILE: usize = 4;

/// 8x8 grid of 4px tiles. Red ramps left to right inside every tile and
/// foreground tiles are opaque on their left half only, so no tile is
/// mirror-symmetric.
pub fn store() -> TileStore {
    let mut img = RgbaImage::new((8 * TILE) as u32, (8 * TILE) as u32);
    for (x, y, px) in img.enumerate_pixels_mut() {
        let index = (y as usize / TILE) * 8 + x as usize / TILE;
        let left = (x as usize % TILE) < TILE / 2;
        let alpha = if is_foreground_tile(index as u16) && !left { 0 } else { 255 };
        *px = Rgba([index as u8 * 4 + (x as u8 % TILE as u8), 90 + (y as u8 % TILE as u8) * 10, 200 - index as u8, alpha]);
    }
    TileStore::new(Atlas::from_image(img, TILE).expect("synthetic atlas"))
}

pub type TestApp = App<RecordingSurface, Vec<HookCall>>;

pub fn app(width: u16, height: u16) -> TestApp {
    let mut app = App::new(
        RecordingSurface::new(width, height),
        SceneView::new(store()),
        Vec::new(),
        250,
    );
    app.full_draw().expect("first draw");
    app.scheduler_mut().surface_mut().clear_ops();
    app
}

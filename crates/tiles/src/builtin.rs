//! Procedurally drawn atlas, used when no atlas file is configured.
//!
//! Every catalogue tile is painted from a few shapes in tile-local unit
//! coordinates, so the atlas works at any tile size. Ground tiles are fully
//! opaque; everything from [`FOREGROUND_TILE_START`] up is drawn on a
//! transparent background. Characters face right and are left/right
//! asymmetric so a mirrored sprite is visibly turned around.

use image::{Rgba as ImgRgba, RgbaImage};

use crate::atlas::{AssetLoadError, Atlas};
use crate::types::{tiles, TileIndex, FOREGROUND_TILE_START};

const TILES_PER_ROW: u32 = 8;
const ATLAS_ROWS: u32 = 7;

type Color = [u8; 3];

const GRASS: Color = [86, 156, 70];
const GRASS_DARK: Color = [62, 124, 54];
const PETAL: Color = [236, 206, 72];
const PETAL_PINK: Color = [228, 120, 168];
const SAND: Color = [198, 172, 122];
const PEBBLE: Color = [160, 136, 96];
const WATER: Color = [60, 116, 196];
const FOAM: Color = [132, 180, 232];
const STONE: Color = [142, 142, 150];
const MORTAR: Color = [100, 100, 108];
const BARK: Color = [112, 74, 40];
const LEAVES: Color = [40, 110, 52];
const ROCK: Color = [120, 120, 128];
const BOARD: Color = [182, 140, 84];
const SKIN: Color = [238, 196, 160];
const EYE: Color = [24, 24, 32];
const BOOTS: Color = [56, 44, 40];
const BLUE: Color = [64, 104, 220];
const PURPLE: Color = [140, 72, 196];
const RED: Color = [208, 64, 64];
const ORANGE: Color = [232, 140, 48];
const TEAL: Color = [40, 168, 160];
const FROG: Color = [96, 188, 72];
const TONGUE: Color = [232, 96, 120];
const OWL: Color = [150, 104, 64];
const WHITE: Color = [244, 244, 244];
const BEAK: Color = [240, 168, 40];
const ALERT_RED: Color = [220, 40, 40];

/// One pixel of a tile: integer coordinates plus its centre in `0..1`.
#[derive(Debug, Clone, Copy)]
struct Px {
    x: u32,
    y: u32,
    u: f32,
    v: f32,
}

impl Px {
    fn new(x: u32, y: u32, size: u32) -> Self {
        let s = size as f32;
        Self {
            x,
            y,
            u: (x as f32 + 0.5) / s,
            v: (y as f32 + 0.5) / s,
        }
    }

    fn within(&self, u: (f32, f32), v: (f32, f32)) -> bool {
        self.u >= u.0 && self.u < u.1 && self.v >= v.0 && self.v < v.1
    }

    fn in_ellipse(&self, cx: f32, cy: f32, rx: f32, ry: f32) -> bool {
        let du = (self.u - cx) / rx;
        let dv = (self.v - cy) / ry;
        du * du + dv * dv <= 1.0
    }

    fn in_circle(&self, cx: f32, cy: f32, r: f32) -> bool {
        self.in_ellipse(cx, cy, r, r)
    }

    /// Sparse deterministic speckle, roughly one pixel in `every`.
    fn speckle(&self, every: u32) -> bool {
        (self.x * 7 + self.y * 13) % every == 0
    }
}

/// Build the built-in atlas at `tile_size` pixels per tile.
pub fn builtin_atlas(tile_size: usize) -> Result<Atlas, AssetLoadError> {
    let bad = || AssetLoadError::BadDimensions {
        width: 0,
        height: 0,
        tile_size,
    };
    let size = u32::try_from(tile_size).map_err(|_| bad())?;
    let width = size.checked_mul(TILES_PER_ROW).ok_or_else(bad)?;
    let height = size.checked_mul(ATLAS_ROWS).ok_or_else(bad)?;

    let image = RgbaImage::from_fn(width, height, |x, y| {
        let index = ((y / size) * TILES_PER_ROW + x / size) as TileIndex;
        match paint(index, Px::new(x % size, y % size, size)) {
            Some([r, g, b]) => ImgRgba([r, g, b, 255]),
            None => ImgRgba([0, 0, 0, 0]),
        }
    });
    let atlas = Atlas::from_image(image, tile_size)?;
    log::info!("using built-in atlas ({} tiles of {}px)", atlas.tile_count(), tile_size);
    Ok(atlas)
}

fn paint(index: TileIndex, p: Px) -> Option<Color> {
    match index {
        tiles::GRASS_SPARSE => Some(grass(p, 11)),
        tiles::GRASS_DENSE => Some(grass(p, 3)),
        tiles::GRASS_FLOWERS => Some(flowers(p)),
        tiles::PATH => Some(if p.speckle(9) { PEBBLE } else { SAND }),
        tiles::WATER => Some(water(p)),
        tiles::STONE_FLOOR => Some(stone(p)),
        tiles::TREE => tree(p),
        tiles::ROCK => p.in_ellipse(0.5, 0.7, 0.36, 0.22).then_some(ROCK),
        tiles::BUSH => p.in_ellipse(0.5, 0.66, 0.4, 0.3).then_some(LEAVES),
        tiles::SIGNPOST => signpost(p),
        tiles::PLAYER => figure(p, BLUE),
        tiles::ARBITER => figure(p, PURPLE),
        tiles::PEER_1 => figure(p, RED),
        tiles::PEER_2 => figure(p, ORANGE),
        tiles::PEER_3 => figure(p, TEAL),
        tiles::FROG => frog(p),
        tiles::OWL => owl(p),
        tiles::CHAT_BUBBLE => bubble(p),
        tiles::ALERT => alert(p),
        i if i < FOREGROUND_TILE_START => Some(grass(p, 11)),
        _ => None,
    }
}

fn grass(p: Px, every: u32) -> Color {
    if p.speckle(every) {
        GRASS_DARK
    } else {
        GRASS
    }
}

fn flowers(p: Px) -> Color {
    if p.in_circle(0.25, 0.3, 0.09) || p.in_circle(0.72, 0.78, 0.09) {
        PETAL
    } else if p.in_circle(0.7, 0.35, 0.09) {
        PETAL_PINK
    } else {
        grass(p, 11)
    }
}

fn water(p: Px) -> Color {
    if ((p.v * 4.0 + p.u).fract()) < 0.12 {
        FOAM
    } else {
        WATER
    }
}

fn stone(p: Px) -> Color {
    let edge = |t: f32| t < 0.06 || (t - 0.5).abs() < 0.03;
    // Running bond: the vertical joint shifts on the lower course.
    let joint = if p.v < 0.5 { p.u } else { (p.u + 0.5).fract() };
    if edge(p.v) || edge(joint) {
        MORTAR
    } else {
        STONE
    }
}

fn tree(p: Px) -> Option<Color> {
    if p.in_circle(0.5, 0.38, 0.32) {
        Some(LEAVES)
    } else if p.within((0.42, 0.58), (0.6, 0.96)) {
        Some(BARK)
    } else {
        None
    }
}

fn signpost(p: Px) -> Option<Color> {
    if p.within((0.18, 0.82), (0.18, 0.44)) {
        Some(BOARD)
    } else if p.within((0.44, 0.56), (0.44, 0.96)) {
        Some(BARK)
    } else {
        None
    }
}

/// Standing figure facing right: the eye and the arm sit right of centre.
fn figure(p: Px, body: Color) -> Option<Color> {
    if p.in_circle(0.58, 0.26, 0.06) {
        Some(EYE)
    } else if p.in_circle(0.5, 0.26, 0.17) {
        Some(SKIN)
    } else if p.within((0.32, 0.68), (0.45, 0.8)) || p.within((0.68, 0.8), (0.5, 0.7)) {
        Some(body)
    } else if p.within((0.34, 0.46), (0.8, 0.96)) || p.within((0.54, 0.66), (0.8, 0.96)) {
        Some(BOOTS)
    } else {
        None
    }
}

fn frog(p: Px) -> Option<Color> {
    if p.in_circle(0.4, 0.4, 0.05) || p.in_circle(0.67, 0.4, 0.05) {
        Some(EYE)
    } else if p.in_circle(0.36, 0.42, 0.11) || p.in_circle(0.63, 0.42, 0.11) {
        Some(FROG)
    } else if p.within((0.8, 0.94), (0.6, 0.68)) {
        Some(TONGUE)
    } else {
        p.in_ellipse(0.5, 0.66, 0.38, 0.25).then_some(FROG)
    }
}

fn owl(p: Px) -> Option<Color> {
    if p.in_circle(0.42, 0.4, 0.045) || p.in_circle(0.66, 0.4, 0.045) {
        Some(EYE)
    } else if p.in_circle(0.38, 0.4, 0.1) || p.in_circle(0.62, 0.4, 0.1) {
        Some(WHITE)
    } else if p.within((0.5, 0.6), (0.5, 0.58)) {
        Some(BEAK)
    } else {
        p.in_ellipse(0.5, 0.56, 0.3, 0.38).then_some(OWL)
    }
}

fn bubble(p: Px) -> Option<Color> {
    let dot = [0.3, 0.5, 0.7].iter().any(|&cx| p.in_circle(cx, 0.42, 0.07));
    if dot && p.within((0.1, 0.9), (0.15, 0.7)) {
        Some(EYE)
    } else if p.within((0.1, 0.9), (0.15, 0.7)) {
        Some(WHITE)
    } else if p.within((0.2, 0.2 + (0.88 - p.v).max(0.0)), (0.7, 0.88)) {
        Some(WHITE)
    } else {
        None
    }
}

fn alert(p: Px) -> Option<Color> {
    if !p.in_circle(0.5, 0.5, 0.46) {
        return None;
    }
    let bang = p.within((0.42, 0.58), (0.18, 0.6)) || p.within((0.42, 0.58), (0.68, 0.82));
    Some(if bang { WHITE } else { ALERT_RED })
}

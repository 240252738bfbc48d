//! Scene grid composition.
//!
//! `build_grid` is a pure function of sprite state plus the fixed terrain
//! template below. Grass variety comes from a stable hash of `(row, col)` so the
//! pattern never changes between redraws and never needs storing.

use std::hash::Hasher;

use crate::sprite::Sprite;
use crate::types::{tiles, TileIndex, SCENE_COLS, SCENE_ROWS};

// `.` grass, `=` path, `#` stone floor, `~` water.
const GROUND: [&str; SCENE_ROWS] = ["~~.....", "~..##..", "...##..", "=======", "======="];

// `T` tree, `r` rock, `b` bush, `s` signpost, `.` nothing.
const PROPS: [&str; SCENE_ROWS] = ["..T..bT", ".r....s", "b......", ".......", "......."];

/// A tile to draw, possibly mirrored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileRef {
    pub tile: TileIndex,
    pub mirrored: bool,
}

/// What stands on a cell above its ground.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Occupant {
    Terrain(TileRef),
    Sprite { id: String, tile: TileRef },
}

impl Occupant {
    pub fn tile(&self) -> TileRef {
        match self {
            Occupant::Terrain(t) => *t,
            Occupant::Sprite { tile, .. } => *tile,
        }
    }

    pub fn sprite_id(&self) -> Option<&str> {
        match self {
            Occupant::Terrain(_) => None,
            Occupant::Sprite { id, .. } => Some(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneCell {
    pub ground: TileIndex,
    pub top: Option<Occupant>,
}

/// Fixed-size grid of scene cells, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneGrid {
    cells: Vec<SceneCell>,
}

impl SceneGrid {
    pub fn rows(&self) -> usize {
        SCENE_ROWS
    }

    pub fn cols(&self) -> usize {
        SCENE_COLS
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&SceneCell> {
        if row >= SCENE_ROWS || col >= SCENE_COLS {
            return None;
        }
        self.cells.get(row * SCENE_COLS + col)
    }

    fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut SceneCell> {
        if row >= SCENE_ROWS || col >= SCENE_COLS {
            return None;
        }
        self.cells.get_mut(row * SCENE_COLS + col)
    }

    /// Cell holding sprite `id`, if it is drawn.
    pub fn find_sprite(&self, id: &str) -> Option<(usize, usize)> {
        self.cells
            .iter()
            .position(|c| c.top.as_ref().and_then(Occupant::sprite_id) == Some(id))
            .map(|i| (i / SCENE_COLS, i % SCENE_COLS))
    }
}

/// Stable 64-bit FNV-1a hasher; `DefaultHasher` output is not stable across
/// Rust versions.
#[derive(Debug, Clone)]
struct Fnv1aHasher {
    state: u64,
}

impl Fnv1aHasher {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    fn new() -> Self {
        Self {
            state: Self::OFFSET_BASIS,
        }
    }
}

impl Hasher for Fnv1aHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.state ^= b as u64;
            self.state = self.state.wrapping_mul(Self::PRIME);
        }
    }
}

pub fn cell_hash(row: usize, col: usize) -> u64 {
    let mut h = Fnv1aHasher::new();
    h.write_u32(row as u32);
    h.write_u32(col as u32);
    h.finish()
}

/// Grass variant for a cell: mostly sparse, some dense, rare flowers.
pub fn grass_at(row: usize, col: usize) -> TileIndex {
    match cell_hash(row, col) % 8 {
        0 => tiles::GRASS_FLOWERS,
        1 | 2 => tiles::GRASS_DENSE,
        _ => tiles::GRASS_SPARSE,
    }
}

fn template_char(template: &[&str; SCENE_ROWS], row: usize, col: usize) -> char {
    template[row].chars().nth(col).unwrap_or('.')
}

pub fn ground_at(row: usize, col: usize) -> TileIndex {
    match template_char(&GROUND, row, col) {
        '=' => tiles::PATH,
        '#' => tiles::STONE_FLOOR,
        '~' => tiles::WATER,
        _ => grass_at(row, col),
    }
}

pub fn prop_at(row: usize, col: usize) -> Option<TileIndex> {
    match template_char(&PROPS, row, col) {
        'T' => Some(tiles::TREE),
        'r' => Some(tiles::ROCK),
        'b' => Some(tiles::BUSH),
        's' => Some(tiles::SIGNPOST),
        _ => None,
    }
}

/// Layer background, terrain and visible sprites into a fresh grid.
///
/// Sprites are written in ascending row order (ties by id); the last writer
/// wins a cell. Sprites outside the scene are skipped.
pub fn build_grid<'a>(sprites: impl IntoIterator<Item = &'a Sprite>) -> SceneGrid {
    let mut cells = Vec::with_capacity(SCENE_ROWS * SCENE_COLS);
    for row in 0..SCENE_ROWS {
        for col in 0..SCENE_COLS {
            cells.push(SceneCell {
                ground: ground_at(row, col),
                top: prop_at(row, col).map(|tile| {
                    Occupant::Terrain(TileRef {
                        tile,
                        mirrored: false,
                    })
                }),
            });
        }
    }
    let mut grid = SceneGrid { cells };

    let mut visible: Vec<&Sprite> = sprites.into_iter().filter(|s| s.visible).collect();
    visible.sort_by(|a, b| {
        a.position
            .row
            .cmp(&b.position.row)
            .then_with(|| a.id.cmp(&b.id))
    });
    for sprite in visible {
        let Some((row, col)) = sprite.position.in_scene() else {
            continue;
        };
        if let Some(cell) = grid.get_mut(row, col) {
            cell.top = Some(Occupant::Sprite {
                id: sprite.id.clone(),
                tile: TileRef {
                    tile: sprite.tile,
                    mirrored: sprite.mirrored,
                },
            });
        }
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{is_foreground_tile, stage, GridPos};

    #[test]
    fn empty_scene_is_deterministic() {
        let a = build_grid(std::iter::empty());
        let b = build_grid(std::iter::empty());
        assert_eq!(a, b);
        assert_eq!(a.get(0, 2).unwrap().top.as_ref().unwrap().tile().tile, tiles::TREE);
        assert_eq!(a.get(3, 0).unwrap().ground, tiles::PATH);
        assert!(a.get(SCENE_ROWS, 0).is_none());
    }

    #[test]
    fn ground_is_always_background() {
        for row in 0..SCENE_ROWS {
            for col in 0..SCENE_COLS {
                assert!(!is_foreground_tile(ground_at(row, col)));
                if let Some(p) = prop_at(row, col) {
                    assert!(is_foreground_tile(p));
                }
            }
        }
    }

    #[test]
    fn canonical_positions_are_free_of_props() {
        let mut spots = vec![stage::PLAYER, stage::ARBITER, stage::PEER_ENTRANCE];
        spots.extend(stage::PEER_SLOTS);
        for p in spots {
            let (r, c) = p.in_scene().unwrap();
            assert!(prop_at(r, c).is_none(), "prop at {:?}", p);
        }
    }

    #[test]
    fn hidden_and_offscreen_sprites_are_skipped() {
        let sprites = vec![
            Sprite::new("hidden", tiles::PLAYER, GridPos::new(3, 1)).hidden(),
            Sprite::new("gone", tiles::PEER_1, GridPos::new(4, 9)),
        ];
        let grid = build_grid(&sprites);
        assert!(grid.find_sprite("hidden").is_none());
        assert!(grid.find_sprite("gone").is_none());
    }

    #[test]
    fn shared_cell_ties_resolve_by_id() {
        // Same row and cell: ordered by id, so "b" is the last writer.
        let sprites = vec![
            Sprite::new("b", tiles::PEER_2, GridPos::new(3, 4)),
            Sprite::new("a", tiles::PEER_1, GridPos::new(3, 4)),
        ];
        let grid = build_grid(&sprites);
        let top = grid.get(3, 4).unwrap().top.as_ref().unwrap();
        assert_eq!(top.sprite_id(), Some("b"));
    }

    #[test]
    fn sprites_replace_terrain_and_keep_mirroring() {
        let sprites = vec![Sprite::new("t", tiles::PLAYER, GridPos::new(0, 2)).facing_left()];
        let grid = build_grid(&sprites);
        let top = grid.get(0, 2).unwrap().top.clone().unwrap();
        assert_eq!(
            top.tile(),
            TileRef {
                tile: tiles::PLAYER,
                mirrored: true
            }
        );
        assert_eq!(grid.find_sprite("t"), Some((0, 2)));
    }

    #[test]
    fn grass_mix_has_variety() {
        let mut kinds = std::collections::HashSet::new();
        for row in 0..32 {
            for col in 0..32 {
                kinds.insert(grass_at(row, col));
            }
        }
        assert_eq!(kinds.len(), 3);
    }
}

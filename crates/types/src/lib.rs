//! Shared types module - data structures and constants
//!
//! This module defines the fundamental types used throughout the workspace.
//! All types are plain data with no external dependencies, so they can be used
//! by the tile decoder, the sprite engine, the terminal layer and the router
//! bridge alike.
//!
//! # Scene Dimensions
//!
//! - **Tile size**: 16x16 pixels (one tile renders as 16 columns x 8 rows)
//! - **Scene grid**: 7 columns x 5 rows of tiles
//! - **Atlas**: row-major grid of tiles, `index = row * tiles_per_row + col`
//!
//! # Timing Constants
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `TICK_MS` | 250 | Shared animation clock interval |
//! | `SPAWN_DELAY_TICKS` | 2 | Ticks before a spawned sprite becomes visible |
//! | `TRANSFORM_DELAY_TICKS` | 2 | Ticks before a transform swaps the tile |
//! | `CHAT_BUBBLE_MS` | 5000 | Chat bubble overlay lifetime |
//! | `ALERT_MS` | 3000 | Alert icon overlay lifetime |
//! | `WAITING_BLINK_MS` | 500 | Waiting indicator blink period |
//!
//! # Examples
//!
//! ```
//! use tui_parley_types::{is_foreground_tile, AgentMode, GridPos, tiles};
//!
//! assert!(is_foreground_tile(tiles::TREE));
//! assert!(!is_foreground_tile(tiles::GRASS_SPARSE));
//!
//! let pos = GridPos::new(2, 3);
//! assert_eq!(pos.manhattan(GridPos::new(4, 1)), 4);
//!
//! assert_eq!(AgentMode::from_str("plan"), Some(AgentMode::Plan));
//! ```

/// Tile edge length in pixels.
pub const TILE_SIZE: usize = 16;

/// Scene width in tiles.
pub const SCENE_COLS: usize = 7;

/// Scene height in tiles.
pub const SCENE_ROWS: usize = 5;

/// Tiles at or above this index are foreground tiles and must be composited
/// onto a background tile before rendering.
pub const FOREGROUND_TILE_START: TileIndex = 32;

/// Foreground pixels with alpha below this value are transparent.
pub const ALPHA_THRESHOLD: u8 = 128;

/// Shared animation clock interval in milliseconds.
pub const TICK_MS: u64 = 250;

/// Ticks a spawn waits before the sprite becomes visible.
pub const SPAWN_DELAY_TICKS: u32 = 2;

/// Ticks a transform waits before swapping the tile.
pub const TRANSFORM_DELAY_TICKS: u32 = 2;

/// Chat bubble overlay lifetime.
pub const CHAT_BUBBLE_MS: u64 = 5000;

/// Alert icon overlay lifetime.
pub const ALERT_MS: u64 = 3000;

/// Waiting indicator blink period.
pub const WAITING_BLINK_MS: u64 = 500;

/// Pixel lift applied to a sprite in the "up" phase of a hop (one glyph row).
pub const HOP_LIFT_PX: usize = 2;

/// Pixel lift applied on odd steps of a walk.
pub const WALK_BOB_PX: usize = 1;

/// Fallback terminal size when the terminal reports nothing usable.
pub const DEFAULT_TERM_WIDTH: u16 = 80;
pub const DEFAULT_TERM_HEIGHT: u16 = 24;

/// Maximum number of visual lines the input editor may occupy on screen.
pub const MAX_INPUT_LINES: usize = 6;

/// Index of a tile inside the atlas.
pub type TileIndex = u16;

/// Whether a tile must be composited onto a background before rendering.
#[inline]
pub fn is_foreground_tile(tile: TileIndex) -> bool {
    tile >= FOREGROUND_TILE_START
}

/// Tile catalogue for the bundled atlas (8 tiles per atlas row).
pub mod tiles {
    use super::TileIndex;

    // Ground (opaque).
    pub const GRASS_SPARSE: TileIndex = 0;
    pub const GRASS_DENSE: TileIndex = 1;
    pub const GRASS_FLOWERS: TileIndex = 2;
    pub const PATH: TileIndex = 3;
    pub const WATER: TileIndex = 4;
    pub const STONE_FLOOR: TileIndex = 5;

    // Props (foreground).
    pub const TREE: TileIndex = 32;
    pub const ROCK: TileIndex = 33;
    pub const BUSH: TileIndex = 34;
    pub const SIGNPOST: TileIndex = 35;

    // Characters (foreground).
    pub const PLAYER: TileIndex = 40;
    pub const ARBITER: TileIndex = 41;
    pub const PEER_1: TileIndex = 42;
    pub const PEER_2: TileIndex = 43;
    pub const PEER_3: TileIndex = 44;
    pub const FROG: TileIndex = 45;
    pub const OWL: TileIndex = 46;

    // Overlay icons (foreground).
    pub const CHAT_BUBBLE: TileIndex = 48;
    pub const ALERT: TileIndex = 49;

    /// Character tile for peer `index` (1-based), cycling through the three
    /// peer tiles.
    pub fn peer(index: usize) -> TileIndex {
        match index.saturating_sub(1) % 3 {
            0 => PEER_1,
            1 => PEER_2,
            _ => PEER_3,
        }
    }
}

/// 32-bit RGBA pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Whether this pixel survives alpha compositing at `threshold`.
    #[inline]
    pub fn is_solid(&self, threshold: u8) -> bool {
        self.a >= threshold
    }
}

/// Position in scene-grid coordinates.
///
/// Signed so that sprites can stand just outside the visible scene (entrances
/// and exits); such sprites are simply not drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct GridPos {
    pub row: i32,
    pub col: i32,
}

impl GridPos {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn manhattan(&self, other: GridPos) -> u32 {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// Grid cell `(row, col)` if the position lies inside the scene.
    pub fn in_scene(&self) -> Option<(usize, usize)> {
        if self.row < 0 || self.col < 0 {
            return None;
        }
        let (row, col) = (self.row as usize, self.col as usize);
        if row >= SCENE_ROWS || col >= SCENE_COLS {
            return None;
        }
        Some((row, col))
    }
}

/// Canonical scene positions.
pub mod stage {
    use super::GridPos;

    pub const PLAYER: GridPos = GridPos::new(3, 1);
    pub const ARBITER: GridPos = GridPos::new(2, 3);
    pub const PEER_ENTRANCE: GridPos = GridPos::new(4, 6);
    pub const PEER_EXIT: GridPos = GridPos::new(4, 7);

    /// Standing cells for peers, in fill order. All lie on the open path rows
    /// away from the fixed sprites and the entrance.
    pub const PEER_SLOTS: [GridPos; 9] = [
        GridPos::new(3, 4),
        GridPos::new(3, 5),
        GridPos::new(3, 6),
        GridPos::new(4, 5),
        GridPos::new(4, 4),
        GridPos::new(4, 3),
        GridPos::new(3, 3),
        GridPos::new(4, 2),
        GridPos::new(3, 2),
    ];

    /// Slot for peer `index` (1-based). Nine peers stand apart; the tenth
    /// shares the first slot and so on around the table.
    pub fn peer_slot(index: usize) -> GridPos {
        PEER_SLOTS[index.saturating_sub(1) % PEER_SLOTS.len()]
    }
}

/// Time-limited sprite decoration, independent of structural animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Overlay {
    /// Chat bubble shown while a sprite is talking.
    Chatting,
    /// Alert icon shown on tool use.
    Alarmed,
}

impl Overlay {
    pub fn icon(&self) -> TileIndex {
        match self {
            Overlay::Chatting => tiles::CHAT_BUBBLE,
            Overlay::Alarmed => tiles::ALERT,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Overlay::Chatting => "chatting",
            Overlay::Alarmed => "alarmed",
        }
    }
}

/// Operating mode reported by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AgentMode {
    /// Plain conversation.
    #[default]
    Chat,
    /// Planning; the arbiter turns into an owl.
    Plan,
    /// Autonomous tool use; the arbiter turns into a frog.
    Auto,
}

impl AgentMode {
    /// Parse mode from string (case-insensitive)
    ///
    /// ```
    /// use tui_parley_types::AgentMode;
    ///
    /// assert_eq!(AgentMode::from_str("AUTO"), Some(AgentMode::Auto));
    /// assert_eq!(AgentMode::from_str("other"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "chat" => Some(AgentMode::Chat),
            "plan" => Some(AgentMode::Plan),
            "auto" => Some(AgentMode::Auto),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentMode::Chat => "chat",
            AgentMode::Plan => "plan",
            AgentMode::Auto => "auto",
        }
    }

    /// Tile the arbiter wears in this mode.
    pub fn arbiter_tile(&self) -> TileIndex {
        match self {
            AgentMode::Chat => tiles::ARBITER,
            AgentMode::Plan => tiles::OWL,
            AgentMode::Auto => tiles::FROG,
        }
    }
}

/// Editor mode shown in the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EditMode {
    /// Free text entry.
    #[default]
    Insert,
    /// Cursor-less scroll/command mode.
    Normal,
}

impl EditMode {
    pub fn label(&self) -> &'static str {
        match self {
            EditMode::Insert => "INSERT",
            EditMode::Normal => "NORMAL",
        }
    }
}

/// Sprite ids used by the stock choreography.
pub mod ids {
    pub const PLAYER: &str = "player";
    pub const ARBITER: &str = "arbiter";

    pub fn peer(index: usize) -> String {
        format!("peer-{}", index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_defaults() {
        assert_eq!(TICK_MS, 250);
        assert_eq!(CHAT_BUBBLE_MS, 5000);
        assert_eq!(SPAWN_DELAY_TICKS, 2);
        assert_eq!(TRANSFORM_DELAY_TICKS, 2);
        assert_eq!(HOP_LIFT_PX % 2, 0, "hop lift should be a whole glyph row");
    }

    #[test]
    fn foreground_split() {
        assert!(!is_foreground_tile(tiles::STONE_FLOOR));
        assert!(is_foreground_tile(tiles::PLAYER));
        assert!(is_foreground_tile(tiles::ALERT));
    }

    #[test]
    fn grid_pos_in_scene() {
        assert_eq!(GridPos::new(0, 0).in_scene(), Some((0, 0)));
        assert_eq!(GridPos::new(4, 6).in_scene(), Some((4, 6)));
        assert_eq!(stage::PEER_EXIT.in_scene(), None);
        assert_eq!(GridPos::new(-1, 2).in_scene(), None);
    }

    #[test]
    fn peer_slots_stay_inside_scene() {
        for i in 0..20 {
            assert!(stage::peer_slot(i).in_scene().is_some());
        }
        assert_eq!(stage::peer_slot(1), GridPos::new(3, 4));
        assert_eq!(stage::peer_slot(3), GridPos::new(3, 6));
    }

    #[test]
    fn nine_peers_stand_apart() {
        let slots: Vec<GridPos> = (1..=stage::PEER_SLOTS.len()).map(stage::peer_slot).collect();
        for (i, a) in slots.iter().enumerate() {
            for b in &slots[i + 1..] {
                assert_ne!(a, b);
            }
            assert_ne!(*a, stage::PLAYER);
            assert_ne!(*a, stage::ARBITER);
            assert_ne!(*a, stage::PEER_ENTRANCE);
        }
        assert_eq!(stage::peer_slot(4), GridPos::new(4, 5));
        assert_eq!(stage::peer_slot(10), stage::peer_slot(1));
    }

    #[test]
    fn peer_tiles_cycle() {
        assert_eq!(tiles::peer(1), tiles::PEER_1);
        assert_eq!(tiles::peer(3), tiles::PEER_3);
        assert_eq!(tiles::peer(4), tiles::PEER_1);
    }

    #[test]
    fn agent_mode_tiles() {
        assert_eq!(AgentMode::Chat.arbiter_tile(), tiles::ARBITER);
        assert_eq!(AgentMode::Plan.arbiter_tile(), tiles::OWL);
        assert_eq!(AgentMode::Auto.arbiter_tile(), tiles::FROG);
        assert_eq!(AgentMode::from_str("Chat"), Some(AgentMode::Chat));
    }
}

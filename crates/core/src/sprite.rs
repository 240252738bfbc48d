//! Sprite model.

use crate::types::{GridPos, TileIndex};

/// A named, positioned visual entity.
///
/// Sprites are handed to [`crate::SpriteEngine::register`] and from then on
/// only change through engine operations, so every visible change is seen by
/// the engine's revision counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprite {
    pub id: String,
    pub tile: TileIndex,
    pub position: GridPos,
    pub visible: bool,
    /// Drawn facing left.
    pub mirrored: bool,
}

impl Sprite {
    pub fn new(id: impl Into<String>, tile: TileIndex, position: GridPos) -> Self {
        Self {
            id: id.into(),
            tile,
            position,
            visible: true,
            mirrored: false,
        }
    }

    /// Start hidden; pair with [`crate::SpriteEngine::spawn`].
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn facing_left(mut self) -> Self {
        self.mirrored = true;
        self
    }
}

/// Render-time displacement derived from a sprite's animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpritePose {
    /// Pixels the sprite is drawn above its logical cell.
    pub lift_px: usize,
}

//! Tile decoding and glyph rendering.
//!
//! This crate turns a packed bitmap atlas into terminal-ready colored strings:
//!
//! - [`atlas`]: atlas loading, per-tile extraction and the memoizing [`TileStore`]
//! - [`builtin`]: the procedurally drawn atlas used when no file is configured
//! - [`pixel`]: pixel grids, alpha compositing, mirroring and blits
//! - [`glyph`]: half-block glyph rows and the [`TileRenderCache`]
//!
//! A missing or corrupt atlas surfaces as [`AssetLoadError`]; callers are
//! expected to keep running without a scene rather than abort.

pub mod atlas;
pub mod builtin;
pub mod glyph;
pub mod pixel;

pub use tui_parley_types as types;

pub use atlas::{extract_tile, load_atlas, AssetLoadError, Atlas, TileStore};
pub use builtin::builtin_atlas;
pub use glyph::{
    render_glyph_row, render_to_glyph_rows, visible_text, GlyphKey, GlyphRows, TileRenderCache,
    HALF_BLOCK,
};
pub use pixel::{blit, composite_onto_background, downscale_half, mirror_horizontally, PixelGrid};

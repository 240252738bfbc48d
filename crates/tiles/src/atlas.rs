//! Tile atlas loading and per-tile extraction.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use image::RgbaImage;

use crate::builtin::builtin_atlas;
use crate::pixel::PixelGrid;
use crate::types::{Rgba, TileIndex};

#[derive(Debug, thiserror::Error)]
pub enum AssetLoadError {
    #[error("atlas {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("atlas {path:?}: decode failed: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("atlas is {width}x{height}, not a non-empty multiple of tile size {tile_size}")]
    BadDimensions {
        width: u32,
        height: u32,
        tile_size: usize,
    },
    #[error("tile {index} out of range (atlas has {count} tiles)")]
    TileOutOfRange { index: TileIndex, count: usize },
}

/// Decoded tile atlas: a row-major grid of square tiles.
#[derive(Debug, Clone)]
pub struct Atlas {
    image: RgbaImage,
    tile_size: usize,
    tiles_per_row: usize,
    tile_count: usize,
}

impl Atlas {
    /// Wrap an already decoded image.
    pub fn from_image(image: RgbaImage, tile_size: usize) -> Result<Self, AssetLoadError> {
        let (w, h) = image.dimensions();
        let bad = AssetLoadError::BadDimensions {
            width: w,
            height: h,
            tile_size,
        };
        if tile_size == 0 || w == 0 || h == 0 {
            return Err(bad);
        }
        if w as usize % tile_size != 0 || h as usize % tile_size != 0 {
            return Err(bad);
        }
        let tiles_per_row = w as usize / tile_size;
        let tile_count = tiles_per_row * (h as usize / tile_size);
        Ok(Self {
            image,
            tile_size,
            tiles_per_row,
            tile_count,
        })
    }

    pub fn tile_size(&self) -> usize {
        self.tile_size
    }

    pub fn tiles_per_row(&self) -> usize {
        self.tiles_per_row
    }

    pub fn tile_count(&self) -> usize {
        self.tile_count
    }
}

/// Read and decode an atlas file.
pub fn load_atlas(path: impl AsRef<Path>, tile_size: usize) -> Result<Atlas, AssetLoadError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| AssetLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let image = image::load_from_memory(&bytes)
        .map_err(|source| AssetLoadError::Decode {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();
    let atlas = Atlas::from_image(image, tile_size)?;
    log::info!(
        "loaded atlas {} ({} tiles of {}px)",
        path.display(),
        atlas.tile_count,
        tile_size
    );
    Ok(atlas)
}

/// Copy tile `index` out of the atlas.
pub fn extract_tile(atlas: &Atlas, index: TileIndex) -> Result<PixelGrid, AssetLoadError> {
    let i = index as usize;
    if i >= atlas.tile_count {
        return Err(AssetLoadError::TileOutOfRange {
            index,
            count: atlas.tile_count,
        });
    }
    let size = atlas.tile_size;
    let ox = (i % atlas.tiles_per_row) * size;
    let oy = (i / atlas.tiles_per_row) * size;

    let mut grid = PixelGrid::square(size, Rgba::TRANSPARENT);
    for y in 0..size {
        for x in 0..size {
            let p = atlas.image.get_pixel((ox + x) as u32, (oy + y) as u32).0;
            grid.set(x, y, Rgba::new(p[0], p[1], p[2], p[3]));
        }
    }
    Ok(grid)
}

/// Atlas plus a memo of extracted tiles, keyed by index.
#[derive(Debug)]
pub struct TileStore {
    atlas: Atlas,
    tiles: HashMap<TileIndex, Rc<PixelGrid>>,
}

impl TileStore {
    pub fn new(atlas: Atlas) -> Self {
        Self {
            atlas,
            tiles: HashMap::new(),
        }
    }

    pub fn load(path: impl AsRef<Path>, tile_size: usize) -> Result<Self, AssetLoadError> {
        Ok(Self::new(load_atlas(path, tile_size)?))
    }

    pub fn builtin(tile_size: usize) -> Result<Self, AssetLoadError> {
        Ok(Self::new(builtin_atlas(tile_size)?))
    }

    /// The atlas file at `path`, or the built-in atlas when there is none.
    pub fn open(path: Option<&Path>, tile_size: usize) -> Result<Self, AssetLoadError> {
        match path {
            Some(path) => Self::load(path, tile_size),
            None => Self::builtin(tile_size),
        }
    }

    pub fn atlas(&self) -> &Atlas {
        &self.atlas
    }

    pub fn tile_size(&self) -> usize {
        self.atlas.tile_size
    }

    /// Pixels of tile `index`, decoded on first use.
    pub fn tile(&mut self, index: TileIndex) -> Result<Rc<PixelGrid>, AssetLoadError> {
        if let Some(t) = self.tiles.get(&index) {
            return Ok(Rc::clone(t));
        }
        let grid = Rc::new(extract_tile(&self.atlas, index)?);
        self.tiles.insert(index, Rc::clone(&grid));
        Ok(grid)
    }

    pub fn decoded_count(&self) -> usize {
        self.tiles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba as ImgRgba;

    fn two_tile_atlas() -> RgbaImage {
        // 2 tiles of 2px side by side: tile 0 red, tile 1 blue.
        RgbaImage::from_fn(4, 2, |x, _| {
            if x < 2 {
                ImgRgba([255, 0, 0, 255])
            } else {
                ImgRgba([0, 0, 255, 255])
            }
        })
    }

    #[test]
    fn extracts_tiles_row_major() {
        let atlas = Atlas::from_image(two_tile_atlas(), 2).unwrap();
        assert_eq!(atlas.tile_count(), 2);
        assert_eq!(atlas.tiles_per_row(), 2);
        let t1 = extract_tile(&atlas, 1).unwrap();
        assert_eq!(t1.get(0, 0), Rgba::opaque(0, 0, 255));
        assert_eq!(t1.get(1, 1), Rgba::opaque(0, 0, 255));
    }

    #[test]
    fn out_of_range_tile_is_an_error() {
        let atlas = Atlas::from_image(two_tile_atlas(), 2).unwrap();
        assert!(matches!(
            extract_tile(&atlas, 2),
            Err(AssetLoadError::TileOutOfRange { index: 2, count: 2 })
        ));
    }

    #[test]
    fn rejects_non_multiple_dimensions() {
        assert!(matches!(
            Atlas::from_image(two_tile_atlas(), 3),
            Err(AssetLoadError::BadDimensions { .. })
        ));
        assert!(Atlas::from_image(two_tile_atlas(), 0).is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_atlas("/definitely/not/here.png", 16).unwrap_err();
        assert!(matches!(err, AssetLoadError::Io { .. }));
    }

    #[test]
    fn store_memoizes_tiles() {
        let mut store = TileStore::new(Atlas::from_image(two_tile_atlas(), 2).unwrap());
        let a = store.tile(0).unwrap();
        let b = store.tile(0).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(store.decoded_count(), 1);
    }

    #[test]
    fn open_without_path_uses_builtin() {
        let mut store = TileStore::open(None, 8).unwrap();
        assert_eq!(store.tile_size(), 8);
        assert!(store.tile(crate::types::tiles::PLAYER).is_ok());

        let err = TileStore::open(Some(Path::new("/definitely/not/here.png")), 8).unwrap_err();
        assert!(matches!(err, AssetLoadError::Io { .. }));
    }
}

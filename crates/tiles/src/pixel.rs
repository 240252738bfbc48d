//! Pixel grids and the per-pixel operations the scene needs.
//!
//! Everything here is pure: grids go in, new grids come out (or a destination
//! grid is modified in place for blits).

use crate::types::Rgba;

/// Rectangular grid of RGBA pixels, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: usize,
    height: usize,
    pixels: Vec<Rgba>,
}

impl PixelGrid {
    pub fn new(width: usize, height: usize, fill: Rgba) -> Self {
        Self {
            width,
            height,
            pixels: vec![fill; width * height],
        }
    }

    pub fn square(size: usize, fill: Rgba) -> Self {
        Self::new(size, size, fill)
    }

    /// Build a grid from row-major pixels. Returns `None` on a length mismatch.
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<Rgba>) -> Option<Self> {
        if pixels.len() != width * height {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    #[inline(always)]
    fn idx(&self, x: usize, y: usize) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y * self.width + x)
    }

    /// Pixel at `(x, y)`; transparent outside the grid.
    pub fn get(&self, x: usize, y: usize) -> Rgba {
        self.idx(x, y)
            .map(|i| self.pixels[i])
            .unwrap_or(Rgba::TRANSPARENT)
    }

    pub fn set(&mut self, x: usize, y: usize, px: Rgba) {
        if let Some(i) = self.idx(x, y) {
            self.pixels[i] = px;
        }
    }

    /// Whether mirroring would change this grid.
    pub fn is_symmetric(&self) -> bool {
        (0..self.height).all(|y| {
            (0..self.width / 2).all(|x| self.get(x, y) == self.get(self.width - 1 - x, y))
        })
    }
}

/// Per pixel: keep the foreground pixel when `fg.a >= threshold`, otherwise take
/// the background pixel at the same coordinate.
///
/// The result has the background's dimensions; foreground pixels outside it are
/// dropped and missing foreground pixels count as transparent.
pub fn composite_onto_background(fg: &PixelGrid, bg: &PixelGrid, threshold: u8) -> PixelGrid {
    let mut out = bg.clone();
    blit(&mut out, fg, 0, 0, threshold);
    out
}

pub fn mirror_horizontally(grid: &PixelGrid) -> PixelGrid {
    let mut out = grid.clone();
    for y in 0..grid.height {
        for x in 0..grid.width {
            out.set(grid.width - 1 - x, y, grid.get(x, y));
        }
    }
    out
}

/// Composite `src` onto `dst` with its top-left corner at `(dx, dy)`.
///
/// Offsets may be negative; anything falling outside `dst` is clipped.
pub fn blit(dst: &mut PixelGrid, src: &PixelGrid, dx: isize, dy: isize, threshold: u8) {
    for sy in 0..src.height {
        let ty = sy as isize + dy;
        if ty < 0 || ty >= dst.height as isize {
            continue;
        }
        for sx in 0..src.width {
            let tx = sx as isize + dx;
            if tx < 0 || tx >= dst.width as isize {
                continue;
            }
            let px = src.get(sx, sy);
            if px.is_solid(threshold) {
                dst.set(tx as usize, ty as usize, px);
            }
        }
    }
}

/// Nearest-neighbour 2:1 downscale (keeps even rows and columns).
pub fn downscale_half(grid: &PixelGrid) -> PixelGrid {
    let w = (grid.width / 2).max(1);
    let h = (grid.height / 2).max(1);
    let mut out = PixelGrid::new(w, h, Rgba::TRANSPARENT);
    for y in 0..h {
        for x in 0..w {
            out.set(x, y, grid.get(x * 2, y * 2));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ALPHA_THRESHOLD;

    fn checker(size: usize) -> PixelGrid {
        let mut g = PixelGrid::square(size, Rgba::BLACK);
        for y in 0..size {
            for x in 0..size {
                if (x + y) % 2 == 0 {
                    g.set(x, y, Rgba::opaque(200, 10, 10));
                }
            }
        }
        g
    }

    #[test]
    fn transparent_foreground_keeps_background() {
        let bg = checker(4);
        let fg = PixelGrid::square(4, Rgba::new(255, 255, 255, 0));
        assert_eq!(composite_onto_background(&fg, &bg, ALPHA_THRESHOLD), bg);
    }

    #[test]
    fn opaque_foreground_replaces_background() {
        let bg = checker(4);
        let fg = PixelGrid::square(4, Rgba::opaque(1, 2, 3));
        assert_eq!(composite_onto_background(&fg, &bg, ALPHA_THRESHOLD), fg);
    }

    #[test]
    fn threshold_is_inclusive() {
        let bg = PixelGrid::square(1, Rgba::BLACK);
        let at = PixelGrid::square(1, Rgba::new(9, 9, 9, ALPHA_THRESHOLD));
        let below = PixelGrid::square(1, Rgba::new(9, 9, 9, ALPHA_THRESHOLD - 1));
        assert_eq!(composite_onto_background(&at, &bg, ALPHA_THRESHOLD), at);
        assert_eq!(composite_onto_background(&below, &bg, ALPHA_THRESHOLD), bg);
    }

    #[test]
    fn mirror_twice_is_identity() {
        let mut g = PixelGrid::square(3, Rgba::BLACK);
        g.set(0, 1, Rgba::opaque(10, 20, 30));
        let m = mirror_horizontally(&g);
        assert_eq!(m.get(2, 1), Rgba::opaque(10, 20, 30));
        assert_eq!(m.get(0, 1), Rgba::BLACK);
        assert_eq!(mirror_horizontally(&m), g);
        assert!(!g.is_symmetric());
    }

    #[test]
    fn blit_clips_negative_offsets() {
        let mut dst = PixelGrid::square(4, Rgba::BLACK);
        let src = PixelGrid::square(4, Rgba::opaque(5, 5, 5));
        blit(&mut dst, &src, 0, -2, ALPHA_THRESHOLD);
        assert_eq!(dst.get(0, 1), Rgba::opaque(5, 5, 5));
        assert_eq!(dst.get(0, 2), Rgba::BLACK);
        assert_eq!(dst.get(3, 3), Rgba::BLACK);
    }

    #[test]
    fn downscale_samples_even_pixels() {
        let g = checker(4);
        let d = downscale_half(&g);
        assert_eq!((d.width(), d.height()), (2, 2));
        assert_eq!(d.get(1, 1), g.get(2, 2));
    }

    #[test]
    fn from_pixels_rejects_bad_length() {
        assert!(PixelGrid::from_pixels(2, 2, vec![Rgba::BLACK; 3]).is_none());
        assert!(PixelGrid::from_pixels(2, 2, vec![Rgba::BLACK; 4]).is_some());
    }
}

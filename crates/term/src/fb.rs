//! Framebuffer and style types for the text panes.
//!
//! Panes draw into a small [`FrameBuffer`] sized to their rect; each row is
//! then encoded into a self-contained colored string so the redraw scheduler
//! can diff and write rows independently.

use crossterm::style::{
    Attribute, Color, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
};
use crossterm::Command;

/// 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Colors plus the two attributes the panes use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellStyle {
    pub fg: Rgb,
    pub bg: Rgb,
    pub bold: bool,
    pub dim: bool,
}

impl Default for CellStyle {
    fn default() -> Self {
        BLANK.style
    }
}

impl CellStyle {
    pub fn fg(fg: Rgb) -> Self {
        Self {
            fg,
            ..Self::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn dim(mut self) -> Self {
        self.dim = true;
        self
    }

    pub fn on(mut self, bg: Rgb) -> Self {
        self.bg = bg;
        self
    }
}

/// One character cell of a pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub style: CellStyle,
}

const BLANK: Cell = Cell {
    ch: ' ',
    style: CellStyle {
        fg: Rgb::new(220, 220, 220),
        bg: Rgb::new(0, 0, 0),
        bold: false,
        dim: false,
    },
};

/// Styled text grid for one pane, stored row by row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u16,
    rows: Vec<Vec<Cell>>,
}

impl FrameBuffer {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            rows: vec![vec![BLANK; width as usize]; height as usize],
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.rows.len() as u16
    }

    pub fn get(&self, x: u16, y: u16) -> Option<Cell> {
        self.rows.get(y as usize)?.get(x as usize).copied()
    }

    /// Write `s` from column `x`, clipped at the right edge. Returns the column
    /// after the last character written.
    pub fn put_str(&mut self, x: u16, y: u16, s: &str, style: CellStyle) -> u16 {
        let Some(row) = self.rows.get_mut(y as usize) else {
            return x;
        };
        let mut cx = x as usize;
        for (slot, ch) in row.iter_mut().skip(cx).zip(s.chars()) {
            *slot = Cell { ch, style };
            cx += 1;
        }
        cx as u16
    }

    /// Blank row `y` in `style`, e.g. to paint a bar background.
    pub fn fill_row(&mut self, y: u16, style: CellStyle) {
        if let Some(row) = self.rows.get_mut(y as usize) {
            row.fill(Cell { ch: ' ', style });
        }
    }

    /// Printed characters of row `y`.
    pub fn row_text(&self, y: u16) -> String {
        self.rows
            .get(y as usize)
            .map(|row| row.iter().map(|c| c.ch).collect())
            .unwrap_or_default()
    }

    /// Row `y` as a self-contained colored string.
    ///
    /// Colors and attributes are emitted only where they change, and the row
    /// ends with a full reset so rows can be written in any order.
    pub fn encode_row(&self, y: u16) -> String {
        let Some(row) = self.rows.get(y as usize) else {
            return String::new();
        };
        let mut out = String::with_capacity(row.len() * 4);
        let mut prev: Option<CellStyle> = None;
        for cell in row {
            let style = cell.style;
            let attrs_changed = prev.map_or(true, |p| (p.bold, p.dim) != (style.bold, style.dim));
            if attrs_changed {
                push_ansi(&mut out, SetAttribute(Attribute::Reset));
                if style.bold {
                    push_ansi(&mut out, SetAttribute(Attribute::Bold));
                }
                if style.dim {
                    push_ansi(&mut out, SetAttribute(Attribute::Dim));
                }
            }
            // An attribute reset also drops the colors.
            if attrs_changed || prev.map(|p| p.fg) != Some(style.fg) {
                push_ansi(&mut out, SetForegroundColor(rgb_to_color(style.fg)));
            }
            if attrs_changed || prev.map(|p| p.bg) != Some(style.bg) {
                push_ansi(&mut out, SetBackgroundColor(rgb_to_color(style.bg)));
            }
            prev = Some(style);
            out.push(cell.ch);
        }
        push_ansi(&mut out, ResetColor);
        push_ansi(&mut out, SetAttribute(Attribute::Reset));
        out
    }

    pub fn encode_rows(&self) -> Vec<String> {
        (0..self.height()).map(|y| self.encode_row(y)).collect()
    }
}

fn push_ansi(out: &mut String, cmd: impl Command) {
    let _ = cmd.write_ansi(out);
}

pub(crate) fn rgb_to_color(rgb: Rgb) -> Color {
    Color::Rgb {
        r: rgb.r,
        g: rgb.g,
        b: rgb.b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tui_parley_tiles::visible_text;

    #[test]
    fn put_str_clips_at_edge() {
        let mut fb = FrameBuffer::new(4, 1);
        let next = fb.put_str(2, 0, "abc", CellStyle::default());
        assert_eq!(next, 4);
        assert_eq!(fb.row_text(0), "  ab");
    }

    #[test]
    fn encoded_row_prints_cells_in_order() {
        let mut fb = FrameBuffer::new(3, 2);
        fb.put_str(0, 1, "hey", CellStyle::fg(Rgb::new(255, 0, 0)).bold());
        let row = fb.encode_row(1);
        assert_eq!(visible_text(&row), "hey");
        assert!(row.contains("\x1b[38;2;255;0;0m"));
        assert_eq!(visible_text(&fb.encode_row(0)), "   ");
    }

    #[test]
    fn bar_background_spans_the_row() {
        let mut fb = FrameBuffer::new(5, 1);
        let bar = CellStyle::default().on(Rgb::new(40, 40, 48));
        fb.fill_row(0, bar);
        fb.put_str(1, 0, "ok", CellStyle::fg(Rgb::new(1, 2, 3)).on(Rgb::new(40, 40, 48)));
        assert_eq!(fb.get(4, 0).map(|c| c.style.bg), Some(Rgb::new(40, 40, 48)));
        assert_eq!(fb.row_text(0), " ok  ");
        // Out-of-range writes are ignored.
        assert_eq!(fb.put_str(0, 3, "x", bar), 0);
    }

    #[test]
    fn style_runs_are_not_repeated() {
        let mut fb = FrameBuffer::new(4, 1);
        fb.put_str(0, 0, "abcd", CellStyle::default());
        let row = fb.encode_row(0);
        assert_eq!(row.matches("38;2;").count(), 1);
    }
}

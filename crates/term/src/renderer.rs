//! Terminal surfaces.
//!
//! Every terminal write goes through the [`Surface`] trait. [`TerminalRenderer`]
//! queues crossterm commands into a byte buffer and writes them to stdout on
//! `flush`; [`RecordingSurface`] keeps the operations in memory so tests can
//! count writes.

use std::io::{self, Write};

use anyhow::Result;

use crossterm::{
    cursor,
    style::{Attribute, Print, ResetColor, SetAttribute},
    terminal, QueueableCommand,
};

use crate::layout::Rect;

/// Where region rows end up.
pub trait Surface {
    /// Terminal size in cells; may be zero when the terminal cannot tell.
    fn size(&self) -> Result<(u16, u16)>;

    /// Print an already styled row at `(x, y)`.
    fn write_at(&mut self, x: u16, y: u16, text: &str) -> Result<()>;

    /// Blank a rectangle.
    fn clear_rect(&mut self, rect: Rect) -> Result<()>;

    fn clear_all(&mut self) -> Result<()>;

    /// Show the cursor at `at`, or hide it.
    fn place_cursor(&mut self, at: Option<(u16, u16)>) -> Result<()>;

    fn flush(&mut self) -> Result<()>;
}

pub struct TerminalRenderer {
    stdout: io::Stdout,
    buf: Vec<u8>,
    active: bool,
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self {
            stdout: io::stdout(),
            buf: Vec::with_capacity(64 * 1024),
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn enter(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        self.buf.clear();
        self.buf.queue(terminal::EnterAlternateScreen)?;
        self.buf.queue(cursor::Hide)?;
        self.buf.queue(terminal::DisableLineWrap)?;
        self.flush_buf()?;
        self.active = true;
        Ok(())
    }

    pub fn exit(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        self.buf.clear();
        encode_restore_into(&mut self.buf)?;
        self.flush_buf()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    fn flush_buf(&mut self) -> Result<()> {
        self.stdout.write_all(&self.buf)?;
        self.stdout.flush()?;
        self.buf.clear();
        Ok(())
    }
}

impl Surface for TerminalRenderer {
    fn size(&self) -> Result<(u16, u16)> {
        Ok(terminal::size()?)
    }

    fn write_at(&mut self, x: u16, y: u16, text: &str) -> Result<()> {
        self.buf.queue(cursor::MoveTo(x, y))?;
        self.buf.queue(Print(text))?;
        Ok(())
    }

    fn clear_rect(&mut self, rect: Rect) -> Result<()> {
        if rect.is_empty() {
            return Ok(());
        }
        let blank = " ".repeat(rect.w as usize);
        self.buf.queue(ResetColor)?;
        for dy in 0..rect.h {
            self.buf.queue(cursor::MoveTo(rect.x, rect.y + dy))?;
            self.buf.queue(Print(&blank))?;
        }
        Ok(())
    }

    fn clear_all(&mut self) -> Result<()> {
        self.buf.queue(ResetColor)?;
        self.buf.queue(terminal::Clear(terminal::ClearType::All))?;
        Ok(())
    }

    fn place_cursor(&mut self, at: Option<(u16, u16)>) -> Result<()> {
        match at {
            Some((x, y)) => {
                self.buf.queue(cursor::MoveTo(x, y))?;
                self.buf.queue(cursor::Show)?;
            }
            None => {
                self.buf.queue(cursor::Hide)?;
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        self.flush_buf()
    }
}

/// Reset sequence: colors, attributes, line wrap, cursor, alternate screen.
pub fn encode_restore_into(out: &mut Vec<u8>) -> Result<()> {
    out.queue(ResetColor)?;
    out.queue(SetAttribute(Attribute::Reset))?;
    out.queue(terminal::EnableLineWrap)?;
    out.queue(cursor::Show)?;
    out.queue(terminal::LeaveAlternateScreen)?;
    Ok(())
}

/// Best-effort terminal restore for panic hooks and signal handlers, where no
/// renderer is at hand. Errors are ignored.
pub fn restore_terminal() {
    let mut buf = Vec::new();
    if encode_restore_into(&mut buf).is_ok() {
        let mut stdout = io::stdout();
        let _ = stdout.write_all(&buf);
        let _ = stdout.flush();
    }
    let _ = terminal::disable_raw_mode();
}

/// One recorded surface operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceOp {
    Write { x: u16, y: u16, text: String },
    ClearRect(Rect),
    ClearAll,
}

/// In-memory surface that records operations instead of printing them.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    width: u16,
    height: u16,
    ops: Vec<SurfaceOp>,
    cursor: Option<(u16, u16)>,
    flushes: usize,
}

impl RecordingSurface {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
            cursor: None,
            flushes: 0,
        }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    /// Writes and clears recorded so far.
    pub fn writes(&self) -> usize {
        self.ops.len()
    }

    pub fn row_writes(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, SurfaceOp::Write { .. }))
            .count()
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    pub fn cursor(&self) -> Option<(u16, u16)> {
        self.cursor
    }

    pub fn flushes(&self) -> usize {
        self.flushes
    }

    /// Text of the last write that landed on row `y`.
    pub fn last_write_at(&self, y: u16) -> Option<&str> {
        self.ops.iter().rev().find_map(|op| match op {
            SurfaceOp::Write { y: wy, text, .. } if *wy == y => Some(text.as_str()),
            _ => None,
        })
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> Result<(u16, u16)> {
        Ok((self.width, self.height))
    }

    fn write_at(&mut self, x: u16, y: u16, text: &str) -> Result<()> {
        self.ops.push(SurfaceOp::Write {
            x,
            y,
            text: text.to_string(),
        });
        Ok(())
    }

    fn clear_rect(&mut self, rect: Rect) -> Result<()> {
        self.ops.push(SurfaceOp::ClearRect(rect));
        Ok(())
    }

    fn clear_all(&mut self) -> Result<()> {
        self.ops.push(SurfaceOp::ClearAll);
        Ok(())
    }

    fn place_cursor(&mut self, at: Option<(u16, u16)>) -> Result<()> {
        self.cursor = at;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

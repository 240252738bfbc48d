//! RedrawScheduler: per-region dirty tracking over a [`Surface`].
//!
//! Each region (tiles, chat, status, context, input) keeps a snapshot of the
//! inputs it was last drawn from plus the rows it last wrote. A draw call with
//! an unchanged snapshot writes nothing; otherwise only rows that differ from
//! the previous ones are written. A region's rect is cleared only when the
//! layout moves or resizes it.

use anyhow::Result;

use tui_parley_core::{blink_phase, ChatLog, ContextGauge, SpriteEngine, StatusLine};
use tui_parley_input::{FilePicker, InputEditor};

use crate::layout::{effective_size, Layout, Rect};
use crate::panes::{render_chat, render_context, render_input, render_log_view, render_picker, render_status};
use crate::renderer::Surface;
use crate::scene_view::SceneView;
use crate::types::EditMode;

/// Borrowed view of everything the screen shows.
#[derive(Clone, Copy)]
pub struct UiState<'a> {
    pub engine: &'a SpriteEngine,
    pub chat: &'a ChatLog,
    pub status: &'a StatusLine,
    pub context: &'a ContextGauge,
    pub editor: &'a InputEditor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TilesSnapshot {
    revision: u64,
    available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ChatSnapshot {
    messages: usize,
    scroll: usize,
    waiting: Option<String>,
    blink: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct InputSnapshot {
    text: String,
    cursor: usize,
    mode: EditMode,
}

#[derive(Debug)]
struct Region<T> {
    snapshot: Option<T>,
    rect: Option<Rect>,
    rows: Vec<String>,
    needs_clear: bool,
}

impl<T> Default for Region<T> {
    fn default() -> Self {
        Self {
            snapshot: None,
            rect: None,
            rows: Vec::new(),
            needs_clear: false,
        }
    }
}

impl<T: PartialEq> Region<T> {
    fn reset(&mut self) {
        self.snapshot = None;
        self.rect = None;
        self.rows.clear();
        self.needs_clear = false;
    }

    /// Move the region; a changed rect blanks the old one and forces a redraw.
    fn relayout<S: Surface>(&mut self, surface: &mut S, rect: Rect) -> Result<usize> {
        if self.rect == Some(rect) {
            return Ok(0);
        }
        let mut ops = 0;
        if let Some(old) = self.rect.filter(|r| !r.is_empty()) {
            surface.clear_rect(old)?;
            ops += 1;
        }
        self.rect = Some(rect);
        self.snapshot = None;
        self.rows.clear();
        self.needs_clear = true;
        Ok(ops)
    }

    fn is_current(&self, snapshot: &T, force: bool) -> bool {
        !force && self.snapshot.as_ref() == Some(snapshot)
    }

    /// Write the rows that changed. Returns the number of surface operations.
    fn write<S: Surface>(&mut self, surface: &mut S, rows: Vec<String>, snapshot: T) -> Result<usize> {
        let mut ops = 0;
        let Some(rect) = self.rect else {
            self.snapshot = Some(snapshot);
            return Ok(0);
        };
        if std::mem::take(&mut self.needs_clear) && !rect.is_empty() {
            surface.clear_rect(rect)?;
            ops += 1;
        }
        let h = rect.h as usize;
        for (i, row) in rows.iter().enumerate().take(h) {
            if self.rows.get(i) != Some(row) {
                surface.write_at(rect.x, rect.y + i as u16, row)?;
                ops += 1;
            }
        }
        let stale = self.rows.len().min(h);
        if rows.len() < stale {
            let blank = " ".repeat(rect.w as usize);
            for i in rows.len()..stale {
                surface.write_at(rect.x, rect.y + i as u16, &blank)?;
                ops += 1;
            }
        }
        self.rows = rows;
        self.snapshot = Some(snapshot);
        Ok(ops)
    }
}

pub struct RedrawScheduler<S: Surface> {
    surface: S,
    scene: SceneView,
    size: (u16, u16),
    layout: Option<Layout>,
    tiles: Region<TilesSnapshot>,
    chat: Region<ChatSnapshot>,
    status: Region<StatusLine>,
    context: Region<u8>,
    input: Region<InputSnapshot>,
    /// Absolute cursor cell, `None` when hidden.
    cursor: Option<(u16, u16)>,
}

impl<S: Surface> RedrawScheduler<S> {
    pub fn new(surface: S, scene: SceneView) -> Self {
        let size = surface.size().unwrap_or((0, 0));
        Self {
            surface,
            scene,
            size: effective_size(size.0, size.1),
            layout: None,
            tiles: Region::default(),
            chat: Region::default(),
            status: Region::default(),
            context: Region::default(),
            input: Region::default(),
            cursor: None,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn scene(&self) -> &SceneView {
        &self.scene
    }

    pub fn size(&self) -> (u16, u16) {
        self.size
    }

    /// Record a new terminal size; follow with [`Self::full_draw`].
    pub fn set_size(&mut self, width: u16, height: u16) {
        self.size = effective_size(width, height);
    }

    /// Layout for an editor occupying `input_lines` visual lines.
    pub fn layout_for(&self, input_lines: usize) -> Layout {
        Layout::compute(self.size.0, self.size.1, self.scene.tile_size(), input_lines)
    }

    fn sync_layout(&mut self, ui: &UiState<'_>) -> Result<(Layout, usize)> {
        let layout = self.layout_for(ui.editor.visible_height());
        let mut ops = 0;
        if self.layout != Some(layout) {
            ops += self.tiles.relayout(&mut self.surface, layout.scene)?;
            ops += self.chat.relayout(&mut self.surface, layout.chat)?;
            ops += self.status.relayout(&mut self.surface, layout.status)?;
            ops += self.context.relayout(&mut self.surface, layout.context)?;
            ops += self.input.relayout(&mut self.surface, layout.input)?;
            self.layout = Some(layout);
        }
        Ok((layout, ops))
    }

    fn finish(&mut self, ops: usize) -> Result<bool> {
        if ops == 0 {
            return Ok(false);
        }
        self.surface.place_cursor(self.cursor)?;
        self.surface.flush()?;
        Ok(true)
    }

    /// Scene region; redrawn when the engine revision changed.
    pub fn draw_tiles(&mut self, ui: &UiState<'_>, force: bool) -> Result<bool> {
        let (layout, mut ops) = self.sync_layout(ui)?;
        let snapshot = TilesSnapshot {
            revision: ui.engine.revision(),
            available: self.scene.is_available(),
        };
        if self.tiles.is_current(&snapshot, force) {
            return self.finish(ops);
        }
        if force {
            self.tiles.rows.clear();
        }
        let rows = if layout.scene.is_empty() {
            Vec::new()
        } else {
            let (cols, rows) = layout.scene_tiles(self.scene.tile_size());
            self.scene.render_rows(ui.engine, cols, rows)
        };
        let snapshot = TilesSnapshot {
            available: self.scene.is_available(),
            ..snapshot
        };
        ops += self.tiles.write(&mut self.surface, rows, snapshot)?;
        self.finish(ops)
    }

    pub fn draw_chat(&mut self, ui: &UiState<'_>, force: bool) -> Result<bool> {
        let (layout, mut ops) = self.sync_layout(ui)?;
        let waiting = ui.chat.waiting().map(str::to_string);
        let snapshot = ChatSnapshot {
            messages: ui.chat.message_count(),
            scroll: ui.chat.scroll(),
            blink: if waiting.is_some() {
                blink_phase(ui.engine.now_ms())
            } else {
                0
            },
            waiting,
        };
        if self.chat.is_current(&snapshot, force) {
            return self.finish(ops);
        }
        if force {
            self.chat.rows.clear();
        }
        let rect = layout.chat;
        let rows = render_chat(ui.chat, ui.engine.now_ms(), rect.w, rect.h).encode_rows();
        ops += self.chat.write(&mut self.surface, rows, snapshot)?;
        self.finish(ops)
    }

    pub fn draw_status(&mut self, ui: &UiState<'_>, force: bool) -> Result<bool> {
        let (layout, mut ops) = self.sync_layout(ui)?;
        if self.status.is_current(ui.status, force) {
            return self.finish(ops);
        }
        if force {
            self.status.rows.clear();
        }
        let rows = render_status(ui.status, layout.status.w).encode_rows();
        ops += self.status.write(&mut self.surface, rows, ui.status.clone())?;
        self.finish(ops)
    }

    pub fn draw_context(&mut self, ui: &UiState<'_>, force: bool) -> Result<bool> {
        let (layout, mut ops) = self.sync_layout(ui)?;
        let percent = ui.context.percent();
        if self.context.is_current(&percent, force) {
            return self.finish(ops);
        }
        if force {
            self.context.rows.clear();
        }
        let rows = render_context(ui.context, layout.context.w).encode_rows();
        ops += self.context.write(&mut self.surface, rows, percent)?;
        self.finish(ops)
    }

    pub fn draw_input(&mut self, ui: &UiState<'_>, force: bool) -> Result<bool> {
        let (layout, mut ops) = self.sync_layout(ui)?;
        let snapshot = InputSnapshot {
            text: ui.editor.text(),
            cursor: ui.editor.cursor(),
            mode: ui.editor.mode(),
        };
        if self.input.is_current(&snapshot, force) {
            return self.finish(ops);
        }
        if force {
            self.input.rows.clear();
        }
        let rect = layout.input;
        let (fb, cursor) = render_input(ui.editor, rect.w, rect.h);
        let cursor = cursor.map(|(x, y)| (rect.x + x, rect.y + y));
        if cursor != self.cursor {
            self.cursor = cursor;
            ops += 1;
        }
        ops += self.input.write(&mut self.surface, fb.encode_rows(), snapshot)?;
        self.finish(ops)
    }

    /// Evaluate every region; unchanged regions write nothing.
    pub fn draw_all(&mut self, ui: &UiState<'_>) -> Result<bool> {
        let mut drew = self.draw_tiles(ui, false)?;
        drew |= self.draw_chat(ui, false)?;
        drew |= self.draw_status(ui, false)?;
        drew |= self.draw_context(ui, false)?;
        drew |= self.draw_input(ui, false)?;
        Ok(drew)
    }

    /// Forget every snapshot, clear the screen and redraw everything.
    pub fn full_draw(&mut self, ui: &UiState<'_>) -> Result<()> {
        if let Ok((w, h)) = self.surface.size() {
            self.set_size(w, h);
        }
        self.reset_regions();
        self.surface.clear_all()?;
        self.draw_tiles(ui, true)?;
        self.draw_chat(ui, true)?;
        self.draw_status(ui, true)?;
        self.draw_context(ui, true)?;
        self.draw_input(ui, true)?;
        self.surface.place_cursor(self.cursor)?;
        self.surface.flush()?;
        Ok(())
    }

    fn reset_regions(&mut self) {
        self.layout = None;
        self.tiles.reset();
        self.chat.reset();
        self.status.reset();
        self.context.reset();
        self.input.reset();
    }

    fn draw_fullscreen(&mut self, rows: Vec<String>) -> Result<()> {
        self.reset_regions();
        self.surface.clear_all()?;
        for (y, row) in rows.iter().enumerate() {
            self.surface.write_at(0, y as u16, row)?;
        }
        self.surface.place_cursor(None)?;
        self.surface.flush()?;
        Ok(())
    }

    /// Draw the file picker over the whole screen. Regions are forgotten;
    /// call [`Self::full_draw`] when it closes.
    pub fn draw_picker(&mut self, picker: &FilePicker) -> Result<()> {
        let (w, h) = self.size;
        self.draw_fullscreen(render_picker(picker, w, h).encode_rows())
    }

    /// Draw the debug-log viewer over the whole screen.
    pub fn draw_log_view(&mut self, lines: &[String]) -> Result<()> {
        let (w, h) = self.size;
        self.draw_fullscreen(render_log_view(lines, w, h).encode_rows())
    }
}

//! Terminal scene renderer.
//!
//! A small rendering layer over crossterm. It avoids widget toolkits: the scene
//! is drawn from cached half-block glyph rows, and the text panes render into a
//! simple framebuffer whose rows are diffed and written through a [`Surface`].
//!
//! Goals:
//! - Keep `core` deterministic and testable
//! - Write only what changed, region by region, so animation does not flicker
//! - Make every terminal write observable in tests ([`RecordingSurface`])

pub mod fb;
pub mod layout;
pub mod panes;
pub mod redraw;
pub mod renderer;
pub mod scene_view;

pub use tui_parley_core as core;
pub use tui_parley_types as types;

pub use fb::{Cell, CellStyle, FrameBuffer, Rgb};
pub use layout::{effective_size, Layout, Rect};
pub use panes::{chat_line_count, chat_lines, status_text};
pub use redraw::{RedrawScheduler, UiState};
pub use renderer::{restore_terminal, RecordingSurface, Surface, SurfaceOp, TerminalRenderer};
pub use scene_view::{render_grid, render_grid_rows, SceneView};

//! Terminal input module (editor-facing).
//!
//! This module is independent of any UI framework. It maps `crossterm` key
//! events into [`KeyCommand`]s, owns the multi-line [`InputEditor`] with its
//! wrapped-line cursor mapping, and models the requirements-file picker.

pub mod editor;
pub mod map;
pub mod picker;
pub mod wrap;

pub use tui_parley_types as types;

pub use editor::{InputEditor, LINE_CONTINUATION};
pub use map::{handle_key_event, KeyCommand};
pub use picker::FilePicker;
pub use wrap::{wrap_segments, Segment};

//! TUI Parley (workspace facade crate).
//!
//! Re-exports the workspace crates under one name and hosts the application
//! controller that wires them together.

pub mod app;

pub use tui_parley_adapter as adapter;
pub use tui_parley_core as core;
pub use tui_parley_input as input;
pub use tui_parley_term as term;
pub use tui_parley_tiles as tiles;
pub use tui_parley_types as types;

pub use app::{App, Flow};

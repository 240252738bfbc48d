//! Core scene logic - pure, deterministic, and testable
//!
//! This crate holds the state the terminal layer draws. It has no terminal or
//! file I/O, so every piece can be driven tick by tick in tests.
//!
//! # Module Structure
//!
//! - [`sprite`]: the sprite model and its render-time pose
//! - [`animation`]: the [`SpriteEngine`] registry, shared tick and awaitable
//!   animation handles
//! - [`scene`]: terrain template and [`build_grid`]
//! - [`chat`]: chat history, scroll offset and waiting indicator
//! - [`status`]: status line and context gauge
//!
//! # Timing
//!
//! The engine advances on a fixed tick (250ms by default). Walks move one cell
//! per tick, hops take two ticks each, spawns and transforms wait two ticks, and
//! overlays expire on the first tick at or after their deadline.
//!
//! ```
//! use tui_parley_core::{build_grid, Sprite, SpriteEngine};
//! use tui_parley_types::{stage, tiles, Overlay};
//!
//! let mut engine = SpriteEngine::new(250);
//! engine.register(Sprite::new("player", tiles::PLAYER, stage::PLAYER));
//! engine.set_overlay("player", Overlay::Chatting, 500).unwrap();
//!
//! let grid = build_grid(engine.sprites());
//! assert_eq!(grid.find_sprite("player"), Some((3, 1)));
//!
//! engine.tick();
//! engine.tick();
//! assert!(!engine.has_overlay("player", Overlay::Chatting));
//! ```

pub mod animation;
pub mod chat;
pub mod scene;
pub mod sprite;
pub mod status;

pub use tui_parley_types as types;

pub use animation::{AnimationError, AnimationHandle, AnimationState, HopPhase, SpriteEngine};
pub use chat::{blink_phase, ChatLog, ChatMessage};
pub use scene::{build_grid, Occupant, SceneCell, SceneGrid, TileRef};
pub use sprite::{Sprite, SpritePose};
pub use status::{ContextGauge, StatusLine};

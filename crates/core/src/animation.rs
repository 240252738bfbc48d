//! Sprite animation engine.
//!
//! The engine owns the sprite registry and advances every sprite on one shared
//! clock. Structural animations (walk, hop, transform, spawn) are strictly
//! sequential per sprite: requesting one while another is in flight on the same
//! sprite fails with [`AnimationError::Conflict`]. Different sprites animate in
//! parallel, each advancing exactly one phase step per [`SpriteEngine::tick`].
//!
//! Every request returns an [`AnimationHandle`], a future that resolves on the
//! tick that reaches the animation's terminal condition. Callers sequence
//! choreography by awaiting handles in turn:
//!
//! ```
//! use tui_parley_core::{Sprite, SpriteEngine};
//! use tui_parley_types::{tiles, GridPos};
//!
//! let mut engine = SpriteEngine::new(250);
//! engine.register(Sprite::new("arbiter", tiles::ARBITER, GridPos::new(2, 3)));
//!
//! let mut hop = tokio_test::task::spawn(engine.hop("arbiter", 1).unwrap());
//! assert!(hop.poll().is_pending());
//! engine.tick(); // up
//! engine.tick(); // down
//! assert!(hop.poll().is_ready());
//! ```
//!
//! Overlay flags (chat bubble, alert icon) are independent of structural state
//! and expire on the first tick at or after their deadline.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::sprite::{Sprite, SpritePose};
use crate::types::{
    GridPos, Overlay, TileIndex, HOP_LIFT_PX, SPAWN_DELAY_TICKS, TRANSFORM_DELAY_TICKS,
    WALK_BOB_PX,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnimationError {
    #[error("sprite {id} already has a {active} animation in flight")]
    Conflict { id: String, active: &'static str },
    #[error("no sprite named {id}")]
    UnknownSprite { id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopPhase {
    /// Airborne; the sprite is drawn lifted.
    Up,
    /// On the ground; the next step takes off.
    Down,
}

/// In-flight structural animation of one sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationState {
    Walk {
        target: GridPos,
        steps_remaining: u32,
    },
    Hop {
        hops_remaining: u32,
        phase: HopPhase,
    },
    Transform {
        target_tile: TileIndex,
        ticks_remaining: u32,
    },
    Spawn {
        ticks_remaining: u32,
    },
}

impl AnimationState {
    pub fn kind(&self) -> &'static str {
        match self {
            AnimationState::Walk { .. } => "walk",
            AnimationState::Hop { .. } => "hop",
            AnimationState::Transform { .. } => "transform",
            AnimationState::Spawn { .. } => "spawn",
        }
    }
}

/// Completion of one requested animation.
///
/// Resolves when the animation reaches its terminal condition, or when its
/// sprite is unregistered first. Dropping a handle does not stop the animation.
#[derive(Debug)]
#[must_use = "await the handle or drop it explicitly"]
pub struct AnimationHandle {
    rx: Option<oneshot::Receiver<()>>,
}

impl AnimationHandle {
    fn pending() -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        (Self { rx: Some(rx) }, tx)
    }

    fn completed() -> Self {
        Self { rx: None }
    }
}

impl Future for AnimationHandle {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let Some(rx) = self.rx.as_mut() else {
            return Poll::Ready(());
        };
        match Pin::new(rx).poll(cx) {
            Poll::Ready(_) => {
                self.rx = None;
                Poll::Ready(())
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

#[derive(Debug)]
struct Active {
    state: AnimationState,
    done: oneshot::Sender<()>,
}

#[derive(Debug)]
struct Slot {
    sprite: Sprite,
    active: Option<Active>,
    /// Overlay -> expiry timestamp (engine clock, ms).
    overlays: BTreeMap<Overlay, u64>,
    /// Steps taken by the current walk; odd steps bob.
    walk_steps: u32,
}

impl Slot {
    fn new(sprite: Sprite) -> Self {
        Self {
            sprite,
            active: None,
            overlays: BTreeMap::new(),
            walk_steps: 0,
        }
    }

    /// Advance the structural animation by one phase step.
    ///
    /// Returns true if anything visible changed.
    fn advance(&mut self) -> bool {
        let Slot {
            sprite,
            active,
            walk_steps,
            ..
        } = self;
        let Some(current) = active.as_mut() else {
            return false;
        };

        let (finished, visible_change) = match &mut current.state {
            AnimationState::Walk {
                target,
                steps_remaining,
            } => {
                let next = step_toward(sprite.position, *target);
                if next.col < sprite.position.col {
                    sprite.mirrored = true;
                } else if next.col > sprite.position.col {
                    sprite.mirrored = false;
                }
                sprite.position = next;
                *walk_steps += 1;
                *steps_remaining = steps_remaining.saturating_sub(1);
                (*steps_remaining == 0 || sprite.position == *target, true)
            }
            AnimationState::Hop {
                hops_remaining,
                phase,
            } => match phase {
                HopPhase::Down => {
                    *phase = HopPhase::Up;
                    (false, true)
                }
                HopPhase::Up => {
                    *phase = HopPhase::Down;
                    *hops_remaining = hops_remaining.saturating_sub(1);
                    (*hops_remaining == 0, true)
                }
            },
            AnimationState::Transform {
                target_tile,
                ticks_remaining,
            } => {
                *ticks_remaining = ticks_remaining.saturating_sub(1);
                if *ticks_remaining == 0 {
                    let changed = sprite.tile != *target_tile;
                    sprite.tile = *target_tile;
                    (true, changed)
                } else {
                    (false, false)
                }
            }
            AnimationState::Spawn { ticks_remaining } => {
                *ticks_remaining = ticks_remaining.saturating_sub(1);
                if *ticks_remaining == 0 {
                    let changed = !sprite.visible;
                    sprite.visible = true;
                    (true, changed)
                } else {
                    (false, false)
                }
            }
        };

        if finished {
            if let Some(done) = active.take() {
                log::debug!(
                    "{} finished {} at ({}, {})",
                    sprite.id,
                    done.state.kind(),
                    sprite.position.row,
                    sprite.position.col
                );
                let _ = done.done.send(());
            }
            *walk_steps = 0;
        }
        visible_change
    }

    fn pose(&self) -> SpritePose {
        let lift_px = match self.active.as_ref().map(|a| a.state) {
            Some(AnimationState::Hop {
                phase: HopPhase::Up,
                ..
            }) => HOP_LIFT_PX,
            Some(AnimationState::Walk { .. }) if self.walk_steps % 2 == 1 => WALK_BOB_PX,
            _ => 0,
        };
        SpritePose { lift_px }
    }
}

/// One cell toward `to`, on the axis with the larger remaining distance
/// (columns win ties).
fn step_toward(from: GridPos, to: GridPos) -> GridPos {
    let dr = to.row - from.row;
    let dc = to.col - from.col;
    if dc != 0 && dc.abs() >= dr.abs() {
        GridPos::new(from.row, from.col + dc.signum())
    } else if dr != 0 {
        GridPos::new(from.row + dr.signum(), from.col)
    } else {
        from
    }
}

/// Sprite registry plus the shared animation clock.
#[derive(Debug)]
pub struct SpriteEngine {
    slots: BTreeMap<String, Slot>,
    tick_ms: u64,
    now_ms: u64,
    revision: u64,
}

impl SpriteEngine {
    pub fn new(tick_ms: u64) -> Self {
        Self {
            slots: BTreeMap::new(),
            tick_ms: tick_ms.max(1),
            now_ms: 0,
            revision: 0,
        }
    }

    pub fn tick_ms(&self) -> u64 {
        self.tick_ms
    }

    /// Engine clock: milliseconds advanced by ticks so far.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Animation frame counter; bumped on every visible change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Add a sprite. Returns false (and changes nothing) if the id exists.
    pub fn register(&mut self, sprite: Sprite) -> bool {
        if self.slots.contains_key(&sprite.id) {
            return false;
        }
        log::debug!("register sprite {}", sprite.id);
        self.slots.insert(sprite.id.clone(), Slot::new(sprite));
        self.revision += 1;
        true
    }

    /// Remove a sprite, resolving any handle still waiting on it.
    pub fn unregister(&mut self, id: &str) -> bool {
        match self.slots.remove(id) {
            Some(_) => {
                log::debug!("unregister sprite {}", id);
                self.revision += 1;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    pub fn sprite(&self, id: &str) -> Option<&Sprite> {
        self.slots.get(id).map(|s| &s.sprite)
    }

    /// All sprites, ordered by id.
    pub fn sprites(&self) -> impl Iterator<Item = &Sprite> {
        self.slots.values().map(|s| &s.sprite)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn animation(&self, id: &str) -> Option<AnimationState> {
        self.slots.get(id)?.active.as_ref().map(|a| a.state)
    }

    pub fn pose(&self, id: &str) -> SpritePose {
        self.slots.get(id).map(Slot::pose).unwrap_or_default()
    }

    /// Active overlays on `id`, in a stable order.
    pub fn overlays(&self, id: &str) -> Vec<Overlay> {
        self.slots
            .get(id)
            .map(|s| s.overlays.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn has_overlay(&self, id: &str, flag: Overlay) -> bool {
        self.slots
            .get(id)
            .is_some_and(|s| s.overlays.contains_key(&flag))
    }

    pub fn has_active_animations(&self) -> bool {
        self.slots.values().any(|s| s.active.is_some())
    }

    /// Advance the clock by one interval.
    pub fn tick(&mut self) {
        self.now_ms += self.tick_ms;
        let now = self.now_ms;
        let mut changed = false;
        for slot in self.slots.values_mut() {
            changed |= slot.advance();
            let before = slot.overlays.len();
            slot.overlays.retain(|_, expires_at| *expires_at > now);
            changed |= slot.overlays.len() != before;
        }
        if changed {
            self.revision += 1;
        }
    }

    fn idle_slot(&mut self, id: &str) -> Result<&mut Slot, AnimationError> {
        let slot = self
            .slots
            .get_mut(id)
            .ok_or_else(|| AnimationError::UnknownSprite { id: id.to_string() })?;
        if let Some(active) = &slot.active {
            return Err(AnimationError::Conflict {
                id: id.to_string(),
                active: active.state.kind(),
            });
        }
        Ok(slot)
    }

    fn begin(&mut self, id: &str, state: AnimationState) -> Result<AnimationHandle, AnimationError> {
        let slot = self.idle_slot(id)?;
        let (handle, done) = AnimationHandle::pending();
        log::debug!("{} begins {}", id, state.kind());
        slot.active = Some(Active { state, done });
        Ok(handle)
    }

    /// Walk one cell per tick toward `target`.
    pub fn walk(&mut self, id: &str, target: GridPos) -> Result<AnimationHandle, AnimationError> {
        let from = self.idle_slot(id)?.sprite.position;
        let steps = from.manhattan(target);
        if steps == 0 {
            return Ok(AnimationHandle::completed());
        }
        self.begin(
            id,
            AnimationState::Walk {
                target,
                steps_remaining: steps,
            },
        )
    }

    /// Hop `count` times, two ticks per hop.
    pub fn hop(&mut self, id: &str, count: u32) -> Result<AnimationHandle, AnimationError> {
        self.idle_slot(id)?;
        if count == 0 {
            return Ok(AnimationHandle::completed());
        }
        self.begin(
            id,
            AnimationState::Hop {
                hops_remaining: count,
                phase: HopPhase::Down,
            },
        )
    }

    /// Become visible after a short delay.
    pub fn spawn(&mut self, id: &str) -> Result<AnimationHandle, AnimationError> {
        self.begin(
            id,
            AnimationState::Spawn {
                ticks_remaining: SPAWN_DELAY_TICKS.max(1),
            },
        )
    }

    /// Hide immediately.
    pub fn despawn(&mut self, id: &str) -> Result<AnimationHandle, AnimationError> {
        let slot = self.idle_slot(id)?;
        let was_visible = std::mem::replace(&mut slot.sprite.visible, false);
        if was_visible {
            self.revision += 1;
        }
        Ok(AnimationHandle::completed())
    }

    /// Swap the sprite's tile after a fixed delay.
    pub fn transform(&mut self, id: &str, tile: TileIndex) -> Result<AnimationHandle, AnimationError> {
        self.begin(
            id,
            AnimationState::Transform {
                target_tile: tile,
                ticks_remaining: TRANSFORM_DELAY_TICKS.max(1),
            },
        )
    }

    /// Show `flag` on `id` for `duration_ms`; setting it again extends it.
    /// Deadlines saturate at the end of the clock.
    pub fn set_overlay(&mut self, id: &str, flag: Overlay, duration_ms: u64) -> Result<(), AnimationError> {
        let now = self.now_ms;
        let slot = self
            .slots
            .get_mut(id)
            .ok_or_else(|| AnimationError::UnknownSprite { id: id.to_string() })?;
        slot.overlays.insert(flag, now.saturating_add(duration_ms));
        self.revision += 1;
        Ok(())
    }

    pub fn clear_overlay(&mut self, id: &str, flag: Overlay) -> bool {
        let removed = self
            .slots
            .get_mut(id)
            .is_some_and(|s| s.overlays.remove(&flag).is_some());
        if removed {
            self.revision += 1;
        }
        removed
    }
}

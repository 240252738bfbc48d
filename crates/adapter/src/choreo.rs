//! Scene choreography for router events.
//!
//! Each routine issues one engine request at a time and awaits its handle
//! before the next, holding the `RefCell` borrow only for the request itself.
//! A rejected request (conflict or unknown sprite) is logged and that step is
//! skipped; the routine carries on with whatever steps remain.
//!
//! Routines that move the same sprite are chained through [`Lanes`], so the
//! second one starts only once the first has finished and never meets a busy
//! slot of its own making.

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;

use tokio::sync::oneshot;
use tui_parley_core::{AnimationError, AnimationHandle, Sprite, SpriteEngine};

use crate::types::{ids, stage, tiles, AgentMode, Overlay, ALERT_MS, CHAT_BUBBLE_MS};

pub type SharedEngine = Rc<RefCell<SpriteEngine>>;

/// Per-sprite FIFO of choreographies.
///
/// Each lane remembers the completion signal of its newest routine. A routine
/// chained onto a lane waits for that signal before its first poll of the
/// inner future; a predecessor that is dropped unfinished releases the lane.
#[derive(Debug, Default)]
pub struct Lanes {
    tails: HashMap<String, oneshot::Receiver<()>>,
}

impl Lanes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `fut` behind everything already chained on lane `id`.
    pub fn chain<F>(&mut self, id: &str, fut: F) -> impl Future<Output = F::Output> + 'static
    where
        F: Future + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel();
        let prev = self.tails.insert(id.to_string(), done_rx);
        async move {
            if let Some(prev) = prev {
                let _ = prev.await;
            }
            let out = fut.await;
            let _ = done_tx.send(());
            out
        }
    }

    /// Lanes whose newest routine may still be running.
    pub fn busy(&mut self) -> usize {
        self.tails.retain(|_, rx| matches!(rx.try_recv(), Err(oneshot::error::TryRecvError::Empty)));
        self.tails.len()
    }
}

/// Register the sprites that are always on stage.
pub fn stage_cast(engine: &mut SpriteEngine) {
    engine.register(Sprite::new(ids::PLAYER, tiles::PLAYER, stage::PLAYER));
    engine.register(Sprite::new(ids::ARBITER, tiles::ARBITER, stage::ARBITER).facing_left());
}

/// Sprite that speaks for a chat speaker name.
pub fn sprite_for_speaker(speaker: &str) -> &str {
    match speaker.to_ascii_lowercase().as_str() {
        "you" | "user" | "player" => ids::PLAYER,
        _ => speaker,
    }
}

fn request<F>(engine: &SharedEngine, what: &str, f: F) -> Option<AnimationHandle>
where
    F: FnOnce(&mut SpriteEngine) -> Result<AnimationHandle, AnimationError>,
{
    let result = f(&mut engine.borrow_mut());
    match result {
        Ok(handle) => Some(handle),
        Err(e) => {
            log::warn!("{} skipped: {}", what, e);
            None
        }
    }
}

async fn step<F>(engine: &SharedEngine, what: &str, f: F)
where
    F: FnOnce(&mut SpriteEngine) -> Result<AnimationHandle, AnimationError>,
{
    if let Some(handle) = request(engine, what, f) {
        handle.await;
    }
}

fn overlay(engine: &SharedEngine, id: &str, flag: Overlay, duration_ms: u64) {
    if let Err(e) = engine.borrow_mut().set_overlay(id, flag, duration_ms) {
        log::warn!("{} overlay skipped: {}", flag.as_str(), e);
    }
}

/// A chat message: the speaker shows a bubble and hops once.
pub async fn message_received(engine: SharedEngine, speaker: String) {
    let id = sprite_for_speaker(&speaker).to_string();
    if !engine.borrow().contains(&id) {
        log::debug!("no sprite for speaker {}", speaker);
        return;
    }
    overlay(&engine, &id, Overlay::Chatting, CHAT_BUBBLE_MS);
    step(&engine, "message hop", |e| e.hop(&id, 1)).await;
}

/// Tool use: the arbiter raises an alert.
pub fn tool_used(engine: &SharedEngine) {
    overlay(engine, ids::ARBITER, Overlay::Alarmed, ALERT_MS);
}

/// Mode change: the arbiter transforms into the mode's creature, then hops.
pub async fn mode_changed(engine: SharedEngine, mode: AgentMode) {
    step(&engine, "mode transform", |e| {
        e.transform(ids::ARBITER, mode.arbiter_tile())
    })
    .await;
    step(&engine, "mode hop", |e| e.hop(ids::ARBITER, 1)).await;
}

/// A peer joins: it appears at the entrance, walks to its slot and hops twice.
/// Returns the peer's sprite id, or `None` when that peer is already on stage.
pub async fn peer_spawned(engine: SharedEngine, index: usize) -> Option<String> {
    let id = ids::peer(index);
    let sprite = Sprite::new(id.clone(), tiles::peer(index), stage::PEER_ENTRANCE)
        .hidden()
        .facing_left();
    if !engine.borrow_mut().register(sprite) {
        log::warn!("peer {} already on stage", id);
        return None;
    }
    step(&engine, "peer spawn", |e| e.spawn(&id)).await;
    step(&engine, "peer walk", |e| e.walk(&id, stage::peer_slot(index))).await;
    step(&engine, "peer hop", |e| e.hop(&id, 2)).await;
    Some(id)
}

/// A peer leaves: it walks off stage, disappears and is unregistered.
pub async fn peer_disconnected(engine: SharedEngine, id: String) {
    step(&engine, "peer exit", |e| e.walk(&id, stage::PEER_EXIT)).await;
    step(&engine, "peer despawn", |e| e.despawn(&id)).await;
    engine.borrow_mut().unregister(&id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use tokio_test::task;
    use tokio_test::{assert_pending, assert_ready};

    fn shared() -> SharedEngine {
        let mut engine = SpriteEngine::new(250);
        stage_cast(&mut engine);
        Rc::new(RefCell::new(engine))
    }

    /// Tick until the future completes; returns the ticks it took.
    fn drive<F: Future>(engine: &SharedEngine, fut: F, limit: usize) -> (F::Output, usize) {
        let mut t = task::spawn(fut);
        for ticks in 0..=limit {
            if let std::task::Poll::Ready(out) = t.poll() {
                return (out, ticks);
            }
            engine.borrow_mut().tick();
        }
        panic!("choreography did not finish in {} ticks", limit);
    }

    #[test]
    fn speaker_names_map_to_sprites() {
        assert_eq!(sprite_for_speaker("You"), ids::PLAYER);
        assert_eq!(sprite_for_speaker("arbiter"), ids::ARBITER);
        assert_eq!(sprite_for_speaker("peer-2"), "peer-2");
    }

    #[test]
    fn message_shows_bubble_and_hops_once() {
        let engine = shared();
        let (_, ticks) = drive(&engine, message_received(engine.clone(), "arbiter".into()), 10);
        assert_eq!(ticks, 2);
        let e = engine.borrow();
        assert!(e.has_overlay(ids::ARBITER, Overlay::Chatting));
        assert_eq!(e.sprite(ids::ARBITER).unwrap().position, stage::ARBITER);
    }

    #[test]
    fn unknown_speaker_is_ignored() {
        let engine = shared();
        let before = engine.borrow().revision();
        let (_, ticks) = drive(&engine, message_received(engine.clone(), "router".into()), 1);
        assert_eq!(ticks, 0);
        assert_eq!(engine.borrow().revision(), before);
    }

    #[test]
    fn conflicting_hop_is_skipped_but_bubble_still_shows() {
        let engine = shared();
        let _busy = engine.borrow_mut().hop(ids::PLAYER, 3).unwrap();
        let mut t = task::spawn(message_received(engine.clone(), "you".into()));
        assert_ready!(t.poll());
        assert!(engine.borrow().has_overlay(ids::PLAYER, Overlay::Chatting));
    }

    #[test]
    fn tool_use_raises_alert_for_three_seconds() {
        let engine = shared();
        tool_used(&engine);
        for _ in 0..11 {
            engine.borrow_mut().tick();
        }
        assert!(engine.borrow().has_overlay(ids::ARBITER, Overlay::Alarmed));
        engine.borrow_mut().tick();
        assert!(!engine.borrow().has_overlay(ids::ARBITER, Overlay::Alarmed));
    }

    #[test]
    fn mode_change_transforms_then_hops() {
        let engine = shared();
        let (_, ticks) = drive(&engine, mode_changed(engine.clone(), AgentMode::Plan), 10);
        assert_eq!(ticks, 4);
        assert_eq!(engine.borrow().sprite(ids::ARBITER).unwrap().tile, tiles::OWL);
    }

    #[test]
    fn peer_joins_and_leaves() {
        let engine = shared();
        let (id, _) = drive(&engine, peer_spawned(engine.clone(), 1), 30);
        let id = id.unwrap();
        {
            let e = engine.borrow();
            let peer = e.sprite(&id).unwrap();
            assert!(peer.visible);
            assert_eq!(peer.position, stage::peer_slot(1));
        }

        let mut again = task::spawn(peer_spawned(engine.clone(), 1));
        assert_eq!(assert_ready!(again.poll()), None);

        let (_, _) = drive(&engine, peer_disconnected(engine.clone(), id.clone()), 30);
        assert!(!engine.borrow().contains(&id));
    }

    #[test]
    fn chained_mode_changes_end_on_the_last_mode() {
        let engine = shared();
        let mut lanes = Lanes::new();
        let mut plan = task::spawn(lanes.chain(ids::ARBITER, mode_changed(engine.clone(), AgentMode::Plan)));
        let mut auto = task::spawn(lanes.chain(ids::ARBITER, mode_changed(engine.clone(), AgentMode::Auto)));
        assert_eq!(lanes.busy(), 1);

        let (mut plan_done, mut auto_done) = (false, false);
        let mut ticks = 0;
        loop {
            plan_done = plan_done || plan.poll().is_ready();
            auto_done = auto_done || auto.poll().is_ready();
            assert!(plan_done || !auto_done, "second routine finished first");
            if plan_done && auto_done {
                break;
            }
            assert!(ticks < 20, "chain did not finish");
            engine.borrow_mut().tick();
            ticks += 1;
        }
        assert_eq!(ticks, 8);
        assert_eq!(engine.borrow().sprite(ids::ARBITER).unwrap().tile, AgentMode::Auto.arbiter_tile());
        assert_eq!(lanes.busy(), 0);
    }

    #[test]
    fn dropped_routine_releases_its_lane() {
        let engine = shared();
        let mut lanes = Lanes::new();
        let first = lanes.chain(ids::ARBITER, mode_changed(engine.clone(), AgentMode::Plan));
        let second = lanes.chain(ids::ARBITER, mode_changed(engine.clone(), AgentMode::Auto));
        drop(first);
        let (_, ticks) = drive(&engine, second, 10);
        assert_eq!(ticks, 4);
    }

    #[test]
    fn lanes_of_different_sprites_run_side_by_side() {
        let engine = shared();
        let mut lanes = Lanes::new();
        let mut mode = task::spawn(lanes.chain(ids::ARBITER, mode_changed(engine.clone(), AgentMode::Plan)));
        let mut talk = task::spawn(lanes.chain(ids::PLAYER, message_received(engine.clone(), "you".into())));
        assert_pending!(mode.poll());
        assert_pending!(talk.poll());
        assert!(engine.borrow().has_overlay(ids::PLAYER, Overlay::Chatting));
        assert_eq!(lanes.busy(), 2);
    }

    #[test]
    fn peer_spawn_waits_on_ticks() {
        let engine = shared();
        let mut t = task::spawn(peer_spawned(engine.clone(), 2));
        assert_pending!(t.poll());
        assert!(!engine.borrow().sprite("peer-2").unwrap().visible);
    }
}

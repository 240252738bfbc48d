mod support;

use std::fs;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio_test::task;

use tui_parley::adapter::{AppConfig, HookCall, InboundEvent};
use tui_parley::app::{Choreography, USER_SPEAKER};
use tui_parley::term::{RecordingSurface, SceneView, SurfaceOp};
use tui_parley::tiles::{TileStore, HALF_BLOCK};
use tui_parley::types::{ids, stage, AgentMode, EditMode, Overlay};
use tui_parley::{App, Flow};

use support::TestApp;

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::from(code)
}

fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
}

fn type_str(app: &mut TestApp, s: &str) {
    for c in s.chars() {
        app.handle_key(key(KeyCode::Char(c))).unwrap();
    }
}

/// Poll queued choreographies while ticking until all finish.
fn run_choreographies(app: &mut TestApp, max_ticks: usize) {
    let mut tasks: Vec<_> = app
        .take_choreographies()
        .into_iter()
        .map(task::spawn)
        .collect();
    for _ in 0..=max_ticks {
        tasks.retain_mut(|t| t.poll().is_pending());
        if tasks.is_empty() {
            return;
        }
        app.tick().unwrap();
    }
    panic!("choreographies still running after {} ticks", max_ticks);
}

/// Move newly queued choreographies into `tasks` and poll every one once.
fn poll_in_flight(app: &mut TestApp, tasks: &mut Vec<task::Spawn<Choreography>>) {
    tasks.extend(app.take_choreographies().into_iter().map(task::spawn));
    tasks.retain_mut(|t| t.poll().is_pending());
}

#[test]
fn quit_needs_confirmation() {
    let mut app = support::app(120, 40);
    assert_eq!(app.handle_key(ctrl('c')).unwrap(), Flow::Continue);
    assert!(app.status().quit_pending);

    // Any other key cancels and is swallowed.
    assert_eq!(app.handle_key(key(KeyCode::Char('x'))).unwrap(), Flow::Continue);
    assert!(!app.status().quit_pending);
    assert!(app.editor().is_empty());

    assert_eq!(app.handle_key(ctrl('c')).unwrap(), Flow::Continue);
    assert_eq!(app.handle_key(ctrl('c')).unwrap(), Flow::Quit);
    assert_eq!(app.hooks(), &vec![HookCall::ExitConfirmed]);
}

#[test]
fn suspend_and_detach_skip_the_exit_hook() {
    let mut app = support::app(120, 40);
    assert_eq!(app.handle_key(ctrl('z')).unwrap(), Flow::Suspend);
    assert_eq!(app.handle_key(ctrl('d')).unwrap(), Flow::Detach);
    assert!(app.hooks().is_empty());
}

#[test]
fn submit_sends_text_and_animates_the_player() {
    let mut app = support::app(120, 40);
    type_str(&mut app, "hello");
    app.handle_key(key(KeyCode::Enter)).unwrap();

    assert_eq!(app.hooks(), &vec![HookCall::SubmitText("hello".into())]);
    assert!(app.editor().is_empty());
    let last = app.chat().messages().last().unwrap();
    assert_eq!(last.speaker, USER_SPEAKER);
    assert_eq!(last.text, "hello");

    run_choreographies(&mut app, 4);
    assert!(app.engine().borrow().has_overlay(ids::PLAYER, Overlay::Chatting));
}

#[test]
fn blank_and_continued_lines_do_not_submit() {
    let mut app = support::app(120, 40);
    type_str(&mut app, "   ");
    app.handle_key(key(KeyCode::Enter)).unwrap();
    assert!(app.hooks().is_empty());
    assert_eq!(app.editor().text(), "   ");

    for _ in 0..3 {
        app.handle_key(key(KeyCode::Backspace)).unwrap();
    }
    assert!(app.editor().is_empty());
    type_str(&mut app, "one\\");
    app.handle_key(key(KeyCode::Enter)).unwrap();
    assert!(app.hooks().is_empty());
    assert_eq!(app.editor().text(), "one\n");
}

#[test]
fn escape_switches_to_normal_mode_and_scrolls() {
    let mut app = support::app(120, 40);
    for i in 0..80 {
        app.handle_event(InboundEvent::MessageReceived {
            speaker: "router".into(),
            text: format!("line {}", i),
        })
        .unwrap();
    }
    app.take_choreographies();

    app.handle_key(key(KeyCode::Esc)).unwrap();
    assert_eq!(app.editor().mode(), EditMode::Normal);
    assert_eq!(app.status().edit_mode, EditMode::Normal);

    app.handle_key(key(KeyCode::Char('k'))).unwrap();
    app.handle_key(key(KeyCode::Char('k'))).unwrap();
    assert_eq!(app.chat().scroll(), 2);
    app.handle_key(key(KeyCode::Char('j'))).unwrap();
    assert_eq!(app.chat().scroll(), 1);

    app.handle_key(key(KeyCode::PageUp)).unwrap();
    assert!(app.chat().scroll() > 1);
    app.handle_key(key(KeyCode::PageDown)).unwrap();
    app.handle_key(key(KeyCode::PageDown)).unwrap();
    assert_eq!(app.chat().scroll(), 0);

    // Scroll never passes the oldest line.
    for _ in 0..50 {
        app.handle_key(key(KeyCode::PageUp)).unwrap();
    }
    let layout = app.scheduler().layout_for(1);
    let total = tui_parley::term::chat_line_count(app.chat(), layout.chat.w as usize);
    assert_eq!(app.chat().scroll(), total - layout.chat.h as usize);

    app.handle_key(key(KeyCode::Char('i'))).unwrap();
    assert_eq!(app.editor().mode(), EditMode::Insert);
}

#[test]
fn picker_selects_a_file_and_restores_the_screen() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("b.md"), "b").unwrap();
    fs::write(dir.path().join("a.md"), "a").unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();

    let mut app = support::app(120, 40).with_picker_dir(dir.path());
    app.handle_key(key(KeyCode::Esc)).unwrap();
    app.handle_key(key(KeyCode::Char('f'))).unwrap();
    assert!(app.in_overlay());

    // Regions stay untouched while the picker covers them.
    app.scheduler_mut().surface_mut().clear_ops();
    app.tick().unwrap();
    assert_eq!(app.scheduler().surface().writes(), 0);

    app.handle_key(key(KeyCode::Down)).unwrap();
    app.handle_key(key(KeyCode::Enter)).unwrap();
    assert!(!app.in_overlay());
    assert_eq!(
        app.hooks(),
        &vec![HookCall::FileSelected(Some(dir.path().join("b.md")))]
    );
    assert!(app
        .scheduler()
        .surface()
        .ops()
        .contains(&tui_parley::term::SurfaceOp::ClearAll));
}

#[test]
fn picker_escape_reports_no_selection() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = support::app(120, 40).with_picker_dir(dir.path());
    app.handle_key(key(KeyCode::Esc)).unwrap();
    app.handle_key(key(KeyCode::Char('f'))).unwrap();
    // Empty directory: Enter has nothing to pick.
    app.handle_key(key(KeyCode::Enter)).unwrap();
    assert!(app.in_overlay());
    app.handle_key(key(KeyCode::Esc)).unwrap();
    assert!(!app.in_overlay());
    assert_eq!(app.hooks(), &vec![HookCall::FileSelected(None)]);
}

#[test]
fn log_viewer_opens_and_closes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("debug.log");
    let sink = tui_parley::adapter::DebugLog::open(&path, log::LevelFilter::Debug).unwrap();
    let mut app = support::app(120, 40).with_debug_log(sink);

    app.handle_event(InboundEvent::DebugLog {
        kind: "router".into(),
        text: "routed to arbiter".into(),
    })
    .unwrap();

    app.handle_key(key(KeyCode::Esc)).unwrap();
    app.handle_key(key(KeyCode::Char('L'))).unwrap();
    assert!(app.in_overlay());
    let shown = app
        .scheduler()
        .surface()
        .ops()
        .iter()
        .any(|op| matches!(op, tui_parley::term::SurfaceOp::Write { text, .. } if text.contains("routed to arbiter")));
    assert!(shown);

    app.handle_key(key(KeyCode::Esc)).unwrap();
    assert!(!app.in_overlay());
}

#[test]
fn router_events_update_status_and_context() {
    let mut app = support::app(120, 40);
    app.handle_event(InboundEvent::ContextPercent(42)).unwrap();
    app.handle_event(InboundEvent::ToolUse {
        name: "grep".into(),
        count: 2,
    })
    .unwrap();
    app.handle_event(InboundEvent::ToolUse {
        name: "read".into(),
        count: 1,
    })
    .unwrap();

    assert_eq!(app.context().percent(), 42);
    assert_eq!(app.status().last_tool.as_deref(), Some("read"));
    assert_eq!(app.status().tool_total, 3);
    assert!(app.engine().borrow().has_overlay(ids::ARBITER, Overlay::Alarmed));

    app.handle_event(InboundEvent::WaitingStart {
        target: "arbiter".into(),
    })
    .unwrap();
    app.handle_event(InboundEvent::WaitingStop {
        target: "someone-else".into(),
    })
    .unwrap();
    assert_eq!(app.chat().waiting(), Some("arbiter"));
    app.handle_event(InboundEvent::WaitingStop {
        target: "arbiter".into(),
    })
    .unwrap();
    assert_eq!(app.chat().waiting(), None);
}

#[test]
fn mode_change_transforms_the_arbiter() {
    let mut app = support::app(120, 40);
    app.handle_event(InboundEvent::ModeChange(AgentMode::Auto)).unwrap();
    assert_eq!(app.status().agent_mode, AgentMode::Auto);
    run_choreographies(&mut app, 10);
    assert_eq!(
        app.engine().borrow().sprite(ids::ARBITER).unwrap().tile,
        AgentMode::Auto.arbiter_tile()
    );
}

#[test]
fn back_to_back_mode_changes_settle_on_the_last_mode() {
    let mut app = support::app(120, 40);
    app.handle_event(InboundEvent::ModeChange(AgentMode::Plan)).unwrap();
    app.handle_event(InboundEvent::ModeChange(AgentMode::Auto)).unwrap();
    assert_eq!(app.status().agent_mode, AgentMode::Auto);
    run_choreographies(&mut app, 20);
    assert_eq!(
        app.engine().borrow().sprite(ids::ARBITER).unwrap().tile,
        AgentMode::Auto.arbiter_tile()
    );
}

#[test]
fn mode_change_during_arbiter_reply_still_transforms() {
    let mut app = support::app(120, 40);
    app.handle_event(InboundEvent::MessageReceived {
        speaker: ids::ARBITER.into(),
        text: "thinking".into(),
    })
    .unwrap();
    app.handle_event(InboundEvent::ModeChange(AgentMode::Plan)).unwrap();
    run_choreographies(&mut app, 20);
    assert_eq!(
        app.engine().borrow().sprite(ids::ARBITER).unwrap().tile,
        AgentMode::Plan.arbiter_tile()
    );
}

#[test]
fn peer_rejoining_during_its_exit_walk_comes_back() {
    let mut app = support::app(120, 40);
    app.handle_event(InboundEvent::PeerSpawned { index: 1 }).unwrap();
    run_choreographies(&mut app, 30);

    let mut tasks = Vec::new();
    app.handle_event(InboundEvent::PeerDisconnected).unwrap();
    poll_in_flight(&mut app, &mut tasks);
    app.tick().unwrap();
    poll_in_flight(&mut app, &mut tasks);
    assert!(!tasks.is_empty());

    app.handle_event(InboundEvent::PeerSpawned { index: 1 }).unwrap();
    for _ in 0..40 {
        poll_in_flight(&mut app, &mut tasks);
        if tasks.is_empty() {
            break;
        }
        app.tick().unwrap();
    }
    assert!(tasks.is_empty(), "choreographies still running");

    assert_eq!(app.peers(), &["peer-1".to_string()]);
    assert_eq!(app.status().peers, 1);
    let engine = app.engine().borrow();
    let peer = engine.sprite("peer-1").expect("peer sprite registered");
    assert!(peer.visible);
    assert_eq!(peer.position, stage::peer_slot(1));
}

#[test]
fn default_startup_draws_the_builtin_scene() {
    let config = AppConfig::default();
    let scene = SceneView::from_load(TileStore::open(config.atlas_path.as_deref(), config.tile_size));
    assert!(scene.is_available());

    let mut app = App::new(
        RecordingSurface::new(200, 50),
        scene,
        Vec::<HookCall>::new(),
        config.tick_ms,
    );
    app.full_draw().unwrap();
    assert_eq!(app.status().notice, None);

    let scene_rows: Vec<&str> = app
        .scheduler()
        .surface()
        .ops()
        .iter()
        .filter_map(|op| match op {
            SurfaceOp::Write { x: 0, text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(scene_rows.len(), 40);
    assert!(scene_rows.iter().all(|row| row.contains(HALF_BLOCK)));
    assert!(scene_rows.iter().all(|row| !row.contains("unavailable")));
}

#[test]
fn peers_arrive_and_the_newest_leaves_first() {
    let mut app = support::app(120, 40);
    app.handle_event(InboundEvent::PeerSpawned { index: 1 }).unwrap();
    app.handle_event(InboundEvent::PeerSpawned { index: 2 }).unwrap();
    app.handle_event(InboundEvent::PeerSpawned { index: 2 }).unwrap();
    assert_eq!(app.status().peers, 2);
    run_choreographies(&mut app, 30);

    {
        let engine = app.engine().borrow();
        assert_eq!(engine.sprite("peer-1").unwrap().position, stage::peer_slot(1));
        assert_eq!(engine.sprite("peer-2").unwrap().position, stage::peer_slot(2));
    }

    app.handle_event(InboundEvent::PeerDisconnected).unwrap();
    assert_eq!(app.peers(), &["peer-1".to_string()]);
    run_choreographies(&mut app, 30);
    assert!(!app.engine().borrow().contains("peer-2"));
    assert!(app.engine().borrow().contains("peer-1"));
    assert_eq!(app.status().peers, 1);
}

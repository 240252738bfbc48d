//! Application controller.
//!
//! Owns the UI state and routes the three entry points (key events, router
//! events and the clock tick) into it. Nothing here awaits: choreographies are
//! queued and handed to the caller, which runs them on its `LocalSet`.

use std::cell::RefCell;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::adapter::{choreo, DebugLog, EventSender, Hooks, InboundEvent, Lanes, LogTail, SharedEngine};
use crate::core::{ChatLog, ContextGauge, SpriteEngine, StatusLine};
use crate::input::{handle_key_event, FilePicker, InputEditor, KeyCommand};
use crate::term::{chat_line_count, RedrawScheduler, SceneView, Surface, UiState};
use crate::types::{ids, EditMode};

/// Speaker name for the local user's chat lines.
pub const USER_SPEAKER: &str = "you";

/// Delay before the demo echo answers.
pub const ECHO_DELAY_MS: u64 = 800;

pub type Choreography = Pin<Box<dyn Future<Output = ()>>>;

/// What the main loop should do after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
    Suspend,
    Detach,
}

/// Full-screen sub-view currently covering the regions.
#[derive(Debug)]
enum Screen {
    Main,
    Picker(FilePicker),
    Log(Vec<String>),
}

pub struct App<S: Surface, H: Hooks> {
    engine: SharedEngine,
    chat: ChatLog,
    status: StatusLine,
    context: ContextGauge,
    editor: InputEditor,
    scheduler: RedrawScheduler<S>,
    hooks: H,
    screen: Screen,
    /// Peer sprite ids on stage, newest last.
    peers: Vec<String>,
    picker_dir: PathBuf,
    debug_log: Option<DebugLog>,
    echo: Option<EventSender>,
    queued: Vec<Choreography>,
    /// Choreographies touching the same sprite run in arrival order.
    lanes: Lanes,
}

impl<S: Surface, H: Hooks> App<S, H> {
    pub fn new(surface: S, scene: SceneView, hooks: H, tick_ms: u64) -> Self {
        let mut engine = SpriteEngine::new(tick_ms);
        choreo::stage_cast(&mut engine);
        let status = StatusLine {
            notice: scene.notice().map(|n| format!("scene unavailable: {n}")),
            ..StatusLine::default()
        };
        Self {
            engine: Rc::new(RefCell::new(engine)),
            chat: ChatLog::new(),
            status,
            context: ContextGauge::default(),
            editor: InputEditor::new(1),
            scheduler: RedrawScheduler::new(surface, scene),
            hooks,
            screen: Screen::Main,
            peers: Vec::new(),
            picker_dir: PathBuf::from("."),
            debug_log: None,
            echo: None,
            queued: Vec::new(),
            lanes: Lanes::new(),
        }
    }

    pub fn with_picker_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.picker_dir = dir.into();
        self
    }

    pub fn with_debug_log(mut self, log: DebugLog) -> Self {
        self.debug_log = Some(log);
        self
    }

    /// Answer submissions locally through `events` (demo mode), or stop.
    pub fn set_echo(&mut self, events: Option<EventSender>) {
        self.echo = events;
    }

    pub fn engine(&self) -> &SharedEngine {
        &self.engine
    }

    pub fn chat(&self) -> &ChatLog {
        &self.chat
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    pub fn context(&self) -> &ContextGauge {
        &self.context
    }

    pub fn editor(&self) -> &InputEditor {
        &self.editor
    }

    pub fn scheduler(&self) -> &RedrawScheduler<S> {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut RedrawScheduler<S> {
        &mut self.scheduler
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn peers(&self) -> &[String] {
        &self.peers
    }

    pub fn in_overlay(&self) -> bool {
        !matches!(self.screen, Screen::Main)
    }

    /// Choreographies queued since the last call.
    pub fn take_choreographies(&mut self) -> Vec<Choreography> {
        std::mem::take(&mut self.queued)
    }

    fn queue(&mut self, fut: impl Future<Output = ()> + 'static) {
        self.queued.push(Box::pin(fut));
    }

    /// Queue `fut` behind the choreographies already queued for sprite `id`.
    fn queue_on(&mut self, id: &str, fut: impl Future<Output = ()> + 'static) {
        let chained = self.lanes.chain(id, fut);
        self.queue(chained);
    }

    /// Advance the animation clock and redraw what changed.
    pub fn tick(&mut self) -> Result<()> {
        self.engine.borrow_mut().tick();
        self.redraw()
    }

    /// Incremental redraw of every region.
    pub fn redraw(&mut self) -> Result<()> {
        if self.in_overlay() {
            return Ok(());
        }
        self.sync_editor_width();
        let engine = self.engine.borrow();
        let ui = UiState {
            engine: &engine,
            chat: &self.chat,
            status: &self.status,
            context: &self.context,
            editor: &self.editor,
        };
        self.scheduler.draw_all(&ui)?;
        Ok(())
    }

    /// Clear and redraw everything, e.g. after a resize or an overlay.
    pub fn full_draw(&mut self) -> Result<()> {
        if let Ok((w, h)) = self.scheduler.surface().size() {
            self.scheduler.set_size(w, h);
        }
        match &self.screen {
            Screen::Main => {}
            Screen::Picker(picker) => return self.scheduler.draw_picker(picker),
            Screen::Log(lines) => return self.scheduler.draw_log_view(lines),
        }
        self.sync_editor_width();
        let engine = self.engine.borrow();
        let ui = UiState {
            engine: &engine,
            chat: &self.chat,
            status: &self.status,
            context: &self.context,
            editor: &self.editor,
        };
        self.scheduler.full_draw(&ui)
    }

    pub fn resize(&mut self, width: u16, height: u16) -> Result<()> {
        self.scheduler.set_size(width, height);
        let max = self.max_scroll();
        self.chat.clamp_scroll(max);
        self.full_draw()
    }

    /// Wrap width follows the input region, whose height follows the wrap.
    fn sync_editor_width(&mut self) {
        for _ in 0..2 {
            let layout = self.scheduler.layout_for(self.editor.visible_height());
            let width = layout.input_text_width();
            if width == self.editor.width() {
                break;
            }
            self.editor.set_width(width);
        }
    }

    fn chat_page(&self) -> usize {
        let layout = self.scheduler.layout_for(self.editor.visible_height());
        (layout.chat.h as usize).max(1)
    }

    fn max_scroll(&self) -> usize {
        let layout = self.scheduler.layout_for(self.editor.visible_height());
        chat_line_count(&self.chat, layout.chat.w as usize).saturating_sub(layout.chat.h as usize)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<Flow> {
        if key.kind != KeyEventKind::Press {
            return Ok(Flow::Continue);
        }
        match std::mem::replace(&mut self.screen, Screen::Main) {
            Screen::Main => {}
            Screen::Picker(picker) => return self.picker_key(picker, key),
            Screen::Log(lines) => return self.log_key(lines, key),
        }

        let cmd = handle_key_event(key, self.editor.mode());

        if self.status.quit_pending {
            self.status.quit_pending = false;
            if cmd == Some(KeyCommand::Quit) {
                self.hooks.on_exit_confirmed();
                return Ok(Flow::Quit);
            }
            self.redraw()?;
            return Ok(Flow::Continue);
        }

        let Some(cmd) = cmd else {
            return Ok(Flow::Continue);
        };

        match cmd {
            KeyCommand::Quit => self.status.quit_pending = true,
            KeyCommand::Suspend => return Ok(Flow::Suspend),
            KeyCommand::Detach => return Ok(Flow::Detach),

            KeyCommand::Insert(c) => self.editor.insert_char(c),
            KeyCommand::Backspace => {
                self.editor.delete_before();
            }
            KeyCommand::Delete => {
                self.editor.delete_at();
            }
            KeyCommand::Left => self.editor.move_left(),
            KeyCommand::Right => self.editor.move_right(),
            KeyCommand::Up => self.editor.move_up(),
            KeyCommand::Down => self.editor.move_down(),
            KeyCommand::Home => self.editor.move_to_line_start(),
            KeyCommand::End => self.editor.move_to_line_end(),
            KeyCommand::Enter => {
                if let Some(text) = self.editor.enter() {
                    self.submit(text);
                }
            }
            KeyCommand::Escape => self.set_edit_mode(EditMode::Normal),
            KeyCommand::EnterInsert => self.set_edit_mode(EditMode::Insert),

            KeyCommand::ScrollUp => {
                let max = self.max_scroll();
                self.chat.scroll_up(1, max);
            }
            KeyCommand::ScrollDown => self.chat.scroll_down(1),
            KeyCommand::PageUp => {
                let (page, max) = (self.chat_page(), self.max_scroll());
                self.chat.scroll_up(page, max);
            }
            KeyCommand::PageDown => {
                let page = self.chat_page();
                self.chat.scroll_down(page);
            }

            KeyCommand::OpenPicker => return self.open_picker(),
            KeyCommand::OpenLog => return self.open_log(),
        }

        self.redraw()?;
        Ok(Flow::Continue)
    }

    fn set_edit_mode(&mut self, mode: EditMode) {
        self.editor.set_mode(mode);
        self.status.edit_mode = mode;
    }

    fn submit(&mut self, text: String) {
        log::info!("submitting {} chars", text.chars().count());
        self.chat.push(USER_SPEAKER, text.clone());
        self.chat.scroll_to_bottom();
        self.queue_on(
            choreo::sprite_for_speaker(USER_SPEAKER),
            choreo::message_received(self.engine.clone(), USER_SPEAKER.to_string()),
        );
        if let Some(events) = self.echo.clone() {
            let reply = format!("echo: {}", text);
            self.queue(async move {
                events.send(InboundEvent::WaitingStart {
                    target: ids::ARBITER.to_string(),
                });
                tokio::time::sleep(Duration::from_millis(ECHO_DELAY_MS)).await;
                events.send(InboundEvent::WaitingStop {
                    target: ids::ARBITER.to_string(),
                });
                events.send(InboundEvent::MessageReceived {
                    speaker: ids::ARBITER.to_string(),
                    text: reply,
                });
            });
        }
        self.hooks.on_submit_text(text);
    }

    fn open_picker(&mut self) -> Result<Flow> {
        let picker = match FilePicker::scan(&self.picker_dir) {
            Ok(picker) => picker,
            Err(e) => {
                log::warn!("cannot list {}: {}", self.picker_dir.display(), e);
                FilePicker::from_entries(self.picker_dir.clone(), Vec::new())
            }
        };
        self.scheduler.draw_picker(&picker)?;
        self.screen = Screen::Picker(picker);
        Ok(Flow::Continue)
    }

    fn picker_key(&mut self, mut picker: FilePicker, key: KeyEvent) -> Result<Flow> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => picker.move_up(),
            KeyCode::Down | KeyCode::Char('j') => picker.move_down(),
            KeyCode::Enter => {
                let selected = picker.selected().map(|p| p.to_path_buf());
                if selected.is_none() {
                    // Nothing to pick; stay open.
                    self.screen = Screen::Picker(picker);
                    return Ok(Flow::Continue);
                }
                self.hooks.on_requirements_file_selected(selected);
                return self.close_overlay();
            }
            KeyCode::Esc => {
                self.hooks.on_requirements_file_selected(None);
                return self.close_overlay();
            }
            _ => {
                self.screen = Screen::Picker(picker);
                return Ok(Flow::Continue);
            }
        }
        self.scheduler.draw_picker(&picker)?;
        self.screen = Screen::Picker(picker);
        Ok(Flow::Continue)
    }

    fn open_log(&mut self) -> Result<Flow> {
        let (_, h) = self.scheduler.size();
        let lines = match &self.debug_log {
            Some(log) => LogTail::new(log.path())
                .read(h.saturating_sub(2) as usize)
                .unwrap_or_else(|e| vec![format!("cannot read debug log: {e}")]),
            None => vec!["debug log disabled".to_string()],
        };
        self.scheduler.draw_log_view(&lines)?;
        self.screen = Screen::Log(lines);
        Ok(Flow::Continue)
    }

    fn log_key(&mut self, lines: Vec<String>, key: KeyEvent) -> Result<Flow> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.close_overlay(),
            _ => {
                self.screen = Screen::Log(lines);
                Ok(Flow::Continue)
            }
        }
    }

    fn close_overlay(&mut self) -> Result<Flow> {
        self.screen = Screen::Main;
        self.full_draw()?;
        Ok(Flow::Continue)
    }

    /// Apply one router event.
    pub fn handle_event(&mut self, event: InboundEvent) -> Result<()> {
        log::debug!("event {}", event.kind());
        match event {
            InboundEvent::MessageReceived { speaker, text } => {
                self.chat.push(speaker.clone(), text);
                let lane = choreo::sprite_for_speaker(&speaker).to_string();
                self.queue_on(&lane, choreo::message_received(self.engine.clone(), speaker));
            }
            InboundEvent::ContextPercent(pct) => self.context.set(pct),
            InboundEvent::ToolUse { name, count } => {
                self.status.record_tool_use(name, count);
                choreo::tool_used(&self.engine);
            }
            InboundEvent::ModeChange(mode) => {
                self.status.agent_mode = mode;
                self.queue_on(ids::ARBITER, choreo::mode_changed(self.engine.clone(), mode));
            }
            InboundEvent::WaitingStart { target } => self.chat.start_waiting(target),
            InboundEvent::WaitingStop { target } => {
                self.chat.stop_waiting(&target);
            }
            InboundEvent::PeerSpawned { index } => {
                let id = ids::peer(index);
                if self.peers.contains(&id) {
                    log::warn!("peer {} already on stage", id);
                } else {
                    let engine = self.engine.clone();
                    self.queue_on(&id, async move {
                        choreo::peer_spawned(engine, index).await;
                    });
                    self.peers.push(id);
                }
            }
            InboundEvent::PeerDisconnected => match self.peers.pop() {
                Some(id) => self.queue_on(&id, choreo::peer_disconnected(self.engine.clone(), id.clone())),
                None => log::warn!("peer disconnected with no peers on stage"),
            },
            InboundEvent::DebugLog { kind, text } => match &self.debug_log {
                Some(sink) => {
                    if let Err(e) = sink.append(&kind, "router", &text) {
                        log::warn!("debug log write failed: {}", e);
                    }
                }
                None => log::debug!("router {}: {}", kind, text),
            },
        }
        self.status.peers = self.peers.len();
        self.redraw()
    }
}

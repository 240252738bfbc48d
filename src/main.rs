//! Terminal scene runner (default binary).
//!
//! One current-thread tokio runtime drives everything from a single
//! `select!` loop: the animation tick, keys from a blocking reader thread,
//! router events and termination signals. Choreographies run as local tasks.

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event};
use log::LevelFilter;
use tokio::sync::mpsc;
use tokio::task::LocalSet;
use tokio::time::MissedTickBehavior;

use tui_parley::adapter::{AppConfig, BridgeHooks, DebugLog, RouterBridge};
use tui_parley::term::{restore_terminal, SceneView, Surface, TerminalRenderer};
use tui_parley::tiles::TileStore;
use tui_parley::{App, Flow};

type TermApp = App<TerminalRenderer, BridgeHooks>;

fn main() -> Result<()> {
    let config = AppConfig::from_env();

    let debug_log = match &config.debug_log {
        Some(path) => match DebugLog::install(path, LevelFilter::Debug) {
            Ok(sink) => Some(sink),
            Err(e) => {
                eprintln!("debug log unavailable: {e}");
                None
            }
        },
        None => None,
    };

    // Restore the terminal before the panic message is printed.
    let prev_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore_terminal();
        prev_hook(info);
    }));

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let local = LocalSet::new();
    let result = local.block_on(&rt, run(config, debug_log));

    // Always try to restore terminal state.
    restore_terminal();
    if let Err(e) = &result {
        log::warn!("exiting with error: {e:#}");
    }
    result
}

async fn run(config: AppConfig, debug_log: Option<DebugLog>) -> Result<()> {
    let scene = SceneView::from_load(TileStore::open(config.atlas_path.as_deref(), config.tile_size));
    let mut bridge = RouterBridge::from_config(config.router.as_ref());

    let mut term = TerminalRenderer::new();
    term.enter()?;

    let mut app = App::new(term, scene, bridge.hooks(), config.tick_ms)
        .with_picker_dir(config.picker_dir.clone());
    if let Some(sink) = debug_log {
        app = app.with_debug_log(sink);
    }
    app.full_draw()?;

    let mut keys = spawn_key_reader();

    let mut ticker = tokio::time::interval(Duration::from_millis(config.tick_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut stop = shutdown_signals()?;

    loop {
        app.set_echo(if bridge.has_router() {
            None
        } else {
            Some(bridge.sender())
        });

        tokio::select! {
            _ = ticker.tick() => app.tick()?,
            Some(ev) = keys.recv() => match ev {
                Event::Key(key) => match app.handle_key(key)? {
                    Flow::Continue => {}
                    Flow::Quit => break,
                    Flow::Detach => {
                        log::info!("detached");
                        break;
                    }
                    Flow::Suspend => suspend(&mut app)?,
                },
                Event::Resize(w, h) => app.resize(w, h)?,
                _ => {}
            },
            Some(ev) = bridge.recv() => app.handle_event(ev)?,
            _ = stop.recv() => {
                log::info!("terminated by signal");
                break;
            }
        }

        for choreography in app.take_choreographies() {
            tokio::task::spawn_local(choreography);
        }
    }

    app.scheduler_mut().surface_mut().exit()?;
    Ok(())
}

/// Read terminal events on a blocking thread.
fn spawn_key_reader() -> mpsc::UnboundedReceiver<Event> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || loop {
        match event::read() {
            Ok(ev) => {
                if tx.send(ev).is_err() {
                    break;
                }
            }
            Err(e) => {
                log::warn!("terminal input failed: {}", e);
                break;
            }
        }
    });
    rx
}

/// SIGTERM or SIGHUP, merged into one channel.
#[cfg(unix)]
fn shutdown_signals() -> Result<mpsc::UnboundedReceiver<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let (tx, rx) = mpsc::unbounded_channel();
    for kind in [SignalKind::terminate(), SignalKind::hangup()] {
        let mut sig = signal(kind)?;
        let tx = tx.clone();
        tokio::task::spawn_local(async move {
            if sig.recv().await.is_some() {
                let _ = tx.send(());
            }
        });
    }
    Ok(rx)
}

#[cfg(not(unix))]
fn shutdown_signals() -> Result<mpsc::UnboundedReceiver<()>> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::task::spawn_local(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(());
        }
    });
    Ok(rx)
}

/// Hand the terminal back to the shell, stop, and redraw on resume.
#[cfg(unix)]
fn suspend(app: &mut TermApp) -> Result<()> {
    app.scheduler_mut().surface_mut().exit()?;
    signal_hook::low_level::raise(signal_hook::consts::SIGTSTP)?;
    app.scheduler_mut().surface_mut().enter()?;
    let (w, h) = app.scheduler().surface().size()?;
    app.resize(w, h)
}

#[cfg(not(unix))]
fn suspend(_app: &mut TermApp) -> Result<()> {
    log::info!("suspend is not supported on this platform");
    Ok(())
}

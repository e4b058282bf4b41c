//! Runtime: terminal lifecycle and the event loop.
//!
//! - A dedicated input thread blocks on `crossterm::event::read()` and
//!   forwards events over a channel.
//! - Ticking is fast (100 ms) only while a workflow runs so the throbber and
//!   elapsed time animate; otherwise it idles at 5 s.
//! - Workflow runs and figure exports execute on the blocking pool; their
//!   progress events and results come back through the same `select!`.
//! - Ctrl+C and Esc leave the loop. A run still in flight is abandoned.

use std::{
    io::Stdout,
    path::PathBuf,
    time::Duration,
};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, prelude::CrosstermBackend};
use renderflow_types::{ExecutionResult, ProgressEvent};
use tokio::{
    signal,
    sync::mpsc,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, warn};

use crate::{
    app::{App, Effect, Msg},
    exec::{spawn_execution, spawn_export},
    ui::main_view::MainView,
};

type Backend = CrosstermBackend<Stdout>;

const FAST_TICK: Duration = Duration::from_millis(100);
const IDLE_TICK: Duration = Duration::from_millis(5000);

/// Background work the loop is waiting on.
#[derive(Default)]
struct PendingWork {
    progress: Option<mpsc::UnboundedReceiver<ProgressEvent>>,
    execution: Option<JoinHandle<Result<ExecutionResult, String>>>,
    export: Option<(PathBuf, JoinHandle<Result<Vec<PathBuf>, String>>)>,
}

/// Spawn a dedicated input thread that blocks on terminal input and forwards
/// `crossterm` events over a Tokio channel.
fn spawn_input_thread() -> mpsc::Receiver<Event> {
    let (sender, receiver) = mpsc::channel(500);
    std::thread::spawn(move || {
        loop {
            match event::read() {
                Ok(event) => {
                    if sender.blocking_send(event).is_err() {
                        break;
                    }
                }
                Err(error) => {
                    warn!("Failed to read terminal event: {}", error);
                    break;
                }
            }
        }
    });
    receiver
}

fn setup_terminal() -> Result<Terminal<Backend>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn cleanup_terminal(terminal: &mut Terminal<Backend>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn render(terminal: &mut Terminal<Backend>, app: &mut App, main_view: &mut MainView) -> Result<()> {
    terminal.draw(|frame| main_view.render(frame, frame.area(), app))?;
    Ok(())
}

/// Carries out effects; returns false when the UI should exit.
fn process_effects(app: &App, effects: Vec<Effect>, pending: &mut PendingWork) -> bool {
    for effect in effects {
        match effect {
            Effect::Execute(request) => {
                debug!(workflow = %request.workflow_id, "spawning workflow execution");
                let handle = spawn_execution(app.spec.clone(), request);
                pending.progress = Some(handle.progress);
                pending.execution = Some(handle.task);
            }
            Effect::ExportFigures { directory, formats } => {
                let items = app.result.as_ref().map(|result| result.items.clone()).unwrap_or_default();
                let task = spawn_export(items, directory.clone(), formats, app.image_engine.clone());
                pending.export = Some((directory, task));
            }
            Effect::Quit => return false,
        }
    }
    true
}

/// Entry point for the TUI runtime: sets up the terminal, runs the event
/// loop, and restores the terminal on exit.
pub async fn run_app(mut app: App) -> Result<()> {
    let input_receiver = spawn_input_thread();
    let mut main_view = MainView::default();
    let mut terminal = setup_terminal()?;

    let outcome = event_loop(&mut terminal, &mut app, &mut main_view, input_receiver).await;
    cleanup_terminal(&mut terminal)?;
    outcome
}

async fn event_loop(
    terminal: &mut Terminal<Backend>,
    app: &mut App,
    main_view: &mut MainView,
    mut input_receiver: mpsc::Receiver<Event>,
) -> Result<()> {
    let mut pending = PendingWork::default();
    let mut current_interval = IDLE_TICK;
    let mut ticker = time::interval(current_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    render(terminal, app, main_view)?;
    loop {
        let target_interval = if app.is_running() { FAST_TICK } else { IDLE_TICK };
        if target_interval != current_interval {
            current_interval = target_interval;
            ticker = time::interval(current_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        }

        let PendingWork { progress, execution, export } = &mut pending;
        // Completion waits until every progress event has been drained.
        let execution_ready = execution.is_some() && progress.is_none();
        let effects = tokio::select! {
            maybe_event = input_receiver.recv() => {
                let Some(event) = maybe_event else { break };
                match event {
                    Event::Key(key) if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) => break,
                    Event::Key(key) => main_view.handle_key_events(app, key),
                    // Resizes only need the redraw below.
                    _ => Vec::new(),
                }
            }

            _ = ticker.tick() => {
                main_view.handle_message(app, Msg::Tick);
                Vec::new()
            }

            maybe_progress = async {
                match progress.as_mut() {
                    Some(receiver) => receiver.recv().await,
                    None => None,
                }
            }, if progress.is_some() => {
                match maybe_progress {
                    Some(event) => main_view.handle_message(app, Msg::Progress(event)),
                    None => *progress = None,
                }
                Vec::new()
            }

            joined = async {
                match execution.as_mut() {
                    Some(task) => task.await,
                    None => std::future::pending().await,
                }
            }, if execution_ready => {
                *execution = None;
                let outcome = joined.unwrap_or_else(|error| Err(format!("execution task failed: {error}")));
                main_view.handle_message(app, Msg::ExecutionCompleted(outcome));
                Vec::new()
            }

            joined = async {
                match export.as_mut() {
                    Some((_, task)) => task.await,
                    None => std::future::pending().await,
                }
            }, if export.is_some() => {
                let directory = export.take().map(|(directory, _)| directory).unwrap_or_default();
                let outcome = joined.unwrap_or_else(|error| Err(format!("export task failed: {error}")));
                main_view.handle_message(app, Msg::ExportCompleted { directory, outcome });
                Vec::new()
            }

            _ = signal::ctrl_c() => break,
        };

        if !process_effects(app, effects, &mut pending) {
            break;
        }
        render(terminal, app, main_view)?;
    }
    Ok(())
}

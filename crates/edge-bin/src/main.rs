//! Entrypoint: CLI argument parsing, logging/terminal setup, and the
//! single-threaded cooperative main loop (§4.6):
//!   1. Render (read-only).
//!   2. Block on readable input, a scheduled work item, or a tick.
//!   3. Deliver the event to the active mode.
//!   4. Drain the WorkQueue.
//!   5. Goto 1 until `editor.terminate`.

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

use edge_buffer::{EditorState, ModeTransition, OpenBuffer};
use edge_config::{Config, ConfigContext, ConfigPlatformTraits};
use edge_events::LoopEvent;
use edge_script::NoopScriptEnvironment;
use edge_terminal::{CrosstermBackend, TerminalBackend, TerminalCapabilities};
use edge_transform::CommandMode;
use edge_view::Widget;

const STATUS_ROWS: u16 = 1;
const TICK_PERIOD: Duration = Duration::from_millis(250);

/// File/directory arguments and flags overriding config discovery.
#[derive(Parser, Debug)]
#[command(name = "edge", version, about = "A modal terminal text editor")]
struct Args {
    /// Paths to open at startup; a synthetic buffers-list pane is shown
    /// alongside the first one. If omitted, a scratch buffer is used.
    pub paths: Vec<PathBuf>,
    /// Overrides config discovery (`$EDGE_PATH`, `$HOME/.edge`, `/`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Directory the log file is written into.
    #[arg(long = "log-dir", default_value = ".")]
    pub log_dir: PathBuf,
}

fn configure_logging(log_dir: &Path) -> Option<WorkerGuard> {
    let log_path = log_dir.join("edge.log");
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }
    let file_appender = tracing_appender::rolling::never(log_dir, "edge.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(writer)
        .try_init()
    {
        Ok(()) => Some(guard),
        Err(_) => None,
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

/// Load every argv path into its own buffer; a path that fails to read
/// becomes an empty untitled-named buffer with an error status rather
/// than aborting startup (§7 "user-visible failures").
fn load_buffers(editor: &mut EditorState, paths: &[PathBuf]) {
    for path in paths {
        let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("untitled").to_string();
        let mut buffer = OpenBuffer::new(name.clone());
        match std::fs::read_to_string(path) {
            Ok(content) => {
                buffer.load(path.to_string_lossy().to_string(), &content);
                info!(target: "io", path = %path.display(), "file_loaded");
            }
            Err(e) => {
                error!(target: "io", path = %path.display(), error = %e, "file_open_failed");
                buffer.status = edge_buffer::Status::error(format!("failed to open {}: {e}", path.display()));
            }
        }
        editor.open(buffer);
    }
}

/// Walk the mode stack top-down, redelivering `key` whenever a mode
/// pops without consuming it (RepeatMode's digit handoff, §4.6).
fn dispatch_key(editor: &mut EditorState, key: char) {
    loop {
        let Some(mut mode) = editor.mode_stack.pop() else { return };
        match mode.handle_key(editor, key) {
            ModeTransition::Stay => {
                editor.mode_stack.push(mode);
                return;
            }
            ModeTransition::Push(next) => {
                editor.mode_stack.push(mode);
                editor.mode_stack.push(next);
                return;
            }
            ModeTransition::Pop => continue,
            ModeTransition::PopHandled => return,
            ModeTransition::PopAll => {
                editor.mode_stack.clear();
                return;
            }
        }
    }
}

/// Widget tree for the current buffer set: the buffers list beside the
/// current buffer when more than one is open, otherwise just the
/// current buffer full-screen.
fn build_widget(editor: &EditorState) -> Widget {
    let names: Vec<&str> = editor.buffer_names().collect();
    if names.len() <= 1 {
        Widget::buffer(editor.current_name())
    } else {
        Widget::split(
            edge_view::Orientation::Horizontal,
            vec![(Widget::BuffersList, 1), (Widget::buffer(editor.current_name()), 4)],
        )
    }
}

fn render_once(editor: &mut EditorState, capabilities: TerminalCapabilities) -> Result<()> {
    let (width, height) = crossterm::terminal::size()?;
    let widget = build_widget(editor);
    let (writer, new_viewports) = edge_render::render_frame(editor, &widget, width, height, capabilities);
    for (name, top) in new_viewports {
        if let Some(buffer) = editor.buffer_mut(&name) {
            buffer.view_start = top;
        }
    }
    writer.flush()?;
    Ok(())
}

struct Runtime {
    editor: EditorState,
    config: Config,
    platform: ConfigPlatformTraits,
    capabilities: TerminalCapabilities,
    rx: mpsc::Receiver<LoopEvent>,
    input_task: tokio::task::JoinHandle<()>,
    input_shutdown: edge_input::AsyncInputShutdown,
    _script: NoopScriptEnvironment,
}

impl Runtime {
    async fn run(mut self) -> Result<()> {
        self.editor.mode_stack.push(Box::new(CommandMode::new()));
        render_once(&mut self.editor, self.capabilities)?;

        let mut ticker = interval(TICK_PERIOD);
        loop {
            tokio::select! {
                event = self.rx.recv() => {
                    match event {
                        Some(LoopEvent::Key(key)) => dispatch_key(&mut self.editor, key),
                        Some(LoopEvent::Tick) | Some(LoopEvent::WorkAvailable) => {}
                        Some(LoopEvent::BufferReady(name)) => {
                            if let Some(buffer) = self.editor.buffer_mut(&name) {
                                buffer.mark_modified();
                            }
                        }
                        Some(LoopEvent::Shutdown) | None => break,
                    }
                }
                _ = ticker.tick() => {}
            }

            self.editor.work_queue.drain_and_run();
            if self.editor.mode_stack.is_empty() {
                self.editor.mode_stack.push(Box::new(CommandMode::new()));
            }
            render_once(&mut self.editor, self.capabilities)?;
            if self.editor.terminate {
                break;
            }
        }

        self.input_shutdown.signal();
        let _ = self.input_task.await;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = configure_logging(&args.log_dir);
    install_panic_hook();
    info!(target: "runtime", "startup");

    let mut backend = CrosstermBackend::new();
    backend.set_title("edge")?;
    let terminal_guard = backend.enter_guard()?;
    let capabilities = terminal_guard.capabilities;

    let mut config = edge_config::load_from(args.config.clone())?;
    let platform = ConfigPlatformTraits::new(cfg!(windows), capabilities.supports_scroll_region);
    if let Ok((w, h)) = crossterm::terminal::size() {
        config.apply_context(ConfigContext::new(w, h, STATUS_ROWS, platform));
    }

    let mut editor = EditorState::new();
    load_buffers(&mut editor, &args.paths);

    let (tx, rx) = mpsc::channel(edge_events::EVENT_CHANNEL_CAP);
    let (input_task, input_shutdown) = edge_input::spawn_async_input(tx);

    let runtime = Runtime {
        editor,
        config,
        platform,
        capabilities,
        rx,
        input_task,
        input_shutdown,
        _script: NoopScriptEnvironment::new(),
    };
    let result = runtime.run().await;
    drop(terminal_guard);
    result
}

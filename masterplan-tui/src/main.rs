//! masterplan-tui - terminal Gantt chart and goal sheet for the LS x sena plan
//!
//! Shows the plan's tasks on a shared timeline, lights the dependency chain
//! of the selected task and exports CSV and PNG snapshots.

mod app;
mod catalog;
mod config;
mod export;
mod filter;
mod goals;
mod highlight;
mod layout;
mod models;
mod theme;
mod timeline;
mod ui;

use std::io::{self, stdout};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use app::App;
use catalog::Plan;
use config::{Cli, Settings};
use export::{run_export_worker, ExportCommand, ExportMessage};

/// Poll interval of the event loop (approximately 30 FPS)
const FRAME_DURATION: Duration = Duration::from_millis(33);

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install().ok();

    let cli = Cli::parse();
    let settings = Settings::resolve(&cli).context("Failed to load configuration")?;
    let _guard = init_tracing(settings.log_dir().as_deref());

    let plan = match &settings.plan {
        Some(path) => Plan::load(path)
            .with_context(|| format!("Failed to load plan {}", path.display()))?,
        None => Plan::builtin().context("Built-in plan is invalid")?,
    };
    let today = settings.today_or(chrono::Local::now().date_naive());
    info!(%today, zoom = settings.zoom.name(), pad_days = settings.pad_days, "starting");

    run_tui(App::new(plan, &settings, today)).await
}

/// File-only logging; the terminal belongs to the TUI.
fn init_tracing(log_dir: Option<&Path>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = log_dir?;
    std::fs::create_dir_all(log_dir).ok()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_appender = tracing_appender::rolling::daily(log_dir, "masterplan-tui.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_filter(filter),
        )
        .init();

    Some(guard)
}

async fn run_tui(mut app: App) -> Result<()> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let (msg_tx, mut msg_rx) = mpsc::channel::<ExportMessage>(16);
    let (cmd_tx, cmd_rx) = mpsc::channel::<ExportCommand>(16);
    let export_task = tokio::spawn(run_export_worker(cmd_rx, msg_tx));

    let result = run_event_loop(&mut terminal, &mut app, &mut msg_rx, &cmd_tx).await;

    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    // Pending writes finish before the worker sees Shutdown.
    drop(cmd_tx);
    export_task.await.ok();

    result
}

async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    msg_rx: &mut mpsc::Receiver<ExportMessage>,
    cmd_tx: &mpsc::Sender<ExportCommand>,
) -> Result<()> {
    loop {
        let size = terminal.size()?;
        app.tick(size.width);

        terminal.draw(|frame| ui::render(frame, app))?;

        while let Ok(msg) = msg_rx.try_recv() {
            app.handle_export_message(msg);
        }

        if event::poll(FRAME_DURATION)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(cmd) = app.handle_key(key) {
                        cmd_tx.send(cmd).await.ok();
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

//! Interactive session: a line-oriented event loop over [`App`].
//!
//! Input lines, task completions and the initial terminal size all arrive
//! on one channel and are applied in order by [`App::update`].

use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::debug;

use sprout_core::error::SproutResult;

use super::CommandContext;
use crate::app::runner::TaskRunner;
use crate::app::view::render;
use crate::app::{App, AppEvent};

const DEFAULT_WIDTH: u16 = 80;
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Execute the interactive session
pub async fn execute(ctx: &CommandContext) -> SproutResult<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let runner = TaskRunner::new(Arc::clone(&ctx.services), ctx.cwd.clone(), tx.clone());
    let mut app = App::new(DEFAULT_WIDTH, ctx.services.window_days());

    if let Some(width) = terminal_width() {
        if tx.send(AppEvent::Resize { width }).is_err() {
            debug!("session closed before the initial resize");
        }
    }
    spawn_input_reader(tx);

    runner.spawn_all(app.startup());
    let mut stdout = std::io::stdout();
    if let Err(e) = draw(&mut stdout, &app, ctx) {
        debug!("stdout closed: {}", e);
        return Ok(());
    }

    while let Some(event) = rx.recv().await {
        let tasks = app.update(event);
        if app.should_quit {
            break;
        }
        runner.spawn_all(tasks);
        if let Err(e) = draw(&mut stdout, &app, ctx) {
            debug!("stdout closed: {}", e);
            break;
        }
    }
    Ok(())
}

/// Width from `COLUMNS`, when the shell exports it
fn terminal_width() -> Option<u16> {
    std::env::var("COLUMNS").ok()?.trim().parse().ok().filter(|w| *w > 0)
}

fn spawn_input_reader(events: UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let event = match lines.next_line().await {
                Ok(Some(line)) => AppEvent::Input(line),
                Ok(None) => AppEvent::Input("q".to_string()),
                Err(e) => {
                    debug!("stdin closed: {}", e);
                    AppEvent::Input("q".to_string())
                }
            };
            let quit = matches!(&event, AppEvent::Input(line) if line == "q");
            if events.send(event).is_err() || quit {
                break;
            }
        }
    });
}

/// Redraw the session; fails once the terminal is gone
pub(super) fn draw(out: &mut impl Write, app: &App, ctx: &CommandContext) -> std::io::Result<()> {
    let clear = if ctx.output.colors().is_enabled() { CLEAR_SCREEN } else { "" };
    write!(out, "{}{}› ", clear, render(app))?;
    out.flush()
}

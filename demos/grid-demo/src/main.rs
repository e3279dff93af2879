//! Manual smoke-test binary exercising the public cell-grid API end to
//! end: paints a border and a moving cursor, echoes decoded key/mouse
//! events until `q` is pressed. Not part of the library's public
//! contract — a thin harness in the same spirit as the teacher's own
//! editor entry point.

use anyhow::Context;
use clap::Parser;
use core_attr::Attribute;
use core_event::{Event, InputMode, KeyPayload};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "grid-demo", about = "Interactive smoke test for core-terminal")]
struct Args {
    /// Directory log files are written to; defaults to the current directory.
    #[arg(long, default_value = ".")]
    log_dir: PathBuf,

    /// Enable mouse tracking on startup.
    #[arg(long)]
    mouse: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _log_guard = configure_logging(&args.log_dir)?;
    install_panic_hook();

    core_terminal::init().context("failed to initialize terminal session")?;
    let result = run(args.mouse);
    let _ = core_terminal::close();
    result
}

fn run(enable_mouse: bool) -> anyhow::Result<()> {
    core_terminal::with_session(|session| {
        let mut mode = InputMode::DEFAULT;
        if enable_mouse {
            mode |= InputMode::MOUSE;
        }
        session.set_input_mode(mode)
    })??;

    loop {
        core_terminal::with_session(|session| draw_frame(session))??;

        let event = core_terminal::with_session(|session| session.poll_event())?;
        match event {
            Event::Key {
                payload: KeyPayload::Char('q'),
                ..
            } => break,
            Event::Resize { width, height } => {
                core_terminal::with_session(|session| session.resize(width, height))?;
            }
            Event::Interrupt => break,
            _ => {}
        }
    }

    Ok(())
}

fn draw_frame(session: &mut core_terminal::Session) -> Result<(), core_terminal::TermError> {
    let (width, height) = session.size();
    session.clear(Attribute::DEFAULT, Attribute::DEFAULT);
    for x in 0..width {
        session.set_cell(x, 0, '-', Attribute::DEFAULT, Attribute::DEFAULT);
        session.set_cell(x, height.saturating_sub(1), '-', Attribute::DEFAULT, Attribute::DEFAULT);
    }
    for y in 0..height {
        session.set_cell(0, y, '|', Attribute::DEFAULT, Attribute::DEFAULT);
        session.set_cell(width.saturating_sub(1), y, '|', Attribute::DEFAULT, Attribute::DEFAULT);
    }
    session.flush()
}

fn configure_logging(dir: &PathBuf) -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    let file_appender = tracing_appender::rolling::never(dir, "grid-demo.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_ansi(false)
        .init();
    Ok(guard)
}

fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = core_terminal::close();
        default_hook(info);
    }));
}

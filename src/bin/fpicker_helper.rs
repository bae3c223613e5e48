//! fpicker-helper - the dialog side of the picker protocol.
//!
//! Started by the host with piped stdin/stdout. Reads commands from stdin,
//! drives the dialog backend, and writes replies to stdout. Logs go to stderr
//! only. Exits with status 0 on Quit or when the host closes the pipe, and
//! non-zero when the command stream is malformed.

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::{ArgAction, Parser, ValueEnum};
use fpicker_bridge::helper::{DialogBackend, HeadlessBackend, NativeBackend, ServeExit, serve};
use fpicker_bridge::{APP_NAME, VERSION};
use std::fs::OpenOptions;
use std::io::Write;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendArg {
    /// Platform file dialog
    Native,
    /// Scripted dialog, no UI
    Headless,
}

#[derive(Debug, Parser)]
#[command(name = "fpicker-helper", about = "File picker helper process", version)]
struct Args {
    /// Dialog implementation to drive
    #[arg(long, value_enum, default_value_t = BackendArg::Native)]
    backend: BackendArg,

    /// Headless only: accept the dialog instead of cancelling it
    #[arg(long, default_value_t = false)]
    accept: bool,

    /// Headless only: file URL returned as the selection (repeatable)
    #[arg(long = "select", action = ArgAction::Append, value_name = "URL")]
    select: Vec<String>,

    /// Headless only: time the dialog stays up
    #[arg(long = "execute-delay-ms", default_value_t = 0)]
    execute_delay_ms: u64,

    /// Append the name of every received command to this file
    #[arg(long, value_name = "PATH")]
    journal: Option<Utf8PathBuf>,

    /// Debug-level logging
    #[arg(long, env = "FPICKER_DEBUG", default_value_t = false)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    fpicker_bridge::logging::setup_stderr_logging(args.debug)?;

    tracing::info!("Starting {} helper v{} ({:?} backend)", APP_NAME, VERSION, args.backend);

    let mut backend: Box<dyn DialogBackend> = match args.backend {
        BackendArg::Native => Box::new(NativeBackend::new()),
        BackendArg::Headless => Box::new(HeadlessBackend::new(
            args.accept,
            args.select.clone(),
            Duration::from_millis(args.execute_delay_ms),
        )),
    };

    let mut journal = match &args.journal {
        Some(path) => Some(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open command journal: {}", path))?,
        ),
        None => None,
    };

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut reader = stdin.lock();
    let mut writer = stdout.lock();

    let exit = serve(
        &mut reader,
        &mut writer,
        &mut backend,
        journal.as_mut().map(|file| file as &mut dyn Write),
    )
    .context("Command stream failed")?;

    match exit {
        ServeExit::Quit => tracing::info!("Helper exiting on Quit"),
        ServeExit::Disconnected => tracing::info!("Helper exiting, host went away"),
    }
    Ok(())
}

//! fpicker - host demo for the picker bridge
//!
//! Opens one file picker the way an application would and prints the
//! selected file URLs to stdout, one per line.
//!
//! # Overview
//!
//! This binary initializes:
//! - Logging infrastructure (file rotation + console output on stderr)
//! - Tokio runtime (blocking pool for helper reply reads)
//! - Configuration loading ([`ConfigManager`], `fpicker.yaml`)
//! - The picker chosen by the configured transport ([`create_file_picker`])
//!
//! # Execution Flow
//!
//! 1. Parse arguments and load `fpicker.yaml` from the config directory
//! 2. Initialize logging → logs/fpicker.<date>
//! 3. Create the tokio runtime and the picker (launches the helper when out of process)
//! 4. Initialize the template, apply title, filters and selection mode
//! 5. Execute the dialog, pumping a heartbeat while it is up
//! 6. Print the selection, log metrics, shut down

use anyhow::{Context, Result, bail};
use camino::Utf8PathBuf;
use clap::{ArgAction, Parser};
use fpicker_bridge::ui::{EventPump, new_ui_lock};
use fpicker_bridge::{
    APP_NAME, ConfigManager, ControlId, FilePickerListener, InitArgument, Metrics, VERSION,
    create_file_picker,
};
use std::cell::Cell;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Parser)]
#[command(name = "fpicker", about = "Open a file picker and print the selection", version)]
struct Args {
    /// Directory holding fpicker.yaml
    #[arg(long = "config-dir", default_value = "fpicker Data")]
    config_dir: Utf8PathBuf,

    /// Dialog template id (0 = simple open, 1 = simple save, 10 = save with auto extension)
    #[arg(long, default_value_t = 0)]
    template: i16,

    /// Dialog title; defaults to Open or Save
    #[arg(long)]
    title: Option<String>,

    /// Filter as "Title=pattern", e.g. "Text=*.txt;*.text" (repeatable)
    #[arg(long = "filter", action = ArgAction::Append, value_name = "TITLE=PATTERN")]
    filters: Vec<String>,

    /// Allow selecting several files
    #[arg(long, default_value_t = false)]
    multi: bool,

    /// Debug-level logging
    #[arg(long, env = "FPICKER_DEBUG", default_value_t = false)]
    debug: bool,
}

/// Stands in for a host UI loop: notes that it is still being serviced
struct HeartbeatPump {
    last_beat: Cell<Instant>,
    beats: Cell<u64>,
}

impl HeartbeatPump {
    fn new() -> Self {
        Self {
            last_beat: Cell::new(Instant::now()),
            beats: Cell::new(0),
        }
    }
}

impl EventPump for HeartbeatPump {
    fn pump(&self) {
        if self.last_beat.get().elapsed() >= Duration::from_secs(1) {
            self.beats.set(self.beats.get() + 1);
            self.last_beat.set(Instant::now());
            tracing::debug!("Host still responsive ({} s in dialog)", self.beats.get());
        }
    }
}

/// Logs what the picker reports
struct LoggingListener;

impl FilePickerListener for LoggingListener {
    fn file_selection_changed(&self) {
        tracing::info!("Selection changed");
    }

    fn control_state_changed(&self, control: ControlId) {
        tracing::debug!("Control {:?} changed state", control);
    }
}

/// Split a `Title=pattern` argument
fn parse_filter(raw: &str) -> Result<(&str, &str)> {
    match raw.split_once('=') {
        Some((title, pattern)) if !title.is_empty() && !pattern.is_empty() => Ok((title, pattern)),
        _ => bail!("Invalid filter {:?}, expected TITLE=PATTERN", raw),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config_manager = ConfigManager::new(&args.config_dir)?;
    let mut config = config_manager.load_picker_config()?;
    config.debug_mode |= args.debug;

    let _log_guard =
        fpicker_bridge::logging::setup_logging_with_console("logs", "fpicker", config.debug_mode, true)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);
    tracing::info!(
        "Transport: {:?}, backend: {:?}",
        config.transport,
        config.dialog_backend
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("fpicker-worker")
        .build()?;

    let metrics = Arc::new(Metrics::new());
    let mut picker = create_file_picker(
        &config,
        runtime.handle().clone(),
        Box::new(HeartbeatPump::new()),
        new_ui_lock(),
        metrics.clone(),
    )
    .context("Failed to create file picker")?;

    tracing::info!("Picker ready: {}", picker.implementation_name());
    picker.add_listener(Arc::new(LoggingListener));

    picker.initialize(&[InitArgument::Int16(args.template)])?;
    if let Some(title) = &args.title {
        picker.set_title(title)?;
    }
    picker.set_multi_selection_mode(args.multi)?;
    for raw in &args.filters {
        let (title, pattern) = parse_filter(raw)?;
        picker.append_filter(title, pattern)?;
    }
    if let Some((title, _)) = args.filters.first().and_then(|raw| raw.split_once('=')) {
        picker.set_current_filter(title)?;
    }

    let result = picker.execute();
    if result.is_accepted() {
        for file in picker.selected_files()? {
            println!("{}", file);
        }
    } else {
        tracing::info!("Dialog cancelled");
    }

    // Tears down the helper before the runtime goes away
    drop(picker);

    metrics.log_summary();
    runtime.shutdown_timeout(Duration::from_secs(1));

    tracing::info!("Application shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter() {
        assert_eq!(parse_filter("Text=*.txt;*.text").unwrap(), ("Text", "*.txt;*.text"));
        assert_eq!(parse_filter("A=B=C").unwrap(), ("A", "B=C"));
        assert!(parse_filter("no-pattern").is_err());
        assert!(parse_filter("=*.txt").is_err());
    }
}

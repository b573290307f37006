//! Tracing subscriber setup.
//!
//! The library only emits `tracing` events; hosts that want them on stderr or
//! in a file call [`init`] once at startup.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::EditorConfig;

/// Installs a global fmt subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level is `debug` with
/// `DMI_EDITOR_DEBUG=1` and `info` without. Returns false when a global
/// subscriber was already installed or the log file could not be opened.
pub fn init(config: &EditorConfig) -> bool {
    let default_level = if config.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dmi_editor={default_level}")));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match &config.log_file {
        Some(path) => {
            let file = match OpenOptions::new().create(true).append(true).open(path) {
                Ok(file) => file,
                Err(error) => {
                    eprintln!("dmi_editor: cannot open log file {}: {error}", path.display());
                    return false;
                }
            };
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .is_ok()
        }
        None => builder.with_writer(std::io::stderr).try_init().is_ok(),
    }
}

//! Environment configuration.

use std::env;
use std::path::PathBuf;

/// File name used when a session has neither a save target nor an open path.
pub const DEFAULT_FILE_NAME: &str = "untitled.dmi";

pub const DOCUMENTS_DIR_ENV: &str = "DMI_EDITOR_DOCUMENTS_DIR";
pub const TEMP_DIR_ENV: &str = "DMI_EDITOR_TEMP_DIR";
pub const LOG_ENV: &str = "DMI_EDITOR_LOG";
pub const DEBUG_ENV: &str = "DMI_EDITOR_DEBUG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    /// Directory holding the default save target.
    pub documents_dir: PathBuf,
    /// Root under which every decoded document gets its own temp directory.
    pub temp_root: PathBuf,
    pub log_file: Option<PathBuf>,
    pub debug: bool,
    pub canvas: CanvasConfig,
}

/// Presentation constants for the state grid and the save dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
    pub cell_padding: u32,
    /// Height of the state name label under each preview.
    pub label_height: u32,
    pub scroll_step: u32,
    pub min_dialog_width: u32,
    /// Approximate pixel advance of one terminal-width column in dialog text.
    pub char_width: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 400,
            height: 300,
            cell_padding: 4,
            label_height: 12,
            scroll_step: 16,
            min_dialog_width: 240,
            char_width: 7,
        }
    }
}

impl EditorConfig {
    pub fn from_env() -> Self {
        Self {
            documents_dir: env_path_opt(DOCUMENTS_DIR_ENV).unwrap_or_else(default_documents_dir),
            temp_root: env_path_opt(TEMP_DIR_ENV)
                .unwrap_or_else(|| env::temp_dir().join("dmi-editor")),
            log_file: env_path_opt(LOG_ENV),
            debug: env_flag(DEBUG_ENV),
            canvas: CanvasConfig::default(),
        }
    }

    /// Builds a configuration rooted in explicit directories, ignoring the environment.
    pub fn with_dirs(documents_dir: impl Into<PathBuf>, temp_root: impl Into<PathBuf>) -> Self {
        Self {
            documents_dir: documents_dir.into(),
            temp_root: temp_root.into(),
            log_file: None,
            debug: false,
            canvas: CanvasConfig::default(),
        }
    }

    #[must_use]
    pub fn default_save_path(&self) -> PathBuf {
        self.documents_dir.join(DEFAULT_FILE_NAME)
    }
}

fn default_documents_dir() -> PathBuf {
    dirs::document_dir()
        .or_else(dirs::home_dir)
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

fn env_path_opt(key: &str) -> Option<PathBuf> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(PathBuf::from(value))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.previous {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_env_guard(key: &'static str, value: Option<&str>) -> EnvGuard {
        let previous = env::var(key).ok();
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
        EnvGuard { key, previous }
    }

    #[test]
    fn env_defaults() {
        let _lock = env_lock();
        let _g1 = set_env_guard(TEMP_DIR_ENV, None);
        let _g2 = set_env_guard(LOG_ENV, None);
        let _g3 = set_env_guard(DEBUG_ENV, None);

        let config = EditorConfig::from_env();
        assert_eq!(config.temp_root, env::temp_dir().join("dmi-editor"));
        assert!(config.log_file.is_none());
        assert!(!config.debug);
        assert_eq!(
            config.default_save_path().file_name().and_then(|name| name.to_str()),
            Some(DEFAULT_FILE_NAME)
        );
    }

    #[test]
    fn env_overrides_apply() {
        let _lock = env_lock();
        let _g1 = set_env_guard(DOCUMENTS_DIR_ENV, Some("/home/user/icons"));
        let _g2 = set_env_guard(TEMP_DIR_ENV, Some("/var/tmp/dmi"));
        let _g3 = set_env_guard(LOG_ENV, Some("/tmp/dmi-editor.log"));
        let _g4 = set_env_guard(DEBUG_ENV, Some("1"));

        let config = EditorConfig::from_env();
        assert_eq!(
            config.default_save_path(),
            PathBuf::from("/home/user/icons/untitled.dmi")
        );
        assert_eq!(config.temp_root, PathBuf::from("/var/tmp/dmi"));
        assert_eq!(
            config.log_file.as_deref(),
            Some(std::path::Path::new("/tmp/dmi-editor.log"))
        );
        assert!(config.debug);
    }

    #[test]
    fn blank_paths_are_ignored() {
        let _lock = env_lock();
        let _g1 = set_env_guard(LOG_ENV, Some("  "));
        let _g2 = set_env_guard(DEBUG_ENV, Some("yes"));

        let config = EditorConfig::from_env();
        assert!(config.log_file.is_none());
        assert!(!config.debug);
    }
}

//! Save-target resolution and sizing of the save picker.

use std::path::{Path, PathBuf};

use dmi_host::{Point, SaveTargetRequest};
use unicode_width::UnicodeWidthStr;

use crate::config::CanvasConfig;

/// Horizontal room around the path field (buttons, label, margins).
const DIALOG_CHROME: u32 = 96;

/// Picks the save target: explicit save path, then the path the document was
/// opened from, then `default`.
pub fn resolve_save_path(
    save_path: Option<&Path>,
    open_path: Option<&Path>,
    default: impl FnOnce() -> PathBuf,
) -> PathBuf {
    save_path
        .or(open_path)
        .map(Path::to_path_buf)
        .unwrap_or_else(default)
}

/// Width that fits `path` untruncated, never narrower than the configured minimum.
pub fn dialog_width(path: &Path, canvas: &CanvasConfig) -> u32 {
    let text = path.to_string_lossy();
    let columns = UnicodeWidthStr::width(text.as_ref()) as u32;
    columns
        .saturating_mul(canvas.char_width)
        .saturating_add(DIALOG_CHROME)
        .max(canvas.min_dialog_width)
}

pub fn save_request(
    title: &str,
    path: &Path,
    center: Option<Point>,
    canvas: &CanvasConfig,
) -> SaveTargetRequest {
    SaveTargetRequest {
        title: format!("Save {title}"),
        path: path.to_path_buf(),
        width: dialog_width(path, canvas),
        center,
    }
}

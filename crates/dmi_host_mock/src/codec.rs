use std::cell::{Ref, RefCell};
use std::fs;
use std::path::{Path, PathBuf};

use dmi_host::{Codec, CodecError, IconDocument, IconState};

/// Calls observed by a [`MockCodec`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CodecTrace {
    pub decoded: Vec<PathBuf>,
    pub encoded: Vec<PathBuf>,
    pub released: Vec<PathBuf>,
    pub exported: Vec<String>,
    pub imported: Vec<String>,
}

#[derive(Debug, Default)]
struct Failures {
    encode: bool,
    import: bool,
}

/// Codec that stores icon documents as JSON metadata.
///
/// Source files are the serialized [`IconDocument`] (see [`write_document`]).
/// Exported state files and host snapshots are `{"images": n}` objects; an
/// import fails with [`CodecError::LayoutMismatch`] when `n` differs from the
/// state's direction count times frame count.
#[derive(Debug, Default)]
pub struct MockCodec {
    trace: RefCell<CodecTrace>,
    failures: RefCell<Failures>,
}

impl MockCodec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn trace(&self) -> Ref<'_, CodecTrace> {
        self.trace.borrow()
    }

    pub fn fail_encode(&self, fail: bool) {
        self.failures.borrow_mut().encode = fail;
    }

    pub fn fail_import(&self, fail: bool) {
        self.failures.borrow_mut().import = fail;
    }

    /// Number of times `path` was handed to [`Codec::release_temp`].
    #[must_use]
    pub fn release_count(&self, path: &Path) -> usize {
        self.trace
            .borrow()
            .released
            .iter()
            .filter(|released| released.as_path() == path)
            .count()
    }
}

/// Writes `document` as a source file the mock codec can decode.
pub fn write_document(path: &Path, document: &IconDocument) -> std::io::Result<()> {
    let body = serde_json::to_string_pretty(document).map_err(std::io::Error::other)?;
    fs::write(path, body)
}

fn state_file_name(file_stem: &str) -> String {
    let mut name = String::from("state_");
    for c in file_stem.chars() {
        if c.is_ascii_alphanumeric() {
            name.push(c);
        } else {
            name.push_str(&format!("_{:x}_", u32::from(c)));
        }
    }
    name.push_str(".json");
    name
}

impl Codec for MockCodec {
    fn decode(&self, source: &Path, temp_dir: &Path) -> Result<IconDocument, CodecError> {
        self.trace.borrow_mut().decoded.push(source.to_path_buf());

        let text = fs::read_to_string(source)
            .map_err(|error| CodecError::io("reading icon", source, error))?;
        let mut document: IconDocument = serde_json::from_str(&text)
            .map_err(|error| CodecError::format(source, error.to_string()))?;

        fs::create_dir_all(temp_dir)
            .map_err(|error| CodecError::io("creating temp dir", temp_dir, error))?;
        document.temp_dir = temp_dir.to_path_buf();
        Ok(document)
    }

    fn encode(&self, document: &IconDocument, target: &Path) -> Result<(), CodecError> {
        if self.failures.borrow().encode {
            return Err(CodecError::format(target, "encoder rejected the document"));
        }

        let body = serde_json::to_string_pretty(document)
            .map_err(|error| CodecError::format(target, error.to_string()))?;
        fs::write(target, body).map_err(|error| CodecError::io("writing icon", target, error))?;
        self.trace.borrow_mut().encoded.push(target.to_path_buf());
        Ok(())
    }

    fn release_temp(&self, path: &Path, recursive: bool) {
        self.trace.borrow_mut().released.push(path.to_path_buf());
        let _ = if recursive {
            fs::remove_dir_all(path)
        } else {
            fs::remove_dir(path)
        };
    }

    fn export_state(
        &self,
        document: &IconDocument,
        state: &str,
        file_stem: &str,
    ) -> Result<PathBuf, CodecError> {
        let entry = document
            .state(state)
            .ok_or_else(|| CodecError::unknown_state(state))?;
        let path = document.temp_dir.join(state_file_name(file_stem));
        let body = serde_json::json!({ "state": state, "images": entry.image_count() });
        fs::write(&path, body.to_string())
            .map_err(|error| CodecError::io("exporting state", &path, error))?;
        self.trace.borrow_mut().exported.push(state.to_string());
        Ok(path)
    }

    fn import_state(
        &self,
        document: &mut IconDocument,
        state: &str,
        source: &Path,
    ) -> Result<(), CodecError> {
        if self.failures.borrow().import {
            return Err(CodecError::format(source, "importer rejected the surface"));
        }

        let entry = document
            .state(state)
            .ok_or_else(|| CodecError::unknown_state(state))?;
        let text = fs::read_to_string(source)
            .map_err(|error| CodecError::io("reading surface snapshot", source, error))?;
        let value: serde_json::Value = serde_json::from_str(&text)
            .map_err(|error| CodecError::format(source, error.to_string()))?;
        let found = value
            .get("images")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| CodecError::format(source, "missing image count"))?;

        let expected = entry.image_count();
        if found != u64::from(expected) {
            return Err(CodecError::LayoutMismatch {
                state: state.to_string(),
                expected,
                found: u32::try_from(found).unwrap_or(u32::MAX),
            });
        }

        self.trace.borrow_mut().imported.push(state.to_string());
        Ok(())
    }

    fn create_state(&self, document: &mut IconDocument, name: &str) -> Result<(), CodecError> {
        document.states.push(IconState::new(name));
        Ok(())
    }

    fn copy_state(
        &self,
        document: &mut IconDocument,
        from: &str,
        to: &str,
    ) -> Result<(), CodecError> {
        let mut copy = document
            .state(from)
            .cloned()
            .ok_or_else(|| CodecError::unknown_state(from))?;
        copy.name = to.to_string();
        document.states.push(copy);
        Ok(())
    }
}

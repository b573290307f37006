#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::rc::Rc;

use dmi_editor::dmi_host::{IconDocument, IconState, SurfaceId};
use dmi_editor::{Editor, EditorConfig, EditorContext, OpenRequest};
use dmi_host_mock::{write_document, MockCodec, MockHost, MockPreviewCaches, MockShellFactory};
use tempfile::TempDir;

/// One editor context wired to fresh mocks inside a private temp directory.
pub struct Harness {
    pub codec: Rc<MockCodec>,
    pub host: Rc<MockHost>,
    pub shells: MockShellFactory,
    pub previews: MockPreviewCaches,
    pub ctx: EditorContext,
    dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("harness tempdir");
        let config = EditorConfig::with_dirs(dir.path().join("documents"), dir.path().join("tmp"));
        let codec = Rc::new(MockCodec::new());
        let host = Rc::new(MockHost::new());
        let shells = MockShellFactory::new();
        let previews = MockPreviewCaches::new();
        let ctx = EditorContext::new(
            codec.clone(),
            host.clone(),
            Rc::new(shells.clone()),
            Rc::new(previews.clone()),
            config,
        );

        Self {
            codec,
            host,
            shells,
            previews,
            ctx,
            dir,
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn temp_root(&self) -> PathBuf {
        self.dir.path().join("tmp")
    }

    /// Writes a source icon with the given `(name, dirs, frames)` states.
    pub fn write_icon(&self, file: &str, states: &[(&str, u8, u32)]) -> PathBuf {
        let path = self.dir.path().join(file);
        let mut document = IconDocument::new(32, 32, PathBuf::new());
        document.states = states
            .iter()
            .map(|(name, dirs, frames)| {
                let mut state = IconState::new(*name);
                state.dirs = *dirs;
                state.frames = *frames;
                state
            })
            .collect();
        write_document(&path, &document).expect("write icon fixture");
        path
    }

    /// Opens `file` (written with `states`) and runs the queued decode.
    pub fn open(&self, file: &str, states: &[(&str, u8, u32)]) -> Editor {
        let path = self.write_icon(file, states);
        let editor = Editor::open(&self.ctx, OpenRequest::path(file, path)).expect("open editor");
        self.run_tasks();
        assert!(editor.has_document(), "fixture document failed to load");
        editor
    }

    pub fn run_tasks(&self) -> usize {
        self.ctx.tasks().run_until_idle()
    }

    pub fn modify(&self, surface: SurfaceId) {
        self.host.set_modified(surface, true);
    }
}

pub fn document(states: &[&str], temp_dir: &Path) -> IconDocument {
    let mut document = IconDocument::new(32, 32, temp_dir);
    document.states = states.iter().map(|name| IconState::new(*name)).collect();
    document
}

pub const TWO_STATES: &[(&str, u8, u32)] = &[("idle", 1, 1), ("walk", 4, 2)];

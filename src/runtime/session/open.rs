use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::{Rc, Weak};

use dmi_host::{Codec, IconDocument};
use tracing::{error, info, warn};

use crate::core::document::Document;
use crate::core::resource::allocate_temp_dir;
use crate::error::EditorError;
use crate::runtime::tasks::{FnTask, Task, TaskQueue};

use super::EditorSession;

pub(super) enum OpenSource {
    Path(PathBuf),
    Document {
        document: IconDocument,
        path: Option<PathBuf>,
    },
}

type DecodeContinuation = Box<dyn FnOnce(Result<IconDocument, EditorError>)>;

/// Decodes one file off the caller's stack and hands the result to its continuation.
struct DecodeTask {
    codec: Rc<dyn Codec>,
    source: PathBuf,
    temp_dir: PathBuf,
    on_complete: DecodeContinuation,
}

impl Task for DecodeTask {
    fn name(&self) -> &'static str {
        "decode"
    }

    fn run(self: Box<Self>) {
        let DecodeTask {
            codec,
            source,
            temp_dir,
            on_complete,
        } = *self;

        let result = codec.decode(&source, &temp_dir).map_err(|source_error| {
            // Nothing will own the directory; give it back now.
            codec.release_temp(&temp_dir, true);
            EditorError::decode(&source, source_error)
        });
        on_complete(result);
    }
}

impl EditorSession {
    /// Tears down the current document and installs a new one.
    ///
    /// The old temp materialization, bound surfaces and previews are gone
    /// before the new document is known to load. Decoding from a path is
    /// queued; the shell is repainted empty before that.
    pub(super) fn begin_open(&mut self, source: OpenSource) -> Result<(), EditorError> {
        if self.closed {
            return Err(EditorError::Closed);
        }
        if self.decoding {
            return Err(EditorError::OpenInFlight);
        }

        self.loading = true;

        if let Some(mut document) = self.document.take() {
            document.release();
        }

        let host = Rc::clone(&self.ctx.host);
        for sprite in self.sprites.drain(..) {
            if let Err(error) = sprite.close(host.as_ref()) {
                warn!(
                    session = %self.id,
                    state = sprite.state(),
                    %error,
                    "failed to close state surface"
                );
            }
        }

        self.previews.clear();
        self.view.reset();
        self.save_path = None;
        self.save_as_origin = None;
        self.relayout();
        self.request_repaint();

        match source {
            OpenSource::Document { document, path } => {
                self.open_path = path;
                self.install(document);
                Ok(())
            }
            OpenSource::Path(path) => {
                self.open_path = Some(path.clone());
                self.dispatch_decode(path)
            }
        }
    }

    fn dispatch_decode(&mut self, source: PathBuf) -> Result<(), EditorError> {
        let temp_dir = match allocate_temp_dir(&self.ctx.config.temp_root) {
            Ok(temp_dir) => temp_dir,
            Err(error) => {
                self.fail_open(&error);
                return Err(error);
            }
        };

        let this = self.this.clone();
        let codec = Rc::clone(&self.ctx.codec);
        let tasks = self.ctx.tasks.clone();
        let on_complete: DecodeContinuation =
            Box::new(move |result| complete_decode(this, codec, tasks, result));

        self.decoding = true;
        self.ctx.tasks.dispatch(Box::new(DecodeTask {
            codec: Rc::clone(&self.ctx.codec),
            source,
            temp_dir,
            on_complete,
        }));
        Ok(())
    }

    fn finish_decode(&mut self, result: Result<IconDocument, EditorError>) {
        self.decoding = false;
        match result {
            Ok(document) => self.install(document),
            Err(error) => self.fail_open(&error),
        }
    }

    fn install(&mut self, icon: IconDocument) {
        let document = Document::new(icon, Rc::clone(&self.ctx.codec));
        self.previews.load_previews(document.icon());
        info!(
            session = %self.id,
            states = document.icon().states.len(),
            temp_dir = %document.resource().path().display(),
            "document loaded"
        );

        self.document = Some(document);
        self.modified = false;
        self.loading = false;
        self.relayout();
        self.request_repaint();
    }

    fn fail_open(&mut self, error: &EditorError) {
        error!(session = %self.id, %error, "failed to open document");
        self.alert("Error", &format!("Error loading file: {error}"));
        self.loading = false;
        self.relayout();
        self.request_repaint();
    }
}

/// Delivers a decode result to its session, or releases it if the session
/// closed or went away while the task was queued.
fn complete_decode(
    this: Weak<RefCell<EditorSession>>,
    codec: Rc<dyn Codec>,
    tasks: TaskQueue,
    result: Result<IconDocument, EditorError>,
) {
    let Some(inner) = this.upgrade() else {
        discard(codec, result);
        return;
    };
    let Ok(mut session) = inner.try_borrow_mut() else {
        warn!("editor busy when its document finished decoding; retrying");
        let retry = tasks.clone();
        tasks.dispatch(Box::new(FnTask::new("decode-complete", move || {
            complete_decode(this, codec, retry, result)
        })));
        return;
    };

    if session.closed {
        discard(codec, result);
        return;
    }
    session.finish_decode(result);
}

fn discard(codec: Rc<dyn Codec>, result: Result<IconDocument, EditorError>) {
    if let Ok(icon) = result {
        drop(Document::new(icon, codec));
    }
}

use std::rc::Rc;

use dmi_host::{Codec, HostBridge, PreviewCacheFactory, ShellFactory};

use crate::config::EditorConfig;
use crate::runtime::registry::SessionRegistry;
use crate::runtime::tasks::TaskQueue;

/// Collaborators and shared services every session of one host process uses.
#[derive(Clone)]
pub struct EditorContext {
    pub(crate) codec: Rc<dyn Codec>,
    pub(crate) host: Rc<dyn HostBridge>,
    pub(crate) shells: Rc<dyn ShellFactory>,
    pub(crate) previews: Rc<dyn PreviewCacheFactory>,
    pub(crate) tasks: TaskQueue,
    pub(crate) registry: SessionRegistry,
    pub(crate) config: Rc<EditorConfig>,
}

impl EditorContext {
    pub fn new(
        codec: Rc<dyn Codec>,
        host: Rc<dyn HostBridge>,
        shells: Rc<dyn ShellFactory>,
        previews: Rc<dyn PreviewCacheFactory>,
        config: EditorConfig,
    ) -> Self {
        Self {
            codec,
            host,
            shells,
            previews,
            tasks: TaskQueue::new(),
            registry: SessionRegistry::new(),
            config: Rc::new(config),
        }
    }

    pub fn tasks(&self) -> &TaskQueue {
        &self.tasks
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn host(&self) -> &Rc<dyn HostBridge> {
        &self.host
    }
}

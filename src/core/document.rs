use std::rc::Rc;

use dmi_host::{Codec, IconDocument};

use crate::core::resource::ResourceHandle;

/// The live document of a session: decoded icon data plus the temp storage it owns.
#[derive(Debug)]
pub struct Document {
    icon: IconDocument,
    resource: ResourceHandle,
}

impl Document {
    pub fn new(icon: IconDocument, codec: Rc<dyn Codec>) -> Self {
        let resource = ResourceHandle::new(icon.temp_dir.clone(), codec);
        Self { icon, resource }
    }

    pub fn icon(&self) -> &IconDocument {
        &self.icon
    }

    pub fn icon_mut(&mut self) -> &mut IconDocument {
        &mut self.icon
    }

    pub fn state_names(&self) -> Vec<String> {
        self.icon
            .states
            .iter()
            .map(|state| state.name.clone())
            .collect()
    }

    pub fn resource(&self) -> &ResourceHandle {
        &self.resource
    }

    /// Releases the temp materialization; see [`ResourceHandle::release`].
    pub fn release(&mut self) -> bool {
        self.resource.release()
    }
}

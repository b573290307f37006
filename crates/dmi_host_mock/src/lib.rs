//! Deterministic in-memory implementations of the `dmi_host` contracts.
//!
//! Every mock records what the controller asked of it in a shared trace so
//! tests can assert on call counts and ordering. Nothing here touches a real
//! host application; the codec stores documents as JSON metadata.

mod codec;
mod host;
mod preview;
mod shell;

pub use codec::{write_document, CodecTrace, MockCodec};
pub use host::{MockHost, MockSurface};
pub use preview::{MockPreviewCaches, PreviewTrace};
pub use shell::{MockShellFactory, ShellTrace};

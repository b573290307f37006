//! Session orchestration on the host's cooperative loop.

pub mod context;
pub mod registry;
pub mod session;
pub mod tasks;

pub use context::EditorContext;
pub use registry::{SessionId, SessionRegistry};
pub use session::{Editor, OpenRequest};
pub use tasks::{FnTask, Task, TaskQueue};

// Workflow orchestration: matching decisions and the handoff lifecycle,
// committed atomically against the backing store

pub mod coordinator;
pub mod errors;

pub use coordinator::{WorkflowCoordinator, WorkflowState, AUTO_CREATED_NOTE, DEFAULT_OPERATOR};
pub use errors::{EntityKind, ErrorKind, WorkflowError, WorkflowResult};

pub mod validation;

mod ids;

pub use ids::{BufferName, SessionId, VaultId, WorkflowGlobalId};

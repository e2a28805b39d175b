//! File-backed persistence adapters for scheduler jobs, file state, and
//! context summaries/cache.

mod context_store;
mod file_state_store;
mod job_store;
mod json_file;

pub use context_store::FileContextStore;
pub use file_state_store::FileFileStateStore;
pub use job_store::FileJobStore;

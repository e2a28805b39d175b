//! Engine: stateful orchestration that wires `domain` logic to `ports`.

pub mod activity_log;
pub mod chat_executor;
pub mod context_manager;
pub mod loader;
pub mod scheduler_sync;
pub mod step_engine;

//! Chat session/message types (`spec.md` §3, "ChatSession").

mod session;

pub use session::{ChatSession, Message, Role};

//! Buffer Store: per-run variable container (`spec.md` §4.8).

mod store;

pub use store::{BufferEntry, BufferStore, WriteMode};

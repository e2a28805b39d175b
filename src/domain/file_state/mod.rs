//! File State Tracker domain logic: the processed/pending invariants
//! (`spec.md` §4.9). Persistence lives in `ports`/`adapters`.

mod pending;
mod record;

pub use pending::pending;
pub use record::{is_processed, FileStateRecord};

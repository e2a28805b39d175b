//! Pattern & time resolver: `{today}`, `{this-week}`, `{latest:N}`,
//! `{pending:N}`, and glob token resolution against a reference date and
//! vault root (`spec.md` §4.1).

mod error;
mod lookup;
mod resolve;
pub mod tokens;

pub use error::PatternError;
pub use lookup::{VaultDirLookup, VaultFileMeta};
pub use resolve::{resolve_dir_prefix, resolve_many, resolve_single, PendingFilter};
pub use tokens::WeekStart;

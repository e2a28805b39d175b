//! Pure `pending(...)` ordering logic over a candidate set.

use crate::domain::pattern::VaultFileMeta;

/// Unprocessed subset of `candidates`, ordered oldest-first by mtime
/// (`spec.md` §4.9). `is_processed` is supplied by the caller (the adapter
/// that can hash file content and consult the `FileStateStore`); this
/// function only owns the filter-then-sort shape of the contract.
pub fn pending(candidates: Vec<VaultFileMeta>, is_processed: impl Fn(&VaultFileMeta) -> bool) -> Vec<VaultFileMeta> {
    let mut unprocessed: Vec<VaultFileMeta> = candidates.into_iter().filter(|candidate| !is_processed(candidate)).collect();
    unprocessed.sort_by(|a, b| a.modified.cmp(&b.modified));
    unprocessed
}

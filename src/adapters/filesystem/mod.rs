//! Filesystem-backed adapters: vault I/O and path-traversal safety.

mod path_safety;
mod vault_repository;

pub use vault_repository::FilesystemVaultRepository;

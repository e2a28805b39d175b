//! Settings/secrets adapters.

mod yaml_store;

pub use yaml_store::{YamlSecretsStore, YamlSettingsStore};

use std::collections::BTreeMap;

use crate::domain::identifiers::BufferName;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Replace,
    Append,
}

#[derive(Debug, Clone, Default)]
pub struct BufferEntry {
    pub content: String,
    pub metadata: BTreeMap<String, String>,
}

/// Per-run variable container. Never shared across runs (`spec.md` §5).
#[derive(Debug, Clone, Default)]
pub struct BufferStore {
    entries: BTreeMap<String, BufferEntry>,
}

impl BufferStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default mode for `@output variable:` is `append` (`spec.md` §4.8).
    pub fn put(&mut self, name: &BufferName, content: &str, mode: WriteMode, metadata: Option<BTreeMap<String, String>>) {
        let entry = self.entries.entry(name.as_str().to_string()).or_default();
        match mode {
            WriteMode::Replace => entry.content = content.to_string(),
            WriteMode::Append => {
                if !entry.content.is_empty() && !content.is_empty() {
                    entry.content.push('\n');
                }
                entry.content.push_str(content);
            }
        }
        if let Some(metadata) = metadata {
            entry.metadata.extend(metadata);
        }
    }

    pub fn get(&self, name: &BufferName) -> Option<&BufferEntry> {
        self.entries.get(name.as_str())
    }

    pub fn list(&self) -> impl Iterator<Item = (&String, &BufferEntry)> {
        self.entries.iter()
    }

    pub fn clear(&mut self, name: &BufferName) {
        self.entries.remove(name.as_str());
    }

    pub fn clear_all(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> BufferName {
        BufferName::new(s).unwrap()
    }

    #[test]
    fn replace_overwrites_append_accumulates() {
        let mut store = BufferStore::new();
        store.put(&name("notes"), "first", WriteMode::Append, None);
        store.put(&name("notes"), "second", WriteMode::Append, None);
        assert_eq!(store.get(&name("notes")).unwrap().content, "first\nsecond");

        store.put(&name("notes"), "reset", WriteMode::Replace, None);
        assert_eq!(store.get(&name("notes")).unwrap().content, "reset");
    }

    #[test]
    fn appending_empty_content_is_a_no_op() {
        let mut store = BufferStore::new();
        store.put(&name("notes"), "first", WriteMode::Append, None);
        store.put(&name("notes"), "", WriteMode::Append, None);
        assert_eq!(store.get(&name("notes")).unwrap().content, "first");
    }

    #[test]
    fn missing_buffer_is_none() {
        let store = BufferStore::new();
        assert!(store.get(&name("missing")).is_none());
    }

    #[test]
    fn clear_removes_single_entry_clear_all_removes_everything() {
        let mut store = BufferStore::new();
        store.put(&name("a"), "1", WriteMode::Replace, None);
        store.put(&name("b"), "2", WriteMode::Replace, None);
        store.clear(&name("a"));
        assert!(store.get(&name("a")).is_none());
        assert!(store.get(&name("b")).is_some());
        store.clear_all();
        assert!(store.get(&name("b")).is_none());
    }
}

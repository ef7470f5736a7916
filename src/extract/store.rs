//! Process-local byte store used while unpacking one archive.

use std::collections::BTreeMap;

#[derive(Debug, Default)]
/// Named byte buffers held in memory, iterated in name order.
///
/// Owned by a single `extract_and_merge` call and freed when it returns.
pub struct MemoryStore {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.files.insert(name.into(), bytes);
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<u8>> {
        self.files.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.files.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_iterate_in_name_order() {
        let mut store = MemoryStore::new();
        store.insert("b.csv", b"bb".to_vec());
        store.insert("a.csv", b"a".to_vec());

        let names: Vec<&str> = store.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["a.csv", "b.csv"]);
        assert_eq!(store.total_bytes(), 3);
        assert_eq!(store.get("a.csv"), Some(&b"a"[..]));
        assert!(store.contains("b.csv"));

        assert_eq!(store.remove("a.csv"), Some(b"a".to_vec()));
        assert_eq!(store.len(), 1);
    }
}

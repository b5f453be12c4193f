//! Copy-on-write KV store with nested branches.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

type Writes = BTreeMap<Vec<u8>, Option<Vec<u8>>>;

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

fn next_store_id() -> u64 {
    NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed)
}

/// A KV store layer. The root layer holds committed state; a branch layers its writes over a
/// frozen snapshot of its parent, and deletions are recorded as tombstones.
#[derive(Debug, Clone)]
pub struct KvStore {
    parent: Option<Arc<KvStore>>,
    writes: Arc<Writes>,
    id: u64,
    version: u64,
    origin: Option<(u64, u64)>,
}

impl Default for KvStore {
    fn default() -> Self {
        Self { parent: None, writes: Arc::default(), id: next_store_id(), version: 0, origin: None }
    }
}

impl KvStore {
    /// Creates an empty root store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a value.
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.writes.get(key) {
            Some(value) => value.clone(),
            None => self.parent.as_ref().and_then(|parent| parent.get(key)),
        }
    }

    /// Returns true when `key` holds a value.
    pub fn has(&self, key: &[u8]) -> bool {
        match self.writes.get(key) {
            Some(value) => value.is_some(),
            None => self.parent.as_ref().is_some_and(|parent| parent.has(key)),
        }
    }

    /// Writes a value.
    pub fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        Arc::make_mut(&mut self.writes).insert(key, Some(value));
        self.version += 1;
    }

    /// Deletes a value.
    pub fn delete(&mut self, key: &[u8]) {
        let writes = Arc::make_mut(&mut self.writes);
        if self.parent.is_some() {
            writes.insert(key.to_vec(), None);
        } else {
            writes.remove(key);
        }
        self.version += 1;
    }

    /// All live entries whose key starts with `prefix`, in key order.
    pub fn prefix_entries(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        let mut merged = BTreeMap::new();
        self.collect_prefix(prefix, &mut merged);
        merged.into_iter().collect()
    }

    fn collect_prefix(&self, prefix: &[u8], out: &mut BTreeMap<Vec<u8>, Vec<u8>>) {
        if let Some(parent) = &self.parent {
            parent.collect_prefix(prefix, out);
        }
        let range = self.writes.range(prefix.to_vec()..).take_while(|(key, _)| key.starts_with(prefix));
        for (key, value) in range {
            match value {
                Some(value) => out.insert(key.clone(), value.clone()),
                None => out.remove(key),
            };
        }
    }

    /// Opens a branch over the current state.
    pub fn branch(&self) -> Self {
        Self {
            parent: Some(Arc::new(self.clone())),
            writes: Arc::default(),
            id: next_store_id(),
            version: 0,
            origin: Some((self.id, self.version)),
        }
    }

    /// Returns true when `branch` was opened on this store and nothing was written here since.
    pub fn is_current_origin_of(&self, branch: &Self) -> bool {
        branch.origin == Some((self.id, self.version))
    }

    /// Applies the writes of `branch` to this store.
    pub(crate) fn absorb(&mut self, branch: Self) {
        let Self { parent, writes, .. } = branch;
        // Release the snapshot first so `make_mut` below does not copy our map.
        drop(parent);
        let writes = Arc::try_unwrap(writes).unwrap_or_else(|shared| (*shared).clone());
        if writes.is_empty() {
            return;
        }
        let is_root = self.parent.is_none();
        let own = Arc::make_mut(&mut self.writes);
        for (key, value) in writes {
            match value {
                None if is_root => {
                    own.remove(&key);
                }
                value => {
                    own.insert(key, value);
                }
            }
        }
        self.version += 1;
    }

    /// Number of branch layers below this one.
    pub fn depth(&self) -> usize {
        self.parent.as_ref().map_or(0, |parent| parent.depth() + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kv(store: &mut KvStore, key: &str, value: &str) {
        store.set(key.as_bytes().to_vec(), value.as_bytes().to_vec());
    }

    #[test]
    fn branch_reads_through_and_shadows() {
        let mut root = KvStore::new();
        kv(&mut root, "a", "1");
        kv(&mut root, "b", "2");

        let mut branch = root.branch();
        kv(&mut branch, "a", "10");
        branch.delete(b"b");

        assert_eq!(branch.get(b"a"), Some(b"10".to_vec()));
        assert!(!branch.has(b"b"));
        assert_eq!(root.get(b"a"), Some(b"1".to_vec()));
        assert!(root.has(b"b"));
    }

    #[test]
    fn absorb_applies_writes_and_tombstones() {
        let mut root = KvStore::new();
        kv(&mut root, "a", "1");
        kv(&mut root, "b", "2");

        let mut branch = root.branch();
        kv(&mut branch, "c", "3");
        branch.delete(b"a");
        assert!(root.is_current_origin_of(&branch));

        root.absorb(branch);
        assert_eq!(root.get(b"a"), None);
        assert_eq!(root.get(b"c"), Some(b"3".to_vec()));
        assert_eq!(root.depth(), 0);
    }

    #[test]
    fn writes_after_branching_make_it_stale() {
        let mut root = KvStore::new();
        let branch = root.branch();
        kv(&mut root, "x", "1");
        assert!(!root.is_current_origin_of(&branch));
    }

    #[test]
    fn prefix_entries_merge_layers() {
        let mut root = KvStore::new();
        kv(&mut root, "p/1", "a");
        kv(&mut root, "p/2", "b");
        kv(&mut root, "q/1", "c");

        let mut branch = root.branch();
        branch.delete(b"p/1");
        kv(&mut branch, "p/3", "d");

        let keys: Vec<_> = branch.prefix_entries(b"p/").into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![b"p/2".to_vec(), b"p/3".to_vec()]);
    }
}

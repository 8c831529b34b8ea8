//! Writes of one consensus change, staged over the committed store.

use std::collections::BTreeMap;

use shared_types::{Decode, Encode};

use crate::domain::{IndexError, KVStoreError};
use crate::ports::outbound::{BatchOperation, KeyValueStore};

/// Reads see staged writes first, then the store. Nothing reaches the store
/// until [`StagedWrites::into_operations`] is committed as one batch.
pub(crate) struct StagedWrites<'a, KV: KeyValueStore + ?Sized> {
    store: &'a KV,
    // None marks a staged delete
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a, KV: KeyValueStore + ?Sized> StagedWrites<'a, KV> {
    pub fn new(store: &'a KV) -> Self {
        Self {
            store,
            writes: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        match self.writes.get(key) {
            Some(staged) => Ok(staged.clone()),
            None => self.store.get(key),
        }
    }

    pub fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        match self.writes.get(key) {
            Some(staged) => Ok(staged.is_some()),
            None => self.store.exists(key),
        }
    }

    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.writes.insert(key, Some(value));
    }

    pub fn delete(&mut self, key: Vec<u8>) {
        self.writes.insert(key, None);
    }

    pub fn get_decoded<T: Decode>(&self, key: &[u8]) -> Result<Option<T>, IndexError> {
        match self.get(key)? {
            Some(bytes) => Ok(Some(T::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn put_encoded<T: Encode + ?Sized>(&mut self, key: Vec<u8>, value: &T) {
        self.put(key, value.to_bytes());
    }

    pub fn into_operations(self) -> Vec<BatchOperation> {
        self.writes
            .into_iter()
            .map(|(key, value)| match value {
                Some(value) => BatchOperation::Put { key, value },
                None => BatchOperation::Delete { key },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::InMemoryKVStore;

    #[test]
    fn test_staged_writes_shadow_store() {
        let mut store = InMemoryKVStore::new();
        store
            .atomic_batch_write(vec![
                BatchOperation::put(b"a".to_vec(), b"1".to_vec()),
                BatchOperation::put(b"b".to_vec(), b"2".to_vec()),
            ])
            .unwrap();

        let mut staged = StagedWrites::new(&store);
        staged.put(b"a".to_vec(), b"3".to_vec());
        staged.delete(b"b".to_vec());
        staged.put(b"c".to_vec(), b"4".to_vec());
        staged.delete(b"c".to_vec());

        assert_eq!(staged.get(b"a").unwrap(), Some(b"3".to_vec()));
        assert!(!staged.exists(b"b").unwrap());
        assert!(!staged.exists(b"c").unwrap());
        // the store is untouched until commit
        assert_eq!(store.get(b"b").unwrap(), Some(b"2".to_vec()));

        let ops = staged.into_operations();
        assert_eq!(
            ops,
            vec![
                BatchOperation::put(b"a".to_vec(), b"3".to_vec()),
                BatchOperation::delete(b"b".to_vec()),
                BatchOperation::delete(b"c".to_vec()),
            ]
        );
    }
}

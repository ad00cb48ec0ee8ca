use crate::error::Result;
use rocksdb::{IteratorMode, Options, WriteBatch as RocksWriteBatch, DB};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// One write (put) or erase (del) destined for a single `writeBatch` call.
/// `prefix ++ key` is the full physical key; `writeBatch` either makes
/// every entry visible to subsequent reads or none at all.
#[derive(Debug, Clone)]
pub enum WriteOp {
    Put { prefix: [u8; 2], key: Vec<u8>, value: Vec<u8> },
    Delete { prefix: [u8; 2], key: Vec<u8> },
}

#[derive(Debug, Default, Clone)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, prefix: [u8; 2], key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.ops.push(WriteOp::Put { prefix, key: key.into(), value: value.into() });
    }

    pub fn delete(&mut self, prefix: [u8; 2], key: impl Into<Vec<u8>>) {
        self.ops.push(WriteOp::Delete { prefix, key: key.into() });
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn extend(&mut self, other: WriteBatch) {
        self.ops.extend(other.ops);
    }
}

/// A persistent ordered map from `bytes -> bytes`, backed by RocksDB's
/// LSM engine. Single writer at a time; unbounded concurrent readers —
/// `Arc<DB>` gives every reader its own handle and RocksDB's MVCC
/// snapshots give `scan_prefix` point-in-time isolation against a
/// concurrent `write_batch`.
pub struct KVStore {
    db: Arc<DB>,
}

impl KVStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        let db = DB::open(&opts, path)?;
        Ok(Self { db: Arc::new(db) })
    }

    fn physical_key(prefix: [u8; 2], key: &[u8]) -> Vec<u8> {
        crate::prefix::key(prefix, key)
    }

    pub fn get(&self, prefix: [u8; 2], key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.db.get(Self::physical_key(prefix, key))?)
    }

    pub fn put(&self, prefix: [u8; 2], key: &[u8], value: &[u8]) -> Result<()> {
        self.db.put(Self::physical_key(prefix, key), value)?;
        Ok(())
    }

    pub fn del(&self, prefix: [u8; 2], key: &[u8]) -> Result<()> {
        self.db.delete(Self::physical_key(prefix, key))?;
        Ok(())
    }

    /// Apply every entry in `batch` atomically: either all of it becomes
    /// visible to subsequent reads, or none of it does.
    pub fn write_batch(&self, batch: WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut rocks_batch = RocksWriteBatch::default();
        for op in &batch.ops {
            match op {
                WriteOp::Put { prefix, key, value } => {
                    rocks_batch.put(Self::physical_key(*prefix, key), value);
                }
                WriteOp::Delete { prefix, key } => {
                    rocks_batch.delete(Self::physical_key(*prefix, key));
                }
            }
        }
        debug!(entries = batch.len(), "flushing write batch");
        self.db.write(rocks_batch)?;
        Ok(())
    }

    /// Range scan over every entry whose full key starts with `prefix`,
    /// with the prefix stripped off the returned keys. Takes a RocksDB
    /// snapshot up front so a concurrent `write_batch` never produces a
    /// torn read — the scan observes the database exactly as it stood
    /// when the scan began, even as the DB grows underneath it.
    pub fn scan_prefix(&self, prefix: [u8; 2]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let snapshot = self.db.snapshot();
        let mode = IteratorMode::From(&prefix, rocksdb::Direction::Forward);
        let mut out = Vec::new();
        for item in snapshot.iterator(mode) {
            let (key, value) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            out.push((key[prefix.len()..].to_vec(), value.to_vec()));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefix;

    fn open_tmp() -> (KVStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        (KVStore::open(dir.path()).unwrap(), dir)
    }

    #[test]
    fn put_get_roundtrip() {
        let (store, _dir) = open_tmp();
        store.put(prefix::ACCOUNTS, b"alice", b"100").unwrap();
        assert_eq!(store.get(prefix::ACCOUNTS, b"alice").unwrap(), Some(b"100".to_vec()));
    }

    #[test]
    fn different_prefixes_do_not_collide() {
        let (store, _dir) = open_tmp();
        store.put(prefix::ACCOUNTS, b"k", b"account-value").unwrap();
        store.put(prefix::CONTRACT_REGISTRY, b"k", b"registry-value").unwrap();
        assert_eq!(store.get(prefix::ACCOUNTS, b"k").unwrap(), Some(b"account-value".to_vec()));
        assert_eq!(
            store.get(prefix::CONTRACT_REGISTRY, b"k").unwrap(),
            Some(b"registry-value".to_vec())
        );
    }

    #[test]
    fn write_batch_is_all_or_nothing_on_success() {
        let (store, _dir) = open_tmp();
        let mut batch = WriteBatch::new();
        batch.put(prefix::ACCOUNTS, b"a", b"1");
        batch.put(prefix::ACCOUNTS, b"b", b"2");
        store.write_batch(batch).unwrap();
        assert_eq!(store.get(prefix::ACCOUNTS, b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.get(prefix::ACCOUNTS, b"b").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn scan_prefix_strips_prefix_and_respects_boundaries() {
        let (store, _dir) = open_tmp();
        store.put(prefix::ACCOUNTS, b"aaa", b"1").unwrap();
        store.put(prefix::ACCOUNTS, b"aab", b"2").unwrap();
        store.put(prefix::CONTRACT_REGISTRY, b"zzz", b"3").unwrap();

        let mut entries = store.scan_prefix(prefix::ACCOUNTS).unwrap();
        entries.sort();
        assert_eq!(entries, vec![(b"aaa".to_vec(), b"1".to_vec()), (b"aab".to_vec(), b"2".to_vec())]);
    }

    #[test]
    fn delete_removes_entry() {
        let (store, _dir) = open_tmp();
        store.put(prefix::ACCOUNTS, b"k", b"v").unwrap();
        store.del(prefix::ACCOUNTS, b"k").unwrap();
        assert_eq!(store.get(prefix::ACCOUNTS, b"k").unwrap(), None);
    }
}

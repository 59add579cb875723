//! In-memory object store
//!
//! Keeps buckets in a map so router behaviour can be exercised without a
//! network. Copies and deletes can be made to fail for specific keys, and
//! every successful mutation is appended to a journal so tests can assert on
//! ordering.

use super::error::{StoreError, StoreResult};
use super::ObjectStore;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

type ObjectId = (String, String);

/// A mutation recorded by [`MemoryStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Copy {
        src_bucket: String,
        src_key: String,
        dst_bucket: String,
        dst_key: String,
    },
    Delete {
        bucket: String,
        key: String,
    },
}

#[derive(Debug, Default)]
struct Inner {
    objects: HashMap<ObjectId, Bytes>,
    fail_copy: HashSet<String>,
    fail_delete: HashSet<String>,
    journal: Vec<StoreOp>,
}

/// In-memory store implementation for testing
///
/// Cloning shares the underlying state.
///
/// # Example
///
/// ```rust
/// use file_sorter::store::{MemoryStore, ObjectStore};
///
/// # #[tokio::main]
/// # async fn main() {
/// let store = MemoryStore::new();
/// store.put("incoming", "42.txt", b"hello");
///
/// store.copy_object("incoming", "42.txt", "numeric", "42.txt").await.unwrap();
/// assert!(store.contains("numeric", "42.txt"));
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Add an object with the given content
    pub fn put(&self, bucket: &str, key: &str, data: &[u8]) {
        self.write().objects.insert(
            (bucket.to_string(), key.to_string()),
            Bytes::copy_from_slice(data),
        );
    }

    /// Whether `bucket/key` exists
    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.read()
            .objects
            .contains_key(&(bucket.to_string(), key.to_string()))
    }

    /// Content of `bucket/key`, if present
    pub fn data(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.read()
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Sorted keys currently held in `bucket`
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .read()
            .objects
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Make every copy whose source key is `key` fail
    pub fn fail_copy_for(&self, key: &str) {
        self.write().fail_copy.insert(key.to_string());
    }

    /// Make every delete of `key` fail
    pub fn fail_delete_for(&self, key: &str) {
        self.write().fail_delete.insert(key.to_string());
    }

    /// Successful mutations in the order they happened
    pub fn journal(&self) -> Vec<StoreOp> {
        self.read().journal.clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> StoreResult<()> {
        let mut inner = self.write();

        if inner.fail_copy.contains(src_key) {
            return Err(StoreError::Service {
                code: "InternalError".to_string(),
                message: format!("injected copy failure for {}", src_key),
            });
        }

        let data = inner
            .objects
            .get(&(src_bucket.to_string(), src_key.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                bucket: src_bucket.to_string(),
                key: src_key.to_string(),
            })?;

        inner
            .objects
            .insert((dst_bucket.to_string(), dst_key.to_string()), data);
        inner.journal.push(StoreOp::Copy {
            src_bucket: src_bucket.to_string(),
            src_key: src_key.to_string(),
            dst_bucket: dst_bucket.to_string(),
            dst_key: dst_key.to_string(),
        });
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> StoreResult<()> {
        let mut inner = self.write();

        if inner.fail_delete.contains(key) {
            return Err(StoreError::AccessDenied(format!(
                "injected delete failure for {}",
                key
            )));
        }

        // S3 deletes are idempotent: a missing key is not an error
        inner
            .objects
            .remove(&(bucket.to_string(), key.to_string()));
        inner.journal.push(StoreOp::Delete {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StoreResult<Bytes> {
        self.data(bucket, key).ok_or_else(|| StoreError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_copy_keeps_source() {
        let store = MemoryStore::new();
        store.put("src", "a/1.txt", b"one");

        store
            .copy_object("src", "a/1.txt", "dst", "a/1.txt")
            .await
            .unwrap();

        assert!(store.contains("src", "a/1.txt"));
        assert_eq!(
            store.get_object("dst", "a/1.txt").await.unwrap(),
            Bytes::from_static(b"one")
        );
    }

    #[tokio::test]
    async fn test_copy_missing_source() {
        let store = MemoryStore::new();
        let err = store
            .copy_object("src", "nope", "dst", "nope")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert!(store.journal().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let store = MemoryStore::new();
        store.delete_object("src", "ghost").await.unwrap();
        assert_eq!(store.journal().len(), 1);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = MemoryStore::new();
        store.put("src", "x", b"x");
        store.fail_copy_for("x");
        store.fail_delete_for("x");

        assert!(store.copy_object("src", "x", "dst", "x").await.is_err());
        assert!(store.delete_object("src", "x").await.is_err());
        assert!(store.contains("src", "x"));
        assert!(!store.contains("dst", "x"));
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemoryStore::new();
        let handle = store.clone();
        handle.put("b", "k", b"v");
        assert_eq!(store.keys("b"), vec!["k".to_string()]);
    }
}

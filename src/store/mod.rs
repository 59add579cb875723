//! Object store abstraction consumed by the router
//!
//! The router only needs three primitives from storage: server-side copy,
//! delete and read-by-key. They are expressed by the [`ObjectStore`] trait so
//! the S3 client can be injected at process start and swapped for
//! [`MemoryStore`] in tests.
//!
//! - `S3Store`: AWS S3 and S3-compatible services (feature `s3-native`)
//! - `MemoryStore`: in-memory buckets with failure injection

pub mod error;
mod memory;

#[cfg(feature = "s3-native")]
mod s3;

pub use error::{StoreError, StoreResult};
pub use memory::{MemoryStore, StoreOp};

#[cfg(feature = "s3-native")]
pub use s3::S3Store;

use async_trait::async_trait;
use bytes::Bytes;

/// Storage operations the router relies on
///
/// Keys are passed through verbatim; implementations must not rewrite them.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Server-side copy of `src_bucket/src_key` to `dst_bucket/dst_key`
    async fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> StoreResult<()>;

    /// Delete `bucket/key`
    async fn delete_object(&self, bucket: &str, key: &str) -> StoreResult<()>;

    /// Read the full content of `bucket/key`
    async fn get_object(&self, bucket: &str, key: &str) -> StoreResult<Bytes>;
}

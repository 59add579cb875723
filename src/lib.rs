/*!
 * file-sorter - routes newly created S3 objects by filename
 *
 * On each object-creation notification the object's filename is classified:
 * - Numeric names (e.g. `123.txt`, `42`) are moved to the second destination bucket
 * - Everything else (e.g. `report.doc`, `1aws.txt`) is moved to the first
 *
 * Moving is copy-then-delete, one record at a time, stopping at the first
 * failure. A failure between copy and delete leaves a duplicate, never a loss.
 */

pub mod classify;
pub mod config;
pub mod error;
pub mod event;
pub mod logging;
pub mod router;
pub mod store;

// Re-export commonly used types
pub use classify::{classify_key, Classification};
pub use config::{FileConfig, LogConfig, RouterConfig, RouterSection, StoreConfig};
pub use error::{Result, SorterError};
pub use event::{NotificationRecord, S3Event};
pub use router::{HandlerResponse, RecordPlan, Relocation, RouteOutcome, Router};
pub use store::{MemoryStore, ObjectStore, StoreError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Application services
//!
//! Business logic between the HTTP surface and the stores.

pub mod conversation;
pub mod sessions;

pub use conversation::{derive_title, validate_content, ConversationService};
pub use sessions::SessionService;

use crate::error::{ChatError, Result};
use crate::storage::SqliteStorage;

/// Run a store operation on the blocking thread pool
///
/// SQLite calls can wait on a locked database, so they never run on an
/// async worker thread.
pub(crate) async fn blocking<T, F>(storage: &SqliteStorage, op: F) -> Result<T>
where
    F: FnOnce(&SqliteStorage) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let storage = storage.clone();
    tokio::task::spawn_blocking(move || op(&storage))
        .await
        .map_err(|e| ChatError::Internal(format!("Store task failed: {}", e)))?
}

//! Document store access.
//!
//! The `photobooks`, `userTags`, and `users` collections live in a hosted
//! document store reachable over HTTP. [`Store`] is the facade the rest of
//! the crate talks to; the backend is selected at construction time and the
//! in-memory variant stands in for the service in tests.

pub mod backend;
pub mod documents;
pub mod http;
pub mod memory;

use thiserror::Error;

pub use backend::StoreBackend;
pub use documents::{
    NewPhotobook, Photo, Photobook, PhotobookId, PhotobookPatch, TagDocument, UserId, UserRecord,
    SCHEMA_VERSION,
};

use crate::config::StoreConfig;
use crate::tags::TagCategory;

/// Failures from the document store, as seen by callers.
///
/// `NotFound` is load-bearing: the tag registry falls back to creating the
/// backing document when a merge answers it. Everything else aborts the
/// calling operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{collection}/{id} not found")]
    NotFound {
        collection: &'static str,
        id: String,
    },

    #[error("permission denied for {0}")]
    PermissionDenied(String),

    #[error("owner already has the maximum of {limit} documents")]
    QuotaExceeded { limit: usize },

    #[error("store request failed: {0}")]
    Transport(String),

    #[error("malformed store response: {0}")]
    Decode(String),
}

/// Macro to dispatch a method call to the active backend variant.
macro_rules! dispatch {
    // No arguments beyond self
    ($self:expr, $method:ident()) => {
        match &$self.inner {
            StoreInner::Http(store) => store.$method(),
            StoreInner::Memory(store) => store.$method(),
        }
    };
    // With arguments
    ($self:expr, $method:ident($($arg:expr),+ $(,)?)) => {
        match &$self.inner {
            StoreInner::Http(store) => store.$method($($arg),+),
            StoreInner::Memory(store) => store.$method($($arg),+),
        }
    };
}

enum StoreInner {
    Http(http::HttpStore),
    Memory(memory::MemoryStore),
}

pub struct Store {
    inner: StoreInner,
}

impl Store {
    /// Connect to the configured document store endpoint.
    pub fn open(config: &StoreConfig) -> Self {
        Self {
            inner: StoreInner::Http(http::HttpStore::new(config)),
        }
    }

    /// Backend holding everything in process memory. Tests only.
    pub fn in_memory() -> Self {
        Self {
            inner: StoreInner::Memory(memory::MemoryStore::new()),
        }
    }

    // ========================================================================
    // Photobook operations
    // ========================================================================

    pub fn create_photobook(
        &self,
        doc: NewPhotobook,
        max_per_owner: usize,
    ) -> Result<PhotobookId, StoreError> {
        dispatch!(self, create_photobook(doc, max_per_owner))
    }

    pub fn photobooks_for_owner(&self, owner: &UserId) -> Result<Vec<Photobook>, StoreError> {
        dispatch!(self, photobooks_for_owner(owner))
    }

    pub fn photobook_count(&self, owner: &UserId) -> Result<usize, StoreError> {
        dispatch!(self, photobook_count(owner))
    }

    pub fn photobook(&self, id: &PhotobookId) -> Result<Photobook, StoreError> {
        dispatch!(self, photobook(id))
    }

    pub fn update_photobook(
        &self,
        id: &PhotobookId,
        patch: &PhotobookPatch,
    ) -> Result<(), StoreError> {
        dispatch!(self, update_photobook(id, patch))
    }

    // ========================================================================
    // Tag operations
    // ========================================================================

    pub fn user_tags(&self, user: &UserId) -> Result<Option<TagDocument>, StoreError> {
        dispatch!(self, user_tags(user))
    }

    pub fn merge_user_tag(
        &self,
        user: &UserId,
        category: TagCategory,
        tag: &str,
    ) -> Result<(), StoreError> {
        dispatch!(self, merge_user_tag(user, category, tag))
    }

    pub fn create_user_tags(
        &self,
        user: &UserId,
        category: TagCategory,
        tag: &str,
    ) -> Result<(), StoreError> {
        dispatch!(self, create_user_tags(user, category, tag))
    }

    // ========================================================================
    // User operations
    // ========================================================================

    pub fn user(&self, id: &UserId) -> Result<Option<UserRecord>, StoreError> {
        dispatch!(self, user(id))
    }

    pub fn put_user(&self, id: &UserId, record: &UserRecord) -> Result<(), StoreError> {
        dispatch!(self, put_user(id, record))
    }
}

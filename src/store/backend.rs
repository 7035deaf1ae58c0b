//! Store backend abstraction.
//!
//! A common interface over the hosted document API and the in-memory
//! implementation used by tests. Every operation is a single round-trip;
//! there are no retries and no timeouts, so each call either succeeds once
//! or surfaces its error to the caller.

use super::documents::{
    NewPhotobook, Photobook, PhotobookId, PhotobookPatch, TagDocument, UserId, UserRecord,
};
use super::StoreError;
use crate::tags::TagCategory;

pub trait StoreBackend: Send + Sync {
    // === Photobook operations ===

    /// Create a photobook document and return the store-issued id.
    ///
    /// The backend enforces `max_per_owner` atomically at write time and
    /// answers `StoreError::QuotaExceeded` when the owner is already at the
    /// cap.
    fn create_photobook(
        &self,
        doc: NewPhotobook,
        max_per_owner: usize,
    ) -> Result<PhotobookId, StoreError>;

    /// All photobooks whose `ownerId` matches. Order unspecified.
    fn photobooks_for_owner(&self, owner: &UserId) -> Result<Vec<Photobook>, StoreError>;

    /// Aggregate count of the owner's photobooks, without fetching them.
    fn photobook_count(&self, owner: &UserId) -> Result<usize, StoreError>;

    /// Fetch a photobook by id. `StoreError::NotFound` if absent.
    fn photobook(&self, id: &PhotobookId) -> Result<Photobook, StoreError>;

    /// Replace the fields set in `patch`, leaving the rest untouched.
    fn update_photobook(&self, id: &PhotobookId, patch: &PhotobookPatch)
        -> Result<(), StoreError>;

    // === Tag operations ===

    /// Fetch a user's tag document. A missing document is `None`, not an
    /// error.
    fn user_tags(&self, user: &UserId) -> Result<Option<TagDocument>, StoreError>;

    /// Set-union one tag into a category array. `StoreError::NotFound` if the
    /// user has no tag document yet.
    fn merge_user_tag(
        &self,
        user: &UserId,
        category: TagCategory,
        tag: &str,
    ) -> Result<(), StoreError>;

    /// Create (or replace) the user's tag document with a singleton set.
    fn create_user_tags(
        &self,
        user: &UserId,
        category: TagCategory,
        tag: &str,
    ) -> Result<(), StoreError>;

    // === User operations ===

    /// Fetch a profile record from the `users` collection.
    fn user(&self, id: &UserId) -> Result<Option<UserRecord>, StoreError>;

    /// Create or replace a profile record.
    fn put_user(&self, id: &UserId, record: &UserRecord) -> Result<(), StoreError>;
}

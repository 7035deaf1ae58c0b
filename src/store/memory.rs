//! In-memory store backend.
//!
//! Keeps the three collections in maps behind a single mutex, which is what
//! makes the conditional create genuinely atomic here. Used by tests as the
//! stand-in for the hosted document API.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use super::backend::StoreBackend;
use super::documents::{
    NewPhotobook, Photobook, PhotobookId, PhotobookPatch, TagDocument, UserId, UserRecord,
};
use super::StoreError;
use crate::tags::TagCategory;

#[derive(Default)]
struct Collections {
    photobooks: HashMap<PhotobookId, Photobook>,
    user_tags: HashMap<UserId, TagDocument>,
    users: HashMap<UserId, UserRecord>,
}

pub struct MemoryStore {
    collections: Mutex<Collections>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: Mutex::new(Collections::default()),
            next_id: AtomicU64::new(1),
        }
    }

    fn issue_id(&self) -> PhotobookId {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        PhotobookId::new(format!("pb-{n:04}"))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreBackend for MemoryStore {
    // ========================================================================
    // Photobook operations
    // ========================================================================

    fn create_photobook(
        &self,
        doc: NewPhotobook,
        max_per_owner: usize,
    ) -> Result<PhotobookId, StoreError> {
        let mut collections = self.collections.lock().unwrap();

        let owned = collections
            .photobooks
            .values()
            .filter(|b| b.owner_id == doc.owner_id)
            .count();
        if owned >= max_per_owner {
            return Err(StoreError::QuotaExceeded {
                limit: max_per_owner,
            });
        }

        let id = self.issue_id();
        collections
            .photobooks
            .insert(id.clone(), doc.into_photobook(id.clone()));
        Ok(id)
    }

    fn photobooks_for_owner(&self, owner: &UserId) -> Result<Vec<Photobook>, StoreError> {
        let collections = self.collections.lock().unwrap();
        Ok(collections
            .photobooks
            .values()
            .filter(|b| &b.owner_id == owner)
            .cloned()
            .collect())
    }

    fn photobook_count(&self, owner: &UserId) -> Result<usize, StoreError> {
        let collections = self.collections.lock().unwrap();
        Ok(collections
            .photobooks
            .values()
            .filter(|b| &b.owner_id == owner)
            .count())
    }

    fn photobook(&self, id: &PhotobookId) -> Result<Photobook, StoreError> {
        let collections = self.collections.lock().unwrap();
        collections
            .photobooks
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                collection: "photobooks",
                id: id.to_string(),
            })
    }

    fn update_photobook(
        &self,
        id: &PhotobookId,
        patch: &PhotobookPatch,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.lock().unwrap();
        let book = collections
            .photobooks
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound {
                collection: "photobooks",
                id: id.to_string(),
            })?;

        if let Some(title) = &patch.title {
            book.title = title.clone();
        }
        if let Some(description) = &patch.description {
            book.description = description.clone();
        }
        if let Some(photos) = &patch.photos {
            book.photos = photos.clone();
        }
        Ok(())
    }

    // ========================================================================
    // Tag operations
    // ========================================================================

    fn user_tags(&self, user: &UserId) -> Result<Option<TagDocument>, StoreError> {
        let collections = self.collections.lock().unwrap();
        Ok(collections.user_tags.get(user).cloned())
    }

    fn merge_user_tag(
        &self,
        user: &UserId,
        category: TagCategory,
        tag: &str,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.lock().unwrap();
        match collections.user_tags.get_mut(user) {
            Some(doc) => {
                doc.merge(category, tag);
                Ok(())
            }
            None => Err(StoreError::NotFound {
                collection: "userTags",
                id: user.to_string(),
            }),
        }
    }

    fn create_user_tags(
        &self,
        user: &UserId,
        category: TagCategory,
        tag: &str,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.lock().unwrap();
        collections
            .user_tags
            .insert(user.clone(), TagDocument::singleton(category, tag));
        Ok(())
    }

    // ========================================================================
    // User operations
    // ========================================================================

    fn user(&self, id: &UserId) -> Result<Option<UserRecord>, StoreError> {
        let collections = self.collections.lock().unwrap();
        Ok(collections.users.get(id).cloned())
    }

    fn put_user(&self, id: &UserId, record: &UserRecord) -> Result<(), StoreError> {
        let mut collections = self.collections.lock().unwrap();
        collections.users.insert(id.clone(), record.clone());
        Ok(())
    }
}

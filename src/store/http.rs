//! HTTP backend for the hosted document store.
//!
//! Documents are flat JSON. The wire contract:
//!
//! - `GET    {base}/{collection}/{id}` — fetch one document
//! - `PUT    {base}/{collection}/{id}` — create or replace one document
//! - `PATCH  {base}/{collection}/{id}` — replace the fields in the body
//! - `POST   {base}/{collection}/{id}:merge` — set-union array fields
//! - `POST   {base}/photobooks?ownerId=&maxPerOwner=` — create with a
//!   store-issued id; the precondition is checked atomically server-side
//! - `GET    {base}/photobooks?ownerId=` — equality query, `{"documents": [...]}`
//! - `GET    {base}/photobooks:count?ownerId=` — aggregate count, `{"count": n}`
//!
//! Status mapping: 404 → `NotFound`, 403 → `PermissionDenied`, 409 (create
//! precondition) → `QuotaExceeded`; anything else is a transport error.
//! Calls carry no timeout and are never retried.

use serde::Deserialize;
use serde_json::json;

use super::backend::StoreBackend;
use super::documents::{
    self, NewPhotobook, Photobook, PhotobookId, PhotobookPatch, TagDocument, UserId, UserRecord,
};
use super::StoreError;
use crate::config::StoreConfig;
use crate::tags::TagCategory;

pub struct HttpStore {
    agent: ureq::Agent,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct DocumentsResponse {
    documents: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: usize,
}

impl HttpStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            agent: ureq::Agent::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        let mut request = self
            .agent
            .request(method, &format!("{}/{}", self.endpoint, path));
        if let Some(key) = &self.api_key {
            request = request.set("Authorization", &format!("Bearer {key}"));
        }
        request
    }
}

fn map_status(collection: &'static str, id: &str, err: ureq::Error) -> StoreError {
    match err {
        ureq::Error::Status(404, _) => StoreError::NotFound {
            collection,
            id: id.to_string(),
        },
        ureq::Error::Status(403, _) => {
            StoreError::PermissionDenied(format!("{collection}/{id}"))
        }
        ureq::Error::Status(code, _) => {
            StoreError::Transport(format!("{collection}/{id}: status {code}"))
        }
        ureq::Error::Transport(t) => StoreError::Transport(t.to_string()),
    }
}

fn decode_err(err: impl std::fmt::Display) -> StoreError {
    StoreError::Decode(err.to_string())
}

fn photobook_from_value(mut value: serde_json::Value) -> Result<Photobook, StoreError> {
    documents::upgrade_photobook(&mut value);
    serde_json::from_value(value).map_err(decode_err)
}

impl StoreBackend for HttpStore {
    // ========================================================================
    // Photobook operations
    // ========================================================================

    fn create_photobook(
        &self,
        doc: NewPhotobook,
        max_per_owner: usize,
    ) -> Result<PhotobookId, StoreError> {
        let owner = doc.owner_id.clone();
        let response = self
            .request("POST", "photobooks")
            .query("ownerId", owner.as_str())
            .query("maxPerOwner", &max_per_owner.to_string())
            .send_json(&doc)
            .map_err(|e| match e {
                ureq::Error::Status(409, _) => StoreError::QuotaExceeded {
                    limit: max_per_owner,
                },
                other => map_status("photobooks", "(new)", other),
            })?;

        let created: CreatedResponse = response.into_json().map_err(decode_err)?;
        tracing::debug!(owner = %owner, id = %created.id, "created photobook document");
        Ok(PhotobookId::new(created.id))
    }

    fn photobooks_for_owner(&self, owner: &UserId) -> Result<Vec<Photobook>, StoreError> {
        let response = self
            .request("GET", "photobooks")
            .query("ownerId", owner.as_str())
            .call()
            .map_err(|e| map_status("photobooks", owner.as_str(), e))?;

        let listed: DocumentsResponse = response.into_json().map_err(decode_err)?;
        listed
            .documents
            .into_iter()
            .map(photobook_from_value)
            .collect()
    }

    fn photobook_count(&self, owner: &UserId) -> Result<usize, StoreError> {
        let response = self
            .request("GET", "photobooks:count")
            .query("ownerId", owner.as_str())
            .call()
            .map_err(|e| map_status("photobooks", owner.as_str(), e))?;

        let counted: CountResponse = response.into_json().map_err(decode_err)?;
        Ok(counted.count)
    }

    fn photobook(&self, id: &PhotobookId) -> Result<Photobook, StoreError> {
        let response = self
            .request("GET", &format!("photobooks/{id}"))
            .call()
            .map_err(|e| map_status("photobooks", id.as_str(), e))?;

        photobook_from_value(response.into_json().map_err(decode_err)?)
    }

    fn update_photobook(
        &self,
        id: &PhotobookId,
        patch: &PhotobookPatch,
    ) -> Result<(), StoreError> {
        self.request("PATCH", &format!("photobooks/{id}"))
            .send_json(patch)
            .map_err(|e| map_status("photobooks", id.as_str(), e))?;
        Ok(())
    }

    // ========================================================================
    // Tag operations
    // ========================================================================

    fn user_tags(&self, user: &UserId) -> Result<Option<TagDocument>, StoreError> {
        let response = match self.request("GET", &format!("userTags/{user}")).call() {
            Ok(response) => response,
            Err(e) => {
                return match map_status("userTags", user.as_str(), e) {
                    StoreError::NotFound { .. } => Ok(None),
                    other => Err(other),
                }
            }
        };

        let doc: TagDocument = response.into_json().map_err(decode_err)?;
        Ok(Some(doc))
    }

    fn merge_user_tag(
        &self,
        user: &UserId,
        category: TagCategory,
        tag: &str,
    ) -> Result<(), StoreError> {
        let field = category.wire_name();
        self.request("POST", &format!("userTags/{user}:merge"))
            .send_json(json!({ field: [tag] }))
            .map_err(|e| map_status("userTags", user.as_str(), e))?;
        Ok(())
    }

    fn create_user_tags(
        &self,
        user: &UserId,
        category: TagCategory,
        tag: &str,
    ) -> Result<(), StoreError> {
        self.request("PUT", &format!("userTags/{user}"))
            .send_json(&TagDocument::singleton(category, tag))
            .map_err(|e| map_status("userTags", user.as_str(), e))?;
        Ok(())
    }

    // ========================================================================
    // User operations
    // ========================================================================

    fn user(&self, id: &UserId) -> Result<Option<UserRecord>, StoreError> {
        let response = match self.request("GET", &format!("users/{id}")).call() {
            Ok(response) => response,
            Err(e) => {
                return match map_status("users", id.as_str(), e) {
                    StoreError::NotFound { .. } => Ok(None),
                    other => Err(other),
                }
            }
        };

        let record: UserRecord = response.into_json().map_err(decode_err)?;
        Ok(Some(record))
    }

    fn put_user(&self, id: &UserId, record: &UserRecord) -> Result<(), StoreError> {
        self.request("PUT", &format!("users/{id}"))
            .send_json(record)
            .map_err(|e| map_status("users", id.as_str(), e))?;
        Ok(())
    }
}

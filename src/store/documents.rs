//! Typed records for the hosted document collections.
//!
//! Wire field names are camelCase to match the backing collections
//! (`photobooks`, `userTags`, `users`). Photobook documents carry a
//! `schemaVersion`; version-0 documents predate the field and may be missing
//! `description` or `photos`, and are upgraded in place on read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::tags::TagCategory;

/// Current photobook document version.
pub const SCHEMA_VERSION: u32 = 1;

/// Opaque user id issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque photobook document id issued by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotobookId(String);

impl PhotobookId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhotobookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A photo embedded in a photobook.
///
/// The retrieval `url` doubles as the photo's identity within its book; it
/// has no lifecycle outside the parent document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub url: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub film_stock: Vec<String>,

    #[serde(default)]
    pub people: Vec<String>,

    #[serde(default)]
    pub location: String,

    #[serde(default)]
    pub caption: String,

    #[serde(default)]
    pub event: Vec<String>,
}

impl Photo {
    /// The tag values this photo carries for one category.
    pub fn category_tags(&self, category: TagCategory) -> &[String] {
        match category {
            TagCategory::FilmStock => &self.film_stock,
            TagCategory::People => &self.people,
            TagCategory::Event => &self.event,
        }
    }
}

/// A photobook document as read from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photobook {
    pub id: PhotobookId,
    pub title: String,

    #[serde(default)]
    pub description: String,

    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub photos: Vec<Photo>,

    #[serde(default)]
    pub schema_version: u32,
}

/// Payload for creating a photobook; the store issues the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPhotobook {
    pub title: String,
    pub description: String,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
    pub photos: Vec<Photo>,
    pub schema_version: u32,
}

impl NewPhotobook {
    pub(crate) fn into_photobook(self, id: PhotobookId) -> Photobook {
        Photobook {
            id,
            title: self.title,
            description: self.description,
            owner_id: self.owner_id,
            created_at: self.created_at,
            photos: self.photos,
            schema_version: self.schema_version,
        }
    }
}

/// Partial field replacement for a photobook document.
///
/// Only the fields that are set are written; everything else is untouched.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotobookPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub photos: Option<Vec<Photo>>,
}

impl PhotobookPatch {
    /// Patch that replaces the whole `photos` array.
    pub fn photos(photos: Vec<Photo>) -> Self {
        Self {
            photos: Some(photos),
            ..Default::default()
        }
    }
}

/// Per-user tag vocabulary, one array field per category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagDocument {
    #[serde(default)]
    pub film_stock: Vec<String>,

    #[serde(default)]
    pub people: Vec<String>,

    #[serde(default)]
    pub event: Vec<String>,
}

impl TagDocument {
    /// Document holding a single tag in one category.
    pub fn singleton(category: TagCategory, tag: &str) -> Self {
        let mut doc = Self::default();
        doc.category_mut(category).push(tag.to_string());
        doc
    }

    pub fn category(&self, category: TagCategory) -> &[String] {
        match category {
            TagCategory::FilmStock => &self.film_stock,
            TagCategory::People => &self.people,
            TagCategory::Event => &self.event,
        }
    }

    pub(crate) fn category_mut(&mut self, category: TagCategory) -> &mut Vec<String> {
        match category {
            TagCategory::FilmStock => &mut self.film_stock,
            TagCategory::People => &mut self.people,
            TagCategory::Event => &mut self.event,
        }
    }

    /// Set-union insert. Returns whether the tag was new (exact, case-sensitive
    /// match).
    pub fn merge(&mut self, category: TagCategory, tag: &str) -> bool {
        let values = self.category_mut(category);
        if values.iter().any(|t| t == tag) {
            return false;
        }
        values.push(tag.to_string());
        true
    }
}

/// Profile record in the `users` collection, written on first sign-in.
///
/// The provider's display name is stored under `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub name: String,
    pub email: String,

    #[serde(rename = "photoURL")]
    pub photo_url: String,
}

/// Upgrade a raw photobook document to the current schema version.
///
/// Version 0 may be missing `description`, `photos`, and `schemaVersion`;
/// the fields are filled with their empty values so the typed record always
/// deserializes.
pub fn upgrade_photobook(value: &mut serde_json::Value) {
    let Some(obj) = value.as_object_mut() else {
        return;
    };

    let version = obj
        .get("schemaVersion")
        .and_then(|v| v.as_u64())
        .unwrap_or(0);
    if version >= u64::from(SCHEMA_VERSION) {
        return;
    }

    obj.entry("description")
        .or_insert_with(|| serde_json::Value::String(String::new()));
    obj.entry("photos")
        .or_insert_with(|| serde_json::Value::Array(Vec::new()));
    obj.insert("schemaVersion".to_string(), SCHEMA_VERSION.into());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn photo_defaults_fill_missing_metadata() {
        let photo: Photo = serde_json::from_str(r#"{"url":"https://b/1.jpg"}"#).unwrap();
        assert_eq!(photo.url, "https://b/1.jpg");
        assert!(photo.title.is_empty());
        assert!(photo.film_stock.is_empty());
        assert!(photo.people.is_empty());
        assert!(photo.event.is_empty());
    }

    #[test]
    fn photobook_wire_names_are_camel_case() {
        let book = Photobook {
            id: PhotobookId::new("b1"),
            title: "Summer".to_string(),
            description: "Trip".to_string(),
            owner_id: UserId::new("u1"),
            created_at: "2024-06-01T12:00:00Z".parse().unwrap(),
            photos: vec![],
            schema_version: SCHEMA_VERSION,
        };

        let value = serde_json::to_value(&book).unwrap();
        assert!(value.get("ownerId").is_some());
        assert!(value.get("createdAt").is_some());
        assert!(value.get("schemaVersion").is_some());
        assert!(value.get("owner_id").is_none());
    }

    #[test]
    fn user_record_keeps_photo_url_casing() {
        let record = UserRecord {
            name: "Sam".to_string(),
            email: "sam@example.net".to_string(),
            photo_url: "https://p/avatar.jpg".to_string(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("photoURL").is_some());
    }

    #[test]
    fn upgrade_fills_version_zero_documents() {
        let mut value = serde_json::json!({
            "id": "b1",
            "title": "Old book",
            "ownerId": "u1",
            "createdAt": "2023-01-01T00:00:00Z"
        });

        upgrade_photobook(&mut value);
        let book: Photobook = serde_json::from_value(value).unwrap();
        assert_eq!(book.schema_version, SCHEMA_VERSION);
        assert!(book.photos.is_empty());
        assert!(book.description.is_empty());
    }

    #[test]
    fn upgrade_leaves_current_documents_alone() {
        let mut value = serde_json::json!({
            "id": "b1",
            "title": "New book",
            "description": "desc",
            "ownerId": "u1",
            "createdAt": "2024-01-01T00:00:00Z",
            "photos": [{"url": "https://b/1.jpg"}],
            "schemaVersion": SCHEMA_VERSION
        });
        let before = value.clone();

        upgrade_photobook(&mut value);
        assert_eq!(value, before);
    }

    #[test]
    fn tag_document_merge_is_a_set_union() {
        let mut doc = TagDocument::default();
        assert!(doc.merge(TagCategory::People, "Sam"));
        assert!(!doc.merge(TagCategory::People, "Sam"));
        assert!(doc.merge(TagCategory::People, "Alex"));
        assert_eq!(doc.category(TagCategory::People), ["Sam", "Alex"]);

        // Case-sensitive exact match
        assert!(doc.merge(TagCategory::People, "sam"));
    }
}

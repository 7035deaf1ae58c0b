//! Client library for a film photobook manager.
//!
//! Persistence, authentication, and file storage are delegated to hosted
//! services: a document store (collections `photobooks`, `userTags`, `users`),
//! a blob store, and an identity provider. This crate holds the typed records,
//! the service adapters, and the two pieces of domain logic the app needs —
//! the per-user tag registry and the photo grouping used by the single-book
//! view. There is no server and no local persistence here; every fallible
//! operation is one request against a hosted service.

pub mod blob;
pub mod config;
pub mod error;
pub mod grouping;
pub mod logging;
pub mod photobooks;
pub mod session;
pub mod store;
pub mod tags;

pub use blob::{BlobError, BlobStore};
pub use config::Config;
pub use error::{Error, ValidationError};
pub use grouping::{group_photos, GroupMetric, PhotoGroup};
pub use photobooks::{
    DraftPhoto, PhotobookDraft, PhotobookService, MAX_PHOTOBOOKS_PER_USER,
    MAX_PHOTOS_PER_PHOTOBOOK,
};
pub use session::{AuthError, AuthUser, Session, SessionManager};
pub use store::{
    Photo, Photobook, PhotobookId, PhotobookPatch, Store, StoreError, TagDocument, UserId,
    UserRecord,
};
pub use tags::{TagCategory, TagRegistry};

//! Crate-level error taxonomy.
//!
//! Three failure classes reach callers: authentication failures (the provider
//! rejected or the user cancelled sign-in), service request failures (document
//! store or blob store), and client-side validation failures that are rejected
//! before any network call. None of them are fatal; the caller's state is the
//! pre-operation state in every case.

use thiserror::Error;

use crate::blob::BlobError;
use crate::photobooks::{MAX_PHOTOBOOKS_PER_USER, MAX_PHOTOS_PER_PHOTOBOOK};
use crate::session::AuthError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no user is signed in")]
    NotSignedIn,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Blob(#[from] BlobError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Rejections raised before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("a photobook needs a title")]
    MissingTitle,

    #[error("a photobook needs a description")]
    MissingDescription,

    #[error("a photobook needs at least one photo")]
    NoPhotos,

    #[error("a photobook can hold at most {} photos", MAX_PHOTOS_PER_PHOTOBOOK)]
    TooManyPhotos,

    #[error("you already have the maximum of {} photobooks", MAX_PHOTOBOOKS_PER_USER)]
    PhotobookQuotaReached,

    #[error("no photo with url {url} in this photobook")]
    UnknownPhoto { url: String },
}

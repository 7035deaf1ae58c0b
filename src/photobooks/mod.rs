//! Photobook operations.
//!
//! A photobook is created in two stages: every photo in the draft is
//! uploaded to the blob store as an independent concurrent request, and only
//! once all of them have a URL is the single document written. Any upload
//! failure aborts the whole create — no document is written, though the
//! blobs uploaded before the failure stay behind (there is no delete on the
//! blob surface; they are logged). Quotas are checked client-side before
//! anything touches the network, and the document write itself carries the
//! owner cap as an atomic precondition in case two sessions race the check.

use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::blob::{photo_path, BlobError, BlobStore};
use crate::error::{Error, ValidationError};
use crate::session::Session;
use crate::store::{
    NewPhotobook, Photo, Photobook, PhotobookId, PhotobookPatch, Store, StoreError,
    SCHEMA_VERSION,
};

/// A user has at most this many photobooks.
pub const MAX_PHOTOBOOKS_PER_USER: usize = 10;

/// A photobook holds at most this many photos.
pub const MAX_PHOTOS_PER_PHOTOBOOK: usize = 20;

/// A photo staged for upload: the file bytes plus the metadata the user has
/// entered for it.
#[derive(Debug, Clone)]
pub struct DraftPhoto {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,

    pub title: String,
    pub film_stock: Vec<String>,
    pub people: Vec<String>,
    pub location: String,
    pub caption: String,
    pub event: Vec<String>,
}

impl DraftPhoto {
    pub fn new(filename: &str, content_type: &str, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            bytes,
            title: String::new(),
            film_stock: Vec::new(),
            people: Vec::new(),
            location: String::new(),
            caption: String::new(),
            event: Vec::new(),
        }
    }

    fn into_photo(self, url: String) -> Photo {
        Photo {
            url,
            title: self.title,
            film_stock: self.film_stock,
            people: self.people,
            location: self.location,
            caption: self.caption,
            event: self.event,
        }
    }
}

/// A photobook being assembled, before anything is uploaded or written.
#[derive(Debug, Clone, Default)]
pub struct PhotobookDraft {
    pub title: String,
    pub description: String,
    photos: Vec<DraftPhoto>,
}

impl PhotobookDraft {
    pub fn new(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            photos: Vec::new(),
        }
    }

    /// Stage a photo. The cap is enforced here, before any upload is
    /// attempted.
    pub fn add_photo(&mut self, photo: DraftPhoto) -> Result<(), ValidationError> {
        if self.photos.len() >= MAX_PHOTOS_PER_PHOTOBOOK {
            return Err(ValidationError::TooManyPhotos);
        }
        self.photos.push(photo);
        Ok(())
    }

    pub fn photos(&self) -> &[DraftPhoto] {
        &self.photos
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        if self.description.trim().is_empty() {
            return Err(ValidationError::MissingDescription);
        }
        if self.photos.is_empty() {
            return Err(ValidationError::NoPhotos);
        }
        if self.photos.len() > MAX_PHOTOS_PER_PHOTOBOOK {
            return Err(ValidationError::TooManyPhotos);
        }
        Ok(())
    }
}

pub struct PhotobookService {
    store: Arc<Store>,
    blobs: Arc<BlobStore>,
}

impl PhotobookService {
    pub fn new(store: Arc<Store>, blobs: Arc<BlobStore>) -> Self {
        Self { store, blobs }
    }

    /// Create a photobook from a draft.
    ///
    /// Validation and the quota pre-check reject bad drafts before any
    /// network call. The uploads then run concurrently, one request per
    /// photo, and all of them must succeed before the document is written.
    pub async fn create(
        &self,
        session: &Session,
        draft: PhotobookDraft,
    ) -> Result<Photobook, Error> {
        draft.validate()?;
        let owner = session.user_id().clone();

        {
            let store = Arc::clone(&self.store);
            let owner = owner.clone();
            let count = spawn_store(move || store.photobook_count(&owner)).await?;
            if count >= MAX_PHOTOBOOKS_PER_USER {
                return Err(ValidationError::PhotobookQuotaReached.into());
            }
        }

        // Fan the uploads out; each is its own request against the blob store.
        let mut photos: Vec<Photo> = Vec::with_capacity(draft.photos.len());
        let mut uploads: JoinSet<Result<(usize, String), (String, BlobError)>> = JoinSet::new();
        for (index, mut photo) in draft.photos.into_iter().enumerate() {
            let bytes = std::mem::take(&mut photo.bytes);
            let content_type = photo.content_type.clone();
            let path = photo_path(&owner, &photo.filename);
            photos.push(photo.into_photo(String::new()));

            let blobs = Arc::clone(&self.blobs);
            uploads.spawn_blocking(move || {
                blobs
                    .upload(&path, &bytes, &content_type)
                    .map(|url| (index, url))
                    .map_err(|err| (path, err))
            });
        }

        let mut urls: Vec<Option<String>> = vec![None; photos.len()];
        let mut failure: Option<Error> = None;
        while let Some(joined) = uploads.join_next().await {
            match joined {
                Ok(Ok((index, url))) => urls[index] = Some(url),
                Ok(Err((path, err))) => {
                    tracing::error!(path = %path, error = %err, "photo upload failed");
                    failure.get_or_insert(Error::Blob(err));
                }
                Err(join_err) => {
                    failure.get_or_insert(Error::Blob(BlobError::Transport(format!(
                        "upload task failed: {join_err}"
                    ))));
                }
            }
        }

        if let Some(err) = failure {
            // No rollback exists on the blob surface; whatever made it up
            // before the failure stays there.
            let orphaned: Vec<&String> = urls.iter().flatten().collect();
            if !orphaned.is_empty() {
                tracing::warn!(
                    count = orphaned.len(),
                    "aborting photobook create; uploaded blobs were not rolled back"
                );
            }
            return Err(err);
        }

        for (photo, url) in photos.iter_mut().zip(urls) {
            match url {
                Some(url) => photo.url = url,
                None => {
                    return Err(Error::Blob(BlobError::Transport(
                        "upload produced no result".to_string(),
                    )))
                }
            }
        }

        let doc = NewPhotobook {
            title: draft.title,
            description: draft.description,
            owner_id: owner.clone(),
            created_at: Utc::now(),
            photos,
            schema_version: SCHEMA_VERSION,
        };

        // The cap travels with the write; if another session raced the
        // pre-check above, the store is the one that says no.
        let record = doc.clone();
        let store = Arc::clone(&self.store);
        let created = tokio::task::spawn_blocking(move || {
            store.create_photobook(doc, MAX_PHOTOBOOKS_PER_USER)
        })
        .await
        .map_err(|e| Error::Store(StoreError::Transport(format!("store task failed: {e}"))))?;

        let id = match created {
            Ok(id) => id,
            Err(StoreError::QuotaExceeded { .. }) => {
                return Err(ValidationError::PhotobookQuotaReached.into())
            }
            Err(err) => return Err(err.into()),
        };

        tracing::info!(owner = %owner, id = %id, "created photobook");
        Ok(record.into_photobook(id))
    }

    /// The signed-in user's photobooks. Order unspecified.
    pub fn list(&self, session: &Session) -> Result<Vec<Photobook>, Error> {
        Ok(self.store.photobooks_for_owner(session.user_id())?)
    }

    /// How many photobooks the user has.
    pub fn count(&self, session: &Session) -> Result<usize, Error> {
        Ok(self.store.photobook_count(session.user_id())?)
    }

    /// Whether the user is under the photobook cap.
    pub fn can_create(&self, session: &Session) -> Result<bool, Error> {
        Ok(self.count(session)? < MAX_PHOTOBOOKS_PER_USER)
    }

    /// Fetch one photobook by id.
    pub fn get(&self, session: &Session, id: &PhotobookId) -> Result<Photobook, Error> {
        tracing::debug!(user = %session.user_id(), id = %id, "fetching photobook");
        Ok(self.store.photobook(id)?)
    }

    /// Save an edited photo back into its book.
    ///
    /// The photo's `url` is its identity: the matching element of the
    /// `photos` array is replaced and the whole array is written back as a
    /// field patch. A url that matches nothing means the caller's copy of
    /// the book is stale.
    pub fn update_photo(
        &self,
        session: &Session,
        id: &PhotobookId,
        updated: Photo,
    ) -> Result<Photobook, Error> {
        let mut book = self.store.photobook(id)?;

        if !book.photos.iter().any(|p| p.url == updated.url) {
            return Err(ValidationError::UnknownPhoto { url: updated.url }.into());
        }

        for photo in &mut book.photos {
            if photo.url == updated.url {
                *photo = updated.clone();
            }
        }
        self.store
            .update_photobook(id, &PhotobookPatch::photos(book.photos.clone()))?;

        tracing::debug!(user = %session.user_id(), id = %id, "updated photo metadata");
        Ok(book)
    }
}

async fn spawn_store<T: Send + 'static>(
    call: impl FnOnce() -> Result<T, StoreError> + Send + 'static,
) -> Result<T, Error> {
    tokio::task::spawn_blocking(call)
        .await
        .map_err(|e| Error::Store(StoreError::Transport(format!("store task failed: {e}"))))?
        .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::MemoryBlobStore;
    use crate::session::{AuthUser, SessionManager, StaticIdentityProvider};
    use crate::store::UserId;

    fn signed_in(store: &Arc<Store>, id: &str) -> Session {
        let user = AuthUser {
            id: UserId::new(id),
            display_name: "Sam Porter".to_string(),
            email: format!("{id}@example.net"),
            photo_url: String::new(),
        };
        let mut manager =
            SessionManager::new(Box::new(StaticIdentityProvider::new(user)), store.clone());
        manager.sign_in().unwrap().clone()
    }

    fn draft_with_photos(n: usize) -> PhotobookDraft {
        let mut draft = PhotobookDraft::new("Summer Rolls", "Two rolls of HP5 from June");
        for i in 0..n {
            draft
                .add_photo(DraftPhoto::new(
                    &format!("frame-{i:02}.jpg"),
                    "image/jpeg",
                    vec![0u8; 16],
                ))
                .unwrap();
        }
        draft
    }

    fn seed_books(store: &Store, owner: &str, n: usize) {
        for i in 0..n {
            let doc = NewPhotobook {
                title: format!("Book {i}"),
                description: "seed".to_string(),
                owner_id: UserId::new(owner),
                created_at: Utc::now(),
                photos: vec![],
                schema_version: SCHEMA_VERSION,
            };
            store.create_photobook(doc, MAX_PHOTOBOOKS_PER_USER).unwrap();
        }
    }

    #[tokio::test]
    async fn create_uploads_every_photo_then_writes_one_document() {
        let store = Arc::new(Store::in_memory());
        let blobs = Arc::new(BlobStore::in_memory());
        let service = PhotobookService::new(store.clone(), blobs.clone());
        let session = signed_in(&store, "u1");

        let mut draft = draft_with_photos(2);
        draft.photos[0].people = vec!["Sam".to_string()];

        let book = service.create(&session, draft).await.unwrap();
        assert_eq!(book.owner_id, UserId::new("u1"));
        assert_eq!(book.photos.len(), 2);
        assert_eq!(book.photos[0].url, "memory://photobooks/u1/frame-00.jpg");
        assert_eq!(book.photos[0].people, ["Sam"]);
        assert_eq!(book.schema_version, SCHEMA_VERSION);
        assert_eq!(blobs.stored_count(), Some(2));

        let listed = service.list(&session).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, book.id);
    }

    #[tokio::test]
    async fn eleventh_photobook_is_rejected_before_any_network_call() {
        let store = Arc::new(Store::in_memory());
        let blobs = Arc::new(BlobStore::in_memory());
        let service = PhotobookService::new(store.clone(), blobs.clone());
        let session = signed_in(&store, "u1");
        seed_books(&store, "u1", MAX_PHOTOBOOKS_PER_USER);

        let err = service.create(&session, draft_with_photos(1)).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::PhotobookQuotaReached)
        ));

        // Nothing was uploaded and nothing was written
        assert_eq!(blobs.stored_count(), Some(0));
        assert_eq!(service.count(&session).unwrap(), MAX_PHOTOBOOKS_PER_USER);
        assert!(!service.can_create(&session).unwrap());
    }

    #[test]
    fn twenty_first_photo_is_rejected_at_the_draft() {
        let mut draft = draft_with_photos(MAX_PHOTOS_PER_PHOTOBOOK);

        let err = draft
            .add_photo(DraftPhoto::new("extra.jpg", "image/jpeg", vec![]))
            .unwrap_err();
        assert_eq!(err, ValidationError::TooManyPhotos);
        assert_eq!(draft.photos().len(), MAX_PHOTOS_PER_PHOTOBOOK);
    }

    #[tokio::test]
    async fn empty_drafts_are_rejected_inline() {
        let store = Arc::new(Store::in_memory());
        let blobs = Arc::new(BlobStore::in_memory());
        let service = PhotobookService::new(store.clone(), blobs.clone());
        let session = signed_in(&store, "u1");

        let err = service
            .create(&session, PhotobookDraft::new("Summer", "June"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::NoPhotos)));

        let mut untitled = draft_with_photos(1);
        untitled.title = "  ".to_string();
        let err = service.create(&session, untitled).await.unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::MissingTitle)));

        let mut blank = draft_with_photos(1);
        blank.description = String::new();
        let err = service.create(&session, blank).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::MissingDescription)
        ));

        assert_eq!(blobs.stored_count(), Some(0));
    }

    #[tokio::test]
    async fn upload_failure_aborts_the_create_with_no_document() {
        let store = Arc::new(Store::in_memory());
        let blobs = Arc::new(BlobStore::from_memory(MemoryBlobStore::failing()));
        let service = PhotobookService::new(store.clone(), blobs);
        let session = signed_in(&store, "u1");

        let err = service.create(&session, draft_with_photos(3)).await.unwrap_err();
        assert!(matches!(err, Error::Blob(BlobError::Transport(_))));
        assert!(service.list(&session).unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_photo_replaces_the_matching_url_only() {
        let store = Arc::new(Store::in_memory());
        let blobs = Arc::new(BlobStore::in_memory());
        let service = PhotobookService::new(store.clone(), blobs);
        let session = signed_in(&store, "u1");

        let book = service.create(&session, draft_with_photos(2)).await.unwrap();

        let mut edited = book.photos[1].clone();
        edited.title = "Harbour at dusk".to_string();
        edited.location = "Lisbon".to_string();

        let updated = service.update_photo(&session, &book.id, edited).unwrap();
        assert_eq!(updated.photos[1].title, "Harbour at dusk");
        assert_eq!(updated.photos[1].location, "Lisbon");
        assert_eq!(updated.photos[0], book.photos[0]);

        // The write is visible on a fresh fetch, order preserved
        let fetched = service.get(&session, &book.id).unwrap();
        assert_eq!(fetched.photos[0].url, book.photos[0].url);
        assert_eq!(fetched.photos[1].title, "Harbour at dusk");
    }

    #[tokio::test]
    async fn update_photo_with_a_stale_url_is_rejected() {
        let store = Arc::new(Store::in_memory());
        let blobs = Arc::new(BlobStore::in_memory());
        let service = PhotobookService::new(store.clone(), blobs);
        let session = signed_in(&store, "u1");

        let book = service.create(&session, draft_with_photos(1)).await.unwrap();

        let stranger = Photo {
            url: "memory://photobooks/u1/not-there.jpg".to_string(),
            ..Default::default()
        };
        let err = service.update_photo(&session, &book.id, stranger).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::UnknownPhoto { .. })
        ));
    }

    #[tokio::test]
    async fn missing_photobook_surfaces_not_found() {
        let store = Arc::new(Store::in_memory());
        let blobs = Arc::new(BlobStore::in_memory());
        let service = PhotobookService::new(store.clone(), blobs);
        let session = signed_in(&store, "u1");

        let err = service
            .get(&session, &PhotobookId::new("missing"))
            .unwrap_err();
        assert!(matches!(err, Error::Store(StoreError::NotFound { .. })));
    }
}

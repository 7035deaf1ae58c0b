//! Blob store access.
//!
//! Photo bytes are written to a hosted blob store under
//! `photobooks/{userId}/{filename}` and read back through the durable URL the
//! upload returns. That URL doubles as the photo's identity inside its
//! photobook. There is no delete operation on this surface; a failed
//! photobook creation leaves its already-uploaded blobs behind (the service
//! logs them).

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

use crate::config::BlobConfig;
use crate::store::UserId;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("permission denied for {0}")]
    PermissionDenied(String),

    #[error("blob request failed: {0}")]
    Transport(String),

    #[error("malformed blob response: {0}")]
    InvalidResponse(String),
}

/// Write path for a photo within the per-user namespace.
pub fn photo_path(user: &UserId, filename: &str) -> String {
    format!("photobooks/{user}/{filename}")
}

/// Trait for blob store backends.
pub trait BlobBackend: Send + Sync {
    /// Upload bytes under `path` and return the durable retrieval URL.
    fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<String, BlobError>;
}

// ============================================================================
// HTTP backend
// ============================================================================

/// `PUT {endpoint}/{path}` with the raw bytes; the response body is
/// `{"url": "..."}`. 403 maps to `PermissionDenied`, anything else non-2xx
/// is a transport error. No timeout, no retry.
pub struct HttpBlobStore {
    agent: ureq::Agent,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

impl HttpBlobStore {
    pub fn new(config: &BlobConfig) -> Self {
        Self {
            agent: ureq::Agent::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }
}

impl BlobBackend for HttpBlobStore {
    fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<String, BlobError> {
        let mut request = self
            .agent
            .put(&format!("{}/{}", self.endpoint, path))
            .set("Content-Type", content_type);
        if let Some(key) = &self.api_key {
            request = request.set("Authorization", &format!("Bearer {key}"));
        }

        let response = request.send_bytes(bytes).map_err(|e| match e {
            ureq::Error::Status(403, _) => BlobError::PermissionDenied(path.to_string()),
            ureq::Error::Status(code, _) => {
                BlobError::Transport(format!("{path}: status {code}"))
            }
            ureq::Error::Transport(t) => BlobError::Transport(t.to_string()),
        })?;

        let uploaded: UploadResponse = response
            .into_json()
            .map_err(|e| BlobError::InvalidResponse(e.to_string()))?;
        tracing::debug!(path, url = %uploaded.url, "uploaded blob");
        Ok(uploaded.url)
    }
}

// ============================================================================
// In-memory backend
// ============================================================================

/// Keeps uploaded bytes in a map and mints `memory://{path}` URLs. Tests
/// only; `failing()` primes it to refuse every upload for abort-path tests.
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    fail_uploads: bool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self {
            blobs: Mutex::new(HashMap::new()),
            fail_uploads: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn failing() -> Self {
        Self {
            blobs: Mutex::new(HashMap::new()),
            fail_uploads: true,
        }
    }

    /// Number of blobs written so far.
    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobBackend for MemoryBlobStore {
    fn upload(&self, path: &str, bytes: &[u8], _content_type: &str) -> Result<String, BlobError> {
        if self.fail_uploads {
            return Err(BlobError::Transport(format!("{path}: refused")));
        }
        let mut blobs = self.blobs.lock().unwrap();
        blobs.insert(path.to_string(), bytes.to_vec());
        Ok(format!("memory://{path}"))
    }
}

// ============================================================================
// Facade
// ============================================================================

enum BlobInner {
    Http(HttpBlobStore),
    Memory(MemoryBlobStore),
}

pub struct BlobStore {
    inner: BlobInner,
}

impl BlobStore {
    /// Connect to the configured blob store endpoint.
    pub fn open(config: &BlobConfig) -> Self {
        Self {
            inner: BlobInner::Http(HttpBlobStore::new(config)),
        }
    }

    /// Backend holding blobs in process memory. Tests only.
    pub fn in_memory() -> Self {
        Self {
            inner: BlobInner::Memory(MemoryBlobStore::new()),
        }
    }

    pub(crate) fn from_memory(memory: MemoryBlobStore) -> Self {
        Self {
            inner: BlobInner::Memory(memory),
        }
    }

    pub fn upload(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, BlobError> {
        match &self.inner {
            BlobInner::Http(store) => store.upload(path, bytes, content_type),
            BlobInner::Memory(store) => store.upload(path, bytes, content_type),
        }
    }

    /// Blob count when backed by memory; `None` over HTTP.
    pub fn stored_count(&self) -> Option<usize> {
        match &self.inner {
            BlobInner::Http(_) => None,
            BlobInner::Memory(store) => Some(store.len()),
        }
    }
}

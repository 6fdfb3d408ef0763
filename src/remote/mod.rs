//! Remote collaborators: the document store and the spreadsheet store.
//!
//! Both services are opaque external systems; the pipeline only ever talks
//! to them through these traits. Client handles are constructed once per
//! process and injected into the pipeline calls — there is no global cached
//! connection state anywhere in the crate.
//!
//! [`google::GoogleClient`] implements both traits over the REST endpoints;
//! [`memory::InMemoryStore`] implements them over the local document model
//! for tests and offline runs.

pub mod google;
pub mod memory;

use crate::pipeline::replace::ReplaceRule;
use crate::record::Value;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identifier of a remotely stored document (template or clone).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub String);

impl DocumentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        DocumentId(s.to_string())
    }
}

/// Identifier of the destination folder clones are created in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderId(pub String);

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FolderId {
    fn from(s: &str) -> Self {
        FolderId(s.to_string())
    }
}

/// Transport-level failure from a remote call.
///
/// Never shown to the operator directly; the pipeline converts it into the
/// matching [`crate::error::ReportError`] variant at each stage boundary.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The request never produced a usable response (connect, timeout, TLS).
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response arrived but was not in the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// The addressed document does not exist.
    #[error("document '{0}' not found")]
    NotFound(String),
}

/// The remote document-editing service.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Duplicate `template` into `folder` under `title`; returns the id of
    /// the writable clone.
    async fn clone_template(
        &self,
        template: &DocumentId,
        title: &str,
        folder: &FolderId,
    ) -> Result<DocumentId, RemoteError>;

    /// Apply the whole rule batch to `doc` atomically: all replacements
    /// land or the document is left unusable and an error is returned.
    /// Partial application is not a supported outcome.
    async fn replace_all(&self, doc: &DocumentId, rules: &[ReplaceRule])
        -> Result<(), RemoteError>;

    /// Export `doc` as standalone bytes. Either the full byte stream is
    /// returned or an error — never a partial stream.
    async fn export(&self, doc: &DocumentId) -> Result<Vec<u8>, RemoteError>;

    /// Delete `doc`. Callers treat this as best-effort and swallow errors.
    async fn delete(&self, doc: &DocumentId) -> Result<(), RemoteError>;
}

/// The remote spreadsheet service.
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Fetch all rows of a worksheet, header row included.
    async fn fetch_rows(&self, worksheet: &str) -> Result<Vec<Vec<Value>>, RemoteError>;
}

//! Error types for the bbnt-docgen library.
//!
//! Two distinct error types reflect two distinct layers:
//!
//! * [`ReportError`] — user-facing: what went wrong with this generation
//!   request, in terms an operator understands (bad login, no billing row,
//!   a remote stage failed). Returned by the top-level `generate*` calls.
//!
//! * [`crate::remote::RemoteError`] — transport-level: what an HTTP call to
//!   the document or spreadsheet service reported. Converted into the
//!   matching [`ReportError`] variant at the pipeline boundary so raw
//!   transport errors never reach the caller.
//!
//! Two failure paths are intentionally absent from this taxonomy: derived
//! field computation (degrades to string fallbacks, never fails) and clone
//! deletion (best-effort, failures swallowed).

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the bbnt-docgen library.
#[derive(Debug, Error)]
pub enum ReportError {
    // ── Authentication ────────────────────────────────────────────────────
    /// The station code is not present in the station directory.
    #[error("unknown station code '{station}'")]
    UnknownStation { station: String },

    /// The station exists but the password does not match.
    #[error("wrong password for station '{station}'")]
    WrongPassword { station: String },

    // ── Data lookup ───────────────────────────────────────────────────────
    /// No billing row matches the requested station and period.
    #[error("no billing record for station '{station}' in period '{period}'")]
    BillingRecordNotFound { station: String, period: String },

    // ── Remote document service ───────────────────────────────────────────
    /// Cloning the report template failed; nothing was created.
    #[error("failed to clone the report template: {detail}")]
    CloneFailed { detail: String },

    /// The batch substitution call failed. The clone must be treated as
    /// unusable — partial application is not a supported outcome.
    #[error("placeholder substitution failed on document '{doc}': {detail}")]
    SubstituteFailed { doc: String, detail: String },

    /// Export of the substituted document failed. Distinct from
    /// [`ReportError::SubstituteFailed`]; the caller may retry the request.
    #[error("export failed for document '{doc}': {detail}")]
    ExportFailed { doc: String, detail: String },

    // ── Image embedding ───────────────────────────────────────────────────
    /// The embedding pass failed; partial output is discarded, not returned.
    #[error("image embedding failed: {detail}")]
    EmbedFailed { detail: String },

    // ── Document bytes ────────────────────────────────────────────────────
    /// The exported bytes do not parse as a report document.
    #[error("exported document is malformed: {detail}")]
    DocumentParse { detail: String },

    // ── Configuration / I/O ───────────────────────────────────────────────
    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Could not write an output document file (CLI path).
    #[error("failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ReportError {
    /// True when the failure happened before any remote document call, i.e.
    /// no clone exists that could need cleaning up.
    pub fn is_pre_clone(&self) -> bool {
        matches!(
            self,
            ReportError::UnknownStation { .. }
                | ReportError::WrongPassword { .. }
                | ReportError::BillingRecordNotFound { .. }
                | ReportError::CloneFailed { .. }
                | ReportError::InvalidConfig(_)
        )
    }
}

//! Top-level orchestration: one call from login to downloadable bytes.
//!
//! The flow is strictly sequential — authenticate, look up the billing
//! row, merge and derive the field record, assemble the document remotely,
//! then embed photos locally. Authentication and lookup run before any
//! remote document call, so a failed login or a missing billing row never
//! creates a clone.
//!
//! Cleanup of the clone is deliberately not part of the flow: the operator
//! may want to keep the online copy, so deletion is the separate,
//! best-effort [`delete_report`].

use crate::config::GenerationConfig;
use crate::error::ReportError;
use crate::output::{ReportOutput, ReportStats};
use crate::pipeline::assemble::assemble;
use crate::pipeline::derive::derive;
use crate::pipeline::embed::{embed_images, EmbedOutcome, SlotSet};
use crate::pipeline::replace::build_replacements;
use crate::remote::{DocumentId, DocumentStore};
use crate::sheets::{merge_records, normalize_code, BillingTable, StationDirectory};
use std::fmt;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// One operator's request: credentials, period, and uploaded photos.
#[derive(Clone, Default)]
pub struct GenerationRequest {
    pub station_code: String,
    pub password: String,
    pub period: String,
    pub images: SlotSet,
}

impl fmt::Debug for GenerationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationRequest")
            .field("station_code", &self.station_code)
            .field("password", &"<redacted>")
            .field("period", &self.period)
            .field("images", &self.images.filled_count())
            .finish()
    }
}

/// Generate the acceptance report for one request.
///
/// Returns both variants: the raw export always, the image-embedded
/// document when any photo slot is filled.
///
/// # Errors
/// * [`ReportError::UnknownStation`] / [`ReportError::WrongPassword`] —
///   login failed; no remote call was made.
/// * [`ReportError::BillingRecordNotFound`] — no billing row for the
///   station and period; no clone was created.
/// * [`ReportError::CloneFailed`] / [`ReportError::SubstituteFailed`] /
///   [`ReportError::ExportFailed`] — a remote stage failed.
/// * [`ReportError::EmbedFailed`] — the embedding pass failed; the partial
///   result is discarded and no `final_document` is returned.
pub async fn generate(
    request: &GenerationRequest,
    config: &GenerationConfig,
    docs: &dyn DocumentStore,
    stations: &StationDirectory,
    billing: &BillingTable,
) -> Result<ReportOutput, ReportError> {
    let total_start = Instant::now();
    let station_code = normalize_code(&request.station_code);
    info!(%station_code, period = %request.period, "generation request");

    // ── Step 1: Authenticate ─────────────────────────────────────────────
    let station_row = stations.authenticate(&request.station_code, &request.password)?;

    // ── Step 2: Billing lookup (first match wins) ────────────────────────
    let billing_row = billing
        .find(&station_code, &request.period)
        .ok_or_else(|| ReportError::BillingRecordNotFound {
            station: station_code.clone(),
            period: request.period.clone(),
        })?;

    // ── Step 3: Merge and derive the field record ────────────────────────
    let merged = merge_records(&station_row, billing_row, &request.period);
    let record = derive(&merged);
    debug!(fields = record.len(), "field record ready");

    // ── Step 4: Substitution batch ───────────────────────────────────────
    let rules = build_replacements(&record);

    // ── Step 5: Clone, substitute, export ────────────────────────────────
    let assemble_start = Instant::now();
    let assembled = assemble(docs, config, &station_code, &request.period, &rules).await?;
    let assemble_duration_ms = assemble_start.elapsed().as_millis() as u64;

    // ── Step 6: Embed photos ─────────────────────────────────────────────
    let embed_start = Instant::now();
    let (final_document, embed_outcomes) = if request.images.is_empty() {
        (None, Vec::new())
    } else {
        let (bytes, outcomes) =
            embed_images(&assembled.bytes, &request.images, config.image_width_emu)?;
        (Some(bytes), outcomes)
    };
    let embed_duration_ms = embed_start.elapsed().as_millis() as u64;

    let images_embedded = embed_outcomes
        .iter()
        .filter(|o| matches!(o, EmbedOutcome::Inserted(_)))
        .count();
    let images_appended = embed_outcomes.len() - images_embedded;

    let stats = ReportStats {
        replacement_rules: rules.len(),
        images_embedded,
        images_appended,
        assemble_duration_ms,
        embed_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        doc = %assembled.doc_id,
        embedded = images_embedded,
        appended = images_appended,
        total_ms = stats.total_duration_ms,
        "report generated"
    );

    Ok(ReportOutput {
        document_id: assembled.doc_id,
        file_name: format!(
            "{}_{}_{}.docx",
            config.file_prefix, station_code, request.period
        ),
        raw_file_name: format!(
            "{}_{}_{}_raw.docx",
            config.file_prefix, station_code, request.period
        ),
        station_code,
        period: request.period.clone(),
        raw_document: assembled.bytes,
        final_document,
        embed_outcomes,
        stats,
    })
}

/// Synchronous wrapper around [`generate`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(
    request: &GenerationRequest,
    config: &GenerationConfig,
    docs: &dyn DocumentStore,
    stations: &StationDirectory,
    billing: &BillingTable,
) -> Result<ReportOutput, ReportError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ReportError::Internal(format!("failed to create tokio runtime: {e}")))?
        .block_on(generate(request, config, docs, stations, billing))
}

/// Write document bytes to a file.
///
/// Uses atomic write (temp file + rename) so a failed run never leaves a
/// half-written document behind.
pub async fn write_document(path: impl AsRef<Path>, bytes: &[u8]) -> Result<(), ReportError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ReportError::OutputWriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                }
            })?;
        }
    }

    let tmp_path = path.with_extension("docx.tmp");
    tokio::fs::write(&tmp_path, bytes)
        .await
        .map_err(|e| ReportError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| ReportError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    Ok(())
}

/// Best-effort deletion of a generated clone.
///
/// Failures are swallowed by design — the clone may already be gone, or the
/// caller may lack permission; neither should disturb a finished request.
pub async fn delete_report(docs: &dyn DocumentStore, doc: &DocumentId) {
    if let Err(e) = docs.delete(doc).await {
        debug!(%doc, error = %e, "ignoring delete failure");
    }
}

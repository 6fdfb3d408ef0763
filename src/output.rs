//! Output types returned by the top-level `generate*` calls.

use crate::pipeline::embed::EmbedOutcome;
use crate::remote::DocumentId;
use serde::{Deserialize, Serialize};

/// The finished report: bytes for download plus what happened on the way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportOutput {
    /// Id of the clone on the remote store. Kept so the caller can offer
    /// the explicit, optional cleanup (see [`crate::generate::delete_report`])
    /// or link to the online copy.
    pub document_id: DocumentId,

    /// Normalised station code the report was generated for.
    pub station_code: String,

    /// Billing period the report covers.
    pub period: String,

    /// Download name of the final (image-embedded) variant.
    pub file_name: String,

    /// Download name of the raw variant, exported before any photo was
    /// touched.
    pub raw_file_name: String,

    /// The raw export: placeholders substituted, no photos.
    pub raw_document: Vec<u8>,

    /// The image-embedded variant; `None` when no photos were uploaded.
    pub final_document: Option<Vec<u8>>,

    /// Where each uploaded photo landed, in slot order.
    pub embed_outcomes: Vec<EmbedOutcome>,

    pub stats: ReportStats,
}

impl ReportOutput {
    /// The bytes to offer for download: the embedded variant when photos
    /// were uploaded, the raw export otherwise.
    pub fn document(&self) -> &[u8] {
        self.final_document.as_deref().unwrap_or(&self.raw_document)
    }
}

/// Run statistics for one generation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportStats {
    /// Substitution rules sent in the batch (one per record field).
    pub replacement_rules: usize,

    /// Photos placed at their placeholder.
    pub images_embedded: usize,

    /// Photos appended at the end because their placeholder was absent.
    pub images_appended: usize,

    /// Clone + substitute + export wall time.
    pub assemble_duration_ms: u64,

    /// Embedding-pass wall time (0 when no photos were uploaded).
    pub embed_duration_ms: u64,

    pub total_duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_prefers_embedded_variant() {
        let mut output = ReportOutput {
            document_id: DocumentId("clone-1".into()),
            station_code: "ABC123".into(),
            period: "2024-07".into(),
            file_name: "BBNT_ABC123_2024-07.docx".into(),
            raw_file_name: "BBNT_ABC123_2024-07_raw.docx".into(),
            raw_document: vec![1],
            final_document: None,
            embed_outcomes: vec![],
            stats: ReportStats::default(),
        };
        assert_eq!(output.document(), &[1]);
        output.final_document = Some(vec![2]);
        assert_eq!(output.document(), &[2]);
    }

    #[test]
    fn output_serialises_to_json() {
        let output = ReportOutput {
            document_id: DocumentId("clone-1".into()),
            station_code: "ABC123".into(),
            period: "2024-07".into(),
            file_name: "a.docx".into(),
            raw_file_name: "a_raw.docx".into(),
            raw_document: vec![0, 1, 2],
            final_document: None,
            embed_outcomes: vec![EmbedOutcome::Appended],
            stats: ReportStats::default(),
        };
        let json = serde_json::to_string(&output).unwrap();
        let back: ReportOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(back.document_id, output.document_id);
        assert_eq!(back.embed_outcomes, output.embed_outcomes);
    }
}

//! Document assembly: drive the remote store from template to exported
//! bytes.
//!
//! The stage walks a fixed sequence of states — template ready, cloned,
//! substituted, exported — and each fallible transition maps to its own
//! error variant so callers can tell a failed clone (nothing was created)
//! from a failed substitution (the clone is unusable) from a failed export
//! (the substituted document exists and a retry of the request may
//! succeed). No transition is retried here; retry policy belongs to the
//! caller.

use crate::config::GenerationConfig;
use crate::error::ReportError;
use crate::pipeline::replace::ReplaceRule;
use crate::remote::{DocumentId, DocumentStore};
use tracing::{debug, info};

/// The assembled report: the clone's id plus its exported bytes.
#[derive(Debug, Clone)]
pub struct AssembledReport {
    pub doc_id: DocumentId,
    pub bytes: Vec<u8>,
}

/// Title for a clone: prefix, station, period, creation timestamp.
///
/// The timestamp makes concurrent requests for the same station and period
/// produce distinct clones; a same-second collision is accepted as
/// negligible.
pub fn clone_title(prefix: &str, station: &str, period: &str, timestamp: i64) -> String {
    format!("{prefix}_{station}_{period}_{timestamp}")
}

/// Clone the template, apply the substitution batch, export the result.
pub async fn assemble(
    store: &dyn DocumentStore,
    config: &GenerationConfig,
    station: &str,
    period: &str,
    rules: &[ReplaceRule],
) -> Result<AssembledReport, ReportError> {
    let title = clone_title(
        &config.file_prefix,
        station,
        period,
        chrono::Utc::now().timestamp(),
    );

    debug!(template = %config.template, %title, "cloning template");
    let doc_id = store
        .clone_template(&config.template, &title, &config.destination)
        .await
        .map_err(|e| ReportError::CloneFailed {
            detail: e.to_string(),
        })?;
    info!(%doc_id, %title, "template cloned");

    store
        .replace_all(&doc_id, rules)
        .await
        .map_err(|e| ReportError::SubstituteFailed {
            doc: doc_id.to_string(),
            detail: e.to_string(),
        })?;
    debug!(%doc_id, rules = rules.len(), "substitution batch applied");

    let bytes = store
        .export(&doc_id)
        .await
        .map_err(|e| ReportError::ExportFailed {
            doc: doc_id.to_string(),
            detail: e.to_string(),
        })?;
    info!(%doc_id, size = bytes.len(), "document exported");

    Ok(AssembledReport { doc_id, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationConfig;
    use crate::document::{Document, Paragraph};
    use crate::pipeline::replace::ReplaceRule;
    use crate::remote::memory::InMemoryStore;

    fn config() -> GenerationConfig {
        GenerationConfig::builder("tpl", "folder").build().unwrap()
    }

    fn rules() -> Vec<ReplaceRule> {
        vec![ReplaceRule {
            find: "$ma_tram".into(),
            replace: "ABC123".into(),
        }]
    }

    #[test]
    fn clone_title_composes_all_parts() {
        let title = clone_title("BBNT", "ABC123", "2024-07", 1_722_400_000);
        assert_eq!(title, "BBNT_ABC123_2024-07_1722400000");
    }

    #[tokio::test]
    async fn assemble_produces_substituted_bytes() {
        let store = InMemoryStore::new();
        let mut template = Document::new();
        template.push_paragraph(Paragraph::text("Trạm: $ma_tram"));
        store.put_document("tpl", template);

        let report = assemble(&store, &config(), "ABC123", "2024-07", &rules())
            .await
            .unwrap();

        let doc = Document::from_bytes(&report.bytes).unwrap();
        assert!(doc.contains_text("Trạm: ABC123"));

        let title = store.title(report.doc_id.as_str()).unwrap();
        assert!(title.starts_with("BBNT_ABC123_2024-07_"));
    }

    #[tokio::test]
    async fn missing_template_is_a_clone_failure() {
        let store = InMemoryStore::new();
        let err = assemble(&store, &config(), "ABC123", "2024-07", &rules())
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::CloneFailed { .. }));
    }
}

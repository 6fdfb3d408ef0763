//! In-memory implementation of both remote stores.
//!
//! Backs the end-to-end tests and lets callers run the whole pipeline
//! without network access: documents live in a map keyed by id, the batch
//! substitution applies [`crate::pipeline::replace::apply_replacements`]
//! under one lock (so the batch is atomic exactly like the remote call
//! promises), and export serialises the stored document model to bytes.
//!
//! Every trait call increments a counter; tests use it to assert that
//! failed logins and lookups never reach the remote services.

use crate::document::Document;
use crate::pipeline::replace::{apply_replacements, ReplaceRule};
use crate::record::Value;
use crate::remote::{DocumentId, DocumentStore, FolderId, RemoteError, SheetStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
struct Inner {
    documents: HashMap<String, Document>,
    titles: HashMap<String, String>,
    worksheets: HashMap<String, Vec<Vec<Value>>>,
    next_clone: u64,
}

/// Shared in-memory document and worksheet storage.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
    calls: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document (typically the template) under a fixed id.
    pub fn put_document(&self, id: &str, doc: Document) {
        self.inner
            .lock()
            .unwrap()
            .documents
            .insert(id.to_string(), doc);
    }

    /// Seed a worksheet, header row first.
    pub fn put_worksheet(&self, name: &str, rows: Vec<Vec<Value>>) {
        self.inner
            .lock()
            .unwrap()
            .worksheets
            .insert(name.to_string(), rows);
    }

    /// Snapshot of a stored document, if present.
    pub fn document(&self, id: &str) -> Option<Document> {
        self.inner.lock().unwrap().documents.get(id).cloned()
    }

    /// Title a clone was created under, if present.
    pub fn title(&self, id: &str) -> Option<String> {
        self.inner.lock().unwrap().titles.get(id).cloned()
    }

    pub fn document_count(&self) -> usize {
        self.inner.lock().unwrap().documents.len()
    }

    /// Number of store-trait calls made so far, across both traits.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn clone_template(
        &self,
        template: &DocumentId,
        title: &str,
        _folder: &FolderId,
    ) -> Result<DocumentId, RemoteError> {
        self.tick();
        let mut inner = self.inner.lock().unwrap();
        let doc = inner
            .documents
            .get(template.as_str())
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(template.to_string()))?;
        inner.next_clone += 1;
        let id = format!("clone-{}", inner.next_clone);
        inner.documents.insert(id.clone(), doc);
        inner.titles.insert(id.clone(), title.to_string());
        Ok(DocumentId(id))
    }

    async fn replace_all(
        &self,
        doc: &DocumentId,
        rules: &[ReplaceRule],
    ) -> Result<(), RemoteError> {
        self.tick();
        let mut inner = self.inner.lock().unwrap();
        let document = inner
            .documents
            .get_mut(doc.as_str())
            .ok_or_else(|| RemoteError::NotFound(doc.to_string()))?;
        apply_replacements(document, rules);
        Ok(())
    }

    async fn export(&self, doc: &DocumentId) -> Result<Vec<u8>, RemoteError> {
        self.tick();
        let inner = self.inner.lock().unwrap();
        let document = inner
            .documents
            .get(doc.as_str())
            .ok_or_else(|| RemoteError::NotFound(doc.to_string()))?;
        document
            .to_bytes()
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }

    async fn delete(&self, doc: &DocumentId) -> Result<(), RemoteError> {
        self.tick();
        let mut inner = self.inner.lock().unwrap();
        match inner.documents.remove(doc.as_str()) {
            Some(_) => {
                inner.titles.remove(doc.as_str());
                Ok(())
            }
            None => Err(RemoteError::NotFound(doc.to_string())),
        }
    }
}

#[async_trait]
impl SheetStore for InMemoryStore {
    async fn fetch_rows(&self, worksheet: &str) -> Result<Vec<Vec<Value>>, RemoteError> {
        self.tick();
        self.inner
            .lock()
            .unwrap()
            .worksheets
            .get(worksheet)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(worksheet.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Paragraph;

    fn template() -> Document {
        let mut doc = Document::new();
        doc.push_paragraph(Paragraph::text("Trạm: $ma_tram"));
        doc
    }

    #[tokio::test]
    async fn clone_then_replace_then_export() {
        let store = InMemoryStore::new();
        store.put_document("tpl", template());

        let id = store
            .clone_template(&"tpl".into(), "BBNT_ABC123_2024-07_1", &"folder".into())
            .await
            .unwrap();
        store
            .replace_all(
                &id,
                &[ReplaceRule {
                    find: "$ma_tram".into(),
                    replace: "ABC123".into(),
                }],
            )
            .await
            .unwrap();

        let bytes = store.export(&id).await.unwrap();
        let doc = Document::from_bytes(&bytes).unwrap();
        assert!(doc.contains_text("Trạm: ABC123"));

        // the template itself is untouched
        assert!(store.document("tpl").unwrap().contains_text("$ma_tram"));
        assert_eq!(store.title(id.as_str()).as_deref(), Some("BBNT_ABC123_2024-07_1"));
    }

    #[tokio::test]
    async fn clone_of_missing_template_is_not_found() {
        let store = InMemoryStore::new();
        let err = store
            .clone_template(&"nope".into(), "t", &"folder".into())
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_removes_document() {
        let store = InMemoryStore::new();
        store.put_document("tpl", template());
        let id = store
            .clone_template(&"tpl".into(), "t", &"folder".into())
            .await
            .unwrap();
        assert_eq!(store.document_count(), 2);
        store.delete(&id).await.unwrap();
        assert_eq!(store.document_count(), 1);
    }
}

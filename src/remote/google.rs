//! REST client for the Google Drive / Docs / Sheets endpoints.
//!
//! One [`GoogleClient`] serves both store traits: Drive `files.copy`,
//! `files.export` and `files.delete` plus Docs `documents.batchUpdate`
//! implement [`DocumentStore`], and Sheets `values.get` implements
//! [`SheetStore`]. The batch-update request carries one `replaceAllText`
//! entry per rule with `matchCase` set, which is exactly the substitution
//! contract the pipeline assumes: case-sensitive, replace-all, atomic per
//! batch.
//!
//! The caller supplies a ready OAuth bearer token; obtaining and refreshing
//! credentials is outside this crate.

use crate::error::ReportError;
use crate::pipeline::replace::ReplaceRule;
use crate::record::Value;
use crate::remote::{DocumentId, DocumentStore, FolderId, RemoteError, SheetStore};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const DRIVE_BASE: &str = "https://www.googleapis.com/drive/v3";
const DOCS_BASE: &str = "https://docs.googleapis.com/v1";
const SHEETS_BASE: &str = "https://sheets.googleapis.com/v4";

/// Export format requested from the document service.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Authenticated HTTP handle for all three services.
///
/// Construct once per process and share by reference; the underlying
/// [`reqwest::Client`] pools connections internally.
pub struct GoogleClient {
    http: reqwest::Client,
    token: String,
    spreadsheet_id: String,
    export_mime: String,
    drive_base: String,
    docs_base: String,
    sheets_base: String,
}

impl GoogleClient {
    /// Build a client with the given bearer token and spreadsheet id.
    pub fn new(
        token: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, ReportError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ReportError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            token: token.into(),
            spreadsheet_id: spreadsheet_id.into(),
            export_mime: DOCX_MIME.to_string(),
            drive_base: DRIVE_BASE.to_string(),
            docs_base: DOCS_BASE.to_string(),
            sheets_base: SHEETS_BASE.to_string(),
        })
    }

    /// Override the export MIME type (default: DOCX).
    pub fn with_export_mime(mut self, mime: impl Into<String>) -> Self {
        self.export_mime = mime.into();
        self
    }

    /// Point the client at different service roots (tests, proxies).
    pub fn with_base_urls(
        mut self,
        drive: impl Into<String>,
        docs: impl Into<String>,
        sheets: impl Into<String>,
    ) -> Self {
        self.drive_base = drive.into();
        self.docs_base = docs.into();
        self.sheets_base = sheets.into();
        self
    }
}

fn transport(e: reqwest::Error) -> RemoteError {
    RemoteError::Transport(e.to_string())
}

/// Map non-success statuses; the body is truncated so error messages stay
/// readable in a terminal.
async fn check_status(
    response: reqwest::Response,
    context: &str,
) -> Result<reqwest::Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(RemoteError::NotFound(context.to_string()));
    }
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > 300 {
        let mut end = 300;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
        body.push('…');
    }
    Err(RemoteError::Status {
        status: status.as_u16(),
        body,
    })
}

fn cell_value(v: serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Empty,
        serde_json::Value::String(s) => Value::Text(s),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or_default()),
        serde_json::Value::Bool(b) => Value::Text(b.to_string()),
        other => Value::Text(other.to_string()),
    }
}

#[async_trait]
impl DocumentStore for GoogleClient {
    async fn clone_template(
        &self,
        template: &DocumentId,
        title: &str,
        folder: &FolderId,
    ) -> Result<DocumentId, RemoteError> {
        #[derive(Deserialize)]
        struct FileResource {
            id: String,
        }

        let url = format!("{}/files/{}/copy", self.drive_base, template);
        debug!(%template, title, "cloning template");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .query(&[("supportsAllDrives", "true")])
            .json(&serde_json::json!({
                "name": title,
                "parents": [folder.0.as_str()],
            }))
            .send()
            .await
            .map_err(transport)?;
        let response = check_status(response, template.as_str()).await?;
        let file: FileResource = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        Ok(DocumentId(file.id))
    }

    async fn replace_all(
        &self,
        doc: &DocumentId,
        rules: &[ReplaceRule],
    ) -> Result<(), RemoteError> {
        let requests: Vec<serde_json::Value> = rules
            .iter()
            .map(|rule| {
                serde_json::json!({
                    "replaceAllText": {
                        "containsText": { "text": &rule.find, "matchCase": true },
                        "replaceText": &rule.replace,
                    }
                })
            })
            .collect();

        let url = format!("{}/documents/{}:batchUpdate", self.docs_base, doc);
        debug!(%doc, rules = rules.len(), "applying substitution batch");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "requests": requests }))
            .send()
            .await
            .map_err(transport)?;
        check_status(response, doc.as_str()).await?;
        Ok(())
    }

    async fn export(&self, doc: &DocumentId) -> Result<Vec<u8>, RemoteError> {
        let url = format!("{}/files/{}/export", self.drive_base, doc);
        debug!(%doc, mime = %self.export_mime, "exporting document");
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("mimeType", self.export_mime.as_str())])
            .send()
            .await
            .map_err(transport)?;
        let response = check_status(response, doc.as_str()).await?;
        let bytes = response.bytes().await.map_err(transport)?;
        Ok(bytes.to_vec())
    }

    async fn delete(&self, doc: &DocumentId) -> Result<(), RemoteError> {
        let url = format!("{}/files/{}", self.drive_base, doc);
        debug!(%doc, "deleting document");
        let response = self
            .http
            .delete(&url)
            .bearer_auth(&self.token)
            .query(&[("supportsAllDrives", "true")])
            .send()
            .await
            .map_err(transport)?;
        check_status(response, doc.as_str()).await?;
        Ok(())
    }
}

#[async_trait]
impl SheetStore for GoogleClient {
    async fn fetch_rows(&self, worksheet: &str) -> Result<Vec<Vec<Value>>, RemoteError> {
        #[derive(Deserialize)]
        struct ValueRange {
            #[serde(default)]
            values: Vec<Vec<serde_json::Value>>,
        }

        let url = format!(
            "{}/spreadsheets/{}/values/{}",
            self.sheets_base, self.spreadsheet_id, worksheet
        );
        debug!(worksheet, "fetching worksheet rows");
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(transport)?;
        let response = check_status(response, worksheet).await?;
        let range: ValueRange = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        Ok(range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_value).collect())
            .collect())
    }
}

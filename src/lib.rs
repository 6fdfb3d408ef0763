//! # bbnt-docgen
//!
//! Generate station acceptance reports (BBNT — biên bản nghiệm thu) from
//! spreadsheet records and a shared document template.
//!
//! ## Why this crate?
//!
//! Field crews close out a month by filling the same acceptance report over
//! and over: look the station up, copy a dozen billing figures into a Word
//! template, paste in the site photos, export, send. This crate does the
//! whole round mechanically — authenticate against the station directory,
//! fetch the month's billing row, fill the shared template by placeholder
//! substitution, and drop the uploaded photos onto their `${AnhN}` marks.
//!
//! ## Pipeline Overview
//!
//! ```text
//! request (code + password + period + photos)
//!  │
//!  ├─ 1. Login     station directory, case-insensitive code match
//!  ├─ 2. Lookup    first billing row for (station, period)
//!  ├─ 3. Derive    evaluation flags + textual amount (never fails)
//!  ├─ 4. Rules     one $key → value replace-all rule per field
//!  ├─ 5. Assemble  clone template → atomic batch substitute → export
//!  └─ 6. Embed     ${Anh1}…${Anh8} → photos, first match wins,
//!                  append-at-end fallback
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bbnt_docgen::{
//!     generate, BillingTable, GenerationConfig, GenerationRequest, GoogleClient,
//!     StationDirectory,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GenerationConfig::builder("template-doc-id", "dest-folder-id")
//!         .build()?;
//!     let client = GoogleClient::new(
//!         std::env::var("GOOGLE_ACCESS_TOKEN")?,
//!         "spreadsheet-id",
//!         config.api_timeout_secs,
//!     )?;
//!
//!     let stations = StationDirectory::load(&client, &config.station_worksheet).await?;
//!     let billing = BillingTable::load(&client, &config.billing_worksheet).await?;
//!
//!     let request = GenerationRequest {
//!         station_code: "abc123".into(),
//!         password: "pw1".into(),
//!         period: "2024-07".into(),
//!         images: Default::default(),
//!     };
//!     let report = generate(&request, &config, &client, &stations, &billing).await?;
//!     std::fs::write(&report.file_name, report.document())?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `bbnt` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! bbnt-docgen = { version = "0.3", default-features = false }
//! ```
//!
//! ## Remote services
//!
//! The document and spreadsheet services are opaque collaborators behind
//! the [`DocumentStore`] and [`SheetStore`] traits. [`GoogleClient`] talks
//! to the real REST endpoints with a caller-supplied bearer token;
//! [`remote::memory::InMemoryStore`] runs the same pipeline entirely
//! offline and backs the end-to-end tests.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod document;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod record;
pub mod remote;
pub mod sheets;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{GenerationConfig, GenerationConfigBuilder};
pub use document::{Document, DEFAULT_IMAGE_WIDTH_EMU, EMU_PER_INCH};
pub use error::ReportError;
pub use generate::{delete_report, generate, generate_sync, write_document, GenerationRequest};
pub use output::{ReportOutput, ReportStats};
pub use pipeline::assemble::clone_title;
pub use pipeline::derive::derive;
pub use pipeline::embed::{embed_images, EmbedOutcome, InsertLocation, SlotSet, SLOT_COUNT};
pub use pipeline::replace::{apply_replacements, build_replacements, ReplaceRule};
pub use record::{FieldRecord, Value};
pub use remote::google::{GoogleClient, DOCX_MIME};
pub use remote::{DocumentId, DocumentStore, FolderId, RemoteError, SheetStore};
pub use sheets::{merge_records, normalize_code, BillingTable, StationDirectory};

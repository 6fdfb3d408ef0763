//! End-to-end tests for bbnt-docgen.
//!
//! These run the whole pipeline — login, billing lookup, derive,
//! substitute, export, embed — against the in-memory store, so they need
//! no network, no credentials, and no live spreadsheet. The store counts
//! its trait calls, which is how the "failed login makes zero remote
//! calls" guarantees are pinned down.

use bbnt_docgen::document::{Cell, Document, Paragraph, Row, Table};
use bbnt_docgen::remote::memory::InMemoryStore;
use bbnt_docgen::{
    delete_report, generate, BillingTable, EmbedOutcome, GenerationConfig, GenerationRequest,
    InsertLocation, ReportError, SlotSet, StationDirectory, Value,
};

// ── Test fixtures ────────────────────────────────────────────────────────────

/// 1×1 transparent PNG.
const PNG_1X1: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0xDA, 0x63, 0x64,
    0x60, 0xF8, 0x5F, 0x0F, 0x00, 0x02, 0x87, 0x01, 0x80, 0xEB, 0x47, 0xBA, 0x92, 0x00, 0x00,
    0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

const TEMPLATE_ID: &str = "template-1";

fn template() -> Document {
    let mut doc = Document::new();
    doc.push_paragraph(Paragraph::text("BIÊN BẢN NGHIỆM THU THÁNG $Thang"));
    doc.push_paragraph(Paragraph::text(
        "Trạm: $ma_tram — Loại cột: $Loai_cot ($Danh_gia_cot)",
    ));
    doc.push_table(Table {
        rows: vec![
            Row {
                cells: vec![Cell::text("Tổng tiền kỳ"), Cell::text("$tongtienky")],
            },
            Row {
                cells: vec![Cell::text("Bằng chữ"), Cell::text("$Tien_bang_chu")],
            },
            Row {
                cells: vec![Cell::text("Ảnh hiện trạng"), Cell::text("${Anh1}")],
            },
        ],
    });
    doc.push_paragraph(Paragraph::text("Ảnh bổ sung: ${Anh2}"));
    doc
}

fn station_rows() -> Vec<Vec<Value>> {
    vec![
        vec![
            "ma_tram".into(),
            "Password".into(),
            "Loai_cot".into(),
            "Phong_may".into(),
            "Dieu_hoa".into(),
        ],
        vec![
            "abc123".into(),
            "pw1".into(),
            "cột dây co".into(),
            "Không thuê".into(),
            "Thuê ngoài".into(),
        ],
    ]
}

fn billing_rows() -> Vec<Vec<Value>> {
    vec![
        vec!["Thang".into(), "Ma_vi_tri".into(), "tongtienky".into()],
        vec!["2024-06".into(), "ABC123".into(), Value::Number(1000.0)],
        // two rows for 2024-07: first-match policy must pick 1500.5
        vec!["2024-07".into(), "ABC123".into(), Value::Number(1500.5)],
        vec!["2024-07".into(), "abc123".into(), Value::Number(9999.0)],
    ]
}

fn store_with_template() -> InMemoryStore {
    let store = InMemoryStore::new();
    store.put_document(TEMPLATE_ID, template());
    store
}

fn config() -> GenerationConfig {
    GenerationConfig::builder(TEMPLATE_ID, "folder-1")
        .build()
        .expect("valid config")
}

fn tables() -> (StationDirectory, BillingTable) {
    (
        StationDirectory::from_rows(&station_rows()),
        BillingTable::from_rows(&billing_rows()),
    )
}

fn request(station: &str, password: &str, period: &str) -> GenerationRequest {
    GenerationRequest {
        station_code: station.to_string(),
        password: password.to_string(),
        period: period.to_string(),
        images: SlotSet::new(),
    }
}

// ── Authentication and lookup failures ───────────────────────────────────────

#[tokio::test]
async fn wrong_password_fails_before_any_remote_call() {
    let store = store_with_template();
    let calls_before = store.call_count();
    let (stations, billing) = tables();

    let err = generate(
        &request("ABC123", "nope", "2024-07"),
        &config(),
        &store,
        &stations,
        &billing,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ReportError::WrongPassword { .. }), "got: {err}");
    assert_eq!(store.call_count(), calls_before, "no remote call expected");
    assert_eq!(store.document_count(), 1, "only the template exists");
}

#[tokio::test]
async fn unknown_station_is_its_own_error() {
    let store = store_with_template();
    let (stations, billing) = tables();

    let err = generate(
        &request("ZZZ999", "pw1", "2024-07"),
        &config(),
        &store,
        &stations,
        &billing,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ReportError::UnknownStation { .. }), "got: {err}");
    assert_eq!(store.call_count(), 0);
}

#[tokio::test]
async fn missing_billing_row_creates_no_clone() {
    let store = store_with_template();
    let (stations, billing) = tables();

    let err = generate(
        &request("ABC123", "pw1", "2024-12"),
        &config(),
        &store,
        &stations,
        &billing,
    )
    .await
    .unwrap_err();

    match err {
        ReportError::BillingRecordNotFound { station, period } => {
            assert_eq!(station, "ABC123");
            assert_eq!(period, "2024-12");
        }
        other => panic!("expected BillingRecordNotFound, got: {other}"),
    }
    assert_eq!(store.call_count(), 0, "lookup failure is pre-remote");
    assert_eq!(store.document_count(), 1);
}

// ── Happy path ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn raw_report_substitutes_all_fields() {
    let store = store_with_template();
    let (stations, billing) = tables();

    let report = generate(
        &request(" abc123 ", "pw1", "2024-07"),
        &config(),
        &store,
        &stations,
        &billing,
    )
    .await
    .expect("generation should succeed");

    assert_eq!(report.station_code, "ABC123");
    assert_eq!(report.file_name, "BBNT_ABC123_2024-07.docx");
    assert_eq!(report.raw_file_name, "BBNT_ABC123_2024-07_raw.docx");
    assert!(report.final_document.is_none(), "no photos uploaded");

    let doc = Document::from_bytes(&report.raw_document).unwrap();
    assert!(doc.contains_text("THÁNG 2024-07"));
    assert!(doc.contains_text("Trạm: abc123"));
    assert!(doc.contains_text("cột dây co (Đạt)"));
    // first-match policy: 1500.5, not the later 9999 row
    assert!(doc.contains_text("1500.5"));
    assert!(!doc.contains_text("9999"));
    // field placeholders are gone; image placeholders survive the first pass
    assert!(!doc.contains_text("$ma_tram"));
    assert!(!doc.contains_text("$Tien_bang_chu"));
    assert!(doc.contains_text("${Anh1}"));
    assert!(doc.contains_text("${Anh2}"));

    assert!(report.stats.replacement_rules > 0);
    assert_eq!(report.stats.images_embedded, 0);

    let title = store.title(report.document_id.as_str()).unwrap();
    assert!(
        title.starts_with("BBNT_ABC123_2024-07_"),
        "clone title carries station, period and timestamp: {title}"
    );
}

#[tokio::test]
async fn photos_land_on_their_placeholders() {
    let store = store_with_template();
    let (stations, billing) = tables();

    let mut req = request("ABC123", "pw1", "2024-07");
    req.images.set(0, PNG_1X1.to_vec()); // ${Anh1} — in a table cell
    req.images.set(1, PNG_1X1.to_vec()); // ${Anh2} — in a paragraph
    req.images.set(2, PNG_1X1.to_vec()); // ${Anh3} — absent, must append

    let report = generate(&req, &config(), &store, &stations, &billing)
        .await
        .expect("generation should succeed");

    assert_eq!(
        report.embed_outcomes,
        vec![
            EmbedOutcome::Inserted(InsertLocation::Cell {
                table: 0,
                row: 2,
                cell: 1
            }),
            EmbedOutcome::Inserted(InsertLocation::Paragraph { index: 2 }),
            EmbedOutcome::Appended,
        ]
    );
    assert_eq!(report.stats.images_embedded, 2);
    assert_eq!(report.stats.images_appended, 1);

    let raw = Document::from_bytes(&report.raw_document).unwrap();
    let finished = Document::from_bytes(report.final_document.as_ref().unwrap()).unwrap();

    // the raw variant is untouched by the embedding pass
    assert_eq!(raw.image_count(), 0);
    assert!(raw.contains_text("${Anh1}"));

    assert_eq!(finished.image_count(), 3);
    assert!(!finished.contains_text("${Anh1}"));
    assert!(!finished.contains_text("${Anh2}"));
    // the appended photo added exactly one trailing paragraph
    assert_eq!(finished.paragraph_count(), raw.paragraph_count() + 1);
}

#[tokio::test]
async fn broken_photo_discards_partial_output() {
    let store = store_with_template();
    let (stations, billing) = tables();

    let mut req = request("ABC123", "pw1", "2024-07");
    req.images.set(0, b"not an image".to_vec());

    let err = generate(&req, &config(), &store, &stations, &billing)
        .await
        .unwrap_err();
    assert!(matches!(err, ReportError::EmbedFailed { .. }), "got: {err}");
}

// ── Cleanup ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_report_removes_the_clone() {
    let store = store_with_template();
    let (stations, billing) = tables();

    let report = generate(
        &request("ABC123", "pw1", "2024-07"),
        &config(),
        &store,
        &stations,
        &billing,
    )
    .await
    .unwrap();

    assert_eq!(store.document_count(), 2);
    delete_report(&store, &report.document_id).await;
    assert_eq!(store.document_count(), 1, "clone deleted, template kept");
}

#[tokio::test]
async fn delete_report_swallows_failures() {
    let store = InMemoryStore::new();
    // deleting an id that never existed completes without error
    delete_report(&store, &"no-such-doc".into()).await;
}

// ── Sheet-backed helpers ─────────────────────────────────────────────────────

#[tokio::test]
async fn tables_load_through_the_sheet_store() {
    let store = store_with_template();
    store.put_worksheet("CSDL", station_rows());
    store.put_worksheet("Taichinh", billing_rows());

    let stations = StationDirectory::load(&store, "CSDL").await.unwrap();
    let billing = BillingTable::load(&store, "Taichinh").await.unwrap();

    assert_eq!(stations.len(), 1);
    assert_eq!(billing.periods(), vec!["2024-06", "2024-07"]);

    let report = generate(
        &request("ABC123", "pw1", "2024-06"),
        &config(),
        &store,
        &stations,
        &billing,
    )
    .await
    .unwrap();
    let doc = Document::from_bytes(&report.raw_document).unwrap();
    assert!(doc.contains_text("1000"));
}

#[tokio::test]
async fn output_round_trips_through_json() {
    let store = store_with_template();
    let (stations, billing) = tables();

    let report = generate(
        &request("ABC123", "pw1", "2024-07"),
        &config(),
        &store,
        &stations,
        &billing,
    )
    .await
    .unwrap();

    let json = serde_json::to_string(&report).expect("ReportOutput must serialise");
    let back: bbnt_docgen::ReportOutput = serde_json::from_str(&json).unwrap();
    assert_eq!(back.document_id, report.document_id);
    assert_eq!(back.raw_document, report.raw_document);
}

//! Derived fields: the computed keys appended to the merged record before
//! substitution.
//!
//! Three evaluation flags compare a profile field against a sentinel and a
//! fourth renders the billing amount as text. The whole stage is a pure
//! function over the record and can never fail: every odd input degrades to
//! a string fallback, because a half-filled report the crew can correct by
//! hand beats a generation error they cannot.

use crate::record::{FieldRecord, Value};

/// "Đạt" — the pass mark.
const PASS: &str = "Đạt";
/// "Không đánh giá" — not evaluated.
const NOT_EVALUATED: &str = "Không đánh giá";
/// Sentinel meaning the station does not rent the facility.
const NOT_RENTED: &str = "Không thuê";

/// Compute the derived keys and return the extended record.
///
/// * `Danh_gia_cot` — pass only when `Loai_cot` is exactly `"cột dây co"`;
///   a missing field is not evaluated.
/// * `Danh_gia_PM` / `Danh_gia_DH` — pass unless `Phong_may` / `Dieu_hoa`
///   is exactly `"Không thuê"`; a missing field compares unequal and
///   therefore passes.
/// * `Tien_bang_chu` — textual form of `tongtienky`, see [`amount_as_text`].
pub fn derive(record: &FieldRecord) -> FieldRecord {
    let mut out = record.clone();

    let cot = out.text("Loai_cot");
    out.insert(
        "Danh_gia_cot",
        if cot.as_deref() == Some("cột dây co") {
            PASS
        } else {
            NOT_EVALUATED
        },
    );

    let phong_may = out.text("Phong_may");
    out.insert(
        "Danh_gia_PM",
        if phong_may.as_deref() != Some(NOT_RENTED) {
            PASS
        } else {
            NOT_EVALUATED
        },
    );

    let dieu_hoa = out.text("Dieu_hoa");
    out.insert(
        "Danh_gia_DH",
        if dieu_hoa.as_deref() != Some(NOT_RENTED) {
            PASS
        } else {
            NOT_EVALUATED
        },
    );

    out.insert("Tien_bang_chu", amount_as_text(record.get("tongtienky")));
    out
}

/// Textual form of the billing amount.
///
/// Numeric parse first: whole values render integer-formatted, fractional
/// values render as the number prints. Unparseable text falls back to the
/// raw string; a missing or unset field yields the empty string.
pub fn amount_as_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Empty) => String::new(),
        Some(Value::Number(n)) => Value::Number(*n).to_string(),
        Some(Value::Text(s)) => match s.trim().parse::<f64>() {
            Ok(n) => Value::Number(n).to_string(),
            Err(_) => s.clone(),
        },
    }
}

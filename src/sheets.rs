//! Station directory and billing table: the two worksheets behind every
//! generation request.
//!
//! The spreadsheet carries a `CSDL` worksheet (one row per station, columns
//! `ma_tram` and `Password` among the profile fields) and a `Taichinh`
//! worksheet (one row per station per billing period, columns `Ma_vi_tri`,
//! `Thang`, `tongtienky`, …). Both are loaded whole and kept as ordered
//! [`FieldRecord`]s; the pipeline only ever consumes the merged row.
//!
//! Station codes match case-insensitively everywhere (the field crews type
//! them free-form); periods match on exact string form.

use crate::error::ReportError;
use crate::record::{FieldRecord, Value};
use crate::remote::SheetStore;
use std::collections::BTreeSet;
use tracing::info;

/// Worksheet holding station profiles and login credentials.
pub const STATION_WORKSHEET: &str = "CSDL";

/// Worksheet holding per-period billing rows.
pub const BILLING_WORKSHEET: &str = "Taichinh";

/// Canonical form of a station code: trimmed, uppercase.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Turn raw worksheet rows (header row first) into records.
///
/// Header cells are trimmed; a row shorter than the header leaves its
/// trailing fields [`Value::Empty`], a longer row drops the excess.
fn records_from_rows(rows: &[Vec<Value>]) -> Vec<FieldRecord> {
    let Some((header, body)) = rows.split_first() else {
        return Vec::new();
    };
    let columns: Vec<String> = header.iter().map(|c| c.to_string().trim().to_string()).collect();

    body.iter()
        .map(|row| {
            columns
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let value = row.get(i).cloned().unwrap_or(Value::Empty);
                    (name.clone(), value)
                })
                .collect()
        })
        .collect()
}

/// All station profile rows, with login lookup.
#[derive(Debug, Clone, Default)]
pub struct StationDirectory {
    rows: Vec<FieldRecord>,
}

impl StationDirectory {
    pub fn from_rows(rows: &[Vec<Value>]) -> Self {
        Self {
            rows: records_from_rows(rows),
        }
    }

    /// Fetch and parse the station worksheet.
    pub async fn load(store: &dyn SheetStore, worksheet: &str) -> Result<Self, ReportError> {
        let rows = store
            .fetch_rows(worksheet)
            .await
            .map_err(|e| ReportError::Internal(format!("loading worksheet '{worksheet}': {e}")))?;
        let directory = Self::from_rows(&rows);
        info!(worksheet, stations = directory.len(), "loaded station directory");
        Ok(directory)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Check a station login and return the station's profile row.
    ///
    /// Unknown code and wrong password are distinct failures — the operator
    /// is told which one happened. The password compares against the string
    /// form of the stored cell, so numeric passwords in the sheet behave.
    pub fn authenticate(
        &self,
        station_code: &str,
        password: &str,
    ) -> Result<FieldRecord, ReportError> {
        let code = normalize_code(station_code);
        let row = self
            .rows
            .iter()
            .find(|r| {
                r.text("ma_tram")
                    .map(|s| normalize_code(&s) == code)
                    .unwrap_or(false)
            })
            .ok_or_else(|| ReportError::UnknownStation {
                station: code.clone(),
            })?;

        let stored = row.text("Password").unwrap_or_default();
        if stored != password {
            return Err(ReportError::WrongPassword { station: code });
        }
        Ok(row.clone())
    }
}

/// All billing rows, with per-period lookup.
#[derive(Debug, Clone, Default)]
pub struct BillingTable {
    rows: Vec<FieldRecord>,
}

impl BillingTable {
    pub fn from_rows(rows: &[Vec<Value>]) -> Self {
        Self {
            rows: records_from_rows(rows),
        }
    }

    /// Fetch and parse the billing worksheet.
    pub async fn load(store: &dyn SheetStore, worksheet: &str) -> Result<Self, ReportError> {
        let rows = store
            .fetch_rows(worksheet)
            .await
            .map_err(|e| ReportError::Internal(format!("loading worksheet '{worksheet}': {e}")))?;
        let table = Self::from_rows(&rows);
        info!(worksheet, rows = table.len(), "loaded billing table");
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First row matching the station (case-insensitive) and period (exact
    /// string form). Duplicate rows for the same station and period are
    /// possible in the sheet; the first one wins by policy.
    pub fn find(&self, station_code: &str, period: &str) -> Option<&FieldRecord> {
        let code = normalize_code(station_code);
        self.rows.iter().find(|r| {
            r.text("Ma_vi_tri")
                .map(|s| normalize_code(&s) == code)
                .unwrap_or(false)
                && r.text("Thang").as_deref() == Some(period)
        })
    }

    /// Distinct billing periods, sorted — what a front-end offers in its
    /// period picker. Blank cells are skipped.
    pub fn periods(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|r| r.text("Thang"))
            .filter(|t| !t.trim().is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Merge one station row with one billing row into the request's
/// [`FieldRecord`]. Billing fields overwrite profile fields on conflict and
/// `Thang` is pinned to the requested period.
pub fn merge_records(station: &FieldRecord, billing: &FieldRecord, period: &str) -> FieldRecord {
    let mut merged = station.clone();
    merged.merge(billing);
    merged.insert("Thang", period);
    merged
}

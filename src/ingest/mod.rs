//! Bulk ingestion of platform usage reports.
//!
//! A report arrives as the platform's Excel workbook (`.xlsx` or `.xls`), or
//! as the same sheet exported to a JSON array of row objects (`.json`). Every
//! row is stored as-is (after cell coercion) under a new report record;
//! nothing is matched against the catalog here.

mod cells;
pub mod columns;
mod workbook;

use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::store::{NewReport, SqliteStore};
use crate::types::{Caller, ExcelReport, UsageRow};
use crate::validation::validate_required;

pub use columns::usage_row;
pub use workbook::WorkbookKind;

/// How an uploaded report is encoded, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Workbook(WorkbookKind),
    Json,
}

impl ReportFormat {
    pub fn from_file_name(file_name: &str) -> Result<Self> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("xlsx") => Ok(Self::Workbook(WorkbookKind::Xlsx)),
            Some("xls") => Ok(Self::Workbook(WorkbookKind::Xls)),
            Some("json") => Ok(Self::Json),
            _ => Err(Error::Validation(format!(
                "Report '{file_name}' must be an .xlsx, .xls or .json file"
            ))),
        }
    }
}

fn json_records(bytes: &[u8]) -> Result<Vec<Map<String, Value>>> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| Error::Validation(format!("Report is not valid JSON: {e}")))?;

    let Value::Array(records) = value else {
        return Err(Error::Validation(
            "Report must be an array of row objects".to_string(),
        ));
    };

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| match record {
            Value::Object(map) => Ok(map),
            _ => Err(Error::Validation(format!("Row {index} is not an object"))),
        })
        .collect()
}

/// Parses an uploaded report body into usage rows.
pub fn parse_report(format: ReportFormat, bytes: &[u8]) -> Result<Vec<UsageRow>> {
    let records = match format {
        ReportFormat::Workbook(kind) => workbook::read_records(kind, bytes)?,
        ReportFormat::Json => json_records(bytes)?,
    };
    Ok(records.iter().map(usage_row).collect())
}

fn default_description(file_name: &str) -> String {
    format!("Uploaded file: {file_name}")
}

/// Stores a report and its rows in one transaction.
pub fn upload_report(
    store: &SqliteStore,
    caller: &Caller,
    file_name: &str,
    bytes: &[u8],
    description: Option<&str>,
) -> Result<ExcelReport> {
    validate_required(file_name, "file name")?;
    let format = ReportFormat::from_file_name(file_name)?;
    let rows = parse_report(format, bytes)?;

    let description = description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map_or_else(|| default_description(file_name), str::to_string);

    let report = store.create_report(
        &NewReport {
            filename: file_name.to_string(),
            original_name: file_name.to_string(),
            description: Some(description),
            uploaded_by_user_id: Some(caller.id),
        },
        &rows,
    )?;

    tracing::info!(
        "Ingested report {} ({}, {} rows) by user {}",
        report.id,
        file_name,
        report.row_count,
        caller.id
    );
    Ok(report)
}

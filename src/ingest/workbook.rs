//! Excel workbooks as report records.
//!
//! The first worksheet is read; its first row holds the column headers and
//! every later non-blank row becomes one record keyed by those headers.

use std::io::Cursor;

use calamine::{Data, Range, Reader, Xls, Xlsx};
use serde_json::{Map, Number, Value};

use crate::error::{Error, Result};

// Whole floats below 2^53 are read as integers so codes like UPCs keep no ".0".
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

/// Excel container format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkbookKind {
    Xlsx,
    Xls,
}

fn first_sheet<R>(bytes: &[u8]) -> Result<Range<Data>>
where
    R: Reader<Cursor<Vec<u8>>>,
    R::Error: std::fmt::Display,
{
    let unreadable =
        |e: R::Error| Error::Validation(format!("Report is not a readable workbook: {e}"));

    let mut workbook = R::new(Cursor::new(bytes.to_vec())).map_err(unreadable)?;
    workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::Validation("Workbook has no worksheets".to_string()))?
        .map_err(unreadable)
}

fn float_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < MAX_EXACT_FLOAT {
        return Value::from(value as i64);
    }
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Int(n) => Value::from(*n),
        Data::Float(f) => float_value(*f),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map_or_else(|| float_value(dt.as_f64()), |dt| Value::String(dt.to_string())),
        Data::Error(_) | Data::Empty => Value::Null,
    }
}

fn header(cell: &Data) -> Option<String> {
    let name = match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Empty | Data::Error(_) => return None,
        other => other.to_string(),
    };
    (!name.is_empty()).then_some(name)
}

fn records(range: &Range<Data>) -> Vec<Map<String, Value>> {
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Vec::new();
    };
    let headers: Vec<Option<String>> = header_row.iter().map(header).collect();

    rows.filter(|row| row.iter().any(|cell| !matches!(cell, Data::Empty)))
        .map(|row| {
            headers
                .iter()
                .zip(row)
                .filter_map(|(name, cell)| Some((name.clone()?, cell_value(cell))))
                .collect()
        })
        .collect()
}

/// Reads the records of the first worksheet of an uploaded workbook.
pub fn read_records(kind: WorkbookKind, bytes: &[u8]) -> Result<Vec<Map<String, Value>>> {
    let range = match kind {
        WorkbookKind::Xlsx => first_sheet::<Xlsx<_>>(bytes)?,
        WorkbookKind::Xls => first_sheet::<Xls<_>>(bytes)?,
    };
    Ok(records(&range))
}

use std::str::FromStr;

use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;

use super::SqliteStore;
use super::sqlite::{format_datetime, parse_datetime};
use crate::error::{Error, Result};
use crate::types::{
    ExcelReport, PROCESSED_STATUS_PENDING, RawUsageRow, UPLOAD_STATUS_COMPLETED, UsageRow,
};

/// Metadata for a report about to be stored.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub filename: String,
    pub original_name: String,
    pub description: Option<String>,
    pub uploaded_by_user_id: Option<i64>,
}

const REPORT_SELECT: &str = "SELECT r.id, r.filename, r.original_name, r.upload_date, r.upload_status,
        r.description, r.uploaded_by_user_id,
        (SELECT COUNT(*) FROM raw_usage_rows u WHERE u.report_id = r.id)
     FROM excel_reports r";

const ROW_COLUMNS: &str = "id, report_id, row_index, period, platform, right_type, territory,
    content_type, usage_type, performer_name, track_title, album_title, author_words_name,
    author_music_name, licensor_share_author_percent, licensor_share_neighboring_percent, isrc,
    upc, copyright, quantity, total_royalty_author, total_royalty_neighboring,
    licensor_share_author_licensor_percent, licensor_share_neighboring_licensor_percent,
    calculated_royalty_author, calculated_royalty_neighboring, calculated_total_royalty,
    processed_status";

fn report_from_row(row: &Row<'_>) -> rusqlite::Result<ExcelReport> {
    Ok(ExcelReport {
        id: row.get(0)?,
        filename: row.get(1)?,
        original_name: row.get(2)?,
        upload_date: parse_datetime(&row.get::<_, String>(3)?),
        upload_status: row.get(4)?,
        description: row.get(5)?,
        uploaded_by_user_id: row.get(6)?,
        row_count: row.get(7)?,
    })
}

// Amounts are stored as decimal text so no precision is lost in SQLite.
fn decimal_at(row: &Row<'_>, index: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(index)?;
    Decimal::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}

fn usage_row_from_row(row: &Row<'_>) -> rusqlite::Result<RawUsageRow> {
    Ok(RawUsageRow {
        id: row.get(0)?,
        report_id: row.get(1)?,
        row_index: row.get(2)?,
        data: UsageRow {
            period: row.get(3)?,
            platform: row.get(4)?,
            right_type: row.get(5)?,
            territory: row.get(6)?,
            content_type: row.get(7)?,
            usage_type: row.get(8)?,
            performer_name: row.get(9)?,
            track_title: row.get(10)?,
            album_title: row.get(11)?,
            author_words_name: row.get(12)?,
            author_music_name: row.get(13)?,
            licensor_share_author_percent: decimal_at(row, 14)?,
            licensor_share_neighboring_percent: decimal_at(row, 15)?,
            isrc: row.get(16)?,
            upc: row.get(17)?,
            copyright: row.get(18)?,
            quantity: row.get(19)?,
            total_royalty_author: decimal_at(row, 20)?,
            total_royalty_neighboring: decimal_at(row, 21)?,
            licensor_share_author_licensor_percent: decimal_at(row, 22)?,
            licensor_share_neighboring_licensor_percent: decimal_at(row, 23)?,
            calculated_royalty_author: decimal_at(row, 24)?,
            calculated_royalty_neighboring: decimal_at(row, 25)?,
            calculated_total_royalty: decimal_at(row, 26)?,
        },
        processed_status: row.get(27)?,
    })
}

fn load_report(conn: &Connection, id: i64) -> Result<Option<ExcelReport>> {
    conn.query_row(
        &format!("{REPORT_SELECT} WHERE r.id = ?1"),
        params![id],
        report_from_row,
    )
    .optional()
    .map_err(Error::from)
}

fn insert_usage_row(conn: &Connection, report_id: i64, row_index: i64, row: &UsageRow) -> Result<()> {
    conn.execute(
        "INSERT INTO raw_usage_rows (
            report_id, row_index, period, platform, right_type, territory, content_type,
            usage_type, performer_name, track_title, album_title, author_words_name,
            author_music_name, licensor_share_author_percent, licensor_share_neighboring_percent,
            isrc, upc, copyright, quantity, total_royalty_author, total_royalty_neighboring,
            licensor_share_author_licensor_percent, licensor_share_neighboring_licensor_percent,
            calculated_royalty_author, calculated_royalty_neighboring, calculated_total_royalty,
            processed_status
         ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18,
            ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27
         )",
        params![
            report_id,
            row_index,
            row.period,
            row.platform,
            row.right_type,
            row.territory,
            row.content_type,
            row.usage_type,
            row.performer_name,
            row.track_title,
            row.album_title,
            row.author_words_name,
            row.author_music_name,
            row.licensor_share_author_percent.to_string(),
            row.licensor_share_neighboring_percent.to_string(),
            row.isrc,
            row.upc,
            row.copyright,
            row.quantity,
            row.total_royalty_author.to_string(),
            row.total_royalty_neighboring.to_string(),
            row.licensor_share_author_licensor_percent.to_string(),
            row.licensor_share_neighboring_licensor_percent.to_string(),
            row.calculated_royalty_author.to_string(),
            row.calculated_royalty_neighboring.to_string(),
            row.calculated_total_royalty.to_string(),
            PROCESSED_STATUS_PENDING,
        ],
    )?;
    Ok(())
}

impl SqliteStore {
    /// Stores a report and all of its rows in one transaction.
    pub fn create_report(&self, report: &NewReport, rows: &[UsageRow]) -> Result<ExcelReport> {
        self.transaction(|tx| {
            tx.execute(
                "INSERT INTO excel_reports
                    (filename, original_name, upload_date, upload_status, description, uploaded_by_user_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    report.filename,
                    report.original_name,
                    format_datetime(&Utc::now()),
                    UPLOAD_STATUS_COMPLETED,
                    report.description,
                    report.uploaded_by_user_id,
                ],
            )?;
            let report_id = tx.last_insert_rowid();

            for (index, row) in rows.iter().enumerate() {
                insert_usage_row(tx, report_id, index as i64, row)?;
            }

            load_report(tx, report_id)?
                .ok_or_else(|| Error::NotFound("Report not found".to_string()))
        })
    }

    pub fn get_report(&self, id: i64) -> Result<Option<ExcelReport>> {
        load_report(&self.conn(), id)
    }

    pub fn list_reports(&self) -> Result<Vec<ExcelReport>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("{REPORT_SELECT} ORDER BY r.id DESC"))?;

        let rows = stmt.query_map([], report_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    /// Lists rows of a report with an id greater than `after`, in id order.
    pub fn list_report_rows(&self, report_id: i64, after: i64, limit: i32) -> Result<Vec<RawUsageRow>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ROW_COLUMNS} FROM raw_usage_rows
             WHERE report_id = ?1 AND id > ?2 ORDER BY id LIMIT ?3"
        ))?;

        let rows = stmt.query_map(params![report_id, after, limit], usage_row_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    pub fn delete_report(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM excel_reports WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }
}

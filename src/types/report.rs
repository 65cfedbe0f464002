use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const UPLOAD_STATUS_COMPLETED: &str = "completed";
pub const PROCESSED_STATUS_PENDING: &str = "pending";

/// An uploaded usage report from a distribution platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcelReport {
    pub id: i64,
    pub filename: String,
    pub original_name: String,
    pub upload_date: DateTime<Utc>,
    pub upload_status: String,
    pub description: Option<String>,
    pub uploaded_by_user_id: Option<i64>,
    pub row_count: i64,
}

/// One spreadsheet row as reported by the platform, after cell coercion.
/// Money and percentage columns keep the exact decimal the report carried.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageRow {
    pub period: Option<String>,
    pub platform: Option<String>,
    pub right_type: Option<String>,
    pub territory: Option<String>,
    pub content_type: Option<String>,
    pub usage_type: Option<String>,
    pub performer_name: Option<String>,
    pub track_title: Option<String>,
    pub album_title: Option<String>,
    pub author_words_name: Option<String>,
    pub author_music_name: Option<String>,
    pub licensor_share_author_percent: Decimal,
    pub licensor_share_neighboring_percent: Decimal,
    pub isrc: Option<String>,
    pub upc: Option<String>,
    pub copyright: Option<String>,
    pub quantity: i64,
    pub total_royalty_author: Decimal,
    pub total_royalty_neighboring: Decimal,
    pub licensor_share_author_licensor_percent: Decimal,
    pub licensor_share_neighboring_licensor_percent: Decimal,
    pub calculated_royalty_author: Decimal,
    pub calculated_royalty_neighboring: Decimal,
    pub calculated_total_royalty: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawUsageRow {
    pub id: i64,
    pub report_id: i64,
    pub row_index: i64,
    #[serde(flatten)]
    pub data: UsageRow,
    pub processed_status: String,
}

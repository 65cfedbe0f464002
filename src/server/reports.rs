use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use crate::auth::RequireUser;
use crate::ingest;
use crate::server::AppState;
use crate::server::dto::{PaginationParams, UploadReportResponse};
use crate::server::response::{
    ApiError, ApiResponse, DEFAULT_PAGE_SIZE, PaginatedResponse, StoreOptionExt, paginate,
};

const MAX_UPLOAD_SIZE: usize = 50 * 1024 * 1024;

pub fn reports_router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/reports",
            get(list_reports)
                .post(upload_report)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE)),
        )
        .route("/reports/{id}", get(get_report).delete(delete_report))
        .route("/reports/{id}/rows", get(list_report_rows))
}

struct ReportUpload {
    file_name: String,
    content: Vec<u8>,
    description: Option<String>,
}

async fn parse_multipart_upload(multipart: &mut Multipart) -> Result<ReportUpload, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut description: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read multipart: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| ApiError::bad_request("File name is required"))?;
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?;
                file = Some((file_name, data.to_vec()));
            }
            Some("description") => {
                description = Some(field.text().await.map_err(|e| {
                    ApiError::bad_request(format!("Failed to read description: {e}"))
                })?);
            }
            _ => {}
        }
    }

    let (file_name, content) = file.ok_or_else(|| ApiError::bad_request("File field is required"))?;

    Ok(ReportUpload {
        file_name,
        content,
        description,
    })
}

/// POST /reports - multipart form with `file` and optional `description`
async fn upload_report(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let upload = parse_multipart_upload(&mut multipart).await?;

    let report = ingest::upload_report(
        &state.store,
        &auth.caller(),
        &upload.file_name,
        &upload.content,
        upload.description.as_deref(),
    )?;

    let response = UploadReportResponse {
        message: format!(
            "File '{}' uploaded and stored as report {}",
            upload.file_name, report.id
        ),
        report_id: report.id,
        report,
    };

    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))))
}

async fn list_reports(_auth: RequireUser, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let reports = state.store.list_reports()?;
    Ok::<_, ApiError>(Json(ApiResponse::success(reports)))
}

async fn get_report(
    _auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let report = state
        .store
        .get_report(id)?
        .or_not_found("Report not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(report)))
}

/// GET /reports/{id}/rows?cursor= - rows in stored order, paged by row id
async fn list_report_rows(
    _auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let after = match params.cursor.as_deref() {
        None | Some("") => 0,
        Some(cursor) => cursor
            .parse::<i64>()
            .map_err(|_| ApiError::bad_request("Invalid cursor"))?,
    };

    state
        .store
        .get_report(id)?
        .or_not_found("Report not found")?;

    let rows = state.store.list_report_rows(id, after, DEFAULT_PAGE_SIZE + 1)?;

    let (rows, next_cursor, has_more) =
        paginate(rows, DEFAULT_PAGE_SIZE as usize, |r| r.id.to_string());

    Ok::<_, ApiError>(Json(PaginatedResponse::new(rows, next_cursor, has_more)))
}

/// DELETE /reports/{id} - removes the report with all of its rows
async fn delete_report(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    if !state.store.delete_report(id)? {
        return Err(ApiError::not_found("Report not found"));
    }

    tracing::info!("Deleted report {} by user {}", id, auth.user.id);
    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

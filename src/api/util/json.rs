use anyhow::Result;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::api::dto::ApiResponse;
use crate::core::util::export_util::ExportedFile;
use crate::errors::AppError;

/// Wraps a service result in the response envelope. Typed service errors keep
/// their status code (see `From<anyhow::Error> for AppError`).
pub fn to_json<T: serde::Serialize>(
    result: Result<T>
) -> Result<Json<ApiResponse<T>>, AppError> {
    match result {
        Ok(value) => Ok(Json(ApiResponse::ok(value))),
        Err(err) => Err(err.into()),
    }
}

/// Sends an export as a file attachment.
pub fn to_download(result: Result<ExportedFile>) -> Result<Response, AppError> {
    let file = result?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        urlencoding::encode(&file.filename)
    );
    Ok((
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.body,
    )
        .into_response())
}

//! Media handlers: resource info and downloads.

use super::{DownloadRequest, InfoRequest};
use crate::api::AppState;
use crate::error::Result;
use crate::types::{ResourceInfo, SelectionRequest};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::Response,
};

/// POST /resource/info - Resource metadata and format catalog
///
/// Also served at `/video/info`.
#[utoipa::path(
    post,
    path = "/resource/info",
    tag = "media",
    request_body = InfoRequest,
    responses(
        (status = 200, description = "Metadata and allow-listed formats", body = ResourceInfo),
        (status = 400, description = "Invalid URL, no provider installed or extraction failed", body = crate::error::ApiError)
    )
)]
pub async fn resource_info(
    State(state): State<AppState>,
    payload: std::result::Result<Json<InfoRequest>, JsonRejection>,
) -> Result<Json<ResourceInfo>> {
    let Json(request) = payload?;
    let info = state.service.resource_info(&request.url).await?;
    Ok(Json(info))
}

/// POST /download - Stream one rendition as an attachment
///
/// The body is the media file, sent in fixed-size chunks. Errors are only
/// reported before the first byte; after that a failure ends the stream.
#[utoipa::path(
    post,
    path = "/download",
    tag = "media",
    request_body = DownloadRequest,
    responses(
        (status = 200, description = "Media file stream", content_type = "application/octet-stream"),
        (status = 400, description = "Invalid request, provider unavailable, extraction failed or all fetch attempts failed", body = crate::error::ApiError),
        (status = 404, description = "No format of the requested type", body = crate::error::ApiError)
    )
)]
pub async fn download(
    State(state): State<AppState>,
    payload: std::result::Result<Json<DownloadRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = payload?;
    let selection = SelectionRequest::from_wire(request.format_type, &request.quality);
    state.service.download(&request.url, selection).await
}

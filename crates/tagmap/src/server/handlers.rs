//! HTTP request handlers.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use tracing::{debug, error, info};

use super::AppState;
use crate::document::{digest, DocumentHandle};
use crate::error::{Error, Result};

/// File name offered by `/download-map`.
pub const DOWNLOAD_FILE_NAME: &str = "generated_map.html";

const NO_MAP_MESSAGE: &str = "No map has been generated yet.";

/// Why an upload did not produce a map.
#[derive(Debug)]
enum UploadFailure {
    Multipart(MultipartError),
    Build(Error),
}

impl From<MultipartError> for UploadFailure {
    fn from(err: MultipartError) -> Self {
        Self::Multipart(err)
    }
}

impl From<Error> for UploadFailure {
    fn from(err: Error) -> Self {
        Self::Build(err)
    }
}

impl IntoResponse for UploadFailure {
    fn into_response(self) -> Response {
        match self {
            Self::Multipart(e) => (e.status(), e.body_text()).into_response(),
            Self::Build(e) => error_response(&e),
        }
    }
}

/// Map an error to the plain-text response the uploader sees.
fn error_response(err: &Error) -> Response {
    if err.is_upload_missing() {
        (StatusCode::BAD_REQUEST, err.to_string()).into_response()
    } else if err.is_data_error() {
        (StatusCode::BAD_REQUEST, format!("Error in data: {err}")).into_response()
    } else {
        error!(error = %err, "Upload failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("An unexpected error occurred: {err}"),
        )
            .into_response()
    }
}

fn page(result: Result<String>, status: StatusCode) -> Response {
    match result {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render page");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

fn not_found(state: &AppState) -> Response {
    page(
        state.builder.templates().not_found(NO_MAP_MESSAGE),
        StatusCode::NOT_FOUND,
    )
}

/// Reduce a client-supplied file name to its last path component.
///
/// Returns `None` when nothing usable is left.
#[must_use]
pub fn sanitize_filename(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("").trim();
    match base {
        "" | "." | ".." => None,
        base => Some(base.to_string()),
    }
}

/// `GET /`
pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    let builder = state.builder();
    let has_map = tokio::fs::try_exists(builder.document_path())
        .await
        .unwrap_or(false);
    page(
        builder.templates().index(builder.schema().required(), has_map),
        StatusCode::OK,
    )
}

/// `POST /`
///
/// A body that is not `multipart/form-data` has no file part either.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Response {
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            debug!(reason = %rejection.body_text(), "Upload is not multipart");
            return error_response(&Error::UploadMissing {
                reason: "No file part",
            });
        }
    };
    match receive_and_build(&state, &mut multipart).await {
        Ok(handle) => {
            info!(markers = handle.markers, digest = %handle.digest, "Upload processed");
            Redirect::to("/map").into_response()
        }
        Err(failure) => failure.into_response(),
    }
}

async fn receive_and_build(
    state: &Arc<AppState>,
    multipart: &mut Multipart,
) -> std::result::Result<DocumentHandle, UploadFailure> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(ToString::to_string);
        let bytes = field.bytes().await?;
        upload = Some((file_name, bytes));
        break;
    }

    let Some((file_name, bytes)) = upload else {
        return Err(Error::UploadMissing {
            reason: "No file part",
        }
        .into());
    };
    let Some(file_name) = file_name.as_deref().and_then(sanitize_filename) else {
        return Err(Error::UploadMissing {
            reason: "No selected file",
        }
        .into());
    };

    let _guard = state.build_lock.lock().await;

    let upload_dir = state.builder.config().upload_dir();
    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|source| Error::DirectoryCreate {
            path: upload_dir.to_path_buf(),
            source,
        })?;
    let path: PathBuf = upload_dir.join(&file_name);
    tokio::fs::write(&path, &bytes).await.map_err(Error::from)?;
    debug!(path = %path.display(), bytes = bytes.len(), "Saved upload");

    let builder = Arc::clone(&state.builder);
    let handle = tokio::task::spawn_blocking(move || builder.build(&path))
        .await
        .map_err(|e| Error::internal(format!("build task failed: {e}")))??;
    Ok(handle)
}

/// `GET /map`
pub async fn map_view(State(state): State<Arc<AppState>>) -> Response {
    let exists = tokio::fs::try_exists(state.builder.document_path())
        .await
        .unwrap_or(false);
    if !exists {
        return not_found(&state);
    }
    page(state.builder.templates().viewer(), StatusCode::OK)
}

/// `GET /map/document`
pub async fn map_document(State(state): State<Arc<AppState>>) -> Response {
    match read_document(&state).await {
        Ok(Some(bytes)) => (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            bytes,
        )
            .into_response(),
        Ok(None) => not_found(&state),
        Err(e) => error_response(&e),
    }
}

/// `GET /download-map`
pub async fn download_map(State(state): State<Arc<AppState>>) -> Response {
    match read_document(&state).await {
        Ok(Some(bytes)) => {
            let etag = format!("\"{}\"", digest(&bytes));
            (
                [
                    (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{DOWNLOAD_FILE_NAME}\""),
                    ),
                    (header::ETAG, etag),
                ],
                bytes,
            )
                .into_response()
        }
        Ok(None) => not_found(&state),
        Err(e) => error_response(&e),
    }
}

async fn read_document(state: &AppState) -> Result<Option<Vec<u8>>> {
    match tokio::fs::read(state.builder.document_path()).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_plain_name() {
        assert_eq!(sanitize_filename("sites.xlsx").as_deref(), Some("sites.xlsx"));
    }

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(
            sanitize_filename("../../etc/sites.xlsx").as_deref(),
            Some("sites.xlsx")
        );
        assert_eq!(
            sanitize_filename(r"C:\Users\budi\sites.xlsx").as_deref(),
            Some("sites.xlsx")
        );
    }

    #[test]
    fn test_sanitize_rejects_empty() {
        assert_eq!(sanitize_filename(""), None);
        assert_eq!(sanitize_filename("   "), None);
        assert_eq!(sanitize_filename(".."), None);
        assert_eq!(sanitize_filename("uploads/"), None);
    }

    #[test]
    fn test_error_response_status() {
        let missing = Error::UploadMissing {
            reason: "No file part",
        };
        assert_eq!(error_response(&missing).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            error_response(&Error::missing_column("name")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_response(&Error::internal("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use super::views;
use crate::domain::errors::GalleryError;

/// Convert domain GalleryError to HTTP status codes for responses
impl From<&GalleryError> for StatusCode {
    fn from(err: &GalleryError) -> Self {
        match err {
            GalleryError::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            GalleryError::Backend { .. } => StatusCode::BAD_GATEWAY,
            GalleryError::NotFound { .. } => StatusCode::NOT_FOUND,
            GalleryError::InvalidName(_) => StatusCode::BAD_REQUEST,
            GalleryError::AccessDenied { .. } => StatusCode::FORBIDDEN,
        }
    }
}

/// Failure of a page action, rendered as the HTML error page
#[derive(Debug)]
pub enum PageError {
    Gallery(GalleryError),
    /// The request itself was unusable, e.g. a malformed or oversized body
    Request { status: StatusCode, message: String },
}

impl From<&MultipartError> for PageError {
    fn from(err: &MultipartError) -> Self {
        PageError::Request {
            status: err.status(),
            message: format!("Upload rejected: {}", err.body_text()),
        }
    }
}

impl From<GalleryError> for PageError {
    fn from(err: GalleryError) -> Self {
        PageError::Gallery(err)
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self {
            PageError::Gallery(err) => {
                let status = StatusCode::from(&err);
                tracing::error!(status = status.as_u16(), error = %err, "Gallery request failed");
                (status, Html(views::render_error(status, &err.to_string(), &err.trace())))
                    .into_response()
            }
            PageError::Request { status, message } => {
                tracing::warn!(status = status.as_u16(), %message, "Rejected request");
                (status, Html(views::render_error(status, &message, &[]))).into_response()
            }
        }
    }
}

//! HTTP surface of the file browser.
//!
//! The API is a thin, synchronous shim: [`server`] owns the listener and a
//! small pool of worker threads, [`handlers`] translates requests into
//! calls on the browse layer and browse errors into status codes. All
//! state the handlers need is the shared [`Aggregator`](crate::sizing::Aggregator).
//!
//! # Routes
//!
//! | method | path | action |
//! |--------|------|--------|
//! | GET    | `/v1/files[/{path}]`  | list a directory |
//! | POST   | `/v1/files/{path}`    | store the request body as a file |
//! | DELETE | `/v1/files/{path}`    | remove a file or directory |
//! | GET    | `/v1/download/{path}` | stream a file back |
//! | GET    | `/v1/search?q=`       | prefix search over entry names |

pub mod handlers;
pub mod server;

use std::path::Path;

use log::error;
use tiny_http::{Header, Response, ResponseBox, StatusCode};

use crate::browse::BrowseError;

pub use server::ApiServer;

/// Errors from standing up the HTTP front end.
#[derive(thiserror::Error, Debug)]
pub enum ServeError {
    /// The listen address could not be bound.
    #[error("Failed to bind {addr}: {reason}")]
    Bind {
        /// Address that was requested
        addr: String,
        /// What the socket layer said
        reason: String,
    },
}

/// A request that ends as an HTTP error status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: u16,
    message: String,
}

impl ApiError {
    /// 400 with a caller-facing message.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: 400,
            message: message.into(),
        }
    }

    /// 404 with a caller-facing message.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: 404,
            message: message.into(),
        }
    }

    /// 405 for a known route with the wrong method.
    #[must_use]
    pub fn method_not_allowed() -> Self {
        Self {
            status: 405,
            message: "Method not allowed".to_string(),
        }
    }

    /// 413 for bodies past the upload ceiling.
    #[must_use]
    pub fn payload_too_large() -> Self {
        Self {
            status: 413,
            message: "Upload body too large".to_string(),
        }
    }

    /// The HTTP status this error maps to.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Render as a `{"error": ...}` JSON response.
    #[must_use]
    pub fn into_response(self) -> ResponseBox {
        let body = serde_json::json!({ "error": self.message }).to_string();
        let mut response =
            Response::from_string(body).with_status_code(StatusCode(self.status));
        if let Ok(content_type) =
            Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        {
            response = response.with_header(content_type);
        }
        response.boxed()
    }
}

impl From<BrowseError> for ApiError {
    fn from(err: BrowseError) -> Self {
        let status = match &err {
            BrowseError::InvalidPath(_) => 400,
            BrowseError::NotFound(_)
            | BrowseError::NotADirectory(_)
            | BrowseError::NotAFile(_) => 404,
            BrowseError::PermissionDenied(_) => 403,
            BrowseError::Io { .. } => 500,
        };
        if status == 500 {
            error!("Request failed: {}", err);
        }
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        error!("Failed to encode a response body: {}", err);
        Self {
            status: 500,
            message: "Failed to encode response".to_string(),
        }
    }
}

/// MIME type for a download, by file extension.
///
/// Unknown extensions fall back to `application/octet-stream`, which makes
/// browsers save rather than render.
#[must_use]
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase());
    match extension.as_deref() {
        Some("txt") | Some("log") => "text/plain",
        Some("md") => "text/markdown",
        Some("html") | Some("htm") => "text/html",
        Some("css") => "text/css",
        Some("csv") => "text/csv",
        Some("js") => "text/javascript",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("gz") => "application/gzip",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        _ => "application/octet-stream",
    }
}

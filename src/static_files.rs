//! Static file serving with SPA fallback.
//!
//! Paths are confined to the public root lexically, before any filesystem
//! access. Unknown paths and directories are answered with the root document.

use axum::body::Body;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::Response;
use percent_encoding::percent_decode_str;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use crate::error::GatewayError;
use crate::metrics::SPA_FALLBACKS;

/// Public root plus its root document.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
    index_file: String,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>, index_file: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            index_file: index_file.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(&self.index_file)
    }

    /// Map a request path to a location under the root. `/` maps to the root document.
    pub fn resolve(&self, request_path: &str) -> Result<PathBuf, GatewayError> {
        let relative = normalize(request_path)?;
        if relative.as_os_str().is_empty() {
            return Ok(self.index_path());
        }
        Ok(self.root.join(relative))
    }

    pub async fn serve(&self, request_path: &str) -> Result<Response, GatewayError> {
        let path = self.resolve(request_path)?;
        if let Some((file, len)) = open_regular(&path).await? {
            return file_response(&path, file, len);
        }

        // Missing paths, directories, and files removed mid-request all land here
        let index = self.index_path();
        match open_regular(&index).await? {
            Some((file, len)) => {
                SPA_FALLBACKS.inc();
                tracing::debug!(path = request_path, "serving root document as fallback");
                file_response(&index, file, len)
            }
            None => Err(GatewayError::NotFound),
        }
    }
}

/// Percent-decode `request_path` and fold `.`/`..` segments into a relative path.
///
/// Fails with `BadPath` when a `..` would climb above the root, or when the
/// decoded path is not UTF-8 or carries a NUL byte.
pub fn normalize(request_path: &str) -> Result<PathBuf, GatewayError> {
    let decoded = percent_decode_str(request_path)
        .decode_utf8()
        .map_err(|_| GatewayError::BadPath)?;
    if decoded.contains('\0') {
        return Err(GatewayError::BadPath);
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(GatewayError::BadPath);
                }
            }
            s => segments.push(s),
        }
    }

    Ok(segments.iter().collect())
}

/// Get MIME Content-Type based on file extension
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// Open `path` if it is a regular file. Missing entries and non-files give `None`.
async fn open_regular(path: &Path) -> Result<Option<(File, u64)>, GatewayError> {
    let file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
            return Ok(None);
        }
        Err(e) => return Err(read_error(path, e)),
    };
    let meta = file.metadata().await.map_err(|e| read_error(path, e))?;
    Ok(meta.is_file().then(|| (file, meta.len())))
}

// The path stays in the log; clients only see a generic detail
fn read_error(path: &Path, e: std::io::Error) -> GatewayError {
    tracing::warn!(path = %path.display(), error = %e, "failed to read static file");
    GatewayError::Server("failed to read static file".to_string())
}

// Headers are committed before the first chunk; a read error mid-stream aborts the connection
fn file_response(path: &Path, file: File, len: u64) -> Result<Response, GatewayError> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type(path))
        .header(header::CONTENT_LENGTH, len)
        .header(header::CACHE_CONTROL, HeaderValue::from_static("no-store"))
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| GatewayError::Server(format!("failed to build file response: {e}")))
}

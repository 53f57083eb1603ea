//! HTTP glue: turn core results into hyper::Response<Body>.

use hyper::{header::CONTENT_TYPE, Body, Request, Response, StatusCode};
use multer::Multipart;
use serde::Deserialize;
use serde_json::json;
use tokio_util::io::ReaderStream;
use tracing::{error, info, warn};

use crate::sys_core::core::ServiceConfig;
use crate::sys_fileapi::core::{self, ApiError};

/// Field names the upload form may use: older clients send a single
/// `myFile`, newer ones `myFiles` with `multiple` set.
const UPLOAD_FIELDS: &[&str] = &["myFile", "myFiles"];

#[derive(Deserialize)]
struct DeleteManyRequest {
    files: Vec<String>,
}

fn status_for(err: &ApiError) -> StatusCode {
    match err {
        ApiError::Validation(_) => StatusCode::BAD_REQUEST,
        ApiError::NotFound => StatusCode::NOT_FOUND,
        ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn json_response<T: serde::Serialize>(status: StatusCode, value: &T) -> Response<Body> {
    let body = serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string());
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

fn error_response(err: &ApiError) -> Response<Body> {
    json_response(status_for(err), &json!({ "error": err.to_string() }))
}

pub async fn handler_upload(req: Request<Body>, config: &ServiceConfig) -> Response<Body> {
    let ct = match req.headers().get(CONTENT_TYPE).and_then(|h| h.to_str().ok()) {
        Some(ct) => ct.to_string(),
        None => return error_response(&ApiError::Validation("Missing Content-Type".to_string())),
    };
    let boundary = match multer::parse_boundary(&ct) {
        Ok(b) => b,
        Err(e) => {
            return error_response(&ApiError::Validation(format!("Bad multipart boundary: {e}")))
        }
    };

    let mut multipart = Multipart::new(req.into_body(), boundary);
    let mut accepted = Vec::new();
    let mut rejection: Option<ApiError> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => {
                warn!("multipart error: {}", e);
                return error_response(&ApiError::Validation(format!("Invalid form data: {e}")));
            }
        };
        // Non-file form fields ride along in the same body; ignore them.
        if !field.name().map_or(false, |n| UPLOAD_FIELDS.contains(&n)) {
            continue;
        }
        let allowed = |ext: &str| config.is_allowed(ext);
        match core::api_upload_field(field, &config.upload_dir, allowed).await {
            Ok(info) => accepted.push(info),
            Err(err @ ApiError::Storage(_)) => {
                error!("upload failed: {}", err);
                return error_response(&err);
            }
            Err(err) => {
                warn!("upload part rejected: {}", err);
                rejection.get_or_insert(err);
            }
        }
    }

    if accepted.is_empty() {
        let err =
            rejection.unwrap_or_else(|| ApiError::Validation("No file uploaded".to_string()));
        return error_response(&err);
    }

    info!(count = accepted.len(), "upload complete");
    json_response(StatusCode::OK, &json!({ "success": true, "files": accepted }))
}

pub async fn handler_list(config: &ServiceConfig) -> Response<Body> {
    match core::api_list_files(&config.upload_dir).await {
        Ok(files) => json_response(StatusCode::OK, &files),
        Err(err) => {
            error!("listing failed: {}", err);
            error_response(&err)
        }
    }
}

/// Stream a stored file back for preview or download.
pub async fn handler_download(filename: &str, config: &ServiceConfig) -> Response<Body> {
    let path = match core::safe_child_path(&config.upload_dir, filename) {
        Ok(p) => p,
        Err(err) => {
            warn!("rejected file path {:?}", filename);
            return error_response(&err);
        }
    };
    match tokio::fs::File::open(&path).await {
        Ok(file) => {
            let stream = ReaderStream::new(file);
            let mime = mime_guess::from_path(filename).first_or_octet_stream();
            Response::builder()
                .header(CONTENT_TYPE, mime.as_ref())
                .body(Body::wrap_stream(stream))
                .unwrap()
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => error_response(&ApiError::NotFound),
        Err(e) => {
            error!("open failed for {}: {}", filename, e);
            error_response(&ApiError::Storage(e))
        }
    }
}

pub async fn handler_remove(filename: &str, config: &ServiceConfig) -> Response<Body> {
    match core::api_remove_file(&config.upload_dir, filename).await {
        Ok(()) => {
            info!("deleted {}", filename);
            json_response(StatusCode::OK, &json!({ "success": true }))
        }
        Err(err) => {
            warn!("delete {} failed: {}", filename, err);
            error_response(&err)
        }
    }
}

pub async fn handler_remove_many(req: Request<Body>, config: &ServiceConfig) -> Response<Body> {
    let body = match hyper::body::to_bytes(req.into_body()).await {
        Ok(b) => b,
        Err(e) => {
            return error_response(&ApiError::Validation(format!("Unreadable request body: {e}")))
        }
    };
    let parsed: DeleteManyRequest = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(_) => {
            return error_response(&ApiError::Validation(
                "Expected a JSON body with a files array".to_string(),
            ))
        }
    };
    if parsed.files.is_empty() {
        return error_response(&ApiError::Validation("No files specified".to_string()));
    }

    let results = core::api_remove_many(&config.upload_dir, &parsed.files).await;
    let deleted = results.iter().filter(|r| r.deleted).count();
    info!(requested = parsed.files.len(), deleted, "bulk delete processed");
    json_response(StatusCode::OK, &json!({ "success": true, "results": results }))
}

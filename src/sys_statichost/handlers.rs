//! HTTP glue: serve whatever `core::map_static_path` gives us.

use std::path::Path;

use hyper::header::CONTENT_TYPE;
use hyper::{Body, Response, StatusCode};
use tokio::fs::File;
use tokio_util::io::ReaderStream;

/// Try to serve a client asset for this URI.
/// Returns `Some(response)` if `uri` maps to a static route, `None` otherwise.
pub async fn handler_static(uri: &str, public_dir: &Path) -> Option<Response<Body>> {
    let path = crate::sys_statichost::core::map_static_path(public_dir, uri)?;
    match File::open(&path).await {
        Ok(file) => {
            let stream = ReaderStream::new(file);
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            Some(
                Response::builder()
                    .header(CONTENT_TYPE, mime.as_ref())
                    .body(Body::wrap_stream(stream))
                    .unwrap(),
            )
        }
        // Mapped but vanished between the check and the open.
        Err(_) => Some(
            Response::builder()
                .status(StatusCode::NOT_FOUND)
                .body(Body::from("Not found"))
                .unwrap(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn serves_index_with_html_type() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html></html>").unwrap();

        let resp = handler_static("/", dir.path()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let ct = resp.headers().get(CONTENT_TYPE).unwrap().to_str().unwrap();
        assert_eq!(ct, "text/html");
        let body = hyper::body::to_bytes(resp.into_body()).await.unwrap();
        assert_eq!(&body[..], b"<html></html>");
    }

    #[tokio::test]
    async fn unmapped_uri_yields_none() {
        let dir = tempdir().unwrap();
        assert!(handler_static("/missing.css", dir.path()).await.is_none());
    }
}

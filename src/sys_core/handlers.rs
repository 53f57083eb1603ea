//! Server loop and top-level router: dispatch requests to the sys_* handlers.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use tracing::info;

use crate::sys_core::core::ServiceConfig;
use crate::{sys_catfact, sys_fileapi, sys_statichost};

pub async fn run_server(config: ServiceConfig) -> hyper::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let config = Arc::new(config);

    let make_svc = make_service_fn(move |_conn| {
        let config = config.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let config = config.clone();
                async move { Ok::<_, Infallible>(route(req, &config).await) }
            }))
        }
    });

    info!("listening on http://{}", addr);
    Server::bind(&addr).serve(make_svc).await
}

async fn route(req: Request<Body>, config: &ServiceConfig) -> Response<Body> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (method, path.as_str()) {
        (Method::POST, "/upload") => sys_fileapi::handlers::handler_upload(req, config).await,
        (Method::GET, "/files") => sys_fileapi::handlers::handler_list(config).await,
        (Method::GET, p) if p.starts_with("/files/") => {
            let name = decode_param(&p["/files/".len()..]);
            sys_fileapi::handlers::handler_download(&name, config).await
        }
        (Method::POST, p) if p.starts_with("/delete/") => {
            let name = decode_param(&p["/delete/".len()..]);
            sys_fileapi::handlers::handler_remove(&name, config).await
        }
        (Method::POST, "/delete-many") => {
            sys_fileapi::handlers::handler_remove_many(req, config).await
        }
        (Method::GET, "/catfact") => sys_catfact::handlers::handler_catfact().await,
        (Method::GET, p) => match sys_statichost::handlers::handler_static(p, &config.public_dir).await {
            Some(resp) => resp,
            None => not_found(),
        },
        _ => not_found(),
    }
}

/// Path parameters arrive percent-encoded; a name that fails to decode is
/// used as-is and will simply miss.
fn decode_param(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

fn not_found() -> Response<Body> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .body(Body::from("Not found"))
        .unwrap()
}

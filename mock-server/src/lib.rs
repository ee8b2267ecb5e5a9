//! HTTP/1.1 test server for exercising the client end-to-end.
//!
//! Every route answers with framing the client has to handle: fixed
//! `Content-Length` bodies, streamed (chunked) bodies, bare status codes,
//! and relative or absolute redirects.

use std::convert::Infallible;

use axum::{
    body::Body,
    extract::Path,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::Redirect,
    routing::{any, get},
    Json, Router,
};
use futures::stream;
use hyper_util::{rt::TokioIo, service::TowerToHyperService};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

pub const OK_BODY: &str = "hello from mock-server";

/// Pieces of the `/chunked` body, each sent as its own chunk.
pub const CHUNKS: &[&str] = &["Wiki", "pedia", " in ", "chunks"];

/// What `/echo` saw of the request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub body: String,
    pub host: Option<String>,
    pub connection: Option<String>,
    pub content_length: Option<String>,
    pub custom: Option<String>,
}

pub fn app() -> Router {
    Router::new()
        .route("/ok", get(ok))
        .route("/echo", any(echo))
        .route("/chunked", get(chunked))
        .route("/bytes/{len}", get(bytes))
        .route("/status/{code}", any(status))
        .route("/redirect/{hops}", any(redirect))
        .route("/absolute-redirect", any(absolute_redirect))
        .route("/loop", any(redirect_loop))
}

/// Serve `app()` over HTTP/1.1 until the listener fails.
///
/// Header names are written title-cased (`Content-Length`, not
/// `content-length`) because the client matches names case-sensitively.
pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    let service = TowerToHyperService::new(app());
    loop {
        let (socket, peer) = listener.accept().await?;
        let service = service.clone();
        tokio::spawn(async move {
            let served = hyper::server::conn::http1::Builder::new()
                .title_case_headers(true)
                .serve_connection(TokioIo::new(socket), service)
                .await;
            if let Err(e) = served {
                log::debug!("connection from {peer} ended with error: {e}");
            }
        });
    }
}

async fn ok() -> &'static str {
    OK_BODY
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: String) -> Json<Echo> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    Json(Echo {
        method: method.to_string(),
        path: uri.path_and_query().map(|pq| pq.to_string()).unwrap_or_default(),
        body,
        host: header(header::HOST.as_str()),
        connection: header(header::CONNECTION.as_str()),
        content_length: header(header::CONTENT_LENGTH.as_str()),
        custom: header("x-custom"),
    })
}

async fn chunked() -> Body {
    let pieces = CHUNKS.iter().map(|piece| Ok::<_, Infallible>(*piece));
    Body::from_stream(stream::iter(pieces))
}

async fn bytes(Path(len): Path<usize>) -> Vec<u8> {
    (0..len).map(|i| b'a' + (i % 26) as u8).collect()
}

async fn status(Path(code): Path<u16>) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}

async fn redirect(Path(hops): Path<u32>) -> Redirect {
    if hops == 0 {
        Redirect::temporary("/echo")
    } else {
        Redirect::temporary(&format!("/redirect/{}", hops - 1))
    }
}

async fn absolute_redirect(headers: HeaderMap) -> Result<Redirect, StatusCode> {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::BAD_REQUEST)?;
    Ok(Redirect::temporary(&format!("http://{host}/echo")))
}

async fn redirect_loop() -> Redirect {
    Redirect::temporary("/loop")
}

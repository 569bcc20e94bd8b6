//! hyper HTTP/1 server loop

use super::{route, ApiResponse, AppState};
use crate::error::Result;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::header::CONTENT_TYPE;
use hyper::server::conn::http1;
use hyper::service::Service;
use hyper_util::rt::TokioIo;
use log::{debug, info, warn};
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Binds `addr` and serves until Ctrl-C
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    serve_with_shutdown(state, listener, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
        }
    })
    .await
}

/// Accepts connections on `listener` until `shutdown` completes
///
/// Connections already accepted run to completion on their own tasks.
pub async fn serve_with_shutdown<F>(
    state: Arc<AppState>,
    listener: TcpListener,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, remote) = result?;
                let state = state.clone();
                tokio::task::spawn(async move {
                    if let Err(e) = handle_connection(stream, remote, state).await {
                        debug!("Connection from {} failed: {}", remote, e);
                    }
                });
            }
            _ = &mut shutdown => {
                info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}

async fn handle_connection(
    stream: TcpStream,
    remote: SocketAddr,
    state: Arc<AppState>,
) -> std::result::Result<(), hyper::Error> {
    let service = ApiService { state, remote };
    http1::Builder::new()
        .serve_connection(TokioIo::new(stream), service)
        .await
}

struct ApiService {
    state: Arc<AppState>,
    remote: SocketAddr,
}

impl Service<hyper::Request<Incoming>> for ApiService {
    type Response = hyper::Response<Full<Bytes>>;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: hyper::Request<Incoming>) -> Self::Future {
        let state = self.state.clone();
        let remote = self.remote;

        Box::pin(async move {
            let uri = req.uri();
            let response = route(&state, req.method(), uri.path(), uri.query().unwrap_or(""));
            debug!("{} {} {} -> {}", remote, req.method(), uri, response.status);
            into_hyper(response)
        })
    }
}

fn into_hyper(response: ApiResponse) -> std::result::Result<hyper::Response<Full<Bytes>>, BoxError> {
    let body = serde_json::to_vec(&response.body)?;
    Ok(hyper::Response::builder()
        .status(response.status)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body)))?)
}

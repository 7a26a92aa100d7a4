//! Development content server.
//!
//! Serves the output directory as static files. Every response tells the
//! client not to cache, since the page is replaced in place on each rebuild.

use std::{io, net::SocketAddr, path::Path, time::Duration};

use axum::{
    Router,
    extract::Request,
    http::{HeaderValue, header},
    middleware::{self, Next},
    response::Response,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{services::ServeDir, set_header::SetResponseHeaderLayer};

/// Cache directive attached to every response.
pub const NO_CACHE: &str = "no-store, no-cache, must-revalidate";

/// Default time given to in-flight requests after shutdown is requested.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Server errors.
#[derive(Debug, Error)]
pub enum ServeError {
    /// Another process already listens on the address.
    #[error("port already in use: {addr}")]
    PortInUse { addr: String },

    /// Binding failed for another reason.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Accept loop failure.
    #[error("server IO error: {0}")]
    Io(#[from] io::Error),
}

/// Create the static file router for `output_dir`.
pub fn create_router(output_dir: &Path) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(output_dir))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static(NO_CACHE),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::EXPIRES,
            HeaderValue::from_static("0"),
        ))
        .layer(middleware::from_fn(log_request))
}

/// Successful responses are only logged at debug level.
async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let response = next.run(request).await;
    let status = response.status();

    if status.is_success() || status.is_redirection() {
        tracing::debug!(%method, %uri, status = status.as_u16(), "request");
    } else {
        tracing::info!(%method, %uri, status = status.as_u16(), "request");
    }
    response
}

/// A bound, not yet running, content server.
pub struct ContentServer {
    listener: TcpListener,
    router: Router,
    local_addr: SocketAddr,
    grace_period: Duration,
}

impl ContentServer {
    /// Bind `addr` (e.g. `127.0.0.1:8000`) and prepare to serve `output_dir`.
    ///
    /// An occupied port fails immediately with [`ServeError::PortInUse`].
    pub async fn bind(output_dir: &Path, addr: &str) -> Result<Self, ServeError> {
        let listener = TcpListener::bind(addr).await.map_err(|source| {
            if source.kind() == io::ErrorKind::AddrInUse {
                ServeError::PortInUse {
                    addr: addr.to_string(),
                }
            } else {
                ServeError::Bind {
                    addr: addr.to_string(),
                    source,
                }
            }
        })?;
        let local_addr = listener.local_addr()?;

        tracing::info!(address = %local_addr, dir = %output_dir.display(), "content server bound");

        Ok(Self {
            listener,
            router: create_router(output_dir),
            local_addr,
            grace_period: DEFAULT_GRACE_PERIOD,
        })
    }

    /// Override the shutdown grace period.
    #[must_use]
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Address actually bound, useful when binding port 0.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve until `shutdown` is cancelled.
    ///
    /// After cancellation the listener is closed at once; open connections get
    /// the grace period to finish before they are dropped.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), ServeError> {
        let grace_period = self.grace_period;
        let serve = axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown.clone().cancelled_owned())
            .into_future();
        let mut serve = std::pin::pin!(serve);

        tokio::select! {
            res = &mut serve => res?,
            () = shutdown.cancelled() => {
                match tokio::time::timeout(grace_period, &mut serve).await {
                    Ok(res) => res?,
                    Err(_) => tracing::warn!(
                        ?grace_period,
                        "connections still open after grace period, dropping them"
                    ),
                }
            }
        }

        tracing::info!("content server stopped");
        Ok(())
    }
}

//! Listener: TLS with SNI selection when certificates load, plain HTTP otherwise.

use anyhow::{Context, Result};
use http::Request;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::fmt;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

use crate::config::Config;
use crate::serve::handler;
use crate::sni::{self, SelectorTable};

/// How accepted connections are served.
#[derive(Clone)]
pub enum Transport {
    Tls(TlsAcceptor),
    Plain,
}

impl Transport {
    pub fn is_tls(&self) -> bool {
        matches!(self, Transport::Tls(_))
    }
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Tls(_) => f.write_str("Tls"),
            Transport::Plain => f.write_str("Plain"),
        }
    }
}

/// Build the TLS acceptor from `cert_dir`, or fall back to plaintext.
///
/// Certificate problems never abort startup; they are logged and the server
/// runs without TLS.
pub fn prepare_transport(cert_dir: &Path) -> Transport {
    match SelectorTable::from_dir(cert_dir) {
        Ok(table) => {
            tracing::info!(
                certificates = table.entries().len(),
                default = %table.default_entry().domain,
                "TLS enabled"
            );
            Transport::Tls(TlsAcceptor::from(sni::tls_config(Arc::new(table))))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Could not load certificates");
            tracing::warn!("Starting HTTP server (non-SSL)");
            Transport::Plain
        }
    }
}

/// Bind the configured port and serve until the process exits.
pub async fn run(config: Config) -> Result<()> {
    let transport = prepare_transport(&config.cert_dir);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind port {}", config.port))?;
    tracing::info!(
        port = config.port,
        "Server starting on {} port {}",
        if transport.is_tls() { "HTTPS" } else { "HTTP" },
        config.port
    );
    serve(listener, transport, Arc::new(config)).await
}

/// Accept loop. One task per connection; a failed handshake drops only that connection.
pub async fn serve(listener: TcpListener, transport: Transport, config: Arc<Config>) -> Result<()> {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "accept error");
                continue;
            }
        };
        let transport = transport.clone();
        let config = config.clone();
        tokio::spawn(async move {
            match transport {
                Transport::Tls(acceptor) => match acceptor.accept(stream).await {
                    Ok(tls_stream) => {
                        serve_connection(TokioIo::new(tls_stream), peer, true, config).await
                    }
                    Err(e) => tracing::debug!(%peer, error = %e, "TLS handshake failed"),
                },
                Transport::Plain => serve_connection(TokioIo::new(stream), peer, false, config).await,
            }
        });
    }
}

async fn serve_connection<I>(io: I, peer: SocketAddr, tls: bool, config: Arc<Config>)
where
    I: hyper::rt::Read + hyper::rt::Write + Unpin + Send + 'static,
{
    let service = service_fn(move |req: Request<Incoming>| {
        let response = handler::handle(&req, &config, tls);
        async move { Ok::<_, Infallible>(response) }
    });
    if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
        tracing::debug!(%peer, error = %e, "connection error");
    }
}

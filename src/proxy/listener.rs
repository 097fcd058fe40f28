use std::net::SocketAddr;
use std::sync::Arc;

use rustls::ServerConfig;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, info};

use crate::error::Result;
use crate::eventlog::{EventLog, Peer};
use crate::proxy::session;
use crate::tls;

/// Run the accept loop on an already-bound listener.
///
/// Every accepted connection gets its own task for the TLS handshake and,
/// on success, the forwarding session; a failed handshake or a failed
/// session never blocks the next accept. An accept error is unrecoverable
/// and terminates the loop.
pub async fn run(
    listener: TcpListener,
    tls_config: Arc<ServerConfig>,
    backend_addr: SocketAddr,
    log: Arc<EventLog>,
) -> Result<()> {
    let acceptor = TlsAcceptor::from(tls_config);
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, backend = %backend_addr, "TLS tunnel listening");

    loop {
        let (tcp_stream, peer_addr) = listener.accept().await?;
        debug!(peer = %peer_addr, "accepted TCP connection");

        let acceptor = acceptor.clone();
        let log = log.clone();
        tokio::spawn(async move {
            match acceptor.accept(tcp_stream).await {
                Ok(tls_stream) => {
                    let peer = Peer::from(peer_addr);
                    let epoch = tls::connection_epoch(tls_stream.get_ref().1);
                    log.line(&peer, &format!("connection established ({epoch})"));
                    session::run(tls_stream, peer, backend_addr, log).await;
                }
                Err(e) => {
                    // Dropped without an event log entry; the handshake
                    // never produced a session to account for.
                    debug!(peer = %peer_addr, error = %e, "TLS handshake failed");
                }
            }
        });
    }
}

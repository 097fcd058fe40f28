use std::net::SocketAddr;

use tokio::net::lookup_host;

use crate::error::{Error, Result};

/// Resolve the backend host and port to a single socket address.
///
/// Resolution happens once at startup; the first returned address wins. An
/// unreachable backend later on is a per-connection failure, not a resolver
/// concern.
pub async fn resolve_backend(host: &str, port: u16) -> Result<SocketAddr> {
    let mut addrs = lookup_host((host, port))
        .await
        .map_err(|_| Error::Resolution(host.to_string()))?;

    addrs.next().ok_or_else(|| Error::Resolution(host.to_string()))
}

use std::path::Path;

use rustls::{ServerConfig, ServerConnection};
use tokio::fs;

use crate::error::{Error, Result};

/// Load the PEM certificate chain and private key, then build a rustls
/// server config. Called once at startup; the resulting config is shared
/// read-only by every handshake.
pub async fn load_server_config(cert_path: &Path, key_path: &Path) -> Result<ServerConfig> {
    let cert_pem = fs::read(cert_path).await?;
    let key_pem = fs::read(key_path).await?;

    build_server_config(&cert_pem, &key_pem)
}

fn build_server_config(mut cert_pem: &[u8], mut key_pem: &[u8]) -> Result<ServerConfig> {
    let certs = rustls_pemfile::certs(&mut cert_pem)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::CertParse(format!("failed to parse certificate PEM: {e}")))?;

    if certs.is_empty() {
        return Err(Error::CertParse("no certificates found in PEM".into()));
    }

    let key = rustls_pemfile::private_key(&mut key_pem)
        .map_err(|e| Error::CertParse(format!("failed to parse private key PEM: {e}")))?
        .ok_or_else(|| Error::CertParse("no private key found in PEM".into()))?;

    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| Error::Tls(format!("failed to build TLS server config: {e}")))?;

    Ok(config)
}

/// Describe the negotiated protocol version and cipher suite of a completed
/// handshake, for the "connection established" log line.
///
/// Panics if the handshake has not completed; callers only see the
/// connection after `TlsAcceptor::accept` succeeds, so a missing value here
/// is a programming error rather than a runtime condition.
pub fn connection_epoch(conn: &ServerConnection) -> String {
    let version = conn
        .protocol_version()
        .expect("protocol version available after handshake");
    let suite = conn
        .negotiated_cipher_suite()
        .expect("cipher suite available after handshake");

    format!("{:?}, {:?}", version, suite.suite())
}

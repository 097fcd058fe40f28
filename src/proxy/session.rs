use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::server::TlsStream;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::eventlog::{EventLog, Peer};

/// Upper bound on a single read from either stream.
const CHUNK_SIZE: usize = 4096;

/// Run one forwarding session to completion.
///
/// Connects to the backend, then relays bytes in both directions until
/// either side closes or errors. All failures are absorbed here: a session
/// that cannot reach the backend, or that dies mid-transfer, ends with a
/// log line and released sockets, never with an error escaping to the
/// listener.
pub async fn run(
    mut tls_stream: TlsStream<TcpStream>,
    peer: Peer,
    backend_addr: SocketAddr,
    log: Arc<EventLog>,
) {
    let backend = match TcpStream::connect(backend_addr).await {
        Ok(stream) => stream,
        Err(e) => {
            log.line(&peer, &format!("connect to backend failed: {e}"));
            let _ = tls_stream.shutdown().await;
            return;
        }
    };

    log.line(&peer, "connection forwarded");

    // One token shared by both copy directions: whichever direction sees
    // end-of-stream or an I/O error first cancels it, and the other
    // direction converges on the same close instead of lingering on a
    // half-dead connection.
    let closing = CancellationToken::new();
    let (client_read, client_write) = tokio::io::split(tls_stream);
    let (backend_read, backend_write) = backend.into_split();

    let (read_bytes, written_bytes) = tokio::join!(
        copy_half(client_read, backend_write, closing.clone()),
        copy_half(backend_read, client_write, closing.clone()),
    );

    debug!(peer = %peer, read_bytes, written_bytes, "session finished");
    log.line(
        &peer,
        &format!("connection closed read {read_bytes} bytes, wrote {written_bytes} bytes"),
    );
}

/// Copy one direction of a session, returning the number of bytes read
/// from `src`.
///
/// Reads in chunks of up to [`CHUNK_SIZE`] and writes each chunk in full.
/// End-of-stream, any I/O error, or cancellation by the opposite direction
/// all end the loop the same way; the distinction is not observable in the
/// log, since either peer closing is ordinary session termination. On exit
/// the destination's write side is shut down, which is harmless if the
/// peer is already gone.
async fn copy_half<R, W>(mut src: R, mut dst: W, closing: CancellationToken) -> u64
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = [0u8; CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let n = tokio::select! {
            biased;
            _ = closing.cancelled() => break,
            result = src.read(&mut buf) => match result {
                Ok(0) | Err(_) => {
                    closing.cancel();
                    break;
                }
                Ok(n) => n,
            },
        };

        total += n as u64;
        if dst.write_all(&buf[..n]).await.is_err() {
            closing.cancel();
            break;
        }
    }

    let _ = dst.shutdown().await;
    total
}

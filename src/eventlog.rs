use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Mutex;

use crate::error::Result;

/// Identity of the remote end of a connection, used only for log
/// attribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Peer {
    Inet(SocketAddr),
    /// Non-IP peers (e.g. a unix socket path) render as the path itself.
    Local(String),
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Peer::Inet(addr) => write!(f, "{addr}"),
            Peer::Local(path) => write!(f, "{path}"),
        }
    }
}

impl From<SocketAddr> for Peer {
    fn from(addr: SocketAddr) -> Self {
        Peer::Inet(addr)
    }
}

/// Append-only line sink recording connection lifecycle events.
///
/// Each line carries a local wall-clock timestamp, the peer identity, and a
/// message, and is flushed immediately; the log is the only audit trail of
/// what the proxy did. Not a tracing layer: no levels, no rotation, no
/// structured fields.
pub struct EventLog {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl EventLog {
    pub fn new(sink: Box<dyn Write + Send>) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Open `path` for appending, creating it if missing.
    pub fn append(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().append(true).create(true).open(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Write one log line. Sink failures are swallowed; a broken log must
    /// never take a session down with it.
    pub fn line(&self, peer: &Peer, message: &str) {
        let timestamp = chrono::Local::now().format("%H:%M:%S");
        if let Ok(mut sink) = self.sink.lock() {
            let _ = writeln!(sink, "{timestamp} {peer} {message}");
            let _ = sink.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct MemSink(Arc<Mutex<Vec<u8>>>);

    impl Write for MemSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl MemSink {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn renders_inet_peer_as_ip_port() {
        let peer = Peer::from("10.0.0.1:45678".parse::<SocketAddr>().unwrap());
        assert_eq!(peer.to_string(), "10.0.0.1:45678");
    }

    #[test]
    fn renders_local_peer_as_path() {
        let peer = Peer::Local("/run/backend.sock".into());
        assert_eq!(peer.to_string(), "/run/backend.sock");
    }

    #[test]
    fn writes_timestamped_line() {
        let sink = MemSink::default();
        let log = EventLog::new(Box::new(sink.clone()));
        let peer = Peer::from("127.0.0.1:5000".parse::<SocketAddr>().unwrap());

        log.line(&peer, "connection forwarded");

        let line = sink.contents();
        // HH:MM:SS prefix, then peer and message.
        let (stamp, rest) = line.split_once(' ').unwrap();
        assert_eq!(stamp.len(), 8);
        assert!(stamp.chars().all(|c| c.is_ascii_digit() || c == ':'));
        assert_eq!(rest, "127.0.0.1:5000 connection forwarded\n");
    }

    #[test]
    fn appends_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tunnel.log");
        let peer = Peer::from("127.0.0.1:5000".parse::<SocketAddr>().unwrap());

        {
            let log = EventLog::append(&path).unwrap();
            log.line(&peer, "first");
        }
        {
            let log = EventLog::append(&path).unwrap();
            log.line(&peer, "second");
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains("first"));
        assert!(contents.contains("second"));
    }
}

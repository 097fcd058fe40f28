use std::path::PathBuf;

use clap::Parser;

/// Terminate TLS on a listening port and forward the decrypted stream to a
/// plaintext TCP backend.
#[derive(Parser, Debug)]
#[command(name = "tlstunnel", version)]
pub struct Args {
    /// Hostname or IP of the backend service
    pub destination_host: String,

    /// TCP port of the backend service
    pub destination_port: u16,

    /// Port to listen on for incoming TLS connections
    pub listen_port: u16,

    /// Path to the PEM certificate chain presented to clients
    pub certificate_chain: PathBuf,

    /// Path to the PEM private key (unencrypted)
    pub private_key: PathBuf,

    /// Append log lines to this file instead of standard output
    #[arg(short = 'l', long)]
    pub logfile: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positional_arguments() {
        let args = Args::try_parse_from([
            "tlstunnel",
            "backend.internal",
            "8080",
            "8443",
            "/etc/tls/chain.pem",
            "/etc/tls/key.pem",
        ])
        .unwrap();

        assert_eq!(args.destination_host, "backend.internal");
        assert_eq!(args.destination_port, 8080);
        assert_eq!(args.listen_port, 8443);
        assert!(args.logfile.is_none());
    }

    #[test]
    fn parses_logfile_flag() {
        let args = Args::try_parse_from([
            "tlstunnel",
            "127.0.0.1",
            "80",
            "443",
            "chain.pem",
            "key.pem",
            "-l",
            "/var/log/tunnel.log",
        ])
        .unwrap();

        assert_eq!(args.logfile.unwrap(), PathBuf::from("/var/log/tunnel.log"));
    }

    #[test]
    fn rejects_missing_arguments() {
        assert!(Args::try_parse_from(["tlstunnel", "127.0.0.1", "80"]).is_err());
    }

    #[test]
    fn rejects_non_numeric_port() {
        assert!(Args::try_parse_from([
            "tlstunnel",
            "127.0.0.1",
            "http",
            "443",
            "chain.pem",
            "key.pem",
        ])
        .is_err());
    }
}

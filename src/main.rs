use std::net::Ipv4Addr;
use std::sync::Arc;

use clap::error::ErrorKind;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tlstunnel::cli::Args;
use tlstunnel::error::Result;
use tlstunnel::eventlog::EventLog;
use tlstunnel::{proxy, resolver, tls};

#[tokio::main]
async fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    init_logging();
    info!(
        backend_host = %args.destination_host,
        backend_port = args.destination_port,
        listen_port = args.listen_port,
        "tlstunnel starting"
    );

    if let Err(e) = run(args).await {
        error!(error = %e, "tlstunnel exited with error");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    // All of this is startup-fatal: without a backend address, a usable
    // certificate, a log sink, and a bound port there is nothing to serve.
    let backend_addr =
        resolver::resolve_backend(&args.destination_host, args.destination_port).await?;
    let tls_config = tls::load_server_config(&args.certificate_chain, &args.private_key).await?;

    let log = Arc::new(match &args.logfile {
        Some(path) => EventLog::append(path)?,
        None => EventLog::stdout(),
    });

    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, args.listen_port)).await?;

    proxy::listener::run(listener, Arc::new(tls_config), backend_addr, log).await
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub mod cli;
pub mod error;
pub mod eventlog;
pub mod proxy;
pub mod resolver;
pub mod tls;

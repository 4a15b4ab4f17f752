use std::sync::Arc;

use tower_lsp::Server;
use tracing_subscriber::EnvFilter;

use kousei::{create_service, NullTokenizer};

#[tokio::main]
async fn main() {
    // stdout carries the protocol; all logging goes to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = create_service(Arc::new(NullTokenizer));
    Server::new(stdin, stdout, socket).serve(service).await;
}

//! Fetches a resource and prints its status, headers and body size.
//!
//! ```text
//! cargo run --example fetch -- example.com /index.html
//! cargo run --example fetch -- target.org / proxy.local:3128
//! ```

use http::Method;
use micro_http_client::config::ClientConfig;
use micro_http_client::connection::HttpConnection;
use micro_http_client::protocol::HttpError;
use micro_http_client::transport::TcpConnector;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

async fn fetch(host: &str, path: &str, proxy: Option<&str>) -> Result<(), HttpError> {
    let config = ClientConfig::builder().debug_level(1).build();
    let mut connection = match proxy {
        Some(proxy) => {
            let mut connection = HttpConnection::with_config(proxy, None, config, TcpConnector)?;
            connection.set_tunnel(host, None, &[])?;
            connection
        }
        None => HttpConnection::with_config(host, None, config, TcpConnector)?,
    };

    connection.request(&Method::GET, path, None, &[("User-Agent", "micro-http-client")]).await?;
    let mut response = connection.get_response().await?;

    info!(status = %response.status(), reason = response.reason(), version = ?response.version(), "response");
    for (name, value) in response.headers().iter() {
        info!(field = name, value, "header");
    }

    let mut total = 0;
    loop {
        let chunk = response.read(Some(8 * 1024)).await?;
        if chunk.is_empty() {
            break;
        }
        total += chunk.len();
    }
    info!(bytes = total, will_close = response.will_close(), "body read");

    connection.close().await;
    Ok(())
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let host = args.first().map_or("example.com", String::as_str);
    let path = args.get(1).map_or("/", String::as_str);
    let proxy = args.get(2).map(String::as_str);

    if let Err(e) = fetch(host, path, proxy).await {
        error!(cause = %e, "fetch failed");
    }
}

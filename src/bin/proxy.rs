//! Standalone Jira forwarding proxy.
//!
//! Binds 127.0.0.1:3001 (override with the PORT environment variable) and
//! forwards `/api/jira/*` requests to the Jira REST API with server-side
//! Basic auth.
//!
//! Usage: `reviewkit-proxy`

use reviewkit::proxy;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let port = match std::env::var("PORT") {
        Ok(value) => value
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a number, got '{value}'"))?,
        Err(_) => proxy::DEFAULT_PROXY_PORT,
    };

    proxy::serve(port).await?;
    Ok(())
}

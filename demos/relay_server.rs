//! Simple signaling relay server
//!
//! Run with: cargo run --example relay_server [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example relay_server                  # binds to 0.0.0.0:8000
//!   cargo run --example relay_server 127.0.0.1:9000   # binds to 127.0.0.1:9000
//!
//! ## Trying it out
//!
//! Connect two WebSocket clients (e.g. with websocat) and exchange events:
//!
//!   websocat ws://127.0.0.1:8000
//!   > {"event":"generate:room","data":{}}
//!   < {"event":"room:generated","data":{"roomId":"K3F9Q2ZB"}}
//!   > {"event":"room:join","data":{"email":"a@x.com","room":"K3F9Q2ZB"}}
//!   < {"event":"room:status:update","data":{"currentUsers":1,"maxUsers":2,"roomId":"K3F9Q2ZB"}}
//!   < {"event":"room:join","data":{"email":"a@x.com","room":"K3F9Q2ZB","currentUsers":1,"maxUsers":2}}
//!
//! When a second client joins the same room, the first receives
//! `user:joined` with the newcomer's connection id and can start relaying
//! offers with `user:call`.

use std::net::SocketAddr;

use signaling_rs::{RelayServer, ServerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> signaling_rs::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let bind_addr: SocketAddr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "0.0.0.0:8000".to_string())
        .parse()
        .expect("invalid bind address");

    let server = RelayServer::new(ServerConfig::with_addr(bind_addr));

    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
}

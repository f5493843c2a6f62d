//! Per-connection lifecycle
//!
//! One task per socket: upgrade to WebSocket, register the writer channel,
//! feed decoded events to the router, and unwind room membership on every
//! exit path before the task ends.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use crate::error::Result;
use crate::registry::ConnId;
use crate::router::{ClientEvent, SignalingRouter};
use crate::server::peers::PeerMap;

/// One client connection from accept to disconnect
pub struct Connection {
    conn_id: ConnId,
    socket: TcpStream,
    peer_addr: SocketAddr,
    router: Arc<SignalingRouter>,
    peers: Arc<PeerMap>,
}

impl Connection {
    pub(crate) fn new(
        conn_id: ConnId,
        socket: TcpStream,
        peer_addr: SocketAddr,
        router: Arc<SignalingRouter>,
        peers: Arc<PeerMap>,
    ) -> Self {
        Self {
            conn_id,
            socket,
            peer_addr,
            router,
            peers,
        }
    }

    /// Drive the connection until the client leaves or errors out
    pub async fn run(self) -> Result<()> {
        let Connection {
            conn_id,
            socket,
            peer_addr,
            router,
            peers,
        } = self;

        let ws = tokio_tungstenite::accept_async(socket).await?;
        let (mut sink, mut stream) = ws.split();

        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
        peers.register(conn_id, tx.clone()).await;

        tracing::info!(conn = conn_id, peer = %peer_addr, "WebSocket connection established");

        // Writer task: everything addressed to this connection funnels
        // through the channel, so routed events and pongs never contend
        // for the sink.
        let mut writer = tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                if sink.send(msg).await.is_err() {
                    break;
                }
            }
        });

        let result = loop {
            tokio::select! {
                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        process_frame(conn_id, &text, &router, &peers).await;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = tx.send(Message::Pong(data));
                    }
                    Some(Ok(Message::Close(_))) | None => break Ok(()),
                    Some(Ok(_)) => {} // Binary and pong frames carry nothing for us
                    Some(Err(e)) => break Err(e.into()),
                },
                _ = &mut writer => break Ok(()),
            }
        };

        // Unregister first: once the unwind starts, nothing may address
        // this id again.
        peers.unregister(conn_id).await;
        let farewell = router.disconnect(conn_id).await;
        peers.deliver(farewell).await;
        writer.abort();

        tracing::info!(conn = conn_id, peer = %peer_addr, "Connection closed");
        result
    }
}

/// Decode one text frame and dispatch it
///
/// A malformed frame is logged and ignored; it is never fatal and gets no
/// error reply.
async fn process_frame(conn_id: ConnId, text: &str, router: &SignalingRouter, peers: &PeerMap) {
    match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => {
            let outbound = router.handle(conn_id, event).await;
            peers.deliver(outbound).await;
        }
        Err(e) => {
            tracing::warn!(conn = conn_id, error = %e, "Ignoring malformed frame");
        }
    }
}

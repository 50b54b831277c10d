//! Connection layer: WebSocket listener and per-connection tasks
//!
//! One task per connection. Each task performs the WebSocket handshake,
//! pushes the unsolicited greeting, then runs a receive loop that fully
//! processes every inbound frame before awaiting the next one. The
//! (player, session) binding is task-local state, so seat cleanup on
//! disconnect needs no shared directory.

use crate::dispatcher::{handle_message, ConnectionBinding};
use crate::registry::SessionRegistry;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{Message, SERVER_HELLO};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::WebSocketStream;

type WsSink = SplitSink<WebSocketStream<TcpStream>, WsMessage>;
type WsSource = SplitStream<WebSocketStream<TcpStream>>;
type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Listener plus the registry every connection task shares.
pub struct Server {
    listener: TcpListener,
    registry: Arc<Mutex<SessionRegistry>>,
}

impl Server {
    /// Binds the TCP listener and sizes the session pool. Bind failure
    /// is the only fatal startup error.
    pub async fn bind(addr: &str, capacity: usize) -> Result<Self, BoxError> {
        let listener = TcpListener::bind(addr).await?;
        info!(
            "Listening on {} ({} session slots)",
            listener.local_addr()?,
            capacity
        );

        Ok(Self {
            listener,
            registry: Arc::new(Mutex::new(SessionRegistry::new(capacity))),
        })
    }

    /// The bound address, needed when binding to port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept loop. Runs until the listener fails.
    pub async fn run(self) -> Result<(), BoxError> {
        loop {
            let (stream, peer) = self.listener.accept().await?;
            let registry = Arc::clone(&self.registry);

            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, peer, registry).await {
                    warn!("Connection from {} ended: {}", peer, e);
                }
            });
        }
    }
}

/// Serializes a frame and sends it. Failures are logged and swallowed;
/// delivery is not guaranteed and there is no retry.
async fn send_message(sink: &mut WsSink, peer: SocketAddr, message: &Message) {
    let bytes = match bincode::serialize(message) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Failed to encode frame for {}: {}", peer, e);
            return;
        }
    };

    if let Err(e) = sink.send(WsMessage::Binary(bytes)).await {
        error!("Failed to send frame to {}: {}", peer, e);
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    registry: Arc<Mutex<SessionRegistry>>,
) -> Result<(), BoxError> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    info!("Client connected from {}", peer);

    let (mut sink, mut source) = ws.split();

    // Greeting goes out before any client frame is processed.
    send_message(
        &mut sink,
        peer,
        &Message::Hello {
            text: SERVER_HELLO.to_string(),
        },
    )
    .await;

    let mut binding: Option<ConnectionBinding> = None;
    let result = receive_loop(&mut sink, &mut source, peer, &registry, &mut binding).await;

    // Vacate the seat whether the loop ended cleanly or not. A client
    // that never completed GetId has nothing to release.
    if let Some(bound) = binding {
        registry.lock().await.release(bound.player_id, bound.session_id);
    }
    info!("Client {} disconnected", peer);

    result
}

async fn receive_loop(
    sink: &mut WsSink,
    source: &mut WsSource,
    peer: SocketAddr,
    registry: &Arc<Mutex<SessionRegistry>>,
    binding: &mut Option<ConnectionBinding>,
) -> Result<(), BoxError> {
    while let Some(frame) = source.next().await {
        let frame = frame?;

        let data = match frame {
            WsMessage::Binary(data) => data,
            WsMessage::Close(_) => {
                debug!("Close frame from {}", peer);
                break;
            }
            WsMessage::Ping(_) | WsMessage::Pong(_) => continue,
            other => {
                // Only binary frames carry protocol data; anything else
                // is malformed input and kills the read loop.
                warn!("Non-binary frame from {}: {:?}", peer, other);
                break;
            }
        };

        let message: Message = match bincode::deserialize(&data) {
            Ok(message) => message,
            Err(e) => {
                warn!("Failed to decode frame from {}: {}", peer, e);
                break;
            }
        };

        debug!("Frame from {}: {:?}", peer, message);
        if let Some(response) = handle_message(registry, binding, message).await {
            send_message(sink, peer, &response).await;
        }
    }

    Ok(())
}

//! Headless scripted client for exercising the backend by hand.
//!
//! Connects, obtains an identity, waits for a second player (run two
//! copies), signals readiness, then pushes paddle updates and prints
//! the authoritative state for a few rounds.

use futures_util::{SinkExt, StreamExt};
use shared::{Message, NO_BALL, POS_UNSET, UNASSIGNED};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn send(ws: &mut Ws, message: &Message) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = bincode::serialize(message)?;
    ws.send(WsMessage::Binary(bytes)).await?;
    Ok(())
}

async fn recv(ws: &mut Ws) -> Result<Message, Box<dyn std::error::Error>> {
    loop {
        let frame = ws.next().await.ok_or("connection closed")??;
        if let WsMessage::Binary(data) = frame {
            return Ok(bincode::deserialize(&data)?);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ws://127.0.0.1:8443".to_string());

    println!("Connecting to {}", url);
    let (mut ws, _) = tokio_tungstenite::connect_async(&url).await?;

    match recv(&mut ws).await? {
        Message::Hello { text } => println!("Server hello: {}", text),
        other => println!("Expected hello, got {:?}", other),
    }

    send(&mut ws, &Message::GetId).await?;
    let (player_id, session_id) = match recv(&mut ws).await? {
        Message::IdResponse {
            player_id,
            session_id,
        } => (player_id, session_id),
        other => return Err(format!("Expected IdResponse, got {:?}", other).into()),
    };

    if player_id == UNASSIGNED {
        return Err("No session available".into());
    }
    println!(
        "Assigned player {:#010x} in session {:#010x}",
        player_id, session_id
    );

    // Poll until the second player shows up.
    loop {
        send(&mut ws, &Message::GetCtx { session_id }).await?;
        if let Message::CtxResponse {
            left_id, right_id, ..
        } = recv(&mut ws).await?
        {
            if left_id != UNASSIGNED && right_id != UNASSIGNED {
                let side = if player_id == left_id { "left" } else { "right" };
                println!("Both players present, playing {}", side);
                break;
            }
        }
        println!("Waiting for second player...");
        sleep(Duration::from_secs(1)).await;
    }

    send(
        &mut ws,
        &Message::Ready {
            session_id,
            player_id,
        },
    )
    .await?;
    println!("Sent ready");

    for round in 0..10 {
        let paddle_pos = 360 + (round * 20) % 200;
        send(
            &mut ws,
            &Message::SetCtx {
                session_id,
                left_pos: paddle_pos,
                right_pos: POS_UNSET,
                ball_vx: NO_BALL,
                ball_vy: NO_BALL,
                ball_posx: NO_BALL,
                ball_posy: NO_BALL,
            },
        )
        .await?;

        send(&mut ws, &Message::GetCtx { session_id }).await?;
        match recv(&mut ws).await? {
            Message::CtxResponse {
                left_pos,
                right_pos,
                ball_vx,
                ball_vy,
                ball_master_id,
                ..
            } => {
                let master = if ball_master_id == player_id { "us" } else { "peer" };
                println!(
                    "Round {}: paddles ({}, {}), ball velocity ({}, {}), master {}",
                    round, left_pos, right_pos, ball_vx, ball_vy, master
                );
            }
            other => println!("Unexpected frame: {:?}", other),
        }

        sleep(Duration::from_millis(500)).await;
    }

    ws.close(None).await?;
    Ok(())
}

use serde::{Deserialize, Serialize};

/// Sentinel for an unassigned unsigned field (player or session id).
pub const UNASSIGNED: u32 = u32::MAX;
/// Sentinel for ball kinematics fields while no ball is in flight.
pub const NO_BALL: i32 = i32::MAX;
/// Sentinel for a paddle position that has not been reported yet.
pub const POS_UNSET: i32 = -1;

/// Side tag mixed into the low bits of a player id.
pub const SIDE_LEFT: u32 = 1;
pub const SIDE_RIGHT: u32 = 2;

/// Initial ball velocity on both axes when a match starts.
pub const INITIAL_BALL_VELOCITY: i32 = 5;

/// Greeting text pushed to every client right after the handshake.
pub const SERVER_HELLO: &str = "pong backend ready";

/// Derives a player id from a session id and a side tag.
///
/// Ids are only ever compared within one session, so losing the top two
/// session bits to the shift is acceptable.
pub fn player_id_for(session_id: u32, side: u32) -> u32 {
    (session_id << 2) | side
}

/// One wire frame per logical command. Sent as bincode inside a binary
/// WebSocket message.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Message {
    /// Greeting. The server pushes one unsolicited on connect; clients
    /// may send one back, which is acknowledged in the log only.
    Hello { text: String },

    /// Request an identity and a seat in a session.
    GetId,
    /// Answer to `GetId`. Both fields are `UNASSIGNED` when no session
    /// slot is available.
    IdResponse { player_id: u32, session_id: u32 },

    /// Pull the authoritative shared state of a session.
    GetCtx { session_id: u32 },
    /// Answer to `GetCtx`.
    CtxResponse {
        left_id: u32,
        right_id: u32,
        left_pos: i32,
        right_pos: i32,
        ball_vx: i32,
        ball_vy: i32,
        ball_posx: i32,
        ball_posy: i32,
        ball_master_id: u32,
    },

    /// One-way push of locally simulated state. Fields equal to their
    /// sentinel are left untouched by the server.
    SetCtx {
        session_id: u32,
        left_pos: i32,
        right_pos: i32,
        ball_vx: i32,
        ball_vy: i32,
        ball_posx: i32,
        ball_posy: i32,
    },

    /// One-way readiness signal. When both players of a session have
    /// sent theirs, the server spawns the ball.
    Ready { session_id: u32, player_id: u32 },
}

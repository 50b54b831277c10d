//! # Pong Session Backend
//!
//! Authoritative backend for two-player Pong over persistent WebSocket
//! connections. The server pairs incoming clients into sessions, issues
//! identities, and relays the shared match state between the two peers.
//! It does not simulate the game itself: exactly one player at a time is
//! authoritative for ball physics (the "ball master"), and the server
//! arbitrates who that is.
//!
//! ## Protocol flow
//!
//! 1. On connect the server pushes an unsolicited `Hello`.
//! 2. The client sends `GetId` and receives a `(player_id, session_id)`
//!    pair; the first player of a session takes the left side, the
//!    second the right.
//! 3. Both clients signal `Ready`; the second signal spawns the ball
//!    with its canonical velocity and hands authority to the right
//!    player.
//! 4. Clients continuously push local state with `SetCtx` (one-way) and
//!    pull the authoritative shared state with `GetCtx`. Each qualifying
//!    push may hand ball authority to the other side, based on the sign
//!    of the reported horizontal velocity.
//!
//! ## Architecture
//!
//! - One spawned task per connection, each running a blocking receive
//!   loop; a frame is fully handled before the next one is awaited.
//! - The session registry (slot pool, id table) sits behind a single
//!   exclusive lock; every registry operation is one critical section,
//!   which is what guarantees the ready handshake observes both flags
//!   consistently.
//! - The (player, session) binding of a connection is owned by its
//!   task and released when the task exits, so disconnect cleanup never
//!   races a concurrent join.
//!
//! ## Module organization
//!
//! - [`session`]: per-match state and the ball-authority rules.
//! - [`registry`]: slot pool, identity generation, join/release.
//! - [`dispatcher`]: routes decoded frames to registry operations.
//! - [`network`]: WebSocket listener and per-connection tasks.

pub mod dispatcher;
pub mod network;
pub mod registry;
pub mod session;

//! Inbound message routing
//!
//! Decoded frames are routed here by the connection task. Handlers
//! mutate the registry under its lock and return the response frame to
//! send back, if the message kind calls for one. Keeping the routing
//! free of socket types lets the protocol semantics be tested directly.

use crate::registry::SessionRegistry;
use crate::session::ReadyOutcome;
use log::{info, warn};
use shared::{Message, UNASSIGNED};
use std::sync::Arc;
use tokio::sync::Mutex;

/// What this connection represents once `GetId` has succeeded. Owned by
/// the connection task; used to vacate the seat when the task exits.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionBinding {
    pub player_id: u32,
    pub session_id: u32,
}

/// Routes one decoded frame. Returns the frame to send in reply, or
/// `None` for one-way kinds and for requests that are silently dropped.
pub async fn handle_message(
    registry: &Arc<Mutex<SessionRegistry>>,
    binding: &mut Option<ConnectionBinding>,
    message: Message,
) -> Option<Message> {
    match message {
        Message::Hello { text } => {
            info!("Client hello: {}", text);
            None
        }

        Message::GetId => {
            // A connection holds at most one seat; a repeated request
            // just gets the ids it already has.
            if let Some(bound) = binding {
                warn!(
                    "Repeated GetId from player {:#010x}, resending ids",
                    bound.player_id
                );
                return Some(Message::IdResponse {
                    player_id: bound.player_id,
                    session_id: bound.session_id,
                });
            }

            let mut registry = registry.lock().await;
            match registry.join() {
                Some((player_id, session_id)) => {
                    *binding = Some(ConnectionBinding {
                        player_id,
                        session_id,
                    });
                    Some(Message::IdResponse {
                        player_id,
                        session_id,
                    })
                }
                None => {
                    // The protocol has no error frame, so exhaustion is
                    // reported with the sentinel ids.
                    warn!("Session pool exhausted, sending sentinel ids");
                    Some(Message::IdResponse {
                        player_id: UNASSIGNED,
                        session_id: UNASSIGNED,
                    })
                }
            }
        }

        Message::GetCtx { session_id } => {
            let registry = registry.lock().await;
            match registry.session(session_id) {
                Some(session) => Some(session.snapshot()),
                None => {
                    warn!("GetCtx for unknown session {:#010x}", session_id);
                    None
                }
            }
        }

        Message::SetCtx {
            session_id,
            left_pos,
            right_pos,
            ball_vx,
            ball_vy,
            ball_posx,
            ball_posy,
        } => {
            let mut registry = registry.lock().await;
            match registry.session_mut(session_id) {
                Some(session) => {
                    session.apply_ctx_update(left_pos, right_pos, ball_vx, ball_vy, ball_posx, ball_posy);
                }
                None => warn!("SetCtx for unknown session {:#010x}", session_id),
            }
            None
        }

        Message::Ready {
            session_id,
            player_id,
        } => {
            let mut registry = registry.lock().await;
            match registry.session_mut(session_id) {
                Some(session) => {
                    if session.mark_ready(player_id) == ReadyOutcome::InvalidPlayer {
                        warn!(
                            "Ready with invalid player {:#010x} for session {:#010x}",
                            player_id, session_id
                        );
                    }
                }
                None => warn!("Ready for unknown session {:#010x}", session_id),
            }
            None
        }

        // Response kinds arriving from a client are not part of the
        // protocol; log and keep the connection open.
        other => {
            warn!("Ignoring unexpected message kind: {:?}", other);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{INITIAL_BALL_VELOCITY, NO_BALL, POS_UNSET};

    fn registry(capacity: usize) -> Arc<Mutex<SessionRegistry>> {
        Arc::new(Mutex::new(SessionRegistry::new(capacity)))
    }

    async fn get_id(
        registry: &Arc<Mutex<SessionRegistry>>,
        binding: &mut Option<ConnectionBinding>,
    ) -> (u32, u32) {
        match handle_message(registry, binding, Message::GetId).await {
            Some(Message::IdResponse {
                player_id,
                session_id,
            }) => (player_id, session_id),
            other => panic!("Expected IdResponse, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_hello_is_log_only() {
        let registry = registry(1);
        let mut binding = None;

        let response = handle_message(
            &registry,
            &mut binding,
            Message::Hello {
                text: "hi".to_string(),
            },
        )
        .await;

        assert!(response.is_none());
        assert!(binding.is_none());
    }

    #[tokio::test]
    async fn test_get_id_records_binding() {
        let registry = registry(1);
        let mut binding = None;

        let (player_id, session_id) = get_id(&registry, &mut binding).await;

        let bound = binding.expect("binding should be recorded");
        assert_eq!(bound.player_id, player_id);
        assert_eq!(bound.session_id, session_id);
        assert_ne!(player_id, UNASSIGNED);
    }

    #[tokio::test]
    async fn test_get_id_exhaustion_sends_sentinels() {
        let registry = registry(1);
        let mut b1 = None;
        let mut b2 = None;
        let mut b3 = None;

        get_id(&registry, &mut b1).await;
        get_id(&registry, &mut b2).await;
        let (player_id, session_id) = get_id(&registry, &mut b3).await;

        assert_eq!(player_id, UNASSIGNED);
        assert_eq!(session_id, UNASSIGNED);
        // No seat was claimed, so nothing to clean up on disconnect.
        assert!(b3.is_none());
    }

    #[tokio::test]
    async fn test_repeated_get_id_keeps_the_same_seat() {
        let registry = registry(1);
        let mut binding = None;

        let (player_id, session_id) = get_id(&registry, &mut binding).await;
        let (again_player, again_session) = get_id(&registry, &mut binding).await;

        // Same ids come back and no second seat is claimed, so the
        // peer's seat stays available.
        assert_eq!(again_player, player_id);
        assert_eq!(again_session, session_id);

        let mut peer_binding = None;
        let (peer_id, peer_session) = get_id(&registry, &mut peer_binding).await;
        assert_ne!(peer_id, UNASSIGNED);
        assert_eq!(peer_session, session_id);
    }

    #[tokio::test]
    async fn test_get_ctx_unknown_session_is_dropped() {
        let registry = registry(1);
        let mut binding = None;

        let response = handle_message(
            &registry,
            &mut binding,
            Message::GetCtx { session_id: 0x77 },
        )
        .await;

        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_full_match_setup_flow() {
        let registry = registry(1);
        let mut binding_a = None;
        let mut binding_b = None;

        let (left_id, session_id) = get_id(&registry, &mut binding_a).await;
        let (right_id, session_id_b) = get_id(&registry, &mut binding_b).await;
        assert_eq!(session_id, session_id_b);

        for player_id in [right_id, left_id] {
            let response = handle_message(
                &registry,
                &mut binding_a,
                Message::Ready {
                    session_id,
                    player_id,
                },
            )
            .await;
            assert!(response.is_none());
        }

        match handle_message(&registry, &mut binding_a, Message::GetCtx { session_id }).await {
            Some(Message::CtxResponse {
                left_id: l,
                right_id: r,
                ball_vx,
                ball_vy,
                ball_master_id,
                ..
            }) => {
                assert_eq!(l, left_id);
                assert_eq!(r, right_id);
                assert_eq!(ball_vx, INITIAL_BALL_VELOCITY);
                assert_eq!(ball_vy, INITIAL_BALL_VELOCITY);
                assert_eq!(ball_master_id, right_id);
            }
            other => panic!("Expected CtxResponse, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_set_ctx_is_one_way_and_flips_master() {
        let registry = registry(1);
        let mut binding = None;
        let mut peer_binding = None;

        let (left_id, session_id) = get_id(&registry, &mut binding).await;
        let (right_id, _) = get_id(&registry, &mut peer_binding).await;
        for player_id in [left_id, right_id] {
            handle_message(
                &registry,
                &mut binding,
                Message::Ready {
                    session_id,
                    player_id,
                },
            )
            .await;
        }

        let response = handle_message(
            &registry,
            &mut binding,
            Message::SetCtx {
                session_id,
                left_pos: 300,
                right_pos: POS_UNSET,
                ball_vx: -3,
                ball_vy: 2,
                ball_posx: 640,
                ball_posy: 360,
            },
        )
        .await;
        assert!(response.is_none());

        match handle_message(&registry, &mut binding, Message::GetCtx { session_id }).await {
            Some(Message::CtxResponse {
                left_pos,
                right_pos,
                ball_vx,
                ball_master_id,
                ..
            }) => {
                assert_eq!(left_pos, 300);
                assert_eq!(right_pos, POS_UNSET);
                assert_eq!(ball_vx, -3);
                assert_eq!(ball_master_id, left_id);
            }
            other => panic!("Expected CtxResponse, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ready_before_peer_keeps_ball_absent() {
        let registry = registry(1);
        let mut binding = None;

        let (left_id, session_id) = get_id(&registry, &mut binding).await;
        handle_message(
            &registry,
            &mut binding,
            Message::Ready {
                session_id,
                player_id: left_id,
            },
        )
        .await;

        match handle_message(&registry, &mut binding, Message::GetCtx { session_id }).await {
            Some(Message::CtxResponse { ball_vx, ball_master_id, .. }) => {
                assert_eq!(ball_vx, NO_BALL);
                assert_eq!(ball_master_id, UNASSIGNED);
            }
            other => panic!("Expected CtxResponse, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unexpected_kind_is_ignored() {
        let registry = registry(1);
        let mut binding = None;

        let response = handle_message(
            &registry,
            &mut binding,
            Message::IdResponse {
                player_id: 1,
                session_id: 2,
            },
        )
        .await;

        assert!(response.is_none());
    }
}

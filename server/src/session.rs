//! Per-session game state and the ball-authority handoff rules
//!
//! A session holds the shared state of one match: both player ids, the
//! last reported paddle positions, the readiness handshake flags, and
//! the ball kinematics together with the id of the player currently
//! simulating the ball (the "ball master"). The other player renders
//! mirrored state pulled via `GetCtx`.

use log::{debug, info};
use shared::{Message, INITIAL_BALL_VELOCITY, NO_BALL, POS_UNSET, SIDE_LEFT, SIDE_RIGHT, UNASSIGNED};

/// Which half of the field a player occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// The tag encoded into the low bits of a player id.
    pub fn tag(self) -> u32 {
        match self {
            Side::Left => SIDE_LEFT,
            Side::Right => SIDE_RIGHT,
        }
    }
}

/// Result of delivering a `Ready` signal to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyOutcome {
    /// Flag recorded, still waiting for the other player.
    Waiting,
    /// This signal completed the handshake and the ball was spawned.
    BallSpawned,
    /// The player id matches neither side of the session.
    InvalidPlayer,
}

/// Shared state of one match. A vacant slot is represented by a session
/// whose `session_id` is `UNASSIGNED`.
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: u32,
    pub player_left_id: u32,
    pub player_right_id: u32,
    pub player_left_pos: i32,
    pub player_right_pos: i32,
    pub player_left_ready: bool,
    pub player_right_ready: bool,
    pub ball_vx: i32,
    pub ball_vy: i32,
    pub ball_posx: i32,
    pub ball_posy: i32,
    pub ball_master_id: u32,
}

impl Session {
    /// Creates an unoccupied slot.
    pub fn vacant() -> Self {
        Self {
            session_id: UNASSIGNED,
            player_left_id: UNASSIGNED,
            player_right_id: UNASSIGNED,
            player_left_pos: POS_UNSET,
            player_right_pos: POS_UNSET,
            player_left_ready: false,
            player_right_ready: false,
            ball_vx: NO_BALL,
            ball_vy: NO_BALL,
            ball_posx: NO_BALL,
            ball_posy: NO_BALL,
            ball_master_id: UNASSIGNED,
        }
    }

    /// True while the slot holds no session at all.
    pub fn is_vacant(&self) -> bool {
        self.session_id == UNASSIGNED
    }

    /// True when at least one seat can still be claimed.
    pub fn has_open_side(&self) -> bool {
        self.player_left_id == UNASSIGNED || self.player_right_id == UNASSIGNED
    }

    /// True once both seats have been vacated again.
    pub fn is_empty(&self) -> bool {
        self.player_left_id == UNASSIGNED && self.player_right_id == UNASSIGNED
    }

    /// Returns the side the given player id occupies, if any.
    pub fn side_of(&self, player_id: u32) -> Option<Side> {
        if player_id == UNASSIGNED {
            None
        } else if player_id == self.player_left_id {
            Some(Side::Left)
        } else if player_id == self.player_right_id {
            Some(Side::Right)
        } else {
            None
        }
    }

    /// Records a readiness flag. Completing the handshake spawns the
    /// ball: canonical velocity on both axes, position left at the
    /// sentinel (clients pick the canonical start point), simulation
    /// authority handed to the right player.
    pub fn mark_ready(&mut self, player_id: u32) -> ReadyOutcome {
        let side = match self.side_of(player_id) {
            Some(side) => side,
            None => return ReadyOutcome::InvalidPlayer,
        };

        let was_complete = self.player_left_ready && self.player_right_ready;
        match side {
            Side::Left => self.player_left_ready = true,
            Side::Right => self.player_right_ready = true,
        }

        if !was_complete && self.player_left_ready && self.player_right_ready {
            self.ball_vx = INITIAL_BALL_VELOCITY;
            self.ball_vy = INITIAL_BALL_VELOCITY;
            self.ball_posx = NO_BALL;
            self.ball_posy = NO_BALL;
            self.ball_master_id = self.player_right_id;
            info!(
                "Session {:#010x}: both players ready, ball spawned, master {:#010x}",
                self.session_id, self.ball_master_id
            );
            ReadyOutcome::BallSpawned
        } else {
            ReadyOutcome::Waiting
        }
    }

    /// Merges a one-way state push from a client.
    ///
    /// Paddle positions are taken field by field, skipping the unset
    /// sentinel. Ball fields are ignored until the ready handshake has
    /// completed; after that, a push carrying real velocities overwrites
    /// the ball and reassigns authority from the sign of `ball_vx`:
    /// moving right, the right player simulates, otherwise the left.
    pub fn apply_ctx_update(
        &mut self,
        left_pos: i32,
        right_pos: i32,
        ball_vx: i32,
        ball_vy: i32,
        ball_posx: i32,
        ball_posy: i32,
    ) {
        if left_pos != POS_UNSET {
            self.player_left_pos = left_pos;
        }
        if right_pos != POS_UNSET {
            self.player_right_pos = right_pos;
        }

        if !(self.player_left_ready && self.player_right_ready) {
            return;
        }

        if ball_vx != NO_BALL && ball_vy != NO_BALL {
            self.ball_vx = ball_vx;
            self.ball_vy = ball_vy;
            self.ball_posx = ball_posx;
            self.ball_posy = ball_posy;
            self.ball_master_id = if ball_vx > 0 {
                self.player_right_id
            } else {
                self.player_left_id
            };
            debug!(
                "Session {:#010x}: ball ({}, {}) at ({}, {}), master {:#010x}",
                self.session_id, ball_vx, ball_vy, ball_posx, ball_posy, self.ball_master_id
            );
        }
    }

    /// Copies the shared state into a `CtxResponse` frame.
    pub fn snapshot(&self) -> Message {
        Message::CtxResponse {
            left_id: self.player_left_id,
            right_id: self.player_right_id,
            left_pos: self.player_left_pos,
            right_pos: self.player_right_pos,
            ball_vx: self.ball_vx,
            ball_vy: self.ball_vy,
            ball_posx: self.ball_posx,
            ball_posy: self.ball_posy,
            ball_master_id: self.ball_master_id,
        }
    }

    /// Vacates one seat, leaving the rest of the session untouched so a
    /// remaining player keeps their id and the ball state.
    pub fn clear_side(&mut self, side: Side) {
        match side {
            Side::Left => self.player_left_id = UNASSIGNED,
            Side::Right => self.player_right_id = UNASSIGNED,
        }
    }

    /// Returns the slot to its pristine vacant state.
    pub fn reset(&mut self) {
        *self = Session::vacant();
    }
}

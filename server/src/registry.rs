//! Session slot pool, identity generation, and matchmaking
//!
//! The registry owns a fixed number of session slots and the table of
//! live session ids. Joining scans for the first slot that is vacant or
//! has an open seat; a vacant slot gets a fresh random session id. All
//! operations take `&mut self` so the caller's lock makes each one a
//! single critical section: the scan, the id draw, and the seat claim
//! can never interleave with another task's view of the pool.

use crate::session::{Session, Side};
use log::{info, warn};
use rand::Rng;
use shared::{player_id_for, UNASSIGNED};
use std::collections::HashMap;

pub struct SessionRegistry {
    slots: Vec<Session>,
    /// Live session id -> slot index.
    index: HashMap<u32, usize>,
}

impl SessionRegistry {
    /// Creates a registry with `capacity` vacant slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| Session::vacant()).collect(),
            index: HashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots currently holding a session.
    pub fn active_sessions(&self) -> usize {
        self.index.len()
    }

    /// Draws a random session id absent from the live table. Collisions
    /// against a pool this small are vanishingly rare, so resampling is
    /// effectively a single draw.
    fn fresh_session_id(&self) -> u32 {
        let mut rng = rand::thread_rng();
        loop {
            let candidate: u32 = rng.gen();
            if candidate != UNASSIGNED && !self.index.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    /// Seats a new player, creating a session lazily when the first-fit
    /// slot is vacant. The left seat is always claimed before the right
    /// one. Returns `None` when every slot is full.
    pub fn join(&mut self) -> Option<(u32, u32)> {
        let slot = self
            .slots
            .iter()
            .position(|s| s.is_vacant() || s.has_open_side())?;

        if self.slots[slot].is_vacant() {
            let session_id = self.fresh_session_id();
            self.slots[slot].session_id = session_id;
            self.index.insert(session_id, slot);
            info!("Created session {:#010x} in slot {}", session_id, slot);
        }

        let session = &mut self.slots[slot];
        let side = if session.player_left_id == UNASSIGNED {
            Side::Left
        } else {
            Side::Right
        };
        let player_id = player_id_for(session.session_id, side.tag());
        match side {
            Side::Left => session.player_left_id = player_id,
            Side::Right => session.player_right_id = player_id,
        }

        info!(
            "Player {:#010x} joined session {:#010x} ({:?})",
            player_id, session.session_id, side
        );
        Some((player_id, session.session_id))
    }

    /// Vacates the seat held by `player_id`. The remaining player keeps
    /// their id and the ball state; once both seats are empty the slot
    /// is reset completely so the next pair starts from scratch.
    pub fn release(&mut self, player_id: u32, session_id: u32) {
        let slot = match self.index.get(&session_id) {
            Some(&slot) => slot,
            None => {
                warn!(
                    "Release for unknown session {:#010x} (player {:#010x})",
                    session_id, player_id
                );
                return;
            }
        };

        let session = &mut self.slots[slot];
        match session.side_of(player_id) {
            Some(side) => {
                session.clear_side(side);
                info!(
                    "Player {:#010x} left session {:#010x} ({:?})",
                    player_id, session_id, side
                );
            }
            None => {
                warn!(
                    "Release with invalid player {:#010x} for session {:#010x}",
                    player_id, session_id
                );
                return;
            }
        }

        if session.is_empty() {
            session.reset();
            self.index.remove(&session_id);
            info!("Session {:#010x} emptied, slot {} recycled", session_id, slot);
        }
    }

    /// Read access to a live session.
    pub fn session(&self, session_id: u32) -> Option<&Session> {
        self.index.get(&session_id).map(|&slot| &self.slots[slot])
    }

    /// Mutable access to a live session. The registry lock must be held
    /// for the whole mutation, which the dispatcher guarantees.
    pub fn session_mut(&mut self, session_id: u32) -> Option<&mut Session> {
        let slot = *self.index.get(&session_id)?;
        Some(&mut self.slots[slot])
    }
}

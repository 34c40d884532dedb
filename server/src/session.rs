//! Session table: maps a peer address to a player identity.
//!
//! Grounded on the teacher's `server/src/client_manager.rs`
//! (`ClientManager`/`Client`, `check_timeouts`), generalized to key by peer
//! address rather than a numeric client id (sessions are address-keyed per
//! SPEC_FULL.md §4.5/§9) and to track only the single most recent accepted
//! input rather than a pending-input queue — there is no client-side
//! prediction here to reconcile against, so only the latest input matters
//! to the next `tick()`.
//!
//! Lookup stays an O(n) linear scan over a `Vec<Session>`, mirroring the
//! original C implementation's `player_by_id`/address scan rather than
//! reaching for a `HashMap<SocketAddr, _>` prematurely; `§9` calls this
//! acceptable at realistic ("dozens of") player counts and names a
//! `HashMap` as the scale-up path, not something to build now.

use std::net::SocketAddr;
use std::time::Instant;

use shared::protocol::PlayerInput;
use shared::PlayerId;

use crate::clock::Clock;
use crate::net::peers_equal;

/// One connected peer: its identity in the world, and the bookkeeping
/// needed to drop it on silence and reject stale input.
#[derive(Debug, Clone)]
pub struct Session {
    pub peer: SocketAddr,
    pub player_id: PlayerId,
    pub last_seq: u64,
    pub last_input_time: Instant,
}

/// The set of currently-connected sessions.
#[derive(Debug, Default)]
pub struct SessionTable {
    sessions: Vec<Session>,
}

impl SessionTable {
    pub fn new() -> Self {
        SessionTable {
            sessions: Vec::new(),
        }
    }

    pub fn find_by_peer(&self, peer: SocketAddr) -> Option<&Session> {
        self.sessions.iter().find(|s| peers_equal(s.peer, peer))
    }

    fn find_by_peer_mut(&mut self, peer: SocketAddr) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| peers_equal(s.peer, peer))
    }

    /// Registers a brand-new session for a peer that has never been seen
    /// before. The caller is responsible for having already allocated
    /// `player_id` in the world (via `World::register_peer`).
    pub fn register(&mut self, peer: SocketAddr, player_id: PlayerId) {
        self.sessions.push(Session {
            peer,
            player_id,
            last_seq: 0,
            last_input_time: Clock::now(),
        });
    }

    /// Applies §4.5's ingestion rule for one validated `PLAYER_INPUT`
    /// packet from `peer`: creates a session on first sight (returning the
    /// freshly-assigned id via `on_new_peer`, which should call
    /// `World::register_peer`), drops the packet if its sequence number is
    /// stale, and otherwise records the input and refreshes the peer's
    /// last-seen time. Returns the player id the input applies to, and
    /// whether the packet was accepted (vs. dropped as stale).
    pub fn ingest(
        &mut self,
        peer: SocketAddr,
        sequence_num: u64,
        input: PlayerInput,
        on_new_peer: impl FnOnce() -> PlayerId,
    ) -> (PlayerId, bool) {
        if self.find_by_peer(peer).is_none() {
            let player_id = on_new_peer();
            self.register(peer, player_id);
        }
        let session = self
            .find_by_peer_mut(peer)
            .expect("session was just registered if missing");
        if sequence_num < session.last_seq {
            return (session.player_id, false);
        }
        session.last_seq = sequence_num;
        session.last_input_time = Clock::now();
        (session.player_id, true)
    }

    /// Removes every session whose last input is older than `timeout`
    /// seconds, returning the player ids that timed out so the caller can
    /// remove them from the world too (world and session die together).
    pub fn sweep_timeouts(&mut self, now: Instant, timeout_seconds: f64) -> Vec<(SocketAddr, PlayerId)> {
        let mut expired = Vec::new();
        self.sessions.retain(|s| {
            if Clock::elapsed(s.last_input_time, now) > timeout_seconds {
                expired.push((s.peer, s.player_id));
                false
            } else {
                true
            }
        });
        expired
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

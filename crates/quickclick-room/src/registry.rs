//! Room registry: who is seated, and who may still sit down.

use quickclick_protocol::ConnectionId;
use quickclick_store::{Player, StateStore};

use crate::{RoomConfig, RoomError};

/// Enforces the seat limit and the join gate over the store's player rows.
#[derive(Debug, Clone)]
pub struct RoomRegistry {
    max_players: usize,
    join_open: bool,
}

impl RoomRegistry {
    pub fn new(config: &RoomConfig) -> Self {
        Self {
            max_players: config.max_players,
            join_open: config.join_open,
        }
    }

    /// Seats `name` on `connection`.
    ///
    /// Checks run in a fixed order (full, locked, taken), so a full room
    /// reports `RoomFull` even when joining is also locked. The store is
    /// untouched on rejection.
    pub fn join(
        &self,
        store: &mut StateStore,
        connection: ConnectionId,
        name: &str,
    ) -> Result<(), RoomError> {
        if store.player_by_connection(connection).is_some() {
            return Err(RoomError::AlreadyJoined);
        }
        if name.is_empty() {
            return Err(RoomError::InvalidName);
        }
        if store.player_count() >= self.max_players {
            return Err(RoomError::RoomFull(self.max_players));
        }
        if !self.join_open {
            return Err(RoomError::JoinLocked);
        }
        if store.contains_name(name) {
            return Err(RoomError::NameTaken(name.to_owned()));
        }
        store.insert_player(name, connection)?;
        Ok(())
    }

    /// Unseats whoever owns `connection`. `None` if nobody did.
    pub fn leave(
        &self,
        store: &mut StateStore,
        connection: ConnectionId,
    ) -> Option<Player> {
        store.remove_player(connection)
    }

    /// Opens or closes the join gate for future `join` calls.
    pub fn set_join_open(&mut self, open: bool) {
        self.join_open = open;
    }

    pub fn is_join_open(&self) -> bool {
        self.join_open
    }

    /// Seated player names in join order.
    pub fn current_players(&self, store: &StateStore) -> Vec<String> {
        store.players().iter().map(|p| p.name.clone()).collect()
    }
}

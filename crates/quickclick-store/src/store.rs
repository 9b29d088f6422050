//! The [`StateStore`] itself.

use std::collections::HashMap;
use std::fmt;

use quickclick_protocol::ConnectionId;

use crate::{ClickState, Journal, Player, PointState, RoundSync, RowChange, StoreError};

/// Point balances closer to zero than this are stored as exactly zero,
/// so `1/3 + 1/3 + 1/3` worth of decrements eliminates a 1-point player.
const ZERO_EPSILON: f64 = 1e-9;

/// Row-oriented in-memory state for one room.
///
/// Players are kept in join order; click and point rows are keyed by
/// player name and exist only while a game is seeded.
pub struct StateStore {
    players: Vec<Player>,
    clicks: HashMap<String, ClickState>,
    points: HashMap<String, PointState>,
    sync: RoundSync,
    journal: Option<Box<dyn Journal>>,
}

impl StateStore {
    /// Creates an empty store with no journal.
    pub fn new() -> Self {
        Self {
            players: Vec::new(),
            clicks: HashMap::new(),
            points: HashMap::new(),
            sync: RoundSync::default(),
            journal: None,
        }
    }

    /// Attaches a write-through journal.
    pub fn with_journal(mut self, journal: impl Journal) -> Self {
        self.journal = Some(Box::new(journal));
        self
    }

    fn record(&mut self, change: RowChange) {
        if let Some(journal) = self.journal.as_mut() {
            journal.record(&change);
        }
    }

    // -- Player rows --------------------------------------------------------

    /// Inserts a player. Names and connections are both unique.
    pub fn insert_player(
        &mut self,
        name: &str,
        connection: ConnectionId,
    ) -> Result<(), StoreError> {
        if self.contains_name(name) {
            return Err(StoreError::DuplicateName(name.to_owned()));
        }
        if self.player_by_connection(connection).is_some() {
            return Err(StoreError::DuplicateConnection(connection));
        }
        self.players.push(Player {
            name: name.to_owned(),
            connection,
        });
        self.record(RowChange::PlayerInserted {
            name: name.to_owned(),
            connection,
        });
        Ok(())
    }

    /// Removes the player owning `connection`, along with its click and
    /// point rows. Returns the removed player, if any.
    pub fn remove_player(&mut self, connection: ConnectionId) -> Option<Player> {
        let index = self
            .players
            .iter()
            .position(|p| p.connection == connection)?;
        let player = self.players.remove(index);
        self.clicks.remove(&player.name);
        self.points.remove(&player.name);
        self.record(RowChange::PlayerRemoved {
            name: player.name.clone(),
        });
        Some(player)
    }

    pub fn player_by_connection(&self, connection: ConnectionId) -> Option<&Player> {
        self.players.iter().find(|p| p.connection == connection)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.players.iter().any(|p| p.name == name)
    }

    /// All players in join order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    // -- Click / point rows -------------------------------------------------

    /// Seeds a player's game rows: `clicked = false`, `points = starting_points`.
    /// Existing rows for that player are overwritten.
    pub fn seed_game_rows(&mut self, player: &str, starting_points: f64) {
        self.clicks.insert(
            player.to_owned(),
            ClickState {
                player: player.to_owned(),
                clicked: false,
            },
        );
        self.points.insert(
            player.to_owned(),
            PointState {
                player: player.to_owned(),
                points: starting_points,
            },
        );
        self.record(RowChange::ClickSet {
            player: player.to_owned(),
            clicked: false,
        });
        self.record(RowChange::PointsSet {
            player: player.to_owned(),
            points: starting_points,
        });
    }

    pub fn click(&self, player: &str) -> Option<&ClickState> {
        self.clicks.get(player)
    }

    /// Marks `player` as clicked. Returns `true` only if the row existed
    /// and was not already set.
    pub fn set_clicked(&mut self, player: &str) -> bool {
        let Some(row) = self.clicks.get_mut(player) else {
            return false;
        };
        if row.clicked {
            return false;
        }
        row.clicked = true;
        self.record(RowChange::ClickSet {
            player: player.to_owned(),
            clicked: true,
        });
        true
    }

    /// Names of players whose click row is set, in join order.
    pub fn clicked_players(&self) -> Vec<&str> {
        self.players
            .iter()
            .filter(|p| self.clicks.get(&p.name).is_some_and(|c| c.clicked))
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Sets every click row back to `false`.
    pub fn reset_clicks(&mut self) {
        for row in self.clicks.values_mut() {
            row.clicked = false;
        }
        self.record(RowChange::ClicksReset);
    }

    pub fn points(&self, player: &str) -> Option<f64> {
        self.points.get(player).map(|p| p.points)
    }

    /// Subtracts `amount` from `player`'s points, clamping at zero.
    /// Returns the new balance, or `None` if the player has no point row.
    pub fn decrement_points(&mut self, player: &str, amount: f64) -> Option<f64> {
        let row = self.points.get_mut(player)?;
        let mut next = row.points - amount;
        if next < ZERO_EPSILON {
            next = 0.0;
        }
        row.points = next;
        self.record(RowChange::PointsSet {
            player: player.to_owned(),
            points: next,
        });
        Some(next)
    }

    /// First player (join order) whose balance is exactly zero.
    pub fn first_depleted(&self) -> Option<&str> {
        self.players
            .iter()
            .find(|p| self.points.get(&p.name).is_some_and(|row| row.points <= 0.0))
            .map(|p| p.name.as_str())
    }

    /// Deletes every click and point row.
    pub fn clear_game_rows(&mut self) {
        self.clicks.clear();
        self.points.clear();
        self.record(RowChange::GameRowsCleared);
    }

    /// `true` while any click or point row exists.
    pub fn has_game_rows(&self) -> bool {
        !self.clicks.is_empty() || !self.points.is_empty()
    }

    // -- Round sync ---------------------------------------------------------

    pub fn sync(&self) -> RoundSync {
        self.sync
    }

    pub fn set_acked(&mut self, acked: usize) {
        self.sync.acked = acked;
        self.record(RowChange::SyncSet { acked });
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStore")
            .field("players", &self.players)
            .field("clicks", &self.clicks)
            .field("points", &self.points)
            .field("sync", &self.sync)
            .field("journal", &self.journal.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    fn seated(names: &[&str]) -> StateStore {
        let mut store = StateStore::new();
        for (i, name) in names.iter().enumerate() {
            store.insert_player(name, conn(i as u64 + 1)).unwrap();
        }
        store
    }

    #[derive(Clone, Default)]
    struct RecordingJournal(Arc<Mutex<Vec<RowChange>>>);

    impl Journal for RecordingJournal {
        fn record(&mut self, change: &RowChange) {
            self.0.lock().unwrap().push(change.clone());
        }
    }

    #[test]
    fn test_insert_player_keeps_join_order() {
        let store = seated(&["Alice", "Bob", "Carol"]);
        let names: Vec<_> = store.players().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Alice", "Bob", "Carol"]);
        assert_eq!(store.player_count(), 3);
    }

    #[test]
    fn test_insert_player_rejects_duplicate_name() {
        let mut store = seated(&["Alice"]);
        let err = store.insert_player("Alice", conn(9)).unwrap_err();
        assert_eq!(err, StoreError::DuplicateName("Alice".into()));
        assert_eq!(store.player_count(), 1);
    }

    #[test]
    fn test_insert_player_rejects_duplicate_connection() {
        let mut store = seated(&["Alice"]);
        let err = store.insert_player("Bob", conn(1)).unwrap_err();
        assert_eq!(err, StoreError::DuplicateConnection(conn(1)));
    }

    #[test]
    fn test_remove_player_drops_game_rows() {
        let mut store = seated(&["Alice", "Bob"]);
        store.seed_game_rows("Alice", 3.0);
        store.seed_game_rows("Bob", 3.0);

        let removed = store.remove_player(conn(1)).unwrap();
        assert_eq!(removed.name, "Alice");
        assert!(store.click("Alice").is_none());
        assert!(store.points("Alice").is_none());
        assert_eq!(store.points("Bob"), Some(3.0));
    }

    #[test]
    fn test_remove_unknown_connection_is_noop() {
        let mut store = seated(&["Alice"]);
        assert!(store.remove_player(conn(42)).is_none());
        assert_eq!(store.player_count(), 1);
    }

    #[test]
    fn test_set_clicked_is_idempotent() {
        let mut store = seated(&["Alice"]);
        store.seed_game_rows("Alice", 3.0);

        assert!(store.set_clicked("Alice"));
        assert!(!store.set_clicked("Alice"));
        assert_eq!(store.clicked_players(), ["Alice"]);
    }

    #[test]
    fn test_set_clicked_without_row_is_ignored() {
        let mut store = seated(&["Alice"]);
        assert!(!store.set_clicked("Alice"));
        assert!(store.clicked_players().is_empty());
    }

    #[test]
    fn test_reset_clicks() {
        let mut store = seated(&["Alice", "Bob"]);
        store.seed_game_rows("Alice", 3.0);
        store.seed_game_rows("Bob", 3.0);
        store.set_clicked("Alice");
        store.set_clicked("Bob");

        store.reset_clicks();
        assert!(store.clicked_players().is_empty());
        assert_eq!(store.click("Bob").map(|c| c.clicked), Some(false));
    }

    #[test]
    fn test_decrement_points_clamps_at_zero() {
        let mut store = seated(&["Alice"]);
        store.seed_game_rows("Alice", 0.4);

        assert_eq!(store.decrement_points("Alice", 0.5), Some(0.0));
        assert_eq!(store.first_depleted(), Some("Alice"));
    }

    #[test]
    fn test_decrement_points_snaps_rounding_residue_to_zero() {
        let mut store = seated(&["Alice"]);
        store.seed_game_rows("Alice", 1.0);
        for _ in 0..3 {
            store.decrement_points("Alice", 1.0 / 3.0);
        }
        assert_eq!(store.points("Alice"), Some(0.0));
    }

    #[test]
    fn test_decrement_points_without_row() {
        let mut store = seated(&["Alice"]);
        assert_eq!(store.decrement_points("Alice", 1.0), None);
    }

    #[test]
    fn test_clear_game_rows() {
        let mut store = seated(&["Alice"]);
        store.seed_game_rows("Alice", 3.0);
        assert!(store.has_game_rows());

        store.clear_game_rows();
        assert!(!store.has_game_rows());
        assert_eq!(store.player_count(), 1);
    }

    #[test]
    fn test_journal_sees_every_change() {
        let journal = RecordingJournal::default();
        let log = Arc::clone(&journal.0);
        let mut store = StateStore::new().with_journal(journal);

        store.insert_player("Alice", conn(1)).unwrap();
        store.seed_game_rows("Alice", 3.0);
        store.set_clicked("Alice");
        store.set_acked(1);
        store.remove_player(conn(1));

        let log = log.lock().unwrap();
        assert_eq!(
            log.as_slice(),
            [
                RowChange::PlayerInserted { name: "Alice".into(), connection: conn(1) },
                RowChange::ClickSet { player: "Alice".into(), clicked: false },
                RowChange::PointsSet { player: "Alice".into(), points: 3.0 },
                RowChange::ClickSet { player: "Alice".into(), clicked: true },
                RowChange::SyncSet { acked: 1 },
                RowChange::PlayerRemoved { name: "Alice".into() },
            ]
        );
    }

    #[test]
    fn test_rejected_insert_is_not_journaled() {
        let journal = RecordingJournal::default();
        let log = Arc::clone(&journal.0);
        let mut store = StateStore::new().with_journal(journal);

        store.insert_player("Alice", conn(1)).unwrap();
        let _ = store.insert_player("Alice", conn(2));

        assert_eq!(log.lock().unwrap().len(), 1);
    }
}

//! Sync barrier between one round's status display and the next countdown.

use std::collections::HashSet;

use quickclick_protocol::ConnectionId;
use quickclick_store::StateStore;

/// Counts one arrival per seated connection per round.
///
/// The arrival count is mirrored into the store's `RoundSync` row. The
/// barrier is satisfied once every currently seated player has arrived;
/// players who leave take their arrival with them, so a departure can
/// both shrink the target and keep the count honest.
#[derive(Debug, Default)]
pub struct SyncBarrier {
    arrived: HashSet<ConnectionId>,
}

impl SyncBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets every arrival and zeroes `RoundSync`.
    pub fn reset(&mut self, store: &mut StateStore) {
        self.arrived.clear();
        store.set_acked(0);
    }

    /// Records `connection`'s arrival. Returns `false` for repeats.
    pub fn arrive(&mut self, store: &mut StateStore, connection: ConnectionId) -> bool {
        if !self.arrived.insert(connection) {
            return false;
        }
        store.set_acked(self.arrived.len());
        true
    }

    /// Withdraws `connection`'s arrival, if it had one.
    pub fn depart(&mut self, store: &mut StateStore, connection: ConnectionId) -> bool {
        if !self.arrived.remove(&connection) {
            return false;
        }
        store.set_acked(self.arrived.len());
        true
    }

    /// `acked >= seated players`, with at least one player seated.
    pub fn is_satisfied(&self, store: &StateStore) -> bool {
        let expected = store.player_count();
        expected > 0 && store.sync().acked >= expected
    }

    pub fn arrived(&self) -> usize {
        self.arrived.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    fn store_with(n: u64) -> StateStore {
        let mut store = StateStore::new();
        for i in 1..=n {
            store.insert_player(&format!("p{i}"), conn(i)).unwrap();
        }
        store
    }

    #[test]
    fn test_satisfied_when_everyone_arrives() {
        let mut store = store_with(2);
        let mut barrier = SyncBarrier::new();

        assert!(barrier.arrive(&mut store, conn(1)));
        assert!(!barrier.is_satisfied(&store));
        assert!(barrier.arrive(&mut store, conn(2)));
        assert!(barrier.is_satisfied(&store));
        assert_eq!(store.sync().acked, 2);
    }

    #[test]
    fn test_repeat_arrival_counts_once() {
        let mut store = store_with(2);
        let mut barrier = SyncBarrier::new();

        barrier.arrive(&mut store, conn(1));
        assert!(!barrier.arrive(&mut store, conn(1)));
        assert_eq!(store.sync().acked, 1);
        assert!(!barrier.is_satisfied(&store));
    }

    #[test]
    fn test_departure_shrinks_target() {
        let mut store = store_with(3);
        let mut barrier = SyncBarrier::new();
        barrier.arrive(&mut store, conn(1));
        barrier.arrive(&mut store, conn(2));

        store.remove_player(conn(3));
        barrier.depart(&mut store, conn(3));
        assert!(barrier.is_satisfied(&store));
    }

    #[test]
    fn test_departure_retracts_arrival() {
        let mut store = store_with(3);
        let mut barrier = SyncBarrier::new();
        barrier.arrive(&mut store, conn(1));

        store.remove_player(conn(1));
        assert!(barrier.depart(&mut store, conn(1)));
        barrier.arrive(&mut store, conn(2));

        assert_eq!(store.sync().acked, 1);
        assert!(!barrier.is_satisfied(&store), "player 3 has not arrived");
    }

    #[test]
    fn test_reset_zeroes_sync_row() {
        let mut store = store_with(1);
        let mut barrier = SyncBarrier::new();
        barrier.arrive(&mut store, conn(1));

        barrier.reset(&mut store);
        assert_eq!(store.sync().acked, 0);
        assert_eq!(barrier.arrived(), 0);
    }

    #[test]
    fn test_empty_room_is_never_satisfied() {
        let store = StateStore::new();
        assert!(!SyncBarrier::new().is_satisfied(&store));
    }
}

//! In-memory state store for a Quickclick room.
//!
//! Holds the four row collections a room needs: [`Player`],
//! [`ClickState`], [`PointState`] and the single [`RoundSync`] counter.
//! The store is pure data. It enforces row uniqueness, never game policy.
//!
//! The store is the authoritative copy. A [`Journal`] can be attached to
//! observe every row change (write-through), but nothing is ever read
//! back from it.

mod error;
mod journal;
mod rows;
mod store;

pub use error::StoreError;
pub use journal::{Journal, RowChange, TracingJournal};
pub use rows::{ClickState, Player, PointState, RoundSync};
pub use store::StateStore;

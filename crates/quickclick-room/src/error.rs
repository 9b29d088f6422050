//! Error types for the room layer.
//!
//! Every variant except [`RoomError::Unavailable`] is a user-facing
//! rejection: its `Display` text is what the client shows, and
//! [`RoomError::notice_context`] says which screen shows it.

use quickclick_protocol::NoticeContext;
use quickclick_store::StoreError;

/// Errors that can occur during room operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// The seat limit is reached.
    #[error("The room is full (max {0} players)")]
    RoomFull(usize),

    /// Joining is switched off (usually because a game is on).
    #[error("The game already started, please wait for the next round...")]
    JoinLocked,

    /// Another player already uses this name.
    #[error("Someone is already using that name")]
    NameTaken(String),

    /// The requested name is empty.
    #[error("Please enter a name")]
    InvalidName,

    /// This connection is already seated.
    #[error("You have already joined the room")]
    AlreadyJoined,

    /// Too few seated players to start.
    #[error("Not enough players... (min {0} players)")]
    NotEnoughPlayers(usize),

    /// `startGame` while a game is running.
    #[error("The game is already running")]
    AlreadyRunning,

    /// The room actor's channel is closed.
    #[error("room is unavailable")]
    Unavailable,
}

impl RoomError {
    /// The client screen a rejection belongs to. `None` for internal errors.
    pub fn notice_context(&self) -> Option<NoticeContext> {
        match self {
            Self::RoomFull(_)
            | Self::JoinLocked
            | Self::NameTaken(_)
            | Self::InvalidName
            | Self::AlreadyJoined => Some(NoticeContext::Login),
            Self::NotEnoughPlayers(_) | Self::AlreadyRunning => {
                Some(NoticeContext::Start)
            }
            Self::Unavailable => None,
        }
    }
}

impl From<StoreError> for RoomError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateName(name) => Self::NameTaken(name),
            StoreError::DuplicateConnection(_) => Self::AlreadyJoined,
        }
    }
}

#[cfg(test)]
mod tests {
    use quickclick_protocol::ConnectionId;

    use super::*;

    #[test]
    fn test_notice_texts() {
        assert_eq!(
            RoomError::RoomFull(10).to_string(),
            "The room is full (max 10 players)"
        );
        assert_eq!(
            RoomError::NotEnoughPlayers(2).to_string(),
            "Not enough players... (min 2 players)"
        );
    }

    #[test]
    fn test_notice_context() {
        assert_eq!(
            RoomError::NameTaken("Alice".into()).notice_context(),
            Some(NoticeContext::Login)
        );
        assert_eq!(
            RoomError::NotEnoughPlayers(2).notice_context(),
            Some(NoticeContext::Start)
        );
        assert_eq!(RoomError::Unavailable.notice_context(), None);
    }

    #[test]
    fn test_from_store_error() {
        let err: RoomError = StoreError::DuplicateName("Bob".into()).into();
        assert_eq!(err, RoomError::NameTaken("Bob".into()));

        let err: RoomError =
            StoreError::DuplicateConnection(ConnectionId::new(1)).into();
        assert_eq!(err, RoomError::AlreadyJoined);
    }
}

//! Single-slot phase timer for Quickclick rounds.
//!
//! A round advances through timed phases (start delay, countdown, status
//! delay). Only one phase deadline is ever pending, so the scheduler is a
//! single slot: arming replaces whatever was pending, cancelling empties
//! it. Each deadline carries the [`PhaseToken`] the engine stamped when
//! it armed the timer, and the engine drops any expiry whose token is no
//! longer current.
//!
//! # Integration
//!
//! The timer sits inside a room actor's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         token = timer.expired() => {
//!             let step = engine.on_timer(token);
//!         }
//!     }
//! }
//! ```

use std::fmt;
use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// PhaseToken
// ---------------------------------------------------------------------------

/// Identifies one armed phase transition.
///
/// Tokens are issued in strictly increasing order by
/// [`PhaseToken::next`], so a stale token can never equal a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PhaseToken(u64);

impl PhaseToken {
    /// The token after this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Raw sequence number.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PhaseToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "phase-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Counters kept by a [`PhaseTimer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerStats {
    /// Times `arm` was called.
    pub armed: u64,
    /// Deadlines that elapsed and were delivered.
    pub fired: u64,
    /// Pending deadlines discarded by `cancel` or replaced by `arm`.
    pub cancelled: u64,
}

// ---------------------------------------------------------------------------
// PhaseTimer
// ---------------------------------------------------------------------------

/// One pending deadline, or none.
#[derive(Debug, Default)]
pub struct PhaseTimer {
    pending: Option<(Instant, PhaseToken)>,
    stats: TimerStats,
}

impl PhaseTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `token` to fire after `after`, replacing any pending deadline.
    pub fn arm(&mut self, after: Duration, token: PhaseToken) {
        if let Some((_, old)) = self.pending.take() {
            self.stats.cancelled += 1;
            trace!(%old, "pending phase replaced");
        }
        self.pending = Some((Instant::now() + after, token));
        self.stats.armed += 1;
        trace!(%token, after_ms = after.as_millis() as u64, "phase armed");
    }

    /// Drops the pending deadline, if any. Returns `true` if one was pending.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some((_, token)) => {
                self.stats.cancelled += 1;
                debug!(%token, "pending phase cancelled");
                true
            }
            None => false,
        }
    }

    /// Waits for the pending deadline and returns its token.
    ///
    /// With nothing armed this future pends forever, which lets
    /// `tokio::select!` keep serving its other branches. Dropping the
    /// future before it completes leaves the deadline armed.
    pub async fn expired(&mut self) -> PhaseToken {
        let Some((deadline, token)) = self.pending else {
            return std::future::pending().await;
        };

        time::sleep_until(deadline).await;

        self.pending = None;
        self.stats.fired += 1;
        trace!(%token, "phase fired");
        token
    }

    /// Whether a deadline is pending.
    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Token of the pending deadline.
    pub fn pending_token(&self) -> Option<PhaseToken> {
        self.pending.map(|(_, token)| token)
    }

    /// Time left until the pending deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.pending
            .map(|(deadline, _)| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn stats(&self) -> TimerStats {
        self.stats
    }
}

//! The round engine: a synchronous state machine for one room.
//!
//! Every operation returns a [`Step`]: the events to deliver and, at most,
//! one timer request. The engine never sleeps or spawns. The room actor
//! owns the real timer, applies the step, and feeds expired
//! [`PhaseToken`]s back through [`RoundEngine::on_timer`].

use std::time::Duration;

use quickclick_protocol::{
    ClientCommand, ConnectionId, NoticeContext, Recipient, ServerEvent, SERVER_SENDER,
};
use quickclick_store::StateStore;
use quickclick_timer::PhaseToken;
use serde::Serialize;

use crate::{EngineState, Phase, RoomConfig, RoomError, RoomRegistry, SyncBarrier};

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// What the scheduler should do with the room's single timer slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerRequest {
    /// Fire `token` after `after`, replacing anything pending.
    Arm { after: Duration, token: PhaseToken },
    /// Drop whatever is pending.
    Cancel,
}

/// Outcome of one engine operation.
#[derive(Debug, Default)]
pub struct Step {
    pub events: Vec<(Recipient, ServerEvent)>,
    pub timer: Option<TimerRequest>,
}

impl Step {
    fn broadcast(&mut self, event: ServerEvent) {
        self.events.push((Recipient::All, event));
    }

    fn unicast(&mut self, connection: ConnectionId, event: ServerEvent) {
        self.events.push((Recipient::Connection(connection), event));
    }

    fn reject(&mut self, connection: ConnectionId, err: &RoomError) {
        let context = err.notice_context().unwrap_or(NoticeContext::Login);
        self.unicast(
            connection,
            ServerEvent::NoExec {
                message: err.to_string(),
                context,
            },
        );
    }

    /// Events addressed to everyone.
    pub fn broadcasts(&self) -> impl Iterator<Item = &ServerEvent> {
        self.events
            .iter()
            .filter(|(to, _)| *to == Recipient::All)
            .map(|(_, event)| event)
    }
}

/// One row of the scoreboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standing {
    pub name: String,
    pub clicked: bool,
    pub points: f64,
}

// ---------------------------------------------------------------------------
// RoundEngine
// ---------------------------------------------------------------------------

/// Owns the room's state and advances it one command or timer at a time.
#[derive(Debug)]
pub struct RoundEngine {
    config: RoomConfig,
    store: StateStore,
    registry: RoomRegistry,
    barrier: SyncBarrier,
    state: EngineState,
    /// Last token issued.
    token: PhaseToken,
    /// Token of the phase timer the engine is waiting on.
    armed: Option<PhaseToken>,
    round: u64,
}

impl RoundEngine {
    pub fn new(config: RoomConfig) -> Self {
        Self::with_store(config, StateStore::new())
    }

    /// Builds an engine over an existing (normally empty) store, e.g. one
    /// with a journal attached.
    pub fn with_store(config: RoomConfig, store: StateStore) -> Self {
        Self {
            registry: RoomRegistry::new(&config),
            config,
            store,
            barrier: SyncBarrier::new(),
            state: EngineState::Idle,
            token: PhaseToken::default(),
            armed: None,
            round: 0,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Rounds started in the current game (1 during the first countdown).
    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn is_join_open(&self) -> bool {
        self.registry.is_join_open()
    }

    /// Seated player names in join order.
    pub fn current_players(&self) -> Vec<String> {
        self.registry.current_players(&self.store)
    }

    /// Players that have game rows, in join order.
    pub fn standings(&self) -> Vec<Standing> {
        self.store
            .players()
            .iter()
            .filter_map(|p| {
                let click = self.store.click(&p.name)?;
                let points = self.store.points(&p.name)?;
                Some(Standing {
                    name: p.name.clone(),
                    clicked: click.clicked,
                    points,
                })
            })
            .collect()
    }

    /// Routes a client command to its operation.
    pub fn handle(&mut self, connection: ConnectionId, command: ClientCommand) -> Step {
        match command {
            ClientCommand::Join { name } => self.join(connection, &name),
            ClientCommand::ToggleJoin { mode } => self.set_join_open(mode.is_open()),
            ClientCommand::Chat { message } => self.chat(connection, message),
            ClientCommand::StartGame => self.start_game(connection),
            ClientCommand::ClickBtn { name } => self.click(connection, &name),
            ClientCommand::EndGame => self.end_game(),
            ClientCommand::RoundAck => self.round_ack(connection),
        }
    }

    // -- Registry -----------------------------------------------------------

    /// Roster replay for a freshly opened connection.
    pub fn connect(&self, connection: ConnectionId) -> Step {
        let mut step = Step::default();
        for player in self.store.players() {
            step.unicast(
                connection,
                ServerEvent::AddPlayer {
                    name: player.name.clone(),
                },
            );
        }
        step
    }

    pub fn join(&mut self, connection: ConnectionId, name: &str) -> Step {
        let mut step = Step::default();
        let name = name.trim();
        match self.registry.join(&mut self.store, connection, name) {
            Ok(()) => {
                tracing::info!(
                    %connection,
                    player = name,
                    players = self.store.player_count(),
                    "player joined"
                );
                step.broadcast(ServerEvent::AddPlayer {
                    name: name.to_owned(),
                });
            }
            Err(err) => {
                tracing::debug!(%connection, player = name, error = %err, "join rejected");
                step.reject(connection, &err);
            }
        }
        step
    }

    /// Unseats `connection`'s player. Ends the game, whatever the state,
    /// once too few remain.
    pub fn leave(&mut self, connection: ConnectionId) -> Step {
        let mut step = Step::default();
        let Some(player) = self.registry.leave(&mut self.store, connection) else {
            return step;
        };
        self.barrier.depart(&mut self.store, connection);

        tracing::info!(
            %connection,
            player = %player.name,
            players = self.store.player_count(),
            "player left"
        );
        step.broadcast(ServerEvent::RemovePlayer { name: player.name });

        if self.store.player_count() < self.config.min_players {
            tracing::info!(state = %self.state, "too few players, ending game");
            self.finish(&mut step);
        } else {
            self.try_release(&mut step);
        }
        step
    }

    pub fn set_join_open(&mut self, open: bool) -> Step {
        self.registry.set_join_open(open);
        tracing::debug!(open, "join gate toggled");
        Step::default()
    }

    // -- Chat ---------------------------------------------------------------

    /// Broadcasts chat, or reprices the game when `"Point N"` arrives
    /// while no game is running.
    pub fn chat(&mut self, connection: ConnectionId, message: String) -> Step {
        let mut step = Step::default();

        if !self.state.is_running() {
            if let Some(points) = parse_point_command(&message) {
                self.config.starting_points = points;
                tracing::info!(points, "starting points changed");
                step.broadcast(ServerEvent::ChatMessage {
                    message: format!("Starting points set to {points}"),
                    sender: SERVER_SENDER.to_owned(),
                });
                return step;
            }
        }

        match self.store.player_by_connection(connection) {
            Some(player) => step.broadcast(ServerEvent::ChatMessage {
                message,
                sender: player.name.clone(),
            }),
            None => {
                tracing::debug!(%connection, "chat from unseated connection dropped");
            }
        }
        step
    }

    // -- Game lifecycle -----------------------------------------------------

    /// Seeds every seated player's rows and schedules the first countdown.
    pub fn start_game(&mut self, connection: ConnectionId) -> Step {
        let mut step = Step::default();

        if self.state.is_running() {
            step.reject(connection, &RoomError::AlreadyRunning);
            return step;
        }
        if self.store.player_count() < self.config.min_players {
            step.reject(connection, &RoomError::NotEnoughPlayers(self.config.min_players));
            return step;
        }

        self.store.clear_game_rows();
        for name in self.registry.current_players(&self.store) {
            self.store.seed_game_rows(&name, self.config.starting_points);
        }
        self.barrier.reset(&mut self.store);
        self.round = 0;
        self.state = EngineState::Running(Phase::Starting);

        tracing::info!(
            players = self.store.player_count(),
            starting_points = self.config.starting_points,
            "game started"
        );
        step.broadcast(ServerEvent::StartGame);
        self.arm(&mut step, self.config.start_delay);
        step
    }

    /// Marks the sender as clicked for this round. Repeats are no-ops.
    pub fn click(&mut self, connection: ConnectionId, name: &str) -> Step {
        if !self.state.is_running() {
            return Step::default();
        }
        let owns_name = self
            .store
            .player_by_connection(connection)
            .is_some_and(|p| p.name == name);
        if !owns_name {
            tracing::warn!(%connection, player = name, "click for another player ignored");
            return Step::default();
        }
        if self.store.set_clicked(name) {
            tracing::debug!(player = name, round = self.round, "click recorded");
        }
        Step::default()
    }

    /// Counts `connection` toward the sync barrier.
    pub fn round_ack(&mut self, connection: ConnectionId) -> Step {
        let mut step = Step::default();
        if !self.state.accepts_round_ack() {
            tracing::debug!(%connection, state = %self.state, "round ack out of phase");
            return step;
        }
        if self.store.player_by_connection(connection).is_none() {
            return step;
        }
        if self.barrier.arrive(&mut self.store, connection) {
            tracing::debug!(
                %connection,
                acked = self.store.sync().acked,
                players = self.store.player_count(),
                "round ack"
            );
        }
        self.try_release(&mut step);
        step
    }

    /// Ends the game from any state and cancels the pending phase.
    pub fn end_game(&mut self) -> Step {
        let mut step = Step::default();
        tracing::info!(state = %self.state, "game ended");
        self.finish(&mut step);
        step
    }

    /// Advances the phase whose timer fired. Stale tokens are ignored.
    pub fn on_timer(&mut self, token: PhaseToken) -> Step {
        let mut step = Step::default();
        if self.armed != Some(token) {
            tracing::warn!(%token, armed = ?self.armed, "stale phase timer ignored");
            return step;
        }
        self.armed = None;

        match self.state {
            EngineState::Running(Phase::Starting) => self.enter_countdown(&mut step),
            EngineState::Running(Phase::Countdown) => self.resolve(&mut step),
            EngineState::Running(Phase::Resolving) => self.show_status(&mut step),
            state => tracing::warn!(%token, %state, "phase timer fired in untimed state"),
        }
        step
    }

    // -- Phases -------------------------------------------------------------

    fn arm(&mut self, step: &mut Step, after: Duration) {
        self.token = self.token.next();
        self.armed = Some(self.token);
        step.timer = Some(TimerRequest::Arm {
            after,
            token: self.token,
        });
    }

    /// Elimination check, then the click window.
    fn enter_countdown(&mut self, step: &mut Step) {
        self.barrier.reset(&mut self.store);

        if let Some(loser) = self.store.first_depleted().map(str::to_owned) {
            tracing::info!(player = %loser, round = self.round, "player eliminated");
            self.state = EngineState::Ended;
            self.armed = None;
            step.timer = Some(TimerRequest::Cancel);
            step.broadcast(ServerEvent::Loser { loser });
            return;
        }

        self.round += 1;
        self.state = EngineState::Running(Phase::Countdown);
        tracing::debug!(round = self.round, "countdown");
        step.broadcast(ServerEvent::Countdown {
            seconds: self.config.countdown_secs(),
        });
        self.arm(step, self.config.countdown);
    }

    /// Exactly one click costs the clicker `1 / players`. Ties and silence are free.
    fn resolve(&mut self, step: &mut Step) {
        self.state = EngineState::Running(Phase::Resolving);

        let (clicks, sole) = {
            let clicked = self.store.clicked_players();
            let sole = match clicked.as_slice() {
                [only] => Some((*only).to_owned()),
                _ => None,
            };
            (clicked.len(), sole)
        };
        match sole {
            Some(name) => {
                let cost = 1.0 / self.store.player_count() as f64;
                let left = self.store.decrement_points(&name, cost);
                tracing::debug!(player = %name, cost, ?left, round = self.round, "click charged");
            }
            None => tracing::debug!(clicks, round = self.round, "no charge"),
        }

        step.broadcast(ServerEvent::Countdown {
            seconds: self.config.countdown_secs(),
        });
        self.arm(step, self.config.status_delay);
    }

    fn show_status(&mut self, step: &mut Step) {
        self.state = EngineState::Running(Phase::Broadcasting);
        for standing in self.standings() {
            step.broadcast(ServerEvent::ShowStatus {
                name: standing.name,
                clicked: standing.clicked,
                points: standing.points,
            });
        }
        self.state = EngineState::Running(Phase::AwaitingSync);
        self.try_release(step);
    }

    /// Opens the next round once every seated player has acknowledged.
    fn try_release(&mut self, step: &mut Step) {
        if self.state != EngineState::Running(Phase::AwaitingSync)
            || !self.barrier.is_satisfied(&self.store)
        {
            return;
        }
        tracing::debug!(round = self.round, "sync barrier released");
        step.broadcast(ServerEvent::HideStatus);
        self.store.reset_clicks();
        self.enter_countdown(step);
    }

    fn finish(&mut self, step: &mut Step) {
        self.armed = None;
        step.timer = Some(TimerRequest::Cancel);
        self.store.clear_game_rows();
        self.barrier.reset(&mut self.store);
        self.state = EngineState::Ended;
        step.broadcast(ServerEvent::EndGame);
    }
}

/// `"Point N"` → `Some(N)` for a finite positive `N`.
fn parse_point_command(message: &str) -> Option<f64> {
    let value: f64 = message.strip_prefix("Point ")?.trim().parse().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_point_command() {
        assert_eq!(parse_point_command("Point 5"), Some(5.0));
        assert_eq!(parse_point_command("Point  2.5 "), Some(2.5));
        assert_eq!(parse_point_command("Point abc"), None);
        assert_eq!(parse_point_command("Point 0"), None);
        assert_eq!(parse_point_command("Point -3"), None);
        assert_eq!(parse_point_command("Point inf"), None);
        assert_eq!(parse_point_command("point 5"), None);
        assert_eq!(parse_point_command("Points 5"), None);
    }

    #[test]
    fn test_stale_token_is_ignored() {
        let mut engine = RoundEngine::new(RoomConfig::default());
        let step = engine.on_timer(PhaseToken::default().next());
        assert!(step.events.is_empty());
        assert!(step.timer.is_none());
        assert_eq!(engine.state(), EngineState::Idle);
    }
}

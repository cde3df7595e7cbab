//! The turn loop.
//!
//! A [`GameSession`] owns the game state and every seated [`Endpoint`].
//! It reads from exactly one endpoint at a time, the acting player's, so
//! moves are applied strictly one after another and no lock is needed
//! around the state.

use serde_json::Value;
use tabula_protocol::{
    Connected, GameEnd, GameStart, GameStateUpdate, Message, MoveAccepted, MoveRequest, PlayerId,
    ProtocolError, YourTurn,
};
use tabula_rules::{GameRules, TerminalResult};
use tabula_transport::{Connection, TransportError};

use crate::{
    DisconnectCause, Endpoint, SessionConfig, SessionError, SessionOutcome, SessionPhase,
    ShutdownListener,
};

/// Why the turn loop stopped before a terminal state.
enum Halt {
    Disconnected {
        player: PlayerId,
        cause: DisconnectCause,
    },
    Shutdown,
    Failed(SessionError),
}

impl From<SessionError> for Halt {
    fn from(e: SessionError) -> Self {
        Self::Failed(e)
    }
}

impl From<ProtocolError> for Halt {
    fn from(e: ProtocolError) -> Self {
        Self::Failed(e.into())
    }
}

/// One game, from the first admitted player to the last closed connection.
///
/// ```text
/// admit() ... admit()      run()
/// [Admitting] ──min──► [Playing] ──terminal | disconnect | shutdown──► [Ending]
/// ```
///
/// Admission hands out [`PlayerId`]s in arrival order starting at 0 and
/// closes the moment the rules' minimum is met. [`run`](Self::run) then
/// drives the game to its end and closes every endpoint on the way out,
/// whatever the outcome.
pub struct GameSession<G, C> {
    rules: G,
    config: SessionConfig,
    phase: SessionPhase,
    endpoints: Vec<Endpoint<C>>,
}

impl<G, C> GameSession<G, C>
where
    G: GameRules,
    C: Connection<Error = TransportError>,
{
    /// Creates an empty session.
    ///
    /// # Errors
    /// `SessionError::Rules` if the rules declare bounds that break
    /// `1 <= min <= max`.
    pub fn new(rules: G, config: SessionConfig) -> Result<Self, SessionError> {
        rules.check_bounds()?;
        Ok(Self {
            rules,
            config,
            phase: SessionPhase::Admitting,
            endpoints: Vec::new(),
        })
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Number of admitted players.
    pub fn player_count(&self) -> usize {
        self.endpoints.len()
    }

    /// Returns `true` once enough players are seated to call `run`.
    pub fn is_ready(&self) -> bool {
        self.phase.is_playing()
    }

    pub fn rules(&self) -> &G {
        &self.rules
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Seats a new player and sends them `CONNECTED`.
    ///
    /// Flips the session to Playing once the rules' minimum is reached;
    /// every later call fails with `AdmissionClosed`. If the
    /// acknowledgment can't be delivered, the connection is closed and
    /// the id stays free for the next arrival.
    pub async fn admit(&mut self, conn: C) -> Result<PlayerId, SessionError> {
        if !self.phase.is_admitting() {
            if let Err(e) = conn.close().await {
                tracing::debug!(conn = %conn.id(), error = %e, "close failed");
            }
            return Err(SessionError::AdmissionClosed);
        }

        let player_id = PlayerId(self.endpoints.len());
        let endpoint = Endpoint::new(player_id, conn);
        let ack = Message::Connected(Connected {
            player_id,
            game_name: self.rules.name().to_string(),
            min_players: self.rules.min_players(),
            max_players: self.rules.max_players(),
            current_players: self.endpoints.len() + 1,
        });
        if let Err(e) = endpoint.send(&ack).await {
            tracing::warn!(
                conn = %endpoint.connection_id(),
                error = %e,
                "could not acknowledge admission, dropping connection"
            );
            endpoint.close().await;
            return Err(e);
        }

        self.endpoints.push(endpoint);
        tracing::info!(
            %player_id,
            players = self.endpoints.len(),
            min = self.rules.min_players(),
            "player admitted"
        );

        if self.endpoints.len() >= self.rules.min_players() {
            self.transition(SessionPhase::Playing);
        }
        Ok(player_id)
    }

    /// Plays the game to its end.
    ///
    /// Returns the outcome for a game that finished, lost a player, or
    /// was stopped through `shutdown`. Errors are reserved for sessions
    /// that could not run at all (not enough players, the rules refusing
    /// the player count, a state that can't be serialized).
    pub async fn run(mut self, mut shutdown: ShutdownListener) -> Result<SessionOutcome, SessionError> {
        if !self.phase.is_playing() {
            let err = SessionError::NotReady {
                admitted: self.endpoints.len(),
                min: self.rules.min_players(),
            };
            self.finish().await;
            return Err(err);
        }

        let outcome = match self.play(&mut shutdown).await {
            Ok(result) => {
                tracing::info!(
                    winner = ?result.winner,
                    draw = result.draw,
                    message = %result.message,
                    "game over"
                );
                self.announce_end(&result).await;
                Ok(SessionOutcome::Finished(result))
            }
            Err(Halt::Disconnected { player, cause }) => {
                tracing::warn!(player_id = %player, %cause, "player disconnected, ending game");
                self.announce_disconnect(player).await;
                Ok(SessionOutcome::Disconnected { player, cause })
            }
            Err(Halt::Shutdown) => {
                tracing::info!("session stopped by shutdown");
                Ok(SessionOutcome::Shutdown)
            }
            Err(Halt::Failed(e)) => {
                tracing::error!(error = %e, "session failed");
                Err(e)
            }
        };

        self.finish().await;
        outcome
    }

    /// Abandons the session without playing, closing every admitted
    /// connection. Nothing is sent to the players.
    pub async fn close(mut self) {
        tracing::info!(players = self.endpoints.len(), "session abandoned");
        self.finish().await;
    }

    // -- turn loop ----------------------------------------------------------

    async fn play(&self, shutdown: &mut ShutdownListener) -> Result<TerminalResult, Halt> {
        let mut state = self
            .rules
            .initialize(self.endpoints.len())
            .map_err(SessionError::from)?;
        tracing::info!(
            game = %self.rules.name(),
            players = self.endpoints.len(),
            "game started"
        );

        let help = self.rules.move_help();
        for endpoint in &self.endpoints {
            let player_id = endpoint.player_id();
            let (initial_state, _) = self.view_of(&state, player_id)?;
            let start = Message::GameStart(GameStart {
                player_id,
                game_name: self.rules.name().to_string(),
                initial_state,
                help: help.clone(),
            });
            self.send_to(endpoint, &start).await?;
        }

        loop {
            if let Some(result) = self.rules.check_terminal(&state) {
                return Ok(result);
            }

            let actor = self.rules.current_player(&state);
            let Some(endpoint) = self.endpoints.get(actor.index()) else {
                return Err(SessionError::UnknownPlayer(actor).into());
            };

            self.announce_turn(&state, actor).await?;
            state = self.take_turn(&state, endpoint, shutdown).await?;
        }
    }

    /// Reads from the actor until one move is applied, answering every
    /// other message without advancing the turn.
    async fn take_turn(
        &self,
        state: &G::State,
        endpoint: &Endpoint<C>,
        shutdown: &mut ShutdownListener,
    ) -> Result<G::State, Halt> {
        let actor = endpoint.player_id();
        loop {
            let reply = match self.next_message(endpoint, shutdown).await? {
                Message::Move(MoveRequest { value: Some(raw) }) => {
                    match self.rules.validate_move(state, actor, &raw) {
                        Ok(mv) => {
                            let next = self.rules.apply_move(state, actor, mv);
                            tracing::info!(player_id = %actor, %raw, "move applied");
                            tracing::debug!(board = %self.rules.render(&next), "board after move");
                            self.announce_move(&next, actor).await?;
                            return Ok(next);
                        }
                        Err(reason) => {
                            tracing::debug!(player_id = %actor, %raw, %reason, "move rejected");
                            Message::move_rejected(reason)
                        }
                    }
                }
                Message::Move(_) => Message::move_rejected("No move provided"),
                Message::Disconnect => {
                    return Err(Halt::Disconnected {
                        player: actor,
                        cause: DisconnectCause::Requested,
                    });
                }
                // Undecodable frames arrive as ERROR; tell the sender what was wrong.
                Message::Error { error } => Message::error(error),
                other => {
                    tracing::debug!(player_id = %actor, kind = %other.kind(), "unexpected message");
                    Message::error(format!("Unexpected message type: {}", other.kind()))
                }
            };
            self.send_to(endpoint, &reply).await?;
        }
    }

    /// Waits for the actor's next message, bounded by the turn timeout and
    /// interrupted by shutdown.
    async fn next_message(
        &self,
        endpoint: &Endpoint<C>,
        shutdown: &mut ShutdownListener,
    ) -> Result<Message, Halt> {
        let player = endpoint.player_id();
        let received = async {
            match self.config.turn_timeout {
                Some(limit) => tokio::time::timeout(limit, endpoint.recv()).await.ok(),
                None => Some(endpoint.recv().await),
            }
        };

        tokio::select! {
            biased;
            _ = shutdown.wait() => Err(Halt::Shutdown),
            received = received => match received {
                Some(Ok(Some(msg))) => Ok(msg),
                Some(Ok(None)) => Err(Halt::Disconnected {
                    player,
                    cause: DisconnectCause::Closed,
                }),
                Some(Err(e)) => {
                    tracing::warn!(player_id = %player, error = %e, "receive failed");
                    Err(Halt::Disconnected {
                        player,
                        cause: DisconnectCause::Closed,
                    })
                }
                None => Err(Halt::Disconnected {
                    player,
                    cause: DisconnectCause::TimedOut,
                }),
            },
        }
    }

    // -- broadcasts ---------------------------------------------------------

    /// `YOUR_TURN` to the actor, `GAME_STATE` to everyone else.
    async fn announce_turn(&self, state: &G::State, actor: PlayerId) -> Result<(), Halt> {
        for endpoint in &self.endpoints {
            let (game_state, board_display) = self.view_of(state, endpoint.player_id())?;
            let msg = if endpoint.player_id() == actor {
                Message::YourTurn(YourTurn {
                    game_state,
                    board_display,
                })
            } else {
                Message::GameState(GameStateUpdate {
                    game_state,
                    board_display,
                    current_player: actor,
                })
            };
            self.send_to(endpoint, &msg).await?;
        }
        Ok(())
    }

    /// `MOVE_ACCEPTED` to the actor, `GAME_STATE` to everyone else.
    async fn announce_move(&self, state: &G::State, actor: PlayerId) -> Result<(), Halt> {
        let current_player = self.rules.current_player(state);
        for endpoint in &self.endpoints {
            let (game_state, board_display) = self.view_of(state, endpoint.player_id())?;
            let msg = if endpoint.player_id() == actor {
                Message::MoveAccepted(MoveAccepted {
                    game_state,
                    board_display,
                })
            } else {
                Message::GameState(GameStateUpdate {
                    game_state,
                    board_display,
                    current_player,
                })
            };
            self.send_to(endpoint, &msg).await?;
        }
        Ok(())
    }

    /// `GAME_END` to everyone, `won` computed per recipient. Delivery
    /// failures are logged; the game is over regardless.
    async fn announce_end(&self, result: &TerminalResult) {
        for endpoint in &self.endpoints {
            let msg = Message::GameEnd(GameEnd {
                winner: result.winner,
                draw: result.draw,
                message: result.message.clone(),
                won: result.is_won_by(endpoint.player_id()),
            });
            if let Err(e) = endpoint.send(&msg).await {
                tracing::debug!(player_id = %endpoint.player_id(), error = %e, "game end not delivered");
            }
        }
    }

    /// One `ERROR` to every player except the one who left.
    async fn announce_disconnect(&self, player: PlayerId) {
        let notice = Message::error(format!(
            "Player {} disconnected. Game ended.",
            player.index()
        ));
        for endpoint in self.endpoints.iter().filter(|e| e.player_id() != player) {
            if let Err(e) = endpoint.send(&notice).await {
                tracing::debug!(player_id = %endpoint.player_id(), error = %e, "disconnect notice not delivered");
            }
        }
    }

    // -- helpers ------------------------------------------------------------

    /// The recipient's view as JSON, plus its rendering.
    fn view_of(&self, state: &G::State, player: PlayerId) -> Result<(Value, String), ProtocolError> {
        let view = self.rules.view_for(state, player);
        let json = serde_json::to_value(&view).map_err(ProtocolError::Encode)?;
        Ok((json, self.rules.render(&view)))
    }

    /// Sends to one endpoint. A transport failure counts as that player
    /// disconnecting.
    async fn send_to(&self, endpoint: &Endpoint<C>, msg: &Message) -> Result<(), Halt> {
        match endpoint.send(msg).await {
            Ok(()) => Ok(()),
            Err(SessionError::Transport(e)) => {
                tracing::warn!(player_id = %endpoint.player_id(), error = %e, "send failed");
                Err(Halt::Disconnected {
                    player: endpoint.player_id(),
                    cause: DisconnectCause::SendFailed,
                })
            }
            Err(e) => Err(Halt::Failed(e)),
        }
    }

    fn transition(&mut self, target: SessionPhase) {
        debug_assert!(self.phase.can_transition_to(target), "{} -> {target}", self.phase);
        tracing::info!(from = %self.phase, to = %target, "session phase changed");
        self.phase = target;
    }

    async fn finish(&mut self) {
        self.transition(SessionPhase::Ending);
        for endpoint in &self.endpoints {
            endpoint.close().await;
        }
    }
}

impl<G, C> std::fmt::Debug for GameSession<G, C>
where
    G: GameRules,
    C: Connection,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("game", &self.rules.name())
            .field("phase", &self.phase)
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

//! Session state machine.
//!
//! Tracks where the local player stands in the lobby / challenge / game
//! lifecycle and decides which inbound message kinds are legal in each state.
//!
//! # States
//!
//! - `Lobby`: browsing the roster, no challenge outstanding
//! - `ChallengePending`: a challenge was sent or received and awaits a reply
//! - `InGame`: a game is being played
//!
//! # Legality
//!
//! | State | Allowed kinds |
//! |---|---|
//! | `Lobby` | roster updates, `RQ`, `GAME_START`, `INVALID_PROTOCOL`, `OK` |
//! | `ChallengePending` | roster updates, `RQ_CANCELED`, `GAME_START`, `INVALID_PROTOCOL`, `OK` |
//! | `InGame` | roster updates, `GAME_PLAY`, `GAME_RECOVERY`, `GAME_MSG`, `GAME_WINNING_TAILS`, `GAME_RESULT`, `GAME_CANCELED`, `INVALID_PROTOCOL`, `OK` |
//!
//! Roster updates are `ADD_CLIENT`, `REMOVE_CLIENT` and `GAME_PLAYER_STATE`.
//!
//! # Valid Transitions
//!
//! - Lobby → ChallengePending (`RQ`, or the acknowledgement of a sent challenge)
//! - Lobby / ChallengePending → InGame (`GAME_START`)
//! - ChallengePending → Lobby (`RQ_CANCELED`, or the acknowledgement of a withdrawn or declined challenge)
//! - InGame → Lobby (`GAME_CANCELED`)
//!
//! # Examples
//!
//! ```
//! use connect4_protocol::MessageKind;
//! use connect4_session::{SessionState, StateMachine};
//!
//! let mut machine = StateMachine::new();
//! assert_eq!(machine.current_state(), SessionState::Lobby);
//!
//! machine.apply(MessageKind::Rq).unwrap();
//! assert_eq!(machine.current_state(), SessionState::ChallengePending);
//!
//! // GAME_PLAY is only legal during a game
//! assert!(machine.apply(MessageKind::GamePlay).is_err());
//! ```

use std::fmt;

use connect4_core::{Error, Result};
use connect4_protocol::MessageKind;

/// Position of the local player in the lobby / challenge / game lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Browsing the lobby.
    Lobby,

    /// A challenge was sent or received and a reply is outstanding.
    ChallengePending,

    /// A game is being played.
    InGame,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            SessionState::Lobby => "LOBBY",
            SessionState::ChallengePending => "CHALLENGE_PENDING",
            SessionState::InGame => "IN_GAME",
        };
        write!(f, "{}", state_str)
    }
}

impl SessionState {
    /// Check if an inbound message of `kind` is legal in this state.
    ///
    /// # Examples
    ///
    /// ```
    /// use connect4_protocol::MessageKind;
    /// use connect4_session::SessionState;
    ///
    /// assert!(SessionState::InGame.allows(MessageKind::GamePlay));
    /// assert!(!SessionState::Lobby.allows(MessageKind::GamePlay));
    /// ```
    pub fn allows(&self, kind: MessageKind) -> bool {
        use MessageKind as K;

        // Legal everywhere
        if matches!(
            kind,
            K::AddClient | K::RemoveClient | K::GamePlayerState | K::InvalidProtocol | K::Ok
        ) {
            return true;
        }

        match self {
            SessionState::Lobby => matches!(kind, K::Rq | K::GameStart),
            SessionState::ChallengePending => matches!(kind, K::RqCanceled | K::GameStart),
            SessionState::InGame => matches!(
                kind,
                K::GamePlay
                    | K::GameRecovery
                    | K::GameMsg
                    | K::GameWinningTails
                    | K::GameResult
                    | K::GameCanceled
            ),
        }
    }

    /// State entered after accepting a message of `kind`, if it moves the machine.
    pub fn next_state(&self, kind: MessageKind) -> Option<SessionState> {
        match (self, kind) {
            (SessionState::Lobby, MessageKind::Rq) => Some(SessionState::ChallengePending),
            (SessionState::Lobby | SessionState::ChallengePending, MessageKind::GameStart) => {
                Some(SessionState::InGame)
            }
            (SessionState::ChallengePending, MessageKind::RqCanceled) => Some(SessionState::Lobby),
            (SessionState::InGame, MessageKind::GameCanceled) => Some(SessionState::Lobby),
            _ => None,
        }
    }

    /// Check if transition to target state is valid from this state.
    pub fn can_transition_to(&self, target: &SessionState) -> bool {
        matches!(
            (self, target),
            (SessionState::Lobby, SessionState::ChallengePending | SessionState::InGame)
                | (SessionState::ChallengePending, SessionState::Lobby | SessionState::InGame)
                | (SessionState::InGame, SessionState::Lobby)
        )
    }
}

/// A single state change, reported for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: SessionState,
    pub to: SessionState,
}

/// State machine enforcing per-state message legality.
///
/// Not thread-safe; the owning [`Session`](crate::Session) is shared behind a
/// mutex by the network layer.
#[derive(Debug)]
pub struct StateMachine {
    current_state: SessionState,
}

impl StateMachine {
    /// Create a new state machine in the Lobby state.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a builder for a machine starting in an arbitrary state.
    ///
    /// # Examples
    ///
    /// ```
    /// use connect4_session::{SessionState, StateMachine};
    ///
    /// let machine = StateMachine::builder()
    ///     .with_initial_state(SessionState::InGame)
    ///     .build();
    ///
    /// assert_eq!(machine.current_state(), SessionState::InGame);
    /// ```
    pub fn builder() -> StateMachineBuilder {
        StateMachineBuilder::default()
    }

    pub fn current_state(&self) -> SessionState {
        self.current_state
    }

    /// Check legality of an inbound message and advance the state it triggers.
    ///
    /// # Returns
    ///
    /// `Ok(Some(transition))` if the message moved the machine, `Ok(None)` if
    /// it is legal but leaves the state unchanged.
    ///
    /// # Errors
    ///
    /// Returns `Error::ProhibitedMessage` if `kind` is not legal in the
    /// current state. The state is left untouched.
    pub fn apply(&mut self, kind: MessageKind) -> Result<Option<StateTransition>> {
        if !self.current_state.allows(kind) {
            return Err(Error::ProhibitedMessage {
                kind: kind.to_string(),
                state: self.current_state.to_string(),
            });
        }

        match self.current_state.next_state(kind) {
            Some(next) => self.transition_to(next).map(Some),
            None => Ok(None),
        }
    }

    /// Transition to a new state, validating the transition.
    ///
    /// # Errors
    ///
    /// Returns `Error::CommandRejected` if the transition is not part of the
    /// lifecycle.
    pub fn transition_to(&mut self, new_state: SessionState) -> Result<StateTransition> {
        if !self.current_state.can_transition_to(&new_state) {
            return Err(Error::CommandRejected(format!(
                "cannot move from {} to {}",
                self.current_state, new_state
            )));
        }
        Ok(self.change_to(new_state))
    }

    /// Force the machine back to Lobby, as after a fresh handshake.
    pub fn reset(&mut self) -> StateTransition {
        self.change_to(SessionState::Lobby)
    }

    fn change_to(&mut self, new_state: SessionState) -> StateTransition {
        let transition = StateTransition {
            from: self.current_state,
            to: new_state,
        };
        self.current_state = new_state;
        transition
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `StateMachine` instances.
#[derive(Debug)]
pub struct StateMachineBuilder {
    initial_state: SessionState,
}

impl StateMachineBuilder {
    pub fn with_initial_state(mut self, state: SessionState) -> Self {
        self.initial_state = state;
        self
    }

    pub fn build(self) -> StateMachine {
        StateMachine {
            current_state: self.initial_state,
        }
    }
}

impl Default for StateMachineBuilder {
    fn default() -> Self {
        Self {
            initial_state: SessionState::Lobby,
        }
    }
}

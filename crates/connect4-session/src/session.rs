//! Logical session of the local player.
//!
//! [`Session`] owns the state machine together with the local role flags,
//! the lobby roster and the acknowledgement ledger. It has no I/O of its own:
//! the network layer feeds it validated [`ServerMessage`]s and asks it for
//! the [`ClientCommand`]s to write.
//!
//! # Acknowledgement Ledger
//!
//! The server answers `NICK`, `PING`, `RQ`, `RQ_CANCELED`, `RPL … NO` and
//! `EXIT` with a bare `OK`, in order. Every such command is recorded when it
//! is built, and every inbound `OK` settles the oldest record. Challenge
//! actions only move the state machine once their `OK` arrives, so the
//! session never assumes a state the server has not confirmed.

use std::collections::{BTreeMap, VecDeque};

use tracing::{debug, info, warn};

use crate::{ClientEvent, SessionState, StateMachine};
use connect4_core::{Disc, Error, Nick, Result, constants::COLUMNS};
use connect4_protocol::{ClientCommand, ServerMessage};

/// Outbound command still waiting for its `OK`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAck {
    Handshake,
    Ping,
    ChallengeSent,
    ChallengeWithdrawn,
    ChallengeDeclined,
    Exit,
}

impl PendingAck {
    /// Ledger entry for a command, if the server acknowledges it.
    pub fn for_command(command: &ClientCommand) -> Option<Self> {
        if !command.expects_ack() {
            return None;
        }
        let pending = match command {
            ClientCommand::Nick(_) => PendingAck::Handshake,
            ClientCommand::Ping => PendingAck::Ping,
            ClientCommand::Challenge(_) => PendingAck::ChallengeSent,
            ClientCommand::CancelChallenge(_) => PendingAck::ChallengeWithdrawn,
            ClientCommand::Reply { .. } => PendingAck::ChallengeDeclined,
            ClientCommand::Exit => PendingAck::Exit,
            ClientCommand::CancelGame | ClientCommand::Play { .. } => return None,
        };
        Some(pending)
    }
}

/// The local player's view of the server conversation.
#[derive(Debug)]
pub struct Session {
    nick: Nick,
    machine: StateMachine,

    /// The local player sent the challenge that started the game
    player1: bool,

    /// A game is locally believed to be running; moves are only sent while set
    game_on: bool,

    /// The pending challenge was already accepted
    accepted: bool,

    /// Lobby roster, nick to availability
    roster: BTreeMap<Nick, bool>,

    pending_acks: VecDeque<PendingAck>,
}

impl Session {
    pub fn new(nick: Nick) -> Self {
        Self {
            nick,
            machine: StateMachine::new(),
            player1: false,
            game_on: false,
            accepted: false,
            roster: BTreeMap::new(),
            pending_acks: VecDeque::new(),
        }
    }

    pub fn nick(&self) -> &Nick {
        &self.nick
    }

    pub fn state(&self) -> SessionState {
        self.machine.current_state()
    }

    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    pub fn is_player1(&self) -> bool {
        self.player1
    }

    pub fn is_game_on(&self) -> bool {
        self.game_on
    }

    /// Number of commands still waiting for an `OK`
    pub fn outstanding_acks(&self) -> usize {
        self.pending_acks.len()
    }

    /// Snapshot of the lobby roster, ordered by nick.
    pub fn roster(&self) -> Vec<(Nick, bool)> {
        self.roster
            .iter()
            .map(|(nick, available)| (nick.clone(), *available))
            .collect()
    }

    /// Drop every roster entry, as when the link goes down.
    pub fn clear_roster(&mut self) {
        self.roster.clear();
    }

    /// Start a fresh handshake on a new connection.
    ///
    /// Resets the machine to Lobby and forgets every unacknowledged command
    /// of the previous connection. The role flag survives so a game resumed
    /// by the server keeps its disc colors.
    pub fn handshake(&mut self) -> ClientCommand {
        let transition = self.machine.reset();
        debug!(from = %transition.from, "session reset for handshake");
        self.pending_acks.clear();
        self.game_on = false;
        self.accepted = false;
        self.record(ClientCommand::Nick(self.nick.clone()))
    }

    pub fn ping(&mut self) -> ClientCommand {
        self.record(ClientCommand::Ping)
    }

    pub fn exit(&mut self) -> ClientCommand {
        self.record(ClientCommand::Exit)
    }

    /// Challenge another player.
    ///
    /// # Errors
    /// Returns `Error::CommandRejected` outside the lobby, while another
    /// challenge awaits its acknowledgement, or when challenging oneself.
    pub fn challenge(&mut self, to: Nick) -> Result<ClientCommand> {
        if self.state() != SessionState::Lobby || self.awaiting(PendingAck::ChallengeSent) {
            return Err(self.rejected("a challenge can only be sent from the lobby"));
        }
        if to == self.nick {
            return Err(Error::CommandRejected("cannot challenge yourself".to_string()));
        }
        self.player1 = true;
        Ok(self.record(ClientCommand::Challenge(to)))
    }

    /// Withdraw a challenge sent by the local player.
    pub fn cancel_challenge(&mut self, to: Nick) -> Result<ClientCommand> {
        let sent = self.state() == SessionState::ChallengePending
            || self.awaiting(PendingAck::ChallengeSent);
        if !sent || !self.player1 {
            return Err(self.rejected("no challenge of yours is pending"));
        }
        Ok(self.record(ClientCommand::CancelChallenge(to)))
    }

    /// Accept a received challenge.
    ///
    /// Returns `Ok(None)` when the challenge was already accepted, so only
    /// one `RPL … YES` is ever written per challenge.
    pub fn accept(&mut self, from: Nick) -> Result<Option<ClientCommand>> {
        self.expect_received_challenge()?;
        if self.accepted {
            debug!(%from, "challenge already accepted");
            return Ok(None);
        }
        self.accepted = true;
        self.player1 = false;
        Ok(Some(self.record(ClientCommand::Reply {
            to: from,
            accept: true,
        })))
    }

    /// Decline a received challenge.
    pub fn reject(&mut self, from: Nick) -> Result<ClientCommand> {
        self.expect_received_challenge()?;
        if self.accepted {
            return Err(Error::CommandRejected(
                "the challenge was already accepted".to_string(),
            ));
        }
        Ok(self.record(ClientCommand::Reply {
            to: from,
            accept: false,
        }))
    }

    /// Drop a disc into `column`.
    ///
    /// # Errors
    /// - `Error::InvalidColumn` if `column` is not on the board
    /// - `Error::CommandRejected` if no game is running
    pub fn play(&mut self, column: usize) -> Result<ClientCommand> {
        if column >= COLUMNS {
            return Err(Error::InvalidColumn {
                column,
                columns: COLUMNS,
            });
        }
        if !self.game_on {
            return Err(Error::CommandRejected("no game is running".to_string()));
        }
        Ok(self.record(ClientCommand::Play { column }))
    }

    /// Leave the running game.
    pub fn cancel_game(&mut self) -> Result<ClientCommand> {
        if !self.game_on {
            return Err(Error::CommandRejected("no game is running".to_string()));
        }
        self.game_on = false;
        Ok(self.record(ClientCommand::CancelGame))
    }

    /// Apply one validated server message.
    ///
    /// # Returns
    /// The notification for the presentation layer, if the message produces one.
    ///
    /// # Errors
    /// - `Error::ProhibitedMessage` if the message is illegal in the current state
    /// - `Error::ServerRejected` on `INVALID_PROTOCOL`
    ///
    /// Both are fatal; the session is left as it was before the message.
    pub fn handle(&mut self, message: ServerMessage) -> Result<Option<ClientEvent>> {
        if let Some(transition) = self.machine.apply(message.kind())? {
            info!(from = %transition.from, to = %transition.to, trigger = %message, "session state changed");
        }

        let event = match message {
            ServerMessage::Ok => return Ok(self.acknowledge()),
            ServerMessage::AddClient(nick) => {
                self.roster.insert(nick.clone(), true);
                ClientEvent::UserAdded { nick }
            }
            ServerMessage::RemoveClient(nick) => {
                self.roster.remove(&nick);
                ClientEvent::UserRemoved { nick }
            }
            ServerMessage::PlayerState { nick, available } => {
                self.roster.insert(nick.clone(), available);
                ClientEvent::UserAvailability { nick, available }
            }
            ServerMessage::Rq(from) => {
                self.player1 = false;
                self.accepted = false;
                ClientEvent::ChallengeReceived { from }
            }
            ServerMessage::RqCanceled(_) => {
                self.accepted = false;
                ClientEvent::ChallengeCanceled
            }
            ServerMessage::GameStart { opponent, .. } => {
                self.game_on = true;
                ClientEvent::GameStarted { opponent }
            }
            ServerMessage::GamePlay { nick, cell } => {
                let local = nick == self.nick;
                ClientEvent::MoveMade {
                    cell,
                    local,
                    disc: Disc::for_side(self.player1, local),
                }
            }
            ServerMessage::GameWinningTails(cells) => {
                self.game_on = false;
                ClientEvent::WinningCells { cells }
            }
            ServerMessage::GameRecovery(board) => ClientEvent::BoardRecovered {
                discs: board.discs(),
            },
            ServerMessage::GameCanceled(message) => {
                self.game_on = false;
                self.accepted = false;
                ClientEvent::GameCanceled { message }
            }
            ServerMessage::GameMsg(message) => ClientEvent::GameMessage { message },
            ServerMessage::GameResult(message) => ClientEvent::GameResult { message },
            ServerMessage::InvalidProtocol(reason) => return Err(Error::ServerRejected(reason)),
        };
        Ok(Some(event))
    }

    /// Settle the oldest ledger entry.
    fn acknowledge(&mut self) -> Option<ClientEvent> {
        let Some(pending) = self.pending_acks.pop_front() else {
            warn!("OK received with no command awaiting it");
            return None;
        };

        let settle = |session: &mut Session, from: SessionState, to: SessionState| {
            if session.state() == from {
                if let Ok(transition) = session.machine.transition_to(to) {
                    info!(from = %transition.from, to = %transition.to, ?pending, "session state changed");
                }
            }
        };

        match pending {
            PendingAck::Handshake => return Some(ClientEvent::LobbyReady),
            PendingAck::ChallengeSent => {
                settle(self, SessionState::Lobby, SessionState::ChallengePending);
            }
            PendingAck::ChallengeWithdrawn | PendingAck::ChallengeDeclined => {
                self.accepted = false;
                settle(self, SessionState::ChallengePending, SessionState::Lobby);
            }
            PendingAck::Ping | PendingAck::Exit => {}
        }
        None
    }

    fn record(&mut self, command: ClientCommand) -> ClientCommand {
        if let Some(pending) = PendingAck::for_command(&command) {
            self.pending_acks.push_back(pending);
        }
        command
    }

    fn awaiting(&self, pending: PendingAck) -> bool {
        self.pending_acks.contains(&pending)
    }

    fn expect_received_challenge(&self) -> Result<()> {
        if self.state() != SessionState::ChallengePending || self.player1 {
            return Err(self.rejected("no challenge was received"));
        }
        Ok(())
    }

    fn rejected(&self, reason: &str) -> Error {
        Error::CommandRejected(format!("{reason} (state {})", self.state()))
    }
}

use std::fmt;

use crate::{Frame, validation::validate_tokens};
use connect4_core::{BoardSnapshot, Cell, Error, Nick, Result};

/// Closed set of message kinds the server may send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    AddClient,
    RemoveClient,
    GamePlayerState,
    Rq,
    RqCanceled,
    Ok,
    GameStart,
    GamePlay,
    GameWinningTails,
    GameRecovery,
    GameCanceled,
    GameMsg,
    GameResult,
    InvalidProtocol,
}

impl MessageKind {
    /// Every kind, in catalog order
    pub const ALL: [MessageKind; 14] = [
        MessageKind::AddClient,
        MessageKind::RemoveClient,
        MessageKind::GamePlayerState,
        MessageKind::Rq,
        MessageKind::RqCanceled,
        MessageKind::Ok,
        MessageKind::GameStart,
        MessageKind::GamePlay,
        MessageKind::GameWinningTails,
        MessageKind::GameRecovery,
        MessageKind::GameCanceled,
        MessageKind::GameMsg,
        MessageKind::GameResult,
        MessageKind::InvalidProtocol,
    ];

    /// Wire tag of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::AddClient => "ADD_CLIENT",
            MessageKind::RemoveClient => "REMOVE_CLIENT",
            MessageKind::GamePlayerState => "GAME_PLAYER_STATE",
            MessageKind::Rq => "RQ",
            MessageKind::RqCanceled => "RQ_CANCELED",
            MessageKind::Ok => "OK",
            MessageKind::GameStart => "GAME_START",
            MessageKind::GamePlay => "GAME_PLAY",
            MessageKind::GameWinningTails => "GAME_WINNING_TAILS",
            MessageKind::GameRecovery => "GAME_RECOVERY",
            MessageKind::GameCanceled => "GAME_CANCELED",
            MessageKind::GameMsg => "GAME_MSG",
            MessageKind::GameResult => "GAME_RESULT",
            MessageKind::InvalidProtocol => "INVALID_PROTOCOL",
        }
    }

    /// Look up a kind by its wire tag
    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated message received from the server.
///
/// Values of this type only exist for frames whose token list passed the
/// predicate of their kind; see [`crate::validation`].
///
/// # Examples
///
/// ```
/// use connect4_protocol::{Frame, ServerMessage};
///
/// let frame = Frame::decode("silhavyj0017GAME_PLAY bob 0 3").unwrap().unwrap();
/// match ServerMessage::try_from(&frame).unwrap() {
///     ServerMessage::GamePlay { nick, cell } => {
///         assert_eq!(nick.as_str(), "bob");
///         assert_eq!((cell.row(), cell.col()), (0, 3));
///     }
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// A player joined the lobby
    AddClient(Nick),
    /// A player left the server
    RemoveClient(Nick),
    /// A player became available (`ON`) or busy (`OFF`)
    PlayerState { nick: Nick, available: bool },
    /// Another player challenged the local player
    Rq(Nick),
    /// The pending challenge was withdrawn or declined
    RqCanceled(Nick),
    /// Acknowledgement of the oldest unacknowledged client frame
    Ok,
    /// A game against `opponent` started
    GameStart { opponent: Nick, extra: Option<String> },
    /// A disc was dropped into `cell` by `nick`
    GamePlay { nick: Nick, cell: Cell },
    /// The cells forming the winning line
    GameWinningTails(Vec<Cell>),
    /// Board replay after a reconnect
    GameRecovery(BoardSnapshot),
    GameCanceled(String),
    GameMsg(String),
    GameResult(String),
    /// The server considers the client in violation of the protocol
    InvalidProtocol(String),
}

impl ServerMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            ServerMessage::AddClient(_) => MessageKind::AddClient,
            ServerMessage::RemoveClient(_) => MessageKind::RemoveClient,
            ServerMessage::PlayerState { .. } => MessageKind::GamePlayerState,
            ServerMessage::Rq(_) => MessageKind::Rq,
            ServerMessage::RqCanceled(_) => MessageKind::RqCanceled,
            ServerMessage::Ok => MessageKind::Ok,
            ServerMessage::GameStart { .. } => MessageKind::GameStart,
            ServerMessage::GamePlay { .. } => MessageKind::GamePlay,
            ServerMessage::GameWinningTails(_) => MessageKind::GameWinningTails,
            ServerMessage::GameRecovery(_) => MessageKind::GameRecovery,
            ServerMessage::GameCanceled(_) => MessageKind::GameCanceled,
            ServerMessage::GameMsg(_) => MessageKind::GameMsg,
            ServerMessage::GameResult(_) => MessageKind::GameResult,
            ServerMessage::InvalidProtocol(_) => MessageKind::InvalidProtocol,
        }
    }

    fn construct(kind: MessageKind, frame: &Frame) -> Result<Self> {
        let args = frame.args();
        let message = match kind {
            MessageKind::AddClient => ServerMessage::AddClient(Nick::new(&args[0])?),
            MessageKind::RemoveClient => ServerMessage::RemoveClient(Nick::new(&args[0])?),
            MessageKind::GamePlayerState => ServerMessage::PlayerState {
                nick: Nick::new(&args[0])?,
                available: args[1] == "ON",
            },
            MessageKind::Rq => ServerMessage::Rq(Nick::new(&args[0])?),
            MessageKind::RqCanceled => ServerMessage::RqCanceled(Nick::new(&args[0])?),
            MessageKind::Ok => ServerMessage::Ok,
            MessageKind::GameStart => ServerMessage::GameStart {
                opponent: Nick::new(&args[0])?,
                extra: args.get(1).cloned(),
            },
            MessageKind::GamePlay => ServerMessage::GamePlay {
                nick: Nick::new(&args[0])?,
                cell: Cell::parse(&args[1], &args[2])?,
            },
            MessageKind::GameWinningTails => ServerMessage::GameWinningTails(
                args.chunks_exact(2)
                    .map(|pair| Cell::parse(&pair[0], &pair[1]))
                    .collect::<Result<_>>()?,
            ),
            MessageKind::GameRecovery => ServerMessage::GameRecovery(BoardSnapshot::from_codes(
                args.iter().map(String::as_str),
            )?),
            MessageKind::GameCanceled => ServerMessage::GameCanceled(frame.text()),
            MessageKind::GameMsg => ServerMessage::GameMsg(frame.text()),
            MessageKind::GameResult => ServerMessage::GameResult(frame.text()),
            MessageKind::InvalidProtocol => ServerMessage::InvalidProtocol(frame.text()),
        };
        Ok(message)
    }
}

impl TryFrom<&Frame> for ServerMessage {
    type Error = Error;

    /// Look up the kind by tag, validate the token list, then build the payload.
    ///
    /// # Errors
    /// - `Error::UnknownTag` if the tag is not in the catalog
    /// - `Error::InvalidMessage` if the token list fails the kind's predicate
    fn try_from(frame: &Frame) -> Result<Self> {
        let kind = MessageKind::parse(frame.tag()).ok_or_else(|| Error::UnknownTag {
            tag: frame.tag().to_string(),
            line: frame.line(),
        })?;

        let invalid = || Error::InvalidMessage {
            kind: kind.to_string(),
            line: frame.line(),
        };
        if !validate_tokens(kind, &frame.tokens()) {
            return Err(invalid());
        }
        Self::construct(kind, frame).map_err(|_| invalid())
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connect4_core::{
        Disc,
        constants::{COLUMNS, ROWS},
    };

    fn message(body: &str) -> Result<ServerMessage> {
        let tokens: Vec<&str> = body.split(' ').collect();
        ServerMessage::try_from(&Frame::new(tokens[0], tokens[1..].iter().copied()))
    }

    #[test]
    fn test_kind_parse_roundtrip() {
        for kind in MessageKind::ALL {
            assert_eq!(MessageKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(MessageKind::parse("PING"), None);
        assert_eq!(MessageKind::parse("ok"), None);
    }

    #[test]
    fn test_unknown_tag() {
        assert!(matches!(message("HELLO bob"), Err(Error::UnknownTag { .. })));
    }

    #[test]
    fn test_invalid_message() {
        let result = message("ADD_CLIENT bob alice");
        assert!(matches!(result, Err(Error::InvalidMessage { kind, .. }) if kind == "ADD_CLIENT"));
    }

    #[test]
    fn test_player_state_payload() {
        assert_eq!(
            message("GAME_PLAYER_STATE bob OFF").unwrap(),
            ServerMessage::PlayerState {
                nick: Nick::new("bob").unwrap(),
                available: false
            }
        );
    }

    #[test]
    fn test_game_start_extra_token() {
        let start = message("GAME_START bob reconnected").unwrap();
        assert_eq!(
            start,
            ServerMessage::GameStart {
                opponent: Nick::new("bob").unwrap(),
                extra: Some("reconnected".to_string())
            }
        );
        assert_eq!(start.kind(), MessageKind::GameStart);
    }

    #[test]
    fn test_free_text_is_rejoined() {
        assert_eq!(
            message("GAME_CANCELED your opponent canceled the game").unwrap(),
            ServerMessage::GameCanceled("your opponent canceled the game".to_string())
        );
        assert_eq!(
            message("GAME_RESULT").unwrap(),
            ServerMessage::GameResult(String::new())
        );
    }

    #[test]
    fn test_winning_tails_payload() {
        let tails = message("GAME_WINNING_TAILS 5 0 5 1 5 2 5 3").unwrap();
        let ServerMessage::GameWinningTails(cells) = tails else {
            panic!("expected winning tails");
        };
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[3], Cell::new(5, 3).unwrap());
    }

    #[test]
    fn test_recovery_payload() {
        let mut codes = vec!["0"; ROWS * COLUMNS];
        codes[ROWS * COLUMNS - 1] = "2";
        let body = format!("GAME_RECOVERY {}", codes.join(" "));

        let ServerMessage::GameRecovery(board) = message(&body).unwrap() else {
            panic!("expected recovery");
        };
        assert_eq!(
            board.discs(),
            vec![(Cell::new(ROWS - 1, COLUMNS - 1).unwrap(), Disc::Player2)]
        );
    }
}

//! Line commands typed on stdin.

use std::fmt;
use std::str::FromStr;

use connect4_core::Result;
use connect4_network::GameClient;

/// One console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Challenge(String),
    CancelChallenge(String),
    Accept(String),
    Reject(String),
    Play(usize),
    CancelGame,
    Roster,
    Help,
    Quit,
}

pub const HELP: &str = "commands: challenge <nick> | cancel-challenge <nick> | accept <nick> | \
reject <nick> | play <col> | cancel-game | roster | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCommandError(String);

impl fmt::Display for ParseCommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({HELP})", self.0)
    }
}

impl std::error::Error for ParseCommandError {}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words
            .next()
            .ok_or_else(|| ParseCommandError("empty command".to_string()))?;
        let argument = words.next();
        if words.next().is_some() {
            return Err(ParseCommandError(format!("too many arguments for '{name}'")));
        }

        let nick = |argument: Option<&str>| {
            argument
                .map(str::to_string)
                .ok_or_else(|| ParseCommandError(format!("'{name}' needs a nick")))
        };

        let command = match (name, argument) {
            ("challenge", _) => Command::Challenge(nick(argument)?),
            ("cancel-challenge", _) => Command::CancelChallenge(nick(argument)?),
            ("accept", _) => Command::Accept(nick(argument)?),
            ("reject", _) => Command::Reject(nick(argument)?),
            ("play", Some(column)) => Command::Play(
                column
                    .parse()
                    .map_err(|_| ParseCommandError(format!("invalid column '{column}'")))?,
            ),
            ("play", None) => return Err(ParseCommandError("'play' needs a column".to_string())),
            ("cancel-game", None) => Command::CancelGame,
            ("roster", None) => Command::Roster,
            ("help", None) => Command::Help,
            ("quit" | "exit", None) => Command::Quit,
            (_, Some(_)) if matches!(name, "cancel-game" | "roster" | "help" | "quit" | "exit") => {
                return Err(ParseCommandError(format!("'{name}' takes no argument")));
            }
            _ => return Err(ParseCommandError(format!("unknown command '{name}'"))),
        };
        Ok(command)
    }
}

/// Run a game command against the client.
///
/// `Roster`, `Help` and `Quit` are handled by the caller.
pub async fn execute(client: &GameClient, command: Command) -> Result<()> {
    match command {
        Command::Challenge(nick) => client.send_challenge(&nick).await,
        Command::CancelChallenge(nick) => client.cancel_challenge(&nick).await,
        Command::Accept(nick) => client.accept_challenge(&nick).await,
        Command::Reject(nick) => client.reject_challenge(&nick).await,
        Command::Play(column) => client.play_column(column).await,
        Command::CancelGame => client.cancel_game().await,
        Command::Roster | Command::Help | Command::Quit => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("challenge bob", Command::Challenge("bob".to_string()))]
    #[case("  accept   bob ", Command::Accept("bob".to_string()))]
    #[case("reject bob", Command::Reject("bob".to_string()))]
    #[case("cancel-challenge bob", Command::CancelChallenge("bob".to_string()))]
    #[case("play 3", Command::Play(3))]
    #[case("cancel-game", Command::CancelGame)]
    #[case("roster", Command::Roster)]
    #[case("exit", Command::Quit)]
    fn test_parse(#[case] line: &str, #[case] expected: Command) {
        assert_eq!(line.parse::<Command>().unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("challenge")]
    #[case("play")]
    #[case("play x")]
    #[case("play -1")]
    #[case("roster now")]
    #[case("challenge bob carol")]
    #[case("dance")]
    fn test_parse_rejects(#[case] line: &str) {
        assert!(line.parse::<Command>().is_err());
    }
}

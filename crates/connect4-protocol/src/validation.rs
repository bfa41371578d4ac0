//! Arity and range predicates for inbound messages.
//!
//! Every predicate takes the raw token list of a frame, tag included, so the
//! counts below match what the server puts on the wire:
//!
//! | Kind | Tokens | Extra checks |
//! |---|---|---|
//! | `ADD_CLIENT`, `REMOVE_CLIENT`, `RQ`, `RQ_CANCELED` | 2 | - |
//! | `GAME_PLAYER_STATE` | 3 | last token is `ON` or `OFF` |
//! | `OK` | 1 | - |
//! | `GAME_START` | 2 or 3 | - |
//! | `GAME_PLAY` | 4 | row and column on the board |
//! | `GAME_WINNING_TAILS` | 9 | four cells on the board |
//! | `GAME_RECOVERY` | `ROWS * COLUMNS + 1` | every cell value in `{0, 1, 2}` |
//! | `GAME_CANCELED`, `GAME_MSG`, `GAME_RESULT`, `INVALID_PROTOCOL` | any | - |
//!
//! # Examples
//!
//! ```
//! use connect4_protocol::{MessageKind, validate_tokens};
//!
//! assert!(validate_tokens(MessageKind::GamePlay, &["GAME_PLAY", "bob", "0", "3"]));
//! assert!(!validate_tokens(MessageKind::GamePlay, &["GAME_PLAY", "bob", "6", "3"]));
//! assert!(!validate_tokens(MessageKind::Ok, &["OK", "extra"]));
//! ```

use crate::MessageKind;
use connect4_core::{
    BoardSnapshot, Cell,
    constants::{COLUMNS, ROWS, WINNING_LINE_LENGTH},
};

/// Token count of a `GAME_WINNING_TAILS` frame
pub const WINNING_TAILS_TOKENS: usize = 2 * WINNING_LINE_LENGTH + 1;

/// Token count of a `GAME_RECOVERY` frame
pub const RECOVERY_TOKENS: usize = ROWS * COLUMNS + 1;

/// Check a token list against the shape required for `kind`.
pub fn validate_tokens(kind: MessageKind, tokens: &[&str]) -> bool {
    match kind {
        MessageKind::AddClient
        | MessageKind::RemoveClient
        | MessageKind::Rq
        | MessageKind::RqCanceled => tokens.len() == 2,
        MessageKind::GamePlayerState => valid_player_state(tokens),
        MessageKind::Ok => tokens.len() == 1,
        MessageKind::GameStart => matches!(tokens.len(), 2 | 3),
        MessageKind::GamePlay => valid_game_play(tokens),
        MessageKind::GameWinningTails => valid_winning_tails(tokens),
        MessageKind::GameRecovery => valid_recovery(tokens),
        MessageKind::GameCanceled
        | MessageKind::GameMsg
        | MessageKind::GameResult
        | MessageKind::InvalidProtocol => true,
    }
}

fn valid_player_state(tokens: &[&str]) -> bool {
    tokens.len() == 3 && matches!(tokens[2], "ON" | "OFF")
}

fn valid_game_play(tokens: &[&str]) -> bool {
    tokens.len() == 4 && Cell::parse(tokens[2], tokens[3]).is_ok()
}

fn valid_winning_tails(tokens: &[&str]) -> bool {
    tokens.len() == WINNING_TAILS_TOKENS
        && tokens[1..]
            .chunks_exact(2)
            .all(|pair| Cell::parse(pair[0], pair[1]).is_ok())
}

fn valid_recovery(tokens: &[&str]) -> bool {
    tokens.len() == RECOVERY_TOKENS && BoardSnapshot::from_codes(tokens[1..].iter().copied()).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(MessageKind::AddClient, 2)]
    #[case(MessageKind::RemoveClient, 2)]
    #[case(MessageKind::Rq, 2)]
    #[case(MessageKind::RqCanceled, 2)]
    #[case(MessageKind::Ok, 1)]
    fn test_fixed_arity(#[case] kind: MessageKind, #[case] arity: usize) {
        let tokens = |n: usize| {
            std::iter::once(kind.as_str())
                .chain(std::iter::repeat_n("bob", n - 1))
                .collect::<Vec<_>>()
        };
        assert!(validate_tokens(kind, &tokens(arity)));
        assert!(!validate_tokens(kind, &tokens(arity + 1)));
        if arity > 1 {
            assert!(!validate_tokens(kind, &tokens(arity - 1)));
        }
    }

    #[rstest]
    #[case(&["GAME_PLAYER_STATE", "bob", "ON"], true)]
    #[case(&["GAME_PLAYER_STATE", "bob", "OFF"], true)]
    #[case(&["GAME_PLAYER_STATE", "bob", "on"], false)]
    #[case(&["GAME_PLAYER_STATE", "bob"], false)]
    #[case(&["GAME_PLAYER_STATE", "bob", "ON", "x"], false)]
    fn test_player_state(#[case] tokens: &[&str], #[case] valid: bool) {
        assert_eq!(validate_tokens(MessageKind::GamePlayerState, tokens), valid);
    }

    #[rstest]
    #[case(&["GAME_START"], false)]
    #[case(&["GAME_START", "bob"], true)]
    #[case(&["GAME_START", "bob", "extra"], true)]
    #[case(&["GAME_START", "bob", "extra", "more"], false)]
    fn test_game_start(#[case] tokens: &[&str], #[case] valid: bool) {
        assert_eq!(validate_tokens(MessageKind::GameStart, tokens), valid);
    }

    #[rstest]
    #[case(&["GAME_PLAY", "bob", "0", "0"], true)]
    #[case(&["GAME_PLAY", "bob", "5", "6"], true)]
    #[case(&["GAME_PLAY", "bob", "6", "0"], false)]
    #[case(&["GAME_PLAY", "bob", "0", "7"], false)]
    #[case(&["GAME_PLAY", "bob", "-1", "0"], false)]
    #[case(&["GAME_PLAY", "bob", "a", "0"], false)]
    #[case(&["GAME_PLAY", "bob", "0"], false)]
    #[case(&["GAME_PLAY", "bob", "0", "0", "0"], false)]
    fn test_game_play(#[case] tokens: &[&str], #[case] valid: bool) {
        assert_eq!(validate_tokens(MessageKind::GamePlay, tokens), valid);
    }

    #[test]
    fn test_winning_tails() {
        let valid = ["GAME_WINNING_TAILS", "0", "0", "1", "1", "2", "2", "5", "6"];
        assert!(validate_tokens(MessageKind::GameWinningTails, &valid));

        let mut out_of_range = valid;
        out_of_range[8] = "7";
        assert!(!validate_tokens(MessageKind::GameWinningTails, &out_of_range));

        assert!(!validate_tokens(MessageKind::GameWinningTails, &valid[..8]));
        let mut too_long = valid.to_vec();
        too_long.push("0");
        assert!(!validate_tokens(MessageKind::GameWinningTails, &too_long));
    }

    #[test]
    fn test_recovery() {
        let mut tokens = vec!["GAME_RECOVERY"];
        tokens.extend(std::iter::repeat_n("0", ROWS * COLUMNS));
        assert!(validate_tokens(MessageKind::GameRecovery, &tokens));

        tokens[1] = "2";
        tokens[RECOVERY_TOKENS - 1] = "1";
        assert!(validate_tokens(MessageKind::GameRecovery, &tokens));

        tokens[3] = "3";
        assert!(!validate_tokens(MessageKind::GameRecovery, &tokens));

        tokens[3] = "0";
        tokens.pop();
        assert!(!validate_tokens(MessageKind::GameRecovery, &tokens));
    }

    #[test]
    fn test_free_text_kinds_always_valid() {
        for kind in [
            MessageKind::GameCanceled,
            MessageKind::GameMsg,
            MessageKind::GameResult,
            MessageKind::InvalidProtocol,
        ] {
            assert!(validate_tokens(kind, &[kind.as_str()]));
            assert!(validate_tokens(kind, &[kind.as_str(), "any", "text"]));
        }
    }
}

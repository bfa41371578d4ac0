//! Core constants for the Connect 4 lobby protocol.
//!
//! Every frame exchanged with the game server has the same shape:
//!
//! ```text
//! <PROTOCOL_ID><LENGTH><TAG> <ARG1> <ARG2> ...<TERMINATOR>
//! ```
//!
//! Where:
//! - `PROTOCOL_ID` - the literal `silhavyj`
//! - `LENGTH` - byte length of the body, zero-padded to [`LENGTH_FIELD_WIDTH`] digits
//! - `TAG` and arguments - the body, tokens joined by single spaces
//! - `TERMINATOR` - `\r` from the client, `\r\n` from the server
//!
//! # Usage
//!
//! ```
//! use connect4_core::constants::*;
//!
//! assert_eq!(PROTOCOL_ID, "silhavyj");
//! assert_eq!(ROWS * COLUMNS, 42);
//! ```

// ============================================================================
// Protocol Identification
// ============================================================================

/// Literal that opens every frame in both directions.
pub const PROTOCOL_ID: &str = "silhavyj";

/// Width of the zero-padded decimal length field.
pub const LENGTH_FIELD_WIDTH: usize = 4;

/// Largest body length expressible in the length field.
pub const MAX_BODY_LENGTH: usize = 9999;

/// Separator between the tag and its arguments.
pub const TOKEN_SEPARATOR: char = ' ';

/// Terminator appended to every outbound frame.
pub const CLIENT_TERMINATOR: u8 = b'\r';

/// Upper bound on an inbound line, terminator excluded.
///
/// A line longer than this cannot come from a conforming server (the body
/// length is bounded by the four-digit length field), so the decoder treats
/// it as a framing violation instead of buffering without limit.
pub const MAX_LINE_LENGTH: usize = 16 * 1024;

/// Longest nickname accepted, in characters.
///
/// Keeps every outbound frame far below [`MAX_BODY_LENGTH`].
pub const MAX_NICK_LENGTH: usize = 32;

// ============================================================================
// Board Geometry
// ============================================================================

/// Number of rows on the game board.
pub const ROWS: usize = 6;

/// Number of columns on the game board.
pub const COLUMNS: usize = 7;

/// Number of discs in a winning line.
pub const WINNING_LINE_LENGTH: usize = 4;

// ============================================================================
// Timing Defaults
// ============================================================================

/// Timeout for a single TCP connect attempt (milliseconds).
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 3000;

/// Timeout for a single frame write (milliseconds).
pub const DEFAULT_IO_TIMEOUT_MS: u64 = 3000;

/// Delay between two liveness monitor cycles (milliseconds).
pub const DEFAULT_CYCLE_DELAY_MS: u64 = 2500;

/// Window in which a PING must be acknowledged (milliseconds).
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 6000;

/// Ceiling for the optional reconnect backoff (milliseconds).
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 30_000;

// ============================================================================
// Network Defaults
// ============================================================================

/// Address used when none is configured.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Port used when none is configured.
pub const DEFAULT_PORT: u16 = 53333;

use crate::{
    Result,
    constants::{COLUMNS, MAX_NICK_LENGTH, ROWS},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

/// Player nickname (one non-empty word)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Nick(String);

impl Nick {
    /// Create a new nick with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidNick` if the nick is empty, longer than
    /// [`MAX_NICK_LENGTH`] characters or contains whitespace.
    pub fn new(nick: &str) -> Result<Self> {
        if nick.is_empty()
            || nick.chars().count() > MAX_NICK_LENGTH
            || nick.chars().any(char::is_whitespace)
        {
            return Err(Error::InvalidNick(nick.to_string()));
        }
        Ok(Nick(nick.to_string()))
    }

    /// Get the nick as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Nick {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Nick {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Nick::new(s)
    }
}

impl TryFrom<String> for Nick {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Nick::new(&value)
    }
}

impl From<Nick> for String {
    fn from(nick: Nick) -> Self {
        nick.0
    }
}

impl PartialEq<str> for Nick {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// Board coordinate, row 0 at the top
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    row: usize,
    col: usize,
}

impl Cell {
    /// Create a new cell with bounds checking against the fixed board size.
    ///
    /// # Errors
    /// Returns `Error::InvalidFrame` if the row or column lies outside the board.
    pub fn new(row: usize, col: usize) -> Result<Self> {
        if row >= ROWS || col >= COLUMNS {
            return Err(Error::InvalidFrame(format!(
                "cell ({row}, {col}) is outside the {ROWS}x{COLUMNS} board"
            )));
        }
        Ok(Cell { row, col })
    }

    /// Parse a cell from its decimal row and column tokens.
    pub fn parse(row: &str, col: &str) -> Result<Self> {
        let parse = |token: &str| {
            token
                .parse::<usize>()
                .map_err(|_| Error::InvalidFrame(format!("'{token}' is not a board index")))
        };
        Cell::new(parse(row)?, parse(col)?)
    }

    #[must_use]
    pub fn row(&self) -> usize {
        self.row
    }

    #[must_use]
    pub fn col(&self) -> usize {
        self.col
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Owner of a disc on the board.
///
/// `Player1` is the side that sent the accepted challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disc {
    Player1,
    Player2,
}

impl Disc {
    /// Decode a recovery cell value: `0` is empty, `1` and `2` are discs.
    ///
    /// # Errors
    /// Returns `Error::InvalidFrame` for any other value.
    pub fn from_cell_code(code: &str) -> Result<Option<Self>> {
        match code {
            "0" => Ok(None),
            "1" => Ok(Some(Disc::Player1)),
            "2" => Ok(Some(Disc::Player2)),
            other => Err(Error::InvalidFrame(format!(
                "'{other}' is not a board cell value"
            ))),
        }
    }

    /// Disc owned by the given side, from the local player's point of view.
    #[must_use]
    pub fn for_side(local_is_player1: bool, local: bool) -> Self {
        if local == local_is_player1 {
            Disc::Player1
        } else {
            Disc::Player2
        }
    }
}

impl fmt::Display for Disc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Disc::Player1 => f.write_str("player1"),
            Disc::Player2 => f.write_str("player2"),
        }
    }
}

/// Full board state replayed by the server after a reconnect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    cells: Vec<Option<Disc>>,
}

impl BoardSnapshot {
    /// Build a snapshot from row-major cell codes.
    ///
    /// # Errors
    /// Returns `Error::InvalidFrame` if the number of codes differs from
    /// `ROWS * COLUMNS` or any code is outside `{0, 1, 2}`.
    pub fn from_codes<'a, I>(codes: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let cells = codes
            .into_iter()
            .map(Disc::from_cell_code)
            .collect::<Result<Vec<_>>>()?;
        if cells.len() != ROWS * COLUMNS {
            return Err(Error::InvalidFrame(format!(
                "board snapshot has {} cells, expected {}",
                cells.len(),
                ROWS * COLUMNS
            )));
        }
        Ok(BoardSnapshot { cells })
    }

    /// Disc at the given cell, if any.
    #[must_use]
    pub fn get(&self, cell: Cell) -> Option<Disc> {
        self.cells[cell.row() * COLUMNS + cell.col()]
    }

    /// Occupied cells in row-major order.
    pub fn discs(&self) -> Vec<(Cell, Disc)> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(index, disc)| {
                disc.map(|disc| {
                    (
                        Cell {
                            row: index / COLUMNS,
                            col: index % COLUMNS,
                        },
                        disc,
                    )
                })
            })
            .collect()
    }
}

/// Validated server address (IPv4 literal and port)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEndpoint {
    pub ip: Ipv4Addr,
    pub port: u16,
}

impl ServerEndpoint {
    /// Validate user-supplied address and port strings.
    ///
    /// # Errors
    /// Returns `Error::InvalidAddress` unless `ip` is a dotted-quad IPv4
    /// literal, and `Error::InvalidPort` unless `port` is an integer in
    /// `0..=65535`.
    pub fn parse(ip: &str, port: &str) -> Result<Self> {
        let ip = ip
            .trim()
            .parse::<Ipv4Addr>()
            .map_err(|_| Error::InvalidAddress(ip.to_string()))?;
        let port = port
            .trim()
            .parse::<u16>()
            .map_err(|_| Error::InvalidPort(port.to_string()))?;
        Ok(ServerEndpoint { ip, port })
    }

    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.ip, self.port))
    }
}

impl fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

//! Tokio codec for line-delimited protocol frames.
//!
//! `FrameCodec` integrates [`Frame`] with Tokio's `Framed`, `FramedRead` and
//! `FramedWrite` adapters. It implements:
//! - [`Decoder`]: splits the byte stream into lines and decodes each to a [`Frame`]
//! - [`Encoder<Frame>`] and [`Encoder<ClientCommand>`]: write frames with a terminator
//!
//! # Architecture
//!
//! ```text
//! TCP Stream -> Decoder -> Frame -> ServerMessage (catalog)
//! ClientCommand -> Frame -> Encoder -> TCP Stream
//! ```
//!
//! # Line Endings
//!
//! The client terminates frames with `\r`, the server with `\r\n`. The
//! decoder accepts either byte as a line end and skips the empty lines a
//! `\r\n` pair leaves behind. The encoder terminator is chosen at
//! construction: [`FrameCodec::new`] for the client side,
//! [`FrameCodec::server`] for test servers speaking the other half.
//!
//! # Usage with Tokio Framed
//!
//! ```rust,no_run
//! use tokio::net::TcpStream;
//! use tokio_util::codec::Framed;
//! use connect4_protocol::{ClientCommand, FrameCodec};
//! use futures::{SinkExt, StreamExt};
//!
//! # async fn example() -> connect4_core::Result<()> {
//! let stream = TcpStream::connect("127.0.0.1:53333").await?;
//! let mut framed = Framed::new(stream, FrameCodec::new());
//!
//! framed.send(ClientCommand::Ping).await?;
//! if let Some(Ok(frame)) = framed.next().await {
//!     println!("Received: {}", frame);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # DoS Protection
//!
//! A line longer than the codec's limit ([`MAX_LINE_LENGTH`] by default) is
//! rejected with `Error::FrameTooLarge`, whether or not its terminator has
//! arrived. The encoder holds outbound frames to the same limit.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::{ClientCommand, Frame};
use connect4_core::{
    Error, Result,
    constants::{CLIENT_TERMINATOR, MAX_LINE_LENGTH},
};

const CLIENT_LINE_END: &[u8] = &[CLIENT_TERMINATOR];
const SERVER_LINE_END: &[u8] = b"\r\n";

/// Tokio codec for protocol frames.
#[derive(Debug)]
pub struct FrameCodec {
    /// Bytes appended after every encoded frame
    terminator: &'static [u8],

    /// Maximum allowed line length in bytes
    max_line_length: usize,

    /// Index up to which the buffer is known to hold no terminator
    next_index: usize,
}

impl FrameCodec {
    /// Create a client-side codec (frames terminated by `\r`).
    ///
    /// # Example
    ///
    /// ```
    /// use connect4_protocol::FrameCodec;
    ///
    /// let codec = FrameCodec::new();
    /// assert_eq!(codec.terminator(), b"\r");
    /// ```
    pub fn new() -> Self {
        Self {
            terminator: CLIENT_LINE_END,
            max_line_length: MAX_LINE_LENGTH,
            next_index: 0,
        }
    }

    /// Create a server-side codec (frames terminated by `\r\n`).
    pub fn server() -> Self {
        Self {
            terminator: SERVER_LINE_END,
            ..Self::new()
        }
    }

    /// Create a client-side codec with a custom line length limit.
    pub fn with_max_line_length(max_line_length: usize) -> Self {
        Self {
            max_line_length,
            ..Self::new()
        }
    }

    /// Terminator written after each frame
    pub fn terminator(&self) -> &[u8] {
        self.terminator
    }

    /// Get the current maximum line length.
    pub fn max_line_length(&self) -> usize {
        self.max_line_length
    }

    fn decode_line(line: &[u8]) -> Result<Option<Frame>> {
        let line = std::str::from_utf8(line)
            .map_err(|_| Error::InvalidFrame(format!("line is not valid UTF-8: {line:?}")))?;
        Frame::decode(line)
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = Error;

    /// Decode the next non-empty line from the byte stream.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Frame))` - A complete line was decoded
    /// - `Ok(None)` - Need more data to complete the line
    /// - `Err(Error)` - Framing violation (protocol id, length field, size, UTF-8)
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        loop {
            let terminator = src[self.next_index..]
                .iter()
                .position(|b| *b == b'\r' || *b == b'\n');

            let Some(offset) = terminator else {
                if src.len() > self.max_line_length {
                    return Err(Error::FrameTooLarge {
                        size: src.len(),
                        max_size: self.max_line_length,
                    });
                }
                self.next_index = src.len();
                return Ok(None);
            };

            let line_end = self.next_index + offset;
            if line_end > self.max_line_length {
                return Err(Error::FrameTooLarge {
                    size: line_end,
                    max_size: self.max_line_length,
                });
            }
            self.next_index = 0;
            let line = src.split_to(line_end + 1);

            // Empty lines (including the gap inside "\r\n") are not frames
            if let Some(frame) = Self::decode_line(&line[..line_end])? {
                return Ok(Some(frame));
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        // A final line without terminator still counts
        self.next_index = 0;
        if src.is_empty() {
            return Ok(None);
        }
        let line = src.split_to(src.len());
        Self::decode_line(&line)
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = Error;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<()> {
        let bytes = item.encode_with(self.terminator)?;
        let size = bytes.len() - self.terminator.len();
        if size > self.max_line_length {
            return Err(Error::FrameTooLarge {
                size,
                max_size: self.max_line_length,
            });
        }
        dst.extend_from_slice(&bytes);
        Ok(())
    }
}

impl Encoder<ClientCommand> for FrameCodec {
    type Error = Error;

    fn encode(&mut self, item: ClientCommand, dst: &mut BytesMut) -> Result<()> {
        Encoder::<Frame>::encode(self, item.to_frame(), dst)
    }
}

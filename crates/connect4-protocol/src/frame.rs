use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;
use connect4_core::{Error, Result, constants::*};

/// Frame is one protocol message split into its tag and argument tokens.
///
/// # Wire Format
/// ```text
/// silhavyj0012RQ_CANCELED bob\r
/// ^^^^^^^^^^^^^^^^^^^^^^^^^^^
/// id      len body            terminator
/// ```
///
/// The length field counts the bytes of the body only (tag, separators and
/// arguments). The decoder checks that it is a four-digit decimal number but
/// never uses it for framing: lines are delimited by the transport.
///
/// # Basic Usage
/// ```
/// use connect4_protocol::Frame;
///
/// let frame = Frame::new("RQ", ["bob"]);
/// assert_eq!(&frame.encode().unwrap()[..], b"silhavyj0006RQ bob\r");
///
/// let decoded = Frame::decode("silhavyj0006RQ bob\r\n").unwrap().unwrap();
/// assert_eq!(decoded.tag(), "RQ");
/// assert_eq!(decoded.args(), ["bob"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// First token of the body
    tag: String,

    /// Remaining tokens, split on single spaces
    args: Vec<String>,

    /// The line this frame was decoded from, terminator stripped
    line: Option<String>,
}

impl Frame {
    /// Create a frame from a tag and its arguments
    pub fn new<I, S>(tag: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Frame {
            tag: tag.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            line: None,
        }
    }

    /// Decode one line received from the transport.
    ///
    /// Returns `Ok(None)` for a line that is empty once the terminator and
    /// surrounding whitespace are stripped; such lines are not frames.
    ///
    /// # Errors
    /// - `Error::ProtocolIdMismatch` if the line does not open with [`PROTOCOL_ID`]
    /// - `Error::InvalidFrame` if the length field is missing or not decimal
    pub fn decode(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let rest = line
            .strip_prefix(PROTOCOL_ID)
            .ok_or_else(|| Error::ProtocolIdMismatch {
                line: line.to_string(),
            })?;

        let length = rest
            .get(..LENGTH_FIELD_WIDTH)
            .filter(|field| field.bytes().all(|b| b.is_ascii_digit()))
            .ok_or_else(|| Error::InvalidFrame(format!("malformed length field in '{line}'")))?;
        let body = &rest[length.len()..];

        let mut tokens = body.split(TOKEN_SEPARATOR);
        let tag = tokens.next().unwrap_or_default().to_string();
        let mut args: Vec<String> = tokens.map(str::to_string).collect();
        // A trailing separator does not introduce an argument
        while args.last().is_some_and(String::is_empty) {
            args.pop();
        }

        Ok(Some(Frame {
            tag,
            args,
            line: Some(line.to_string()),
        }))
    }

    /// Tag identifying the message kind
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Arguments following the tag
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// All tokens, tag first
    pub fn tokens(&self) -> Vec<&str> {
        std::iter::once(self.tag.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }

    /// Arguments rejoined with single spaces (free-text payloads)
    pub fn text(&self) -> String {
        self.args.join(" ")
    }

    /// The raw line this frame was decoded from, or its body if it was built locally
    pub fn line(&self) -> String {
        self.line.clone().unwrap_or_else(|| self.body())
    }

    /// Tag and arguments joined by single spaces
    pub fn body(&self) -> String {
        self.tokens().join(" ")
    }

    /// Encode the frame with the client terminator (`\r`)
    pub fn encode(&self) -> Result<Bytes> {
        self.encode_with(&[CLIENT_TERMINATOR])
    }

    /// Encode the frame followed by an arbitrary terminator.
    ///
    /// # Errors
    /// Returns `Error::FrameTooLarge` if the body does not fit the length field.
    pub fn encode_with(&self, terminator: &[u8]) -> Result<Bytes> {
        let body = self.body();
        if body.len() > MAX_BODY_LENGTH {
            return Err(Error::FrameTooLarge {
                size: body.len(),
                max_size: MAX_BODY_LENGTH,
            });
        }

        let mut buf = BytesMut::with_capacity(
            PROTOCOL_ID.len() + LENGTH_FIELD_WIDTH + body.len() + terminator.len(),
        );
        buf.put_slice(PROTOCOL_ID.as_bytes());
        buf.put_slice(format!("{:0width$}", body.len(), width = LENGTH_FIELD_WIDTH).as_bytes());
        buf.put_slice(body.as_bytes());
        buf.put_slice(terminator);
        Ok(buf.freeze())
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.body())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_without_args() {
        let frame = Frame::new("PING", Vec::<String>::new());
        assert_eq!(&frame.encode().unwrap()[..], b"silhavyj0004PING\r");
    }

    #[test]
    fn test_encode_length_counts_body_only() {
        let frame = Frame::new("RPL", ["bob", "YES"]);
        let encoded = frame.encode().unwrap();
        assert_eq!(&encoded[..], b"silhavyj0011RPL bob YES\r");
        assert_eq!("RPL bob YES".len(), 11);
    }

    #[test]
    fn test_encode_with_server_terminator() {
        let frame = Frame::new("OK", Vec::<String>::new());
        assert_eq!(&frame.encode_with(b"\r\n").unwrap()[..], b"silhavyj0002OK\r\n");
    }

    #[test]
    fn test_encode_rejects_oversized_body() {
        let frame = Frame::new("GAME_MSG", ["x".repeat(MAX_BODY_LENGTH)]);
        assert!(matches!(
            frame.encode(),
            Err(Error::FrameTooLarge { .. })
        ));
    }

    #[test]
    fn test_decode_strips_terminators() {
        for line in ["silhavyj0002OK", "silhavyj0002OK\r", "silhavyj0002OK\r\n", " silhavyj0002OK \n"] {
            let frame = Frame::decode(line).unwrap().unwrap();
            assert_eq!(frame.tag(), "OK");
            assert!(frame.args().is_empty());
        }
    }

    #[test]
    fn test_decode_empty_line_is_skipped() {
        assert!(Frame::decode("").unwrap().is_none());
        assert!(Frame::decode("\r\n").unwrap().is_none());
        assert!(Frame::decode("   ").unwrap().is_none());
    }

    #[test]
    fn test_decode_ignores_length_value() {
        // The length field is not used for framing, only checked for shape
        let frame = Frame::decode("silhavyj9999GAME_PLAY bob 0 3").unwrap().unwrap();
        assert_eq!(frame.tokens(), vec!["GAME_PLAY", "bob", "0", "3"]);
    }

    #[test]
    fn test_decode_protocol_id_mismatch() {
        let result = Frame::decode("silhavyx0002OK");
        assert!(matches!(result, Err(Error::ProtocolIdMismatch { .. })));

        let result = Frame::decode("OK");
        assert!(matches!(result, Err(Error::ProtocolIdMismatch { .. })));
    }

    #[test]
    fn test_decode_malformed_length() {
        assert!(matches!(
            Frame::decode("silhavyj00x2OK"),
            Err(Error::InvalidFrame(_))
        ));
        assert!(matches!(
            Frame::decode("silhavyj00"),
            Err(Error::InvalidFrame(_))
        ));
    }

    #[test]
    fn test_decode_free_text() {
        let frame = Frame::decode("silhavyj0030GAME_CANCELED the game is over")
            .unwrap()
            .unwrap();
        assert_eq!(frame.tag(), "GAME_CANCELED");
        assert_eq!(frame.text(), "the game is over");
        assert_eq!(frame.line(), "silhavyj0030GAME_CANCELED the game is over");
    }

    #[test]
    fn test_roundtrip() {
        let frame = Frame::new("GAME_PLAY", ["alice", "5", "6"]);
        let encoded = frame.encode().unwrap();
        let decoded = Frame::decode(std::str::from_utf8(&encoded).unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(decoded.tag(), frame.tag());
        assert_eq!(decoded.args(), frame.args());
    }
}

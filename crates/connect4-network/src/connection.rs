//! TCP transport for the game protocol.
//!
//! A connection is split into two halves right after it is opened:
//!
//! ```text
//! GameClient / liveness monitor ──> Link (FrameWriter) ──(TCP)──> server
//!                 Dispatcher <── FrameReader <──────────(TCP)──── server
//! ```
//!
//! The writer half lives in a [`Link`] behind the client's writer lock, so
//! frames from the command API and the liveness monitor never interleave.
//! The reader half is handed to the dispatcher, which is its only reader.
//!
//! Every connection gets a generation number. A reader that fails can only
//! sever the writer of its own generation, never a newer one.

use std::time::Duration;

use futures::SinkExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, warn};

use connect4_core::{Error, Result, ServerEndpoint};
use connect4_protocol::{ClientCommand, FrameCodec};

pub type FrameReader = FramedRead<OwnedReadHalf, FrameCodec>;
pub type FrameWriter = FramedWrite<OwnedWriteHalf, FrameCodec>;

/// Open a TCP connection and split it into framed halves.
///
/// The stream is configured with TCP_NODELAY: frames are small and a PING
/// delayed by Nagle's algorithm eats into the probe window.
///
/// # Errors
/// - `Error::ConnectionTimeout` if the server does not answer in time
/// - `Error::Io` if the connection is refused or the network is unreachable
pub async fn open(
    endpoint: ServerEndpoint,
    timeout: Duration,
) -> Result<(FrameReader, FrameWriter)> {
    debug!(%endpoint, "connecting");

    let stream = match tokio::time::timeout(timeout, TcpStream::connect(endpoint.socket_addr())).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            debug!(%endpoint, error = %e, "connection failed");
            return Err(e.into());
        }
        Err(_) => {
            return Err(Error::ConnectionTimeout(timeout.as_millis() as u64));
        }
    };

    if let Err(e) = stream.set_nodelay(true) {
        warn!("Failed to set TCP_NODELAY: {} - probes may be delayed", e);
    }

    info!(%endpoint, "connected");
    let (read_half, write_half) = stream.into_split();
    Ok((
        FramedRead::new(read_half, FrameCodec::new()),
        FramedWrite::new(write_half, FrameCodec::new()),
    ))
}

/// Writer half of the current connection.
#[derive(Debug)]
pub struct Link {
    writer: Option<FrameWriter>,

    /// Generation of the connection `writer` belongs to
    generation: u64,

    /// Timeout for a single frame write
    io_timeout: Duration,
}

impl Link {
    pub fn new(io_timeout: Duration) -> Self {
        Self {
            writer: None,
            generation: 0,
            io_timeout,
        }
    }

    /// Install the writer of a freshly opened connection.
    ///
    /// Returns the generation assigned to the connection.
    pub fn replace(&mut self, writer: FrameWriter) -> u64 {
        self.generation += 1;
        if self.writer.replace(writer).is_some() {
            debug!(generation = self.generation, "replaced previous connection");
        }
        self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_connected(&self) -> bool {
        self.writer.is_some()
    }

    /// Write one command.
    ///
    /// A failed or timed out write severs the link. A command that cannot be
    /// encoded is refused before anything reaches the socket, and the link
    /// stays up.
    ///
    /// # Errors
    /// - `Error::NotConnected` if the link is severed
    /// - `Error::WriteTimeout` if the write does not complete within the I/O timeout
    /// - `Error::Io` if the write fails
    /// - the codec error if the command cannot be framed
    pub async fn send(&mut self, command: ClientCommand) -> Result<()> {
        let writer = self.writer.as_mut().ok_or(Error::NotConnected)?;
        debug!(target: "connect4::wire", frame = %command, "sending");

        let result = match tokio::time::timeout(self.io_timeout, writer.send(command)).await {
            Ok(result) => result,
            Err(_) => Err(Error::WriteTimeout(self.io_timeout.as_millis() as u64)),
        };
        match &result {
            Err(e @ (Error::Io(_) | Error::WriteTimeout(_))) => {
                warn!(generation = self.generation, error = %e, "write failed, severing link");
                self.writer = None;
            }
            Err(e) => warn!(generation = self.generation, error = %e, "command not sent"),
            Ok(()) => {}
        }
        result
    }

    /// Drop the writer if it still belongs to `generation`.
    pub fn sever(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.writer.is_none() {
            return false;
        }
        debug!(generation, "link severed");
        self.writer = None;
        true
    }

    /// Close the connection gracefully.
    ///
    /// Idempotent. Flush and shutdown are each bounded by 500ms so a dead
    /// network cannot hang the caller.
    pub async fn close(&mut self) {
        let Some(mut writer) = self.writer.take() else {
            return;
        };

        let flush_timeout = Duration::from_millis(500);
        let flush = SinkExt::<ClientCommand>::flush(&mut writer);
        match tokio::time::timeout(flush_timeout, flush).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Error flushing during close: {}", e),
            Err(_) => warn!("Flush timeout during close ({}ms)", flush_timeout.as_millis()),
        }

        let mut write_half = writer.into_inner();
        match tokio::time::timeout(flush_timeout, write_half.shutdown()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Error during shutdown: {}", e),
            Err(_) => warn!("Shutdown timeout during close ({}ms)", flush_timeout.as_millis()),
        }

        debug!(generation = self.generation, "connection closed");
    }
}

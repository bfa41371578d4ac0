//! Game client: the outbound command API and the state shared with the
//! background tasks.
//!
//! # Architecture
//!
//! ```text
//! UI ──> GameClient ──┐                      ┌──> Link (writer lock) ──> server
//!                     ├──> Shared ───────────┤
//!   liveness monitor ─┘   (Session, acks)    └──< dispatcher <── reader ── server
//!                               │
//!                               └──> mpsc<ClientEvent> ──> UI
//! ```
//!
//! Two tasks run per client: the liveness monitor ([`crate::heartbeat`]) and
//! the dispatcher ([`crate::dispatcher`]). Both stop when the client is
//! disconnected or terminated by a protocol violation.
//!
//! # Example
//!
//! ```no_run
//! use connect4_network::{ClientConfig, GameClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (client, mut events) = GameClient::connect(ClientConfig::default(), "127.0.0.1", "53333", "alice")?;
//!
//! while let Some(event) = events.recv().await {
//!     println!("{event}");
//! }
//! client.disconnect().await;
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use connect4_core::{Error, Nick, Result, ServerEndpoint};
use connect4_protocol::ClientCommand;
use connect4_session::{ClientEvent, Session, SessionState};

use crate::config::ClientConfig;
use crate::connection::{FrameReader, Link};
use crate::{dispatcher, heartbeat};

/// State shared by the command API, the liveness monitor and the dispatcher.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) config: ClientConfig,
    pub(crate) endpoint: ServerEndpoint,
    session: Mutex<Session>,

    /// Writer half of the current connection; the single writer path
    pub(crate) link: tokio::sync::Mutex<Link>,

    events: mpsc::UnboundedSender<ClientEvent>,

    /// Number of `OK` messages observed so far
    pub(crate) acks: watch::Sender<u64>,

    pub(crate) shutdown: CancellationToken,
}

impl Shared {
    pub(crate) fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn emit(&self, event: ClientEvent) {
        if self.events.send(event).is_err() {
            debug!("event receiver dropped");
        }
    }

    /// Open a new connection and perform the handshake on it.
    ///
    /// The connect itself runs outside the writer lock. The writer swap and
    /// the `NICK` frame happen under it, so no command can slip in between.
    /// On success the reader half is handed to the dispatcher.
    pub(crate) async fn reconnect(
        &self,
        readers: &mpsc::UnboundedSender<(u64, FrameReader)>,
    ) -> Result<()> {
        let (reader, writer) =
            crate::connection::open(self.endpoint, self.config.connect_timeout()).await?;

        let mut link = self.link.lock().await;
        let generation = link.replace(writer);
        let nick = self.session().handshake();
        link.send(nick).await?;
        drop(link);

        info!(generation, endpoint = %self.endpoint, "handshake sent");
        readers
            .send((generation, reader))
            .map_err(|_| Error::NotConnected)
    }

    /// Send one liveness probe.
    pub(crate) async fn probe(&self) -> Result<()> {
        let mut link = self.link.lock().await;
        if !link.is_connected() {
            return Err(Error::NotConnected);
        }
        let ping = self.session().ping();
        link.send(ping).await
    }

    /// Build a command from the session and write it.
    ///
    /// The ledger entry and the frame are produced under the writer lock so
    /// their order matches the order on the wire.
    async fn issue<F>(&self, build: F) -> Result<()>
    where
        F: FnOnce(&mut Session) -> Result<Option<ClientCommand>>,
    {
        if self.shutdown.is_cancelled() {
            return Err(Error::NotConnected);
        }
        let mut link = self.link.lock().await;
        if !link.is_connected() {
            return Err(Error::NotConnected);
        }
        let command = build(&mut self.session())?;
        match command {
            Some(command) => link.send(command).await,
            None => Ok(()),
        }
    }
}

/// Connection to the game server.
///
/// Created by [`GameClient::connect`], which spawns the liveness monitor and
/// the dispatcher. Every command method validates its input and the session
/// state before anything is written; a rejected command never reaches the
/// wire.
#[derive(Debug)]
pub struct GameClient {
    shared: Arc<Shared>,
    tasks: tokio::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl GameClient {
    /// Validate the user input and start connecting.
    ///
    /// Returns the client and the receiving end of its notification channel.
    /// Connecting happens in the background; the first events are
    /// `Connecting` and, once the server acknowledges the nick, `LobbyReady`.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    /// - `Error::InvalidNick` if `nick` is empty, too long or contains whitespace
    /// - `Error::InvalidAddress` if `ip` is not a dotted-quad IPv4 address
    /// - `Error::InvalidPort` if `port` is not an integer in 0..=65535
    pub fn connect(
        config: ClientConfig,
        ip: &str,
        port: &str,
        nick: &str,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ClientEvent>)> {
        let nick = Nick::new(nick)?;
        let endpoint = ServerEndpoint::parse(ip, port)?;
        Ok(Self::spawn(config, endpoint, nick))
    }

    fn spawn(
        config: ClientConfig,
        endpoint: ServerEndpoint,
        nick: Nick,
    ) -> (Self, mpsc::UnboundedReceiver<ClientEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (readers_tx, readers_rx) = mpsc::unbounded_channel();
        let (acks, _) = watch::channel(0);

        let shared = Arc::new(Shared {
            link: tokio::sync::Mutex::new(Link::new(config.io_timeout())),
            config,
            endpoint,
            session: Mutex::new(Session::new(nick)),
            events: events_tx,
            acks,
            shutdown: CancellationToken::new(),
        });

        let tasks = vec![
            tokio::spawn(heartbeat::run(Arc::clone(&shared), readers_tx)),
            tokio::spawn(dispatcher::run(Arc::clone(&shared), readers_rx)),
        ];

        let client = Self {
            shared,
            tasks: tokio::sync::Mutex::new(tasks),
        };
        (client, events_rx)
    }

    pub fn nick(&self) -> Nick {
        self.shared.session().nick().clone()
    }

    pub fn endpoint(&self) -> ServerEndpoint {
        self.shared.endpoint
    }

    pub fn state(&self) -> SessionState {
        self.shared.session().state()
    }

    /// Snapshot of the lobby roster as `(nick, available)` pairs, sorted by nick.
    pub fn roster(&self) -> Vec<(Nick, bool)> {
        self.shared.session().roster()
    }

    /// Whether a writable connection is currently installed.
    pub async fn is_connected(&self) -> bool {
        self.shared.link.lock().await.is_connected()
    }

    /// Whether the client was disconnected or terminated.
    pub fn is_stopped(&self) -> bool {
        self.shared.shutdown.is_cancelled()
    }

    /// Wait until the client is disconnected or terminated.
    pub async fn stopped(&self) {
        self.shared.shutdown.cancelled().await;
    }

    /// Challenge another player in the lobby.
    pub async fn send_challenge(&self, nick: &str) -> Result<()> {
        let to = Nick::new(nick)?;
        self.shared
            .issue(|session| session.challenge(to).map(Some))
            .await
    }

    /// Withdraw the challenge sent to `nick`.
    pub async fn cancel_challenge(&self, nick: &str) -> Result<()> {
        let to = Nick::new(nick)?;
        self.shared
            .issue(|session| session.cancel_challenge(to).map(Some))
            .await
    }

    /// Accept the challenge received from `nick`.
    ///
    /// Accepting twice is harmless: the second call writes nothing.
    pub async fn accept_challenge(&self, nick: &str) -> Result<()> {
        let from = Nick::new(nick)?;
        self.shared.issue(|session| session.accept(from)).await
    }

    /// Decline the challenge received from `nick`.
    pub async fn reject_challenge(&self, nick: &str) -> Result<()> {
        let from = Nick::new(nick)?;
        self.shared
            .issue(|session| session.reject(from).map(Some))
            .await
    }

    /// Drop a disc into `column` (0-based).
    pub async fn play_column(&self, column: usize) -> Result<()> {
        self.shared
            .issue(|session| session.play(column).map(Some))
            .await
    }

    /// Leave the running game.
    pub async fn cancel_game(&self) -> Result<()> {
        self.shared
            .issue(|session| session.cancel_game().map(Some))
            .await
    }

    /// Say goodbye to the server and stop the background tasks.
    ///
    /// Idempotent; calling it on a terminated client only joins the tasks.
    pub async fn disconnect(&self) {
        {
            let mut link = self.shared.link.lock().await;
            if link.is_connected() && !self.shared.shutdown.is_cancelled() {
                let exit = self.shared.session().exit();
                if let Err(e) = link.send(exit).await {
                    warn!(error = %e, "failed to send EXIT");
                }
            }
            link.close().await;
        }
        self.shared.shutdown.cancel();

        let tasks: Vec<_> = self.tasks.lock().await.drain(..).collect();
        if tasks.is_empty() {
            return;
        }
        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "background task failed");
            }
        }
        info!(nick = %self.nick(), "client disconnected");
    }
}

impl Drop for GameClient {
    fn drop(&mut self) {
        self.shared.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "127.0.0.1", "53333")]
    #[case("two words", "127.0.0.1", "53333")]
    #[case("alice", "localhost", "53333")]
    #[case("alice", "127.0.0.1", "70000")]
    #[case("alice", "127.0.0.1", "-1")]
    #[tokio::test]
    async fn test_connect_rejects_invalid_input(
        #[case] nick: &str,
        #[case] ip: &str,
        #[case] port: &str,
    ) {
        let result = GameClient::connect(ClientConfig::default(), ip, port, nick);
        assert!(result.is_err_and(|e| e.is_rejected_input()));
    }

    #[tokio::test]
    async fn test_connect_rejects_oversized_nick() {
        let nick = "x".repeat(10_000);
        let result = GameClient::connect(ClientConfig::default(), "127.0.0.1", "53333", &nick);
        assert!(matches!(result, Err(Error::InvalidNick(_))));
    }

    #[tokio::test]
    async fn test_drop_stops_background_tasks() {
        let config = ClientConfig {
            connect_timeout_ms: 50,
            cycle_delay_ms: 50,
            ..ClientConfig::default()
        };
        let (client, mut events) = GameClient::connect(config, "127.0.0.1", "9", "alice").unwrap();
        drop(client);

        // Both tasks hold an event sender; the channel closes once they exit
        let drained = tokio::time::timeout(std::time::Duration::from_secs(2), async {
            while events.recv().await.is_some() {}
        })
        .await;
        assert!(drained.is_ok());
    }

    #[tokio::test]
    async fn test_commands_fail_while_disconnected() {
        // Nothing listens on port 9; the client stays in Connecting
        let config = ClientConfig {
            connect_timeout_ms: 50,
            cycle_delay_ms: 50,
            ..ClientConfig::default()
        };
        let (client, _events) = GameClient::connect(config, "127.0.0.1", "9", "alice").unwrap();

        assert!(matches!(
            client.send_challenge("bob").await,
            Err(Error::NotConnected)
        ));
        assert!(matches!(
            client.send_challenge("not a nick").await,
            Err(Error::InvalidNick(_))
        ));
        assert_eq!(client.state(), SessionState::Lobby);

        client.disconnect().await;
        client.disconnect().await;
        assert!(client.is_stopped());
    }
}

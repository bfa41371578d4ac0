//! Liveness monitor.
//!
//! Owns the physical connection. It alternates between two modes:
//!
//! - **Connecting**: open a connection, send the nick and hand the reader to
//!   the dispatcher, then switch to Probing. On failure, retry after the
//!   cycle delay (optionally backed off).
//! - **Probing**: send `PING` and wait for any `OK` within the probe
//!   timeout. A failed send or a missed acknowledgement condemns the link
//!   and switches back to Connecting.
//!
//! Every cycle ends with the cycle delay. The monitor stops only when the
//! client shuts down.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use connect4_session::ClientEvent;

use crate::client::Shared;
use crate::connection::FrameReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Connecting,
    Probing,
}

pub(crate) async fn run(shared: Arc<Shared>, readers: mpsc::UnboundedSender<(u64, FrameReader)>) {
    let mut acks = shared.acks.subscribe();
    let mut mode = Mode::Connecting;
    let mut announce = true;
    let mut failures: u32 = 0;

    loop {
        if shared.shutdown.is_cancelled() {
            break;
        }

        match mode {
            Mode::Connecting => {
                if announce {
                    announce = false;
                    shared.session().clear_roster();
                    shared.emit(ClientEvent::Connecting {
                        info: connecting_info(&shared),
                    });
                }

                let attempt = tokio::select! {
                    _ = shared.shutdown.cancelled() => break,
                    result = shared.reconnect(&readers) => result,
                };
                match attempt {
                    Ok(()) => {
                        failures = 0;
                        mode = Mode::Probing;
                    }
                    Err(e) => {
                        failures = failures.saturating_add(1);
                        debug!(failures, error = %e, "connect attempt failed");
                    }
                }
            }
            Mode::Probing => {
                acks.borrow_and_update();
                let alive = match shared.probe().await {
                    Ok(()) => {
                        let probe_timeout = shared.config.probe_timeout();
                        tokio::select! {
                            _ = shared.shutdown.cancelled() => break,
                            acked = tokio::time::timeout(probe_timeout, acks.changed()) => {
                                matches!(acked, Ok(Ok(())))
                            }
                        }
                    }
                    Err(e) => {
                        debug!(error = %e, "probe could not be sent");
                        false
                    }
                };

                if !alive {
                    warn!(endpoint = %shared.endpoint, "server stopped responding, reconnecting");
                    shared.link.lock().await.close().await;
                    mode = Mode::Connecting;
                    announce = true;
                }
            }
        }

        let delay = match mode {
            Mode::Connecting => shared
                .config
                .backoff
                .delay(shared.config.cycle_delay(), failures),
            Mode::Probing => shared.config.cycle_delay(),
        };
        tokio::select! {
            _ = shared.shutdown.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    info!("liveness monitor stopped");
}

fn connecting_info(shared: &Shared) -> String {
    let nick = shared.session().nick().clone();
    format!("connecting to {} as {}", shared.endpoint, nick)
}

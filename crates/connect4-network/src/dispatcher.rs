//! Receive loop.
//!
//! The dispatcher is the only reader of the connection. It decodes each
//! frame, validates it against the message catalog, lets the session check
//! legality and apply the effect, and forwards the resulting notification.
//!
//! While no connection is available it parks on the channel through which
//! the liveness monitor hands over each new reader. Frames from a reader
//! whose connection has been replaced are dropped.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use connect4_core::{Error, Result};
use connect4_protocol::{Frame, ServerMessage};
use connect4_session::ClientEvent;

use crate::client::Shared;
use crate::config::ViolationPolicy;
use crate::connection::FrameReader;

enum Step {
    Stop,
    Attach(u64, FrameReader),
    Frame(Result<Frame>),
    Closed,
}

pub(crate) async fn run(shared: Arc<Shared>, mut readers: mpsc::UnboundedReceiver<(u64, FrameReader)>) {
    let mut current: Option<(u64, FrameReader)> = None;

    loop {
        let generation = current.as_ref().map_or(0, |(generation, _)| *generation);

        let step = match current.as_mut() {
            Some((_, reader)) => tokio::select! {
                biased;
                _ = shared.shutdown.cancelled() => Step::Stop,
                next = readers.recv() => attach(next),
                frame = reader.next() => match frame {
                    Some(frame) => Step::Frame(frame),
                    None => Step::Closed,
                },
            },
            None => tokio::select! {
                biased;
                _ = shared.shutdown.cancelled() => Step::Stop,
                next = readers.recv() => attach(next),
            },
        };

        match step {
            Step::Stop => break,
            Step::Attach(generation, reader) => {
                debug!(generation, "reader attached");
                current = Some((generation, reader));
            }
            Step::Closed => {
                info!(generation, "server closed the connection");
                current = None;
                shared.link.lock().await.sever(generation);
            }
            Step::Frame(Ok(frame)) => {
                // A reconnect resets the session under the writer lock before
                // the new reader arrives; frames still buffered on the old
                // reader must not reach the fresh session.
                let outcome = {
                    let link = shared.link.lock().await;
                    (link.generation() == generation).then(|| dispatch(&shared, &frame))
                };
                let Some(outcome) = outcome else {
                    debug!(generation, line = %frame.line(), "stale frame dropped");
                    current = None;
                    continue;
                };
                if let Err(e) = outcome {
                    if !e.is_fatal() {
                        warn!(error = %e, line = %frame.line(), "message ignored");
                        continue;
                    }
                    error!(error = %e, line = %frame.line(), "protocol violation");
                    current = None;
                    if violation(&shared, generation, e).await {
                        break;
                    }
                }
            }
            Step::Frame(Err(e)) if e.is_fatal() => {
                error!(error = %e, "protocol violation");
                current = None;
                if violation(&shared, generation, e).await {
                    break;
                }
            }
            Step::Frame(Err(e)) => {
                warn!(generation, error = %e, "read failed");
                current = None;
                shared.link.lock().await.sever(generation);
            }
        }
    }

    info!("dispatcher stopped");
}

fn attach(next: Option<(u64, FrameReader)>) -> Step {
    match next {
        Some((generation, reader)) => Step::Attach(generation, reader),
        None => Step::Stop,
    }
}

/// Decode, check and apply one frame.
fn dispatch(shared: &Shared, frame: &Frame) -> Result<()> {
    debug!(target: "connect4::wire", frame = %frame, "received");

    let message = ServerMessage::try_from(frame)?;
    let acknowledgement = matches!(message, ServerMessage::Ok);

    let event = shared.session().handle(message)?;
    if acknowledgement {
        shared.acks.send_modify(|count| *count += 1);
    }
    if let Some(event) = event {
        shared.emit(event);
    }
    Ok(())
}

/// Apply the violation policy. Returns `true` if the client stopped.
async fn violation(shared: &Shared, generation: u64, error: Error) -> bool {
    match shared.config.violation_policy {
        ViolationPolicy::Terminate => {
            shared.emit(ClientEvent::Terminated {
                reason: error.to_string(),
            });
            shared.shutdown.cancel();
            shared.link.lock().await.close().await;
            true
        }
        ViolationPolicy::Resync => {
            warn!(generation, "dropping link to resynchronize");
            shared.link.lock().await.sever(generation);
            false
        }
    }
}

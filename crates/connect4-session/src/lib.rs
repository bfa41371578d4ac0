//! Session layer of the Connect Four client.
//!
//! This crate tracks the local player's position in the lobby / challenge /
//! game lifecycle, enforces which server messages are legal in each state,
//! and turns accepted messages into [`ClientEvent`] notifications.

pub mod events;
pub mod session;
pub mod state_machine;

pub use events::ClientEvent;
pub use session::{PendingAck, Session};
pub use state_machine::{SessionState, StateMachine, StateMachineBuilder, StateTransition};

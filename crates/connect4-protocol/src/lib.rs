pub mod codec;
pub mod commands;
pub mod frame;
pub mod message;
pub mod validation;

pub use codec::FrameCodec;
pub use commands::ClientCommand;
pub use frame::Frame;
pub use message::{MessageKind, ServerMessage};
pub use validation::validate_tokens;

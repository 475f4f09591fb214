//! Wire protocol between client and game server

pub mod codec;
pub mod messages;
pub mod timestamp;

pub use codec::{ActionType, WireAction};
pub use messages::{
    ActorSnapshot, MessageFromClient, MessageToClient, ObjectiveMessage, Prop, PropUpdate,
    StateSync, TurnState,
};

/// Protocol errors
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Action type {0} is server-only and can't be sent by a client")]
    ServerOnlyAction(&'static str),

    #[error("Invalid timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),
}

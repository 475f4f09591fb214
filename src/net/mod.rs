//! Networking: transport seam, message routing and the entities it drives

pub mod entities;
pub mod router;
pub mod transport;

pub use entities::{Entity, EntityKind, EntityManager, Player, Validation};
pub use router::{GameUi, NetworkRouter};
pub use transport::{
    decode_frame, encode_frame, ChannelTransport, ServerEndpoint, Transport, TransportError,
};

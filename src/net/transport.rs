//! Message transport seam
//!
//! The real socket lives outside this crate. The router only needs a
//! non-blocking receive, a fire-and-forget send and a connection flag.

use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};

use crate::protocol::{MessageFromClient, MessageToClient};

/// Messages buffered in each direction before senders see backpressure
pub const CHANNEL_CAPACITY: usize = 256;

/// Transport errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Transport closed")]
    Closed,

    #[error("Outbound buffer full")]
    Full,

    #[error("Malformed frame: {0}")]
    Frame(#[from] serde_json::Error),
}

pub trait Transport {
    fn is_connected(&self) -> bool;

    /// Next inbound message if one has arrived. Never blocks.
    fn try_recv(&mut self) -> Option<MessageToClient>;

    fn send(&mut self, message: MessageFromClient) -> Result<(), TransportError>;
}

/// Decode one JSON text frame
pub fn decode_frame(text: &str) -> Result<MessageToClient, TransportError> {
    Ok(serde_json::from_str(text)?)
}

/// Encode one JSON text frame
pub fn encode_frame(message: &MessageFromClient) -> Result<String, TransportError> {
    Ok(serde_json::to_string(message)?)
}

/// Transport over a pair of tokio channels. The far side is whatever
/// owns the [`ServerEndpoint`]: a socket task, a replay reader, a test.
pub struct ChannelTransport {
    inbound: mpsc::Receiver<MessageToClient>,
    outbound: mpsc::Sender<MessageFromClient>,
    connected: bool,
}

/// Server side of a [`ChannelTransport`]
pub struct ServerEndpoint {
    pub to_client: mpsc::Sender<MessageToClient>,
    pub from_client: mpsc::Receiver<MessageFromClient>,
}

impl ChannelTransport {
    pub fn pair() -> (Self, ServerEndpoint) {
        let (to_client, inbound) = mpsc::channel(CHANNEL_CAPACITY);
        let (outbound, from_client) = mpsc::channel(CHANNEL_CAPACITY);
        (
            Self {
                inbound,
                outbound,
                connected: true,
            },
            ServerEndpoint {
                to_client,
                from_client,
            },
        )
    }
}

impl Transport for ChannelTransport {
    fn is_connected(&self) -> bool {
        self.connected && !self.outbound.is_closed()
    }

    fn try_recv(&mut self) -> Option<MessageToClient> {
        match self.inbound.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.connected = false;
                None
            }
        }
    }

    fn send(&mut self, message: MessageFromClient) -> Result<(), TransportError> {
        self.outbound.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => TransportError::Full,
            TrySendError::Closed(_) => TransportError::Closed,
        })
    }
}

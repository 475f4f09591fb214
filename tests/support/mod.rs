use chrono::{DateTime, Duration, TimeZone, Utc};

use hex_action_client::hex::HecsCoord;
use hex_action_client::map::NullRenderer;
use hex_action_client::net::{decode_frame, ChannelTransport, ServerEndpoint};
use hex_action_client::protocol::{ActorSnapshot, MessageToClient, StateSync};
use hex_action_client::Client;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn at(ms: i64) -> DateTime<Utc> {
    t0() + Duration::milliseconds(ms)
}

/// Client on an in-memory transport, scene not yet attached
pub fn client() -> (Client, ServerEndpoint) {
    let (transport, server) = ChannelTransport::pair();
    let client = Client::new(Box::new(transport), Box::new(NullRenderer::default()));
    (client, server)
}

pub fn state_sync(player_id: i32, actors: &[(i32, HecsCoord)]) -> MessageToClient {
    MessageToClient::StateSync {
        state: StateSync {
            population: actors.len() as i32,
            player_id,
            actors: actors
                .iter()
                .map(|&(actor_id, location)| ActorSnapshot {
                    actor_id,
                    asset_id: 0,
                    location,
                    rotation_degrees: 0.0,
                })
                .collect(),
        },
    }
}

/// Send a raw JSON frame the way the socket would
pub fn push_frame(server: &ServerEndpoint, frame: &str) {
    let message = decode_frame(frame).expect("frame should decode");
    server.to_client.try_send(message).expect("channel has room");
}

pub fn push(server: &ServerEndpoint, message: MessageToClient) {
    server.to_client.try_send(message).expect("channel has room");
}

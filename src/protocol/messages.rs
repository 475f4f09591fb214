//! Message envelopes exchanged with the game server
//! Both directions are JSON objects discriminated by a `type` field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::action::Color;
use crate::hex::HecsCoord;
use crate::map::MapUpdate;

use super::codec::WireAction;
use super::timestamp;

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageToClient {
    /// Entity actions, applied in list order
    Actions { actions: Vec<WireAction> },

    MapUpdate { map_update: MapUpdate },

    /// Authoritative roster, replaces all entity state
    StateSync { state: StateSync },

    /// Full prop list, replaces every known prop
    PropUpdate { prop_update: PropUpdate },

    PropSpawn { prop_spawn: Prop },

    /// Ids of props to remove
    PropDespawn { prop_despawn: Vec<i32> },

    TurnState { turn_state: TurnState },

    Objective { objectives: Vec<ObjectiveMessage> },

    TutorialResponse { tutorial_response: Value },

    RoomManagement { room_management_response: Value },

    /// Latency probe, answered with PONG
    Ping,

    GoogleAuthConfirmation { google_auth_confirmation: Value },

    UserInfo { user_info: Value },

    MenuOptions { menu_options: Value },

    LiveFeedback { live_feedback: Value },

    /// Any type this client doesn't know
    #[serde(other)]
    Unknown,
}

impl MessageToClient {
    /// Type tag, for logging
    pub fn message_type(&self) -> &'static str {
        match self {
            MessageToClient::Actions { .. } => "ACTIONS",
            MessageToClient::MapUpdate { .. } => "MAP_UPDATE",
            MessageToClient::StateSync { .. } => "STATE_SYNC",
            MessageToClient::PropUpdate { .. } => "PROP_UPDATE",
            MessageToClient::PropSpawn { .. } => "PROP_SPAWN",
            MessageToClient::PropDespawn { .. } => "PROP_DESPAWN",
            MessageToClient::TurnState { .. } => "TURN_STATE",
            MessageToClient::Objective { .. } => "OBJECTIVE",
            MessageToClient::TutorialResponse { .. } => "TUTORIAL_RESPONSE",
            MessageToClient::RoomManagement { .. } => "ROOM_MANAGEMENT",
            MessageToClient::Ping => "PING",
            MessageToClient::GoogleAuthConfirmation { .. } => "GOOGLE_AUTH_CONFIRMATION",
            MessageToClient::UserInfo { .. } => "USER_INFO",
            MessageToClient::MenuOptions { .. } => "MENU_OPTIONS",
            MessageToClient::LiveFeedback { .. } => "LIVE_FEEDBACK",
            MessageToClient::Unknown => "UNKNOWN",
        }
    }

    /// Messages handled before the game scene's collaborators exist
    pub fn is_early_processable(&self) -> bool {
        matches!(
            self,
            MessageToClient::RoomManagement { .. }
                | MessageToClient::GoogleAuthConfirmation { .. }
                | MessageToClient::TutorialResponse { .. }
                | MessageToClient::MenuOptions { .. }
                | MessageToClient::UserInfo { .. }
        )
    }
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageFromClient {
    Actions { actions: Vec<WireAction> },

    /// Ask for a fresh STATE_SYNC after a prediction diverged
    StateSyncRequest,

    Pong {
        #[serde(with = "timestamp")]
        ping_receive_time: DateTime<Utc>,
    },
}

/// One actor in a state sync
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    pub actor_id: i32,
    #[serde(default)]
    pub asset_id: i32,
    pub location: HecsCoord,
    #[serde(default)]
    pub rotation_degrees: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSync {
    #[serde(default)]
    pub population: i32,
    pub actors: Vec<ActorSnapshot>,
    /// Id of the local player, -1 when spectating
    pub player_id: i32,
}

impl StateSync {
    pub fn player(&self) -> Option<&ActorSnapshot> {
        self.actors.iter().find(|a| a.actor_id == self.player_id)
    }
}

/// A static or collectable map object, e.g. a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prop {
    pub id: i32,
    #[serde(default)]
    pub asset_id: i32,
    pub location: HecsCoord,
    #[serde(default)]
    pub rotation_degrees: f32,
    #[serde(default)]
    pub border_radius: f32,
    #[serde(default)]
    pub border_color: Color,
    #[serde(default)]
    pub border_color_follower_pov: Option<Color>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PropUpdate {
    pub props: Vec<Prop>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnState {
    pub turn: String,
    pub moves_remaining: i32,
    pub turns_left: i32,
    pub score: i32,
    pub game_over: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectiveMessage {
    pub sender: String,
    pub text: String,
    pub uuid: String,
    pub completed: bool,
    pub cancelled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_state_sync() {
        let json = r#"{
            "type": "STATE_SYNC",
            "transmit_time": "2024-01-01T00:00:00Z",
            "state": {
                "population": 2,
                "player_id": 5,
                "actors": [
                    {"actor_id": 5, "asset_id": 1, "location": {"a": 0, "r": 0, "c": 0}, "rotation_degrees": 0},
                    {"actor_id": 9, "asset_id": 2, "location": {"a": 1, "r": 2, "c": 3}, "rotation_degrees": 60}
                ]
            }
        }"#;
        let msg: MessageToClient = serde_json::from_str(json).unwrap();
        let MessageToClient::StateSync { state } = msg else {
            panic!("expected state sync");
        };
        assert_eq!(state.player().unwrap().location, HecsCoord::ORIGIN);
        assert_eq!(state.actors[1].rotation_degrees, 60.0);
    }

    #[test]
    fn unknown_type_is_tolerated() {
        let msg: MessageToClient =
            serde_json::from_str(r#"{"type": "SCENARIO_RESPONSE", "scenario": {"x": 1}}"#).unwrap();
        assert!(matches!(msg, MessageToClient::Unknown));
        let ping: MessageToClient =
            serde_json::from_str(r#"{"type": "PING", "transmit_time": "2024-01-01T00:00:00Z"}"#).unwrap();
        assert_eq!(ping.message_type(), "PING");
    }

    #[test]
    fn outbound_tags() {
        let json = serde_json::to_value(MessageFromClient::StateSyncRequest).unwrap();
        assert_eq!(json["type"], "STATE_SYNC_REQUEST");
        let pong = MessageFromClient::Pong {
            ping_receive_time: DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        };
        let json = serde_json::to_value(pong).unwrap();
        assert_eq!(json["type"], "PONG");
        assert_eq!(json["ping_receive_time"], "2024-01-01T00:00:00.000000Z");
    }

    #[test]
    fn early_processable_subset() {
        assert!(MessageToClient::UserInfo { user_info: Value::Null }.is_early_processable());
        assert!(MessageToClient::RoomManagement {
            room_management_response: Value::Null
        }
        .is_early_processable());
        assert!(!MessageToClient::Ping.is_early_processable());
        assert!(!MessageToClient::Actions { actions: vec![] }.is_early_processable());
    }
}

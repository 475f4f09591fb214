//! Action <-> wire action mapping

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::action::{Action, AnimationType, Color, DiscreteState};
use crate::hex::HecsCoord;

use super::{timestamp, ProtocolError};

/// Wire tag selecting how a [`WireAction`] is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionType {
    Init,
    Instant,
    Rotate,
    Translate,
    Outline,
    Death,
    Fade,
}

impl ActionType {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(ActionType::Init),
            1 => Some(ActionType::Instant),
            2 => Some(ActionType::Rotate),
            3 => Some(ActionType::Translate),
            4 => Some(ActionType::Outline),
            5 => Some(ActionType::Death),
            6 => Some(ActionType::Fade),
            _ => None,
        }
    }

    pub fn tag(self) -> u8 {
        match self {
            ActionType::Init => 0,
            ActionType::Instant => 1,
            ActionType::Rotate => 2,
            ActionType::Translate => 3,
            ActionType::Outline => 4,
            ActionType::Death => 5,
            ActionType::Fade => 6,
        }
    }

    pub fn of(action: &Action) -> Self {
        match action {
            Action::Init { .. } => ActionType::Init,
            Action::Instant { .. } => ActionType::Instant,
            Action::Translate { .. } => ActionType::Translate,
            Action::Rotate { .. } => ActionType::Rotate,
            Action::Outline { .. } => ActionType::Outline,
            Action::Fade { .. } => ActionType::Fade,
            Action::Death { .. } => ActionType::Death,
        }
    }
}

fn full_opacity() -> f32 {
    1.0
}

/// An action as carried inside an ACTIONS message.
///
/// `displacement` is absolute for INIT and relative for every other type;
/// the tag decides, not the payload. `action_type` stays a raw integer so
/// an unknown tag never fails the enclosing message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireAction {
    /// Entity the action applies to
    pub id: i32,
    pub action_type: u8,
    #[serde(default)]
    pub animation_type: AnimationType,
    #[serde(default)]
    pub displacement: HecsCoord,
    /// Degrees. Absolute heading for INIT, delta otherwise.
    #[serde(default)]
    pub rotation: f32,
    #[serde(default)]
    pub duration_s: f32,
    #[serde(default)]
    pub border_radius: f32,
    #[serde(default)]
    pub border_color: Color,
    #[serde(default)]
    pub border_color_follower_pov: Option<Color>,
    #[serde(default = "full_opacity")]
    pub opacity: f32,
    #[serde(with = "timestamp")]
    pub expiration: DateTime<Utc>,
}

impl WireAction {
    fn blank(id: i32, action_type: ActionType, expiration: DateTime<Utc>) -> Self {
        Self {
            id,
            action_type: action_type.tag(),
            animation_type: AnimationType::None,
            displacement: HecsCoord::ORIGIN,
            rotation: 0.0,
            duration_s: 0.0,
            border_radius: 0.0,
            border_color: Color::CLEAR,
            border_color_follower_pov: None,
            opacity: 1.0,
            expiration,
        }
    }

    /// Encode `action` for entity `id`. Deaths are refused.
    pub fn encode(id: i32, action: &Action) -> Result<Self, ProtocolError> {
        let mut wire = Self::blank(id, ActionType::of(action), action.expiration());
        match action {
            Action::Init { state, .. } => {
                wire.animation_type = AnimationType::Instant;
                wire.displacement = state.coord;
                wire.rotation = state.heading_degrees;
                wire.border_radius = state.border_radius;
                wire.border_color = state.border_color;
                wire.border_color_follower_pov = Some(state.border_color_follower_pov);
                wire.opacity = state.opacity;
            }
            Action::Instant {
                displacement,
                rotation,
                ..
            } => {
                wire.animation_type = AnimationType::Instant;
                wire.displacement = *displacement;
                wire.rotation = *rotation;
            }
            Action::Translate {
                displacement,
                duration_s,
                animation,
                ..
            } => {
                wire.animation_type = *animation;
                wire.displacement = *displacement;
                wire.duration_s = *duration_s;
            }
            Action::Rotate {
                rotation,
                duration_s,
                ..
            } => {
                wire.animation_type = AnimationType::Rotate;
                wire.rotation = *rotation;
                wire.duration_s = *duration_s;
            }
            Action::Outline {
                border_radius,
                border_color,
                border_color_follower_pov,
                duration_s,
                ..
            } => {
                wire.border_radius = *border_radius;
                wire.border_color = *border_color;
                wire.border_color_follower_pov = Some(*border_color_follower_pov);
                wire.duration_s = *duration_s;
            }
            Action::Fade {
                opacity,
                duration_s,
                ..
            } => {
                wire.opacity = *opacity;
                wire.duration_s = *duration_s;
            }
            Action::Death { .. } => {
                error!(entity_id = id, "Refusing to send a death action to the server");
                return Err(ProtocolError::ServerOnlyAction(action.name()));
            }
        }
        Ok(wire)
    }

    /// Decode into an [`Action`]. Unknown tags are read as INSTANT.
    pub fn decode(&self) -> Action {
        let follower = self.border_color_follower_pov.unwrap_or(self.border_color);
        match ActionType::from_tag(self.action_type) {
            Some(ActionType::Init) => Action::init(
                DiscreteState {
                    coord: self.displacement,
                    heading_degrees: self.rotation,
                    border_radius: self.border_radius,
                    border_color: self.border_color,
                    border_color_follower_pov: follower,
                    opacity: self.opacity,
                    end_of_life: false,
                },
                self.expiration,
            ),
            Some(ActionType::Instant) => {
                Action::instant(self.displacement, self.rotation, self.expiration)
            }
            Some(ActionType::Translate) => Action::Translate {
                displacement: self.displacement,
                duration_s: self.duration_s,
                animation: self.animation_type,
                expiration: self.expiration,
            },
            Some(ActionType::Rotate) => {
                Action::rotate(self.rotation, self.duration_s, self.expiration)
            }
            Some(ActionType::Outline) => Action::outline(
                self.border_radius,
                self.border_color,
                follower,
                self.duration_s,
                self.expiration,
            ),
            Some(ActionType::Fade) => Action::fade(self.opacity, self.duration_s, self.expiration),
            Some(ActionType::Death) => Action::death(self.expiration),
            None => {
                warn!(
                    entity_id = self.id,
                    action_type = self.action_type,
                    "Unknown action type, treating as instant"
                );
                Action::instant(self.displacement, self.rotation, self.expiration)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn exp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    }

    #[test]
    fn translate_wire_shape() {
        let action = Action::translate(HecsCoord::new(1, -1, 0), 0.5, exp());
        let wire = action.packet(12).unwrap();
        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json["id"], 12);
        assert_eq!(json["action_type"], 3);
        assert_eq!(json["animation_type"], 2);
        assert_eq!(json["displacement"], serde_json::json!({"a": 1, "r": -1, "c": 0}));
        assert_eq!(json["duration_s"], 0.5);
        assert_eq!(json["expiration"], "2024-01-02T03:04:05.000000Z");
        assert_eq!(wire.decode(), action);
    }

    #[test]
    fn init_carries_absolute_state() {
        let state = DiscreteState {
            coord: HecsCoord::new(0, 4, 7),
            heading_degrees: 240.0,
            border_radius: 2.0,
            border_color: Color::SELECTION,
            border_color_follower_pov: Color::WHITE,
            opacity: 0.5,
            end_of_life: false,
        };
        let action = Action::init(state, exp());
        let wire = action.packet(1).unwrap();
        assert_eq!(wire.displacement, state.coord);
        assert_eq!(wire.rotation, 240.0);
        assert_eq!(wire.decode(), action);
    }

    #[test]
    fn outline_fade_rotate_survive_encoding() {
        for action in [
            Action::outline(3.0, Color::WHITE, Color::SELECTION, 0.2, exp()),
            Action::fade(0.1, 1.5, exp()),
            Action::rotate(-60.0, 0.3, exp()),
            Action::instant(HecsCoord::new(0, 2, -1), 120.0, exp()),
        ] {
            assert_eq!(action.packet(9).unwrap().decode(), action);
        }
    }

    #[test]
    fn death_is_never_encoded() {
        let err = Action::death(exp()).packet(3).unwrap_err();
        assert!(matches!(err, ProtocolError::ServerOnlyAction("death")));
    }

    #[test]
    fn unknown_action_type_degrades_to_instant() {
        let json = r#"{
            "id": 4,
            "action_type": 42,
            "displacement": {"a": 0, "r": 0, "c": 2},
            "rotation": 60.0,
            "expiration": "2024-01-02T03:04:05"
        }"#;
        let wire: WireAction = serde_json::from_str(json).unwrap();
        assert_eq!(
            wire.decode(),
            Action::instant(HecsCoord::new(0, 0, 2), 60.0, exp())
        );
    }

    #[test]
    fn missing_follower_color_falls_back_to_border_color() {
        let mut wire = Action::outline_select(5.0, 0.1, exp()).packet(2).unwrap();
        wire.border_color_follower_pov = None;
        match wire.decode() {
            Action::Outline {
                border_color_follower_pov,
                ..
            } => assert_eq!(border_color_follower_pov, Color::SELECTION),
            other => panic!("unexpected {other:?}"),
        }
    }
}

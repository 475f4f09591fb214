//! Time-bounded state transitions

use chrono::{DateTime, Utc};

use crate::hex::HecsCoord;
use crate::protocol::{ProtocolError, WireAction};

use super::state::{lerp, AnimationType, Color, ContinuousState, DiscreteState, Vec3};

/// One queued state transition of an entity.
///
/// `Init`, `Instant` and `Death` are steps: their interpolation is the
/// resting state they lead to, whatever the progress. The others blend
/// linearly from the starting state over `duration_s`.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Absolute placement, resets every visual property
    Init {
        state: DiscreteState,
        expiration: DateTime<Utc>,
    },
    /// Relative move and turn with no animation
    Instant {
        displacement: HecsCoord,
        rotation: f32,
        expiration: DateTime<Utc>,
    },
    Translate {
        displacement: HecsCoord,
        duration_s: f32,
        animation: AnimationType,
        expiration: DateTime<Utc>,
    },
    Rotate {
        rotation: f32,
        duration_s: f32,
        expiration: DateTime<Utc>,
    },
    /// Radius blends, colors switch as soon as the action starts
    Outline {
        border_radius: f32,
        border_color: Color,
        border_color_follower_pov: Color,
        duration_s: f32,
        expiration: DateTime<Utc>,
    },
    Fade {
        opacity: f32,
        duration_s: f32,
        expiration: DateTime<Utc>,
    },
    /// Marks the entity for removal. Never sent by clients.
    Death { expiration: DateTime<Utc> },
}

impl Action {
    pub fn init(state: DiscreteState, expiration: DateTime<Utc>) -> Self {
        Action::Init {
            state: DiscreteState {
                end_of_life: false,
                ..state
            },
            expiration,
        }
    }

    pub fn instant(displacement: HecsCoord, rotation: f32, expiration: DateTime<Utc>) -> Self {
        Action::Instant {
            displacement,
            rotation,
            expiration,
        }
    }

    pub fn translate(displacement: HecsCoord, duration_s: f32, expiration: DateTime<Utc>) -> Self {
        Action::Translate {
            displacement,
            duration_s,
            animation: AnimationType::Walking,
            expiration,
        }
    }

    pub fn rotate(rotation: f32, duration_s: f32, expiration: DateTime<Utc>) -> Self {
        Action::Rotate {
            rotation,
            duration_s,
            expiration,
        }
    }

    pub fn outline(
        border_radius: f32,
        border_color: Color,
        border_color_follower_pov: Color,
        duration_s: f32,
        expiration: DateTime<Utc>,
    ) -> Self {
        Action::Outline {
            border_radius,
            border_color,
            border_color_follower_pov,
            duration_s,
            expiration,
        }
    }

    /// Selection highlight
    pub fn outline_select(border_radius: f32, duration_s: f32, expiration: DateTime<Utc>) -> Self {
        Self::outline(border_radius, Color::SELECTION, Color::SELECTION, duration_s, expiration)
    }

    pub fn outline_unselect(duration_s: f32, expiration: DateTime<Utc>) -> Self {
        Self::outline(0.0, Color::CLEAR, Color::CLEAR, duration_s, expiration)
    }

    pub fn fade(opacity: f32, duration_s: f32, expiration: DateTime<Utc>) -> Self {
        Action::Fade {
            opacity,
            duration_s,
            expiration,
        }
    }

    pub fn death(expiration: DateTime<Utc>) -> Self {
        Action::Death { expiration }
    }

    pub fn duration_s(&self) -> f32 {
        match self {
            Action::Init { .. } | Action::Instant { .. } | Action::Death { .. } => 0.0,
            Action::Translate { duration_s, .. }
            | Action::Rotate { duration_s, .. }
            | Action::Outline { duration_s, .. }
            | Action::Fade { duration_s, .. } => duration_s.max(0.0),
        }
    }

    /// Wall-clock deadline after which the action is force-completed
    pub fn expiration(&self) -> DateTime<Utc> {
        match self {
            Action::Init { expiration, .. }
            | Action::Instant { expiration, .. }
            | Action::Translate { expiration, .. }
            | Action::Rotate { expiration, .. }
            | Action::Outline { expiration, .. }
            | Action::Fade { expiration, .. }
            | Action::Death { expiration } => *expiration,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::Init { .. } => "init",
            Action::Instant { .. } => "instant",
            Action::Translate { .. } => "translate",
            Action::Rotate { .. } => "rotate",
            Action::Outline { .. } => "outline",
            Action::Fade { .. } => "fade",
            Action::Death { .. } => "death",
        }
    }

    /// Resting state once the action has fully played out
    pub fn transfer(&self, state: &DiscreteState) -> DiscreteState {
        let mut next = *state;
        match self {
            Action::Init { state: init, .. } => next = *init,
            Action::Instant {
                displacement,
                rotation,
                ..
            } => {
                next.coord = state.coord + *displacement;
                next.heading_degrees = state.heading_degrees + rotation;
            }
            Action::Translate { displacement, .. } => {
                next.coord = state.coord + *displacement;
            }
            Action::Rotate { rotation, .. } => {
                next.heading_degrees = state.heading_degrees + rotation;
            }
            Action::Outline {
                border_radius,
                border_color,
                border_color_follower_pov,
                ..
            } => {
                next.border_radius = *border_radius;
                next.border_color = *border_color;
                next.border_color_follower_pov = *border_color_follower_pov;
            }
            Action::Fade { opacity, .. } => next.opacity = *opacity,
            Action::Death { .. } => next.end_of_life = true,
        }
        next
    }

    /// State at `progress` through the action, starting from `initial`.
    /// Progress is clamped to `[0, 1]`.
    pub fn interpolate(&self, initial: &DiscreteState, progress: f32) -> ContinuousState {
        let t = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        let mut current = initial.project();
        match self {
            Action::Init { .. } | Action::Instant { .. } => {
                current = self.transfer(initial).project();
                current.animation = AnimationType::Instant;
            }
            Action::Death { .. } => current = self.transfer(initial).project(),
            Action::Translate {
                displacement,
                animation,
                ..
            } => {
                let from = Vec3::from_coord(initial.coord);
                let to = Vec3::from_coord(initial.coord + *displacement);
                current.position = from.lerp(to, t);
                current.animation = *animation;
            }
            Action::Rotate { rotation, .. } => {
                current.heading_degrees =
                    lerp(initial.heading_degrees, initial.heading_degrees + rotation, t);
                current.animation = AnimationType::Rotate;
            }
            Action::Outline {
                border_radius,
                border_color,
                border_color_follower_pov,
                ..
            } => {
                current.border_radius = lerp(initial.border_radius, *border_radius, t);
                current.border_color = *border_color;
                current.border_color_follower_pov = *border_color_follower_pov;
            }
            Action::Fade { opacity, .. } => {
                current.opacity = lerp(initial.opacity, *opacity, t);
            }
        }
        current
    }

    /// Wire form of this action for entity `id`
    pub fn packet(&self, id: i32) -> Result<WireAction, ProtocolError> {
        WireAction::encode(id, self)
    }
}

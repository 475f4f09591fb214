//! Resting and interpolated entity state

use serde::{Deserialize, Serialize};

use crate::hex::HecsCoord;

pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Render-space position. `x`/`z` span the map plane, `y` is up.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Ground-plane position of a cell center
    pub fn from_coord(coord: HecsCoord) -> Self {
        let (x, z) = coord.cartesian();
        Self::new(x, 0.0, z)
    }

    pub fn lerp(self, to: Vec3, t: f32) -> Self {
        Self::new(lerp(self.x, to.x, t), lerp(self.y, to.y, t), lerp(self.z, to.z, t))
    }

    pub fn distance(self, other: Vec3) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2) + (self.z - other.z).powi(2))
            .sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const CLEAR: Color = Color::new(0.0, 0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    /// Outline shown on selected cards
    pub const SELECTION: Color = Color::new(0.0, 0.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// Animation the renderer should play, sent on the wire as an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum AnimationType {
    None,
    #[default]
    Idle,
    Walking,
    Instant,
    Translate,
    AccelDecel,
    Skipping,
    Rotate,
}

impl From<u8> for AnimationType {
    fn from(tag: u8) -> Self {
        match tag {
            1 => AnimationType::Idle,
            2 => AnimationType::Walking,
            3 => AnimationType::Instant,
            4 => AnimationType::Translate,
            5 => AnimationType::AccelDecel,
            6 => AnimationType::Skipping,
            7 => AnimationType::Rotate,
            _ => AnimationType::None,
        }
    }
}

impl From<AnimationType> for u8 {
    fn from(animation: AnimationType) -> Self {
        match animation {
            AnimationType::None => 0,
            AnimationType::Idle => 1,
            AnimationType::Walking => 2,
            AnimationType::Instant => 3,
            AnimationType::Translate => 4,
            AnimationType::AccelDecel => 5,
            AnimationType::Skipping => 6,
            AnimationType::Rotate => 7,
        }
    }
}

/// Where an entity rests between actions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscreteState {
    pub coord: HecsCoord,
    pub heading_degrees: f32,
    pub border_radius: f32,
    pub border_color: Color,
    pub border_color_follower_pov: Color,
    pub opacity: f32,
    pub end_of_life: bool,
}

impl Default for DiscreteState {
    fn default() -> Self {
        Self {
            coord: HecsCoord::ORIGIN,
            heading_degrees: 0.0,
            border_radius: 0.0,
            border_color: Color::CLEAR,
            border_color_follower_pov: Color::CLEAR,
            opacity: 1.0,
            end_of_life: false,
        }
    }
}

impl DiscreteState {
    pub fn at(coord: HecsCoord, heading_degrees: f32) -> Self {
        Self {
            coord,
            heading_degrees,
            ..Default::default()
        }
    }

    /// The continuous state of an entity standing still in this state
    pub fn project(&self) -> ContinuousState {
        ContinuousState {
            position: Vec3::from_coord(self.coord),
            heading_degrees: self.heading_degrees,
            border_radius: self.border_radius,
            border_color: self.border_color,
            border_color_follower_pov: self.border_color_follower_pov,
            opacity: self.opacity,
            animation: AnimationType::Idle,
        }
    }
}

/// What the renderer draws this frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContinuousState {
    pub position: Vec3,
    pub heading_degrees: f32,
    pub border_radius: f32,
    pub border_color: Color,
    pub border_color_follower_pov: Color,
    pub opacity: f32,
    pub animation: AnimationType,
}

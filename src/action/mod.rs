//! Entity actions and their per-entity playback queue

pub mod model;
pub mod queue;
pub mod state;

pub use model::Action;
pub use queue::ActionQueue;
pub use state::{AnimationType, Color, ContinuousState, DiscreteState, Vec3};

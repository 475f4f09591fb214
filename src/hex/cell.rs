//! A single walkable grid cell

use serde::{Deserialize, Serialize};

use super::{HecsCoord, HexBoundary};

/// Terrain tiers. Neighbors more than one tier apart can't be crossed.
pub mod layer {
    pub const GROUND: i32 = 0;
    pub const RAMP: i32 = 1;
    pub const MOUNTAIN: i32 = 2;
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HexCell {
    pub coord: HecsCoord,
    pub boundary: HexBoundary,
    pub height: f32,
    pub layer: i32,
}

impl HexCell {
    pub fn new(coord: HecsCoord, boundary: HexBoundary, height: f32, layer: i32) -> Self {
        Self {
            coord,
            boundary,
            height,
            layer,
        }
    }

    /// Cell at `coord` with no edges, zero height, ground layer
    pub fn empty(coord: HecsCoord) -> Self {
        Self::new(coord, HexBoundary::EMPTY, 0.0, layer::GROUND)
    }

    /// True when the tier gap to `other` is too steep to walk
    pub fn is_cliff_to(&self, other: &HexCell) -> bool {
        (self.layer - other.layer).abs() > 1
    }
}

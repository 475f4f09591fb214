//! Per-cell edge mask

use serde::{Deserialize, Serialize};

use super::coord::{HecsCoord, HexDirection};

const EDGE_MASK: u8 = 0b0011_1111;

/// Six edge bits, one per [`HexDirection`], bit `i` for `neighbors()[i]`.
///
/// A set bit means the edge is blocked. Keeping the two cells on either
/// side of an edge in agreement is the grid's job, not this type's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct HexBoundary {
    edges: u8,
}

/// Which bit a relative displacement maps to, built from the origin's neighbors.
fn direction_of(displacement: HecsCoord) -> Option<HexDirection> {
    HecsCoord::ORIGIN
        .neighbors()
        .iter()
        .position(|offset| *offset == displacement)
        .map(HexDirection::from_index)
}

impl HexBoundary {
    pub const EMPTY: Self = Self { edges: 0 };

    pub fn get_edge(&self, direction: HexDirection) -> bool {
        self.edges & (1 << direction.index()) != 0
    }

    pub fn set_edge(&mut self, direction: HexDirection) {
        self.edges |= 1 << direction.index();
    }

    pub fn clear_edge(&mut self, direction: HexDirection) {
        self.edges &= !(1 << direction.index());
    }

    /// Edge between `loc` and `neighbor`. Non-adjacent pairs have no edge.
    pub fn get_edge_with(&self, loc: HecsCoord, neighbor: HecsCoord) -> bool {
        direction_of(neighbor - loc)
            .map(|d| self.get_edge(d))
            .unwrap_or(false)
    }

    /// Set the edge toward `neighbor`. Returns false and leaves the mask
    /// untouched when the two coordinates aren't adjacent.
    pub fn set_edge_with(&mut self, loc: HecsCoord, neighbor: HecsCoord) -> bool {
        match direction_of(neighbor - loc) {
            Some(direction) => {
                self.set_edge(direction);
                true
            }
            None => false,
        }
    }

    pub fn merge_with(&mut self, other: HexBoundary) {
        self.edges |= other.edges;
    }

    /// Rotate the mask clockwise by `turns` sixths of a revolution.
    pub fn rotate_cw(&mut self, turns: i32) {
        let turns = turns.rem_euclid(6) as u32;
        if turns == 0 {
            return;
        }
        let e = self.edges & EDGE_MASK;
        self.edges = ((e << turns) | (e >> (6 - turns))) & EDGE_MASK;
    }

    pub fn edge_count(&self) -> u32 {
        self.edges.count_ones()
    }

    pub fn is_empty(&self) -> bool {
        self.edges == 0
    }

    pub fn to_byte(&self) -> u8 {
        self.edges
    }

    pub fn from_byte(byte: u8) -> Self {
        Self {
            edges: byte & EDGE_MASK,
        }
    }
}

impl From<u8> for HexBoundary {
    fn from(byte: u8) -> Self {
        Self::from_byte(byte)
    }
}

impl From<HexBoundary> for u8 {
    fn from(boundary: HexBoundary) -> Self {
        boundary.to_byte()
    }
}

//! Hex coordinates, edge masks and cells

pub mod boundary;
pub mod cell;
pub mod coord;

pub use boundary::HexBoundary;
pub use cell::HexCell;
pub use coord::{HecsCoord, HexDirection};

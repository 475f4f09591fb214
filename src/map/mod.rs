//! Map snapshots and the logical grid built from them

pub mod grid;
pub mod source;

pub use grid::{GridManager, GridState, NullRenderer, RenderHandle, TileRenderer};
pub use source::{MapSource, MapUpdate, NetworkMapSource, TileInfo};

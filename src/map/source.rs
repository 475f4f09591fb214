//! Map snapshots and the readiness handshake between router and grid

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::hex::HexCell;

/// One placed tile of a map snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileInfo {
    /// Renderer asset to instantiate for this tile
    pub asset_id: i32,
    pub cell: HexCell,
    /// Visual rotation, multiples of 60
    #[serde(default)]
    pub rotation_degrees: i32,
}

/// Full map snapshot as sent by the server
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MapUpdate {
    /// Offset rows
    pub rows: i32,
    /// Offset columns
    pub cols: i32,
    pub tiles: Vec<TileInfo>,
    #[serde(default)]
    pub fog_start: Option<f32>,
    #[serde(default)]
    pub fog_end: Option<f32>,
}

/// Where the grid gets its maps from.
///
/// `is_map_ready` and `fetch_tile_list` are two separate reads: a snapshot
/// arriving between them is fetched now and the flag it raised is cleared,
/// so a consumer may see the map one tick late but never twice.
pub trait MapSource {
    /// `(rows, cols)` in offset coordinates
    fn map_dimensions(&self) -> (i32, i32);

    /// Tiles of the latest snapshot. Clears readiness.
    fn fetch_tile_list(&self) -> Vec<TileInfo>;

    fn is_map_ready(&self) -> bool;

    /// Last snapshot as received, for bug reports
    fn raw_map_update(&self) -> Option<MapUpdate>;
}

#[derive(Debug, Default)]
struct MapSourceState {
    latest: Option<MapUpdate>,
    ready: bool,
    iteration: u64,
}

/// Map sink filled by the network router and drained by the grid.
#[derive(Debug, Clone, Default)]
pub struct NetworkMapSource {
    state: Arc<Mutex<MapSourceState>>,
}

impl NetworkMapSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn receive_map_update(&self, update: MapUpdate) {
        let mut state = self.state.lock();
        state.iteration += 1;
        debug!(
            iteration = state.iteration,
            rows = update.rows,
            cols = update.cols,
            tiles = update.tiles.len(),
            "Map update received"
        );
        state.latest = Some(update);
        state.ready = true;
    }

    /// Number of snapshots received so far
    pub fn iteration(&self) -> u64 {
        self.state.lock().iteration
    }
}

impl MapSource for NetworkMapSource {
    fn map_dimensions(&self) -> (i32, i32) {
        self.state
            .lock()
            .latest
            .as_ref()
            .map(|m| (m.rows, m.cols))
            .unwrap_or((0, 0))
    }

    fn fetch_tile_list(&self) -> Vec<TileInfo> {
        let mut state = self.state.lock();
        state.ready = false;
        state
            .latest
            .as_ref()
            .map(|m| m.tiles.clone())
            .unwrap_or_default()
    }

    fn is_map_ready(&self) -> bool {
        self.state.lock().ready
    }

    fn raw_map_update(&self) -> Option<MapUpdate> {
        self.state.lock().latest.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::HecsCoord;

    fn one_tile_map() -> MapUpdate {
        MapUpdate {
            rows: 2,
            cols: 2,
            tiles: vec![TileInfo {
                asset_id: 3,
                cell: HexCell::empty(HecsCoord::ORIGIN),
                rotation_degrees: 0,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn fetch_clears_readiness() {
        let source = NetworkMapSource::new();
        assert!(!source.is_map_ready());
        assert_eq!(source.map_dimensions(), (0, 0));

        source.receive_map_update(one_tile_map());
        assert!(source.is_map_ready());
        assert_eq!(source.map_dimensions(), (2, 2));
        assert_eq!(source.fetch_tile_list().len(), 1);
        assert!(!source.is_map_ready());

        // Data stays available for diagnostics after the fetch.
        assert_eq!(source.raw_map_update(), Some(one_tile_map()));
        assert_eq!(source.iteration(), 1);
    }

    #[test]
    fn clones_share_state() {
        let writer = NetworkMapSource::new();
        let reader = writer.clone();
        writer.receive_map_update(one_tile_map());
        assert!(reader.is_map_ready());
        reader.fetch_tile_list();
        assert!(!writer.is_map_ready());
    }
}

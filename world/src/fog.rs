//! Hex cells, their spatial index and the revealed set.

use glam::Vec2;
use hexfog_core::{GridConfig, HexCell, HexId, RevealedSet};
use hexfog_system_geometry::{cell_position, generate_grid, point_in_hex};
use hexfog_system_spatial_index::SpatialHashGrid;

/// Generated grid plus the fog state layered over it.
///
/// The revealed set is authoritative; each cell's `revealed` flag is a cache
/// kept in sync on every mutation.
#[derive(Debug)]
pub(crate) struct FogLayer {
    config: Option<GridConfig>,
    cells: Vec<HexCell>,
    index: Option<SpatialHashGrid<usize>>,
    revealed: RevealedSet,
}

impl FogLayer {
    /// Creates a layer with no grid. Hit tests miss until [`Self::regenerate`] runs.
    pub(crate) fn new() -> Self {
        Self {
            config: None,
            cells: Vec::new(),
            index: None,
            revealed: RevealedSet::new(),
        }
    }

    pub(crate) fn config(&self) -> Option<&GridConfig> {
        self.config.as_ref()
    }

    pub(crate) fn cells(&self) -> &[HexCell] {
        &self.cells
    }

    pub(crate) fn revealed(&self) -> &RevealedSet {
        &self.revealed
    }

    /// Rebuilds every cell for the new layout, restoring reveals by identifier.
    pub(crate) fn regenerate(&mut self, config: GridConfig) {
        let (cells, index) = generate_grid(&config, &self.revealed).into_parts();
        self.cells = cells;
        self.index = Some(index);
        self.config = Some(config);
    }

    /// Reveals the hex. Returns `false` when it was already revealed or lies outside the grid.
    pub(crate) fn reveal(&mut self, hex: HexId) -> bool {
        self.set_revealed(hex, true)
    }

    /// Hides the hex. Returns `false` when it was already hidden or lies outside the grid.
    pub(crate) fn hide(&mut self, hex: HexId) -> bool {
        self.set_revealed(hex, false)
    }

    /// Covers every hex in one step.
    pub(crate) fn reset(&mut self) {
        self.revealed.clear();
        for cell in &mut self.cells {
            cell.revealed = false;
        }
    }

    /// Installs a new revealed set and recomputes every cached flag.
    pub(crate) fn replace_revealed(&mut self, revealed: RevealedSet) {
        self.revealed = revealed;
        for cell in &mut self.cells {
            cell.revealed = self.revealed.contains(cell.id);
        }
    }

    /// Hex containing the world point, if any.
    pub(crate) fn find_at(&self, point: Vec2) -> Option<&HexCell> {
        let index = self.index.as_ref()?;
        index
            .query_point(point)
            .into_iter()
            .filter_map(|position| self.cells.get(position))
            .find(|cell| point_in_hex(point, cell))
    }

    /// Number of generated cells currently revealed.
    pub(crate) fn revealed_cell_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.revealed).count()
    }

    fn set_revealed(&mut self, hex: HexId, revealed: bool) -> bool {
        let Some(config) = self.config.as_ref() else {
            return false;
        };
        let Some(cell) = cell_position(hex, config).and_then(|slot| self.cells.get_mut(slot))
        else {
            return false;
        };
        if cell.revealed == revealed {
            return false;
        }
        cell.revealed = revealed;
        let _ = if revealed {
            self.revealed.insert(hex)
        } else {
            self.revealed.remove(hex)
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_grid() -> GridConfig {
        GridConfig {
            columns: 3,
            rows: 3,
            ..GridConfig::default()
        }
    }

    #[test]
    fn uninitialized_layer_never_matches() {
        let layer = FogLayer::new();
        assert!(layer.find_at(Vec2::ZERO).is_none());
        assert!(layer.cells().is_empty());
    }

    #[test]
    fn reveal_is_idempotent() {
        let mut layer = FogLayer::new();
        layer.regenerate(small_grid());
        assert!(layer.reveal(HexId::new(1, 1)));
        assert!(!layer.reveal(HexId::new(1, 1)));
        assert!(layer.revealed().contains(HexId::new(1, 1)));
        assert_eq!(layer.revealed_cell_count(), 1);
    }

    #[test]
    fn hexes_outside_grid_are_ignored() {
        let mut layer = FogLayer::new();
        layer.regenerate(small_grid());
        assert!(!layer.reveal(HexId::new(7, 0)));
        assert!(layer.revealed().is_empty());
    }

    #[test]
    fn regeneration_restores_reveals_by_identifier() {
        let mut layer = FogLayer::new();
        layer.regenerate(GridConfig {
            columns: 5,
            ..small_grid()
        });
        assert!(layer.reveal(HexId::new(4, 0)));

        layer.regenerate(small_grid());
        assert_eq!(layer.revealed_cell_count(), 0);
        assert!(layer.revealed().contains(HexId::new(4, 0)));

        layer.regenerate(GridConfig {
            columns: 5,
            ..small_grid()
        });
        assert_eq!(layer.revealed_cell_count(), 1);
    }

    #[test]
    fn replacing_revealed_set_recomputes_flags() {
        let mut layer = FogLayer::new();
        layer.regenerate(small_grid());
        assert!(layer.reveal(HexId::new(0, 0)));
        layer.replace_revealed([HexId::new(2, 2)].into_iter().collect());
        assert!(!layer.cells()[0].revealed);
        assert!(layer.cells()[8].revealed);
    }
}

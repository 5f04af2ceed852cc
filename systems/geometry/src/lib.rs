#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure geometry for the hex map: grid layout, hit tests and camera math.
//!
//! Nothing in this crate owns state. The world calls [`generate_grid`] when
//! its settings change and uses the hit-test helpers to resolve pointer
//! positions; the renderer uses the camera helpers to cull and transform.

mod camera;

use std::f32::consts::PI;

use glam::Vec2;
use hexfog_core::{
    Bounds, GridConfig, HexCell, HexId, Orientation, RevealedSet, TOKEN_RADIUS_FACTOR,
};
use hexfog_system_spatial_index::SpatialHashGrid;

pub use camera::{screen_to_world, visible_world_bounds, world_to_screen, zoom_about_anchor};

/// Generated cells together with the spatial index over their bounds.
#[derive(Clone, Debug)]
pub struct HexGrid {
    cells: Vec<HexCell>,
    index: SpatialHashGrid<usize>,
}

impl HexGrid {
    /// Cells in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[HexCell] {
        &self.cells
    }

    /// Index mapping cells of size `2 * hex_size` to cell positions.
    #[must_use]
    pub const fn index(&self) -> &SpatialHashGrid<usize> {
        &self.index
    }

    /// Splits the grid into its cells and index.
    #[must_use]
    pub fn into_parts(self) -> (Vec<HexCell>, SpatialHashGrid<usize>) {
        (self.cells, self.index)
    }
}

/// Width and height of a single hex.
#[must_use]
pub fn hex_dimensions(hex_size: f32, orientation: Orientation) -> Vec2 {
    let narrow = 3.0_f32.sqrt() * hex_size;
    let wide = 2.0 * hex_size;
    match orientation {
        Orientation::Pointy => Vec2::new(narrow, wide),
        Orientation::Flat => Vec2::new(wide, narrow),
    }
}

/// World-space center of the hex at the provided column and row.
///
/// Pointy grids shift odd rows right by half a hex and advance rows by three
/// quarters of the hex height. Flat grids shift odd columns down by half a
/// hex and advance columns by three quarters of the hex width.
#[must_use]
pub fn hex_center(id: HexId, config: &GridConfig) -> Vec2 {
    let size = hex_dimensions(config.hex_size, config.orientation);
    let column = id.column() as f32;
    let row = id.row() as f32;
    let offset = Vec2::new(config.offset_x, config.offset_y);
    let local = match config.orientation {
        Orientation::Pointy => {
            let shift = if id.row() % 2 == 1 { size.x / 2.0 } else { 0.0 };
            Vec2::new(column * size.x + shift, row * size.y * 0.75)
        }
        Orientation::Flat => {
            let shift = if id.column() % 2 == 1 { size.y / 2.0 } else { 0.0 };
            Vec2::new(column * size.x * 0.75, row * size.y + shift)
        }
    };
    local + offset
}

/// Six corners of a hex, starting at 90 degrees for pointy and 0 degrees for flat.
#[must_use]
pub fn hex_vertices(center: Vec2, hex_size: f32, orientation: Orientation) -> [Vec2; 6] {
    let start = match orientation {
        Orientation::Pointy => PI / 2.0,
        Orientation::Flat => 0.0,
    };
    std::array::from_fn(|corner| {
        let angle = start + PI / 3.0 * corner as f32;
        center + Vec2::new(angle.cos(), angle.sin()) * hex_size
    })
}

/// Square bounds registered for a hex in the spatial index.
#[must_use]
pub fn hex_bounds(center: Vec2, hex_size: f32) -> Bounds {
    Bounds::around(center, hex_size)
}

/// Builds every cell of the grid and indexes it.
///
/// Cells whose identifiers appear in `revealed` start revealed. Degenerate
/// configurations (zero columns or rows, non-positive size) yield an empty grid.
#[must_use]
pub fn generate_grid(config: &GridConfig, revealed: &RevealedSet) -> HexGrid {
    let mut index = SpatialHashGrid::new(config.hex_size * 2.0);
    let valid_size = config.hex_size.is_finite() && config.hex_size > 0.0;
    if !valid_size || config.columns == 0 || config.rows == 0 {
        return HexGrid {
            cells: Vec::new(),
            index,
        };
    }

    let mut cells = Vec::with_capacity(config.columns as usize * config.rows as usize);
    for row in 0..config.rows {
        for column in 0..config.columns {
            let id = HexId::new(column, row);
            let center = hex_center(id, config);
            index.insert(cells.len(), &hex_bounds(center, config.hex_size));
            cells.push(HexCell {
                id,
                center,
                vertices: hex_vertices(center, config.hex_size, config.orientation),
                revealed: revealed.contains(id),
            });
        }
    }

    HexGrid { cells, index }
}

/// Position of a hex within a row-major cell list, if it lies inside the grid.
#[must_use]
pub fn cell_position(id: HexId, config: &GridConfig) -> Option<usize> {
    if id.column() >= config.columns || id.row() >= config.rows {
        return None;
    }
    Some(id.row() as usize * config.columns as usize + id.column() as usize)
}

/// Even-odd ray cast. Edges are half-open so a point on an edge shared by two
/// cells belongs to exactly one of them.
#[must_use]
pub fn point_in_polygon(point: Vec2, vertices: &[Vec2]) -> bool {
    let Some(mut previous) = vertices.last().copied() else {
        return false;
    };
    let mut inside = false;
    for &current in vertices {
        let crosses = (current.y > point.y) != (previous.y > point.y);
        if crosses {
            let intersect_x = (previous.x - current.x) * (point.y - current.y)
                / (previous.y - current.y)
                + current.x;
            if point.x < intersect_x {
                inside = !inside;
            }
        }
        previous = current;
    }
    inside
}

/// Reports whether the world point lies inside the hex.
#[must_use]
pub fn point_in_hex(point: Vec2, cell: &HexCell) -> bool {
    point_in_polygon(point, &cell.vertices)
}

/// Draw and hit-test radius of a token.
#[must_use]
pub fn token_radius(hex_size: f32) -> f32 {
    hex_size * TOKEN_RADIUS_FACTOR
}

/// Square bounds registered for a token in the spatial index.
#[must_use]
pub fn token_bounds(position: Vec2, hex_size: f32) -> Bounds {
    Bounds::around(position, token_radius(hex_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointy_dimensions_are_taller_than_wide() {
        let size = hex_dimensions(40.0, Orientation::Pointy);
        assert!((size.x - 69.282).abs() < 1e-3);
        assert_eq!(size.y, 80.0);
    }

    #[test]
    fn first_pointy_vertex_points_along_positive_y() {
        let vertices = hex_vertices(Vec2::ZERO, 10.0, Orientation::Pointy);
        assert!(vertices[0].x.abs() < 1e-4);
        assert!((vertices[0].y - 10.0).abs() < 1e-4);
    }

    #[test]
    fn first_flat_vertex_points_along_positive_x() {
        let vertices = hex_vertices(Vec2::ZERO, 10.0, Orientation::Flat);
        assert!((vertices[0].x - 10.0).abs() < 1e-4);
        assert!(vertices[0].y.abs() < 1e-4);
    }

    #[test]
    fn cell_position_rejects_ids_outside_grid() {
        let config = GridConfig {
            columns: 3,
            rows: 2,
            ..GridConfig::default()
        };
        assert_eq!(cell_position(HexId::new(2, 1), &config), Some(5));
        assert_eq!(cell_position(HexId::new(3, 0), &config), None);
        assert_eq!(cell_position(HexId::new(0, 2), &config), None);
    }

    #[test]
    fn degenerate_polygon_contains_nothing() {
        assert!(!point_in_polygon(Vec2::ZERO, &[]));
        assert!(!point_in_polygon(Vec2::ZERO, &[Vec2::ZERO, Vec2::ONE]));
    }
}

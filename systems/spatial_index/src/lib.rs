#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Uniform spatial hash used to narrow hit tests to a handful of candidates.
//!
//! Space is divided into square cells of a fixed size. Every item is
//! registered in each cell its bounding box overlaps, so a point query only
//! has to inspect the single cell containing the point. Cell coordinates are
//! folded into one key by zig-zag encoding both axes and combining them with
//! the Cantor pairing function, which keeps negative coordinates collision
//! free.

use std::{
    collections::{HashMap, HashSet},
    hash::Hash,
};

use glam::Vec2;
use hexfog_core::Bounds;

/// Spatial hash mapping grid cells to the items whose bounds overlap them.
#[derive(Clone, Debug)]
pub struct SpatialHashGrid<T> {
    cell_size: f32,
    cells: HashMap<CellKey, HashSet<T>>,
}

/// Combined key of one grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey(u128);

impl CellKey {
    /// Folds integer cell coordinates into a single key.
    #[must_use]
    pub fn from_cell(column: i32, row: i32) -> Self {
        let x = u128::from(zigzag(column));
        let y = u128::from(zigzag(row));
        Self((x + y) * (x + y + 1) / 2 + y)
    }

    /// Retrieves the raw key.
    #[must_use]
    pub const fn get(&self) -> u128 {
        self.0
    }
}

fn zigzag(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

impl<T> SpatialHashGrid<T>
where
    T: Copy + Eq + Hash,
{
    /// Creates an empty grid. Non-positive or non-finite sizes fall back to `1.0`.
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            1.0
        };
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    /// Edge length of every cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Registers the item in every cell overlapped by `bounds`.
    pub fn insert(&mut self, item: T, bounds: &Bounds) {
        for key in self.cells_overlapping(bounds) {
            let _ = self.cells.entry(key).or_default().insert(item);
        }
    }

    /// Removes the item from every cell overlapped by `bounds`.
    ///
    /// Callers must pass the bounds the item was inserted with. Cells left
    /// empty are dropped.
    pub fn remove(&mut self, item: T, bounds: &Bounds) {
        for key in self.cells_overlapping(bounds) {
            if let Some(bucket) = self.cells.get_mut(&key) {
                let _ = bucket.remove(&item);
                if bucket.is_empty() {
                    let _ = self.cells.remove(&key);
                }
            }
        }
    }

    /// Moves the item from its old bounds to its new bounds.
    pub fn update(&mut self, item: T, old_bounds: &Bounds, new_bounds: &Bounds) {
        self.remove(item, old_bounds);
        self.insert(item, new_bounds);
    }

    /// Returns every item registered in the cell containing `point`.
    ///
    /// Candidates are a superset of the items whose bounds contain the point,
    /// returned in no particular order.
    #[must_use]
    pub fn query_point(&self, point: Vec2) -> Vec<T> {
        if !point.is_finite() {
            return Vec::new();
        }
        let key = self.key_for(point);
        self.cells
            .get(&key)
            .map(|bucket| bucket.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Drops every item.
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Number of non-empty cells.
    #[must_use]
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether no item is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn cell_coord(&self, value: f32) -> i32 {
        (value / self.cell_size).floor() as i32
    }

    fn key_for(&self, point: Vec2) -> CellKey {
        CellKey::from_cell(self.cell_coord(point.x), self.cell_coord(point.y))
    }

    fn cells_overlapping(&self, bounds: &Bounds) -> Vec<CellKey> {
        if !bounds.is_finite() || bounds.x_min > bounds.x_max || bounds.y_min > bounds.y_max {
            return Vec::new();
        }
        let (min_x, max_x) = (self.cell_coord(bounds.x_min), self.cell_coord(bounds.x_max));
        let (min_y, max_y) = (self.cell_coord(bounds.y_min), self.cell_coord(bounds.y_max));
        let mut keys = Vec::new();
        for column in min_x..=max_x {
            for row in min_y..=max_y {
                keys.push(CellKey::from_cell(column, row));
            }
        }
        keys
    }
}

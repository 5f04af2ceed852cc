use glam::Vec2;
use hexfog_core::Bounds;
use hexfog_system_spatial_index::SpatialHashGrid;

#[test]
fn point_query_returns_items_covering_the_cell() {
    let mut grid = SpatialHashGrid::new(80.0);
    grid.insert(1_u32, &Bounds::around(Vec2::new(40.0, 40.0), 40.0));
    grid.insert(2_u32, &Bounds::around(Vec2::new(400.0, 400.0), 40.0));

    let candidates = grid.query_point(Vec2::new(10.0, 10.0));
    assert_eq!(candidates, vec![1], "only the nearby item shares the cell");
    assert!(
        grid.query_point(Vec2::new(-500.0, -500.0)).is_empty(),
        "empty cells yield no candidates"
    );
}

#[test]
fn items_spanning_cells_are_found_from_each_cell() {
    let mut grid = SpatialHashGrid::new(10.0);
    grid.insert(7_u32, &Bounds::new(5.0, 5.0, 25.0, 5.0));

    for x in [6.0, 15.0, 24.0] {
        assert_eq!(
            grid.query_point(Vec2::new(x, 5.0)),
            vec![7],
            "item should be registered in the cell containing x = {x}"
        );
    }
}

#[test]
fn negative_coordinates_do_not_collide_with_positive_ones() {
    let mut grid = SpatialHashGrid::new(10.0);
    grid.insert(1_u32, &Bounds::around(Vec2::new(-15.0, 15.0), 1.0));
    grid.insert(2_u32, &Bounds::around(Vec2::new(15.0, -15.0), 1.0));

    assert_eq!(grid.query_point(Vec2::new(-15.0, 15.0)), vec![1]);
    assert_eq!(grid.query_point(Vec2::new(15.0, -15.0)), vec![2]);
}

#[test]
fn removing_last_item_drops_empty_buckets() {
    let mut grid = SpatialHashGrid::new(10.0);
    let bounds = Bounds::new(0.0, 0.0, 25.0, 25.0);
    grid.insert(3_u32, &bounds);
    assert_eq!(grid.occupied_cells(), 9);

    grid.remove(3, &bounds);
    assert!(grid.is_empty(), "no bucket should outlive its last item");
}

#[test]
fn update_moves_item_between_cells() {
    let mut grid = SpatialHashGrid::new(10.0);
    let before = Bounds::around(Vec2::new(5.0, 5.0), 2.0);
    let after = Bounds::around(Vec2::new(95.0, 95.0), 2.0);
    grid.insert(9_u32, &before);
    grid.update(9, &before, &after);

    assert!(grid.query_point(Vec2::new(5.0, 5.0)).is_empty());
    assert_eq!(grid.query_point(Vec2::new(95.0, 95.0)), vec![9]);
}

#[test]
fn clear_removes_everything() {
    let mut grid = SpatialHashGrid::new(10.0);
    for item in 0_u32..10 {
        grid.insert(item, &Bounds::around(Vec2::splat(item as f32 * 10.0), 3.0));
    }
    grid.clear();
    assert!(grid.is_empty());
    assert!(grid.query_point(Vec2::ZERO).is_empty());
}

#[test]
fn non_finite_bounds_are_ignored() {
    let mut grid = SpatialHashGrid::new(10.0);
    grid.insert(1_u32, &Bounds::new(f32::NAN, 0.0, 1.0, 1.0));
    assert!(grid.is_empty());
    assert!(grid.query_point(Vec2::new(f32::INFINITY, 0.0)).is_empty());
}

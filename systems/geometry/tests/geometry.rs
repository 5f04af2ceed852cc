use glam::Vec2;
use hexfog_core::{
    Bounds, CameraView, GridConfig, HexCell, HexId, Orientation, RevealedSet, ZOOM_MAX,
};
use hexfog_system_geometry::{
    generate_grid, hex_center, hex_vertices, point_in_hex, screen_to_world, token_bounds,
    visible_world_bounds, world_to_screen, zoom_about_anchor,
};

fn assert_close(actual: Vec2, expected: Vec2) {
    assert!(
        (actual - expected).length() < 1e-3,
        "expected {expected:?}, got {actual:?}"
    );
}

fn pointy_cell(center: Vec2, size: f32) -> HexCell {
    HexCell {
        id: HexId::new(0, 0),
        center,
        vertices: hex_vertices(center, size, Orientation::Pointy),
        revealed: false,
    }
}

fn config(orientation: Orientation) -> GridConfig {
    GridConfig {
        hex_size: 40.0,
        offset_x: 10.0,
        offset_y: 20.0,
        columns: 4,
        rows: 3,
        orientation,
    }
}

#[test]
fn screen_to_world_undoes_pan_then_zoom() {
    let world = screen_to_world(Vec2::new(300.0, 500.0), Vec2::new(100.0, 100.0), 2.0);
    assert_close(world, Vec2::new(100.0, 200.0));
}

#[test]
fn world_to_screen_inverts_screen_to_world() {
    let pan = Vec2::new(-37.5, 12.25);
    for zoom in [0.1, 0.75, 1.0, 3.3, 5.0] {
        let screen = Vec2::new(412.0, -91.0);
        let round_trip = world_to_screen(screen_to_world(screen, pan, zoom), pan, zoom);
        assert_close(round_trip, screen);
    }
}

#[test]
fn zooming_keeps_the_anchor_stationary() {
    let camera = CameraView::new(Vec2::new(40.0, -20.0), 1.5);
    let anchor = Vec2::new(250.0, 180.0);
    let before = screen_to_world(anchor, camera.pan(), camera.zoom());

    let zoomed = zoom_about_anchor(camera, anchor, 2.5);
    let after = screen_to_world(anchor, zoomed.pan(), zoomed.zoom());

    assert_eq!(zoomed.zoom(), 2.5);
    assert_close(after, before);
}

#[test]
fn zoom_beyond_limit_is_clamped_before_anchoring() {
    let camera = CameraView::default();
    let anchor = Vec2::new(100.0, 100.0);
    let zoomed = zoom_about_anchor(camera, anchor, 40.0);
    assert_eq!(zoomed.zoom(), ZOOM_MAX);
    assert_close(
        world_to_screen(
            screen_to_world(anchor, camera.pan(), camera.zoom()),
            zoomed.pan(),
            zoomed.zoom(),
        ),
        anchor,
    );
}

#[test]
fn point_in_hex_matches_reference_cases() {
    let cell = pointy_cell(Vec2::new(100.0, 100.0), 40.0);
    assert!(point_in_hex(Vec2::new(100.0, 100.0), &cell));
    assert!(!point_in_hex(Vec2::new(300.0, 300.0), &cell));
    assert!(!point_in_hex(Vec2::new(100.0, 142.0), &cell));
}

#[test]
fn token_bounds_extend_forty_percent_of_hex_size() {
    assert_eq!(
        token_bounds(Vec2::ZERO, 100.0),
        Bounds::new(-40.0, -40.0, 40.0, 40.0)
    );
}

#[test]
fn pointy_layout_offsets_odd_rows() {
    let config = config(Orientation::Pointy);
    let width = 3.0_f32.sqrt() * 40.0;
    assert_close(hex_center(HexId::new(0, 0), &config), Vec2::new(10.0, 20.0));
    assert_close(
        hex_center(HexId::new(1, 1), &config),
        Vec2::new(10.0 + width + width / 2.0, 20.0 + 60.0),
    );
}

#[test]
fn flat_layout_offsets_odd_columns() {
    let config = config(Orientation::Flat);
    let height = 3.0_f32.sqrt() * 40.0;
    assert_close(
        hex_center(HexId::new(1, 0), &config),
        Vec2::new(10.0 + 60.0, 20.0 + height / 2.0),
    );
    assert_close(
        hex_center(HexId::new(2, 1), &config),
        Vec2::new(10.0 + 120.0, 20.0 + height),
    );
}

#[test]
fn generated_grid_is_row_major_and_restores_reveals() {
    let revealed: RevealedSet = [HexId::new(2, 1), HexId::new(99, 99)].into_iter().collect();
    let grid = generate_grid(&config(Orientation::Pointy), &revealed);

    assert_eq!(grid.cells().len(), 12);
    assert_eq!(grid.cells()[6].id, HexId::new(2, 1));
    assert!(grid.cells()[6].revealed);
    assert_eq!(
        grid.cells().iter().filter(|cell| cell.revealed).count(),
        1,
        "ids outside the grid are not materialized"
    );
    assert_eq!(grid.index().cell_size(), 80.0);
}

#[test]
fn every_cell_center_is_found_through_the_index() {
    for orientation in [Orientation::Pointy, Orientation::Flat] {
        let grid = generate_grid(&config(orientation), &RevealedSet::new());
        for (position, cell) in grid.cells().iter().enumerate() {
            let hits: Vec<usize> = grid
                .index()
                .query_point(cell.center)
                .into_iter()
                .filter(|candidate| point_in_hex(cell.center, &grid.cells()[*candidate]))
                .collect();
            assert_eq!(hits, vec![position], "center of {} resolves to itself", cell.id);
        }
    }
}

#[test]
fn adjacent_hexes_do_not_overlap() {
    let grid = generate_grid(&config(Orientation::Pointy), &RevealedSet::new());
    let probes = [Vec2::new(40.0, 60.0), Vec2::new(75.0, 42.0), Vec2::new(120.0, 95.0)];
    for probe in probes {
        let containing = grid
            .cells()
            .iter()
            .filter(|cell| point_in_hex(probe, cell))
            .count();
        assert!(containing <= 1, "{probe:?} lies in {containing} hexes");
    }
}

#[test]
fn empty_configuration_yields_empty_grid() {
    let grid = generate_grid(
        &GridConfig {
            columns: 0,
            ..config(Orientation::Pointy)
        },
        &RevealedSet::new(),
    );
    assert!(grid.cells().is_empty());
    assert!(grid.index().is_empty());
}

#[test]
fn culling_rectangle_tracks_camera() {
    let bounds = visible_world_bounds(CameraView::default(), Vec2::new(640.0, 480.0));
    assert_eq!(bounds, Bounds::new(0.0, 0.0, 640.0, 480.0));
}

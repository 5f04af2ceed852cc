use glam::Vec2;
use hexfog_core::{clamp_zoom, Bounds, CameraView};

/// Maps a screen position into world space. Layers translate by `pan`, then scale by `zoom`.
#[must_use]
pub fn screen_to_world(screen: Vec2, pan: Vec2, zoom: f32) -> Vec2 {
    (screen - pan) / zoom
}

/// Maps a world position onto the screen.
#[must_use]
pub fn world_to_screen(world: Vec2, pan: Vec2, zoom: f32) -> Vec2 {
    world * zoom + pan
}

/// Zooms while keeping the world point under `anchor` fixed on screen.
///
/// The requested zoom is clamped first, so zooming past a limit still keeps
/// the anchor stationary.
#[must_use]
pub fn zoom_about_anchor(camera: CameraView, anchor: Vec2, zoom: f32) -> CameraView {
    let zoom = clamp_zoom(zoom);
    let world = screen_to_world(anchor, camera.pan(), camera.zoom());
    CameraView::new(anchor - world * zoom, zoom)
}

/// World-space rectangle visible through a viewport of the given pixel size.
#[must_use]
pub fn visible_world_bounds(camera: CameraView, viewport: Vec2) -> Bounds {
    let top_left = screen_to_world(Vec2::ZERO, camera.pan(), camera.zoom());
    let bottom_right = screen_to_world(viewport, camera.pan(), camera.zoom());
    Bounds::new(top_left.x, top_left.y, bottom_right.x, bottom_right.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_bounds_use_viewport_height_for_the_vertical_extent() {
        let camera = CameraView::new(Vec2::new(-100.0, -50.0), 2.0);
        let bounds = visible_world_bounds(camera, Vec2::new(800.0, 200.0));
        assert_eq!(bounds, Bounds::new(50.0, 25.0, 450.0, 125.0));
    }
}

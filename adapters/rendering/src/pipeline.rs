use glam::Vec2;
use hexfog_core::{Bounds, CameraView, HexCell, Settings, Token, TokenIndex, TOKEN_RADIUS_FACTOR};
use hexfog_system_geometry::{hex_bounds, visible_world_bounds};

use crate::{Color, DrawCommand, LayerSurface, Layers, Stroke, TextAnchor};

const FALLBACK_TOKEN_COLOR: Color = Color::RED;
const LABEL_FONT_SIZE: f32 = 12.0;
const DEBUG_FONT_SIZE: f32 = 10.0;

/// Read-only view of everything a frame draws.
#[derive(Clone, Copy, Debug)]
pub struct FrameSource<'a> {
    /// Active settings, for colors, sizes and map scale.
    pub settings: &'a Settings,
    /// Generated cells.
    pub hexes: &'a [HexCell],
    /// Tokens in list order.
    pub tokens: &'a [Token],
    /// Number of revealed hex identifiers.
    pub revealed_count: usize,
    /// Camera shared by every layer.
    pub camera: CameraView,
    /// Canvas size in pixels.
    pub viewport: Vec2,
    /// Selected token, drawn with a highlight.
    pub selected: Option<TokenIndex>,
    /// Whether clicks reveal (as opposed to hide).
    pub reveal_mode: bool,
    /// Whether the debug overlay is drawn.
    pub debug_overlay: bool,
    /// Pixel size of the loaded background image.
    pub image_size: Option<Vec2>,
}

/// Number of primitives that survived culling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Hexes drawn on the grid layer.
    pub hexes: usize,
    /// Tokens drawn on the token layer.
    pub tokens: usize,
}

/// Rebuilds all three layers for the frame.
pub fn render_layers(source: &FrameSource<'_>, layers: &mut Layers) -> FrameStats {
    let visible = visible_world_bounds(source.camera, source.viewport);
    draw_map_layer(source, &mut layers.map);
    let hexes = draw_grid_layer(source, &visible, &mut layers.grid);
    let tokens = draw_token_layer(source, &visible, &mut layers.tokens);
    tracing::trace!(hexes, tokens, "layers rebuilt");
    FrameStats { hexes, tokens }
}

fn draw_map_layer(source: &FrameSource<'_>, surface: &mut LayerSurface) {
    surface.reset(source.camera);
    if let Some(size) = source.image_size {
        let scale = source.settings.map_scale / 100.0;
        surface.push(DrawCommand::Image { size: size * scale });
    }
}

fn draw_grid_layer(
    source: &FrameSource<'_>,
    visible: &Bounds,
    surface: &mut LayerSurface,
) -> usize {
    surface.reset(source.camera);
    let settings = source.settings;
    let fog = Color::from_hex_str(&settings.fog_color)
        .unwrap_or(Color::BLACK)
        .with_alpha(settings.fog_opacity);
    let grid_stroke = Color::from_hex_str(&settings.grid_color)
        .ok()
        .filter(|_| settings.grid_thickness > 0.0)
        .map(|color| Stroke::solid(color, settings.grid_thickness));

    let mut drawn = 0;
    for hex in source.hexes {
        if !hex_bounds(hex.center, settings.hex_size).intersects(visible) {
            continue;
        }
        drawn += 1;
        if !hex.revealed {
            surface.push(DrawCommand::Polygon {
                points: hex.vertices.to_vec(),
                fill: Some(fog),
                stroke: grid_stroke,
            });
            if source.debug_overlay {
                push_hex_markers(hex, surface);
            }
        } else if source.debug_overlay {
            surface.push(DrawCommand::Polygon {
                points: hex.vertices.to_vec(),
                fill: None,
                stroke: Some(Stroke::dashed(Color::YELLOW, 2.0)),
            });
        }
    }
    drawn
}

fn push_hex_markers(hex: &HexCell, surface: &mut LayerSurface) {
    surface.push(DrawCommand::Circle {
        center: hex.center,
        radius: 3.0,
        fill: Some(Color::RED),
        stroke: None,
    });
    surface.push(DrawCommand::Text {
        position: hex.center,
        text: hex.id.to_string(),
        size: DEBUG_FONT_SIZE,
        color: Color::WHITE,
        anchor: TextAnchor::Center,
        outline: None,
    });
    for vertex in hex.vertices {
        surface.push(DrawCommand::Circle {
            center: vertex,
            radius: 2.0,
            fill: Some(Color::YELLOW),
            stroke: None,
        });
    }
}

fn draw_token_layer(
    source: &FrameSource<'_>,
    visible: &Bounds,
    surface: &mut LayerSurface,
) -> usize {
    surface.reset(source.camera);
    let hex_size = source.settings.hex_size;
    let default_color =
        Color::from_hex_str(&source.settings.token_color).unwrap_or(FALLBACK_TOKEN_COLOR);

    let mut order: Vec<usize> = (0..source.tokens.len()).collect();
    order.sort_by_key(|&slot| source.tokens[slot].z_index);

    let mut drawn = 0;
    for slot in order {
        let token = &source.tokens[slot];
        let position = token.position();
        if !Bounds::around(position, hex_size).intersects(visible) {
            continue;
        }
        drawn += 1;

        let fill = token
            .color
            .as_deref()
            .and_then(|color| Color::from_hex_str(color).ok())
            .unwrap_or(default_color);
        let stroke = if source.selected.map(|token| token.get()) == Some(slot) {
            Stroke::solid(Color::WHITE, 3.0)
        } else {
            Stroke::solid(fill.darken(0.6), 2.0)
        };
        surface.push(DrawCommand::Circle {
            center: position,
            radius: hex_size * TOKEN_RADIUS_FACTOR,
            fill: Some(fill),
            stroke: Some(stroke),
        });

        if !token.icon.is_empty() {
            surface.push(DrawCommand::Text {
                position: position + Vec2::new(0.0, hex_size * 0.05),
                text: token.icon.clone(),
                size: hex_size * 0.6,
                color: Color::WHITE,
                anchor: TextAnchor::Center,
                outline: None,
            });
        }
        if !token.label.is_empty() {
            surface.push(DrawCommand::Text {
                position: position + Vec2::new(0.0, hex_size * 0.5),
                text: token.label.clone(),
                size: LABEL_FONT_SIZE,
                color: Color::WHITE,
                anchor: TextAnchor::Top,
                outline: Some(Color::BLACK),
            });
        }
    }

    if source.debug_overlay {
        push_statistics(source, surface);
    }
    drawn
}

fn push_statistics(source: &FrameSource<'_>, surface: &mut LayerSurface) {
    surface.push_overlay(DrawCommand::Rect {
        origin: Vec2::new(10.0, 10.0),
        size: Vec2::new(200.0, 100.0),
        fill: Color::BLACK.with_alpha(0.7),
    });
    let mode = if source.reveal_mode { "Reveal" } else { "Hide" };
    let lines = [
        format!("Total Hexes: {}", source.hexes.len()),
        format!("Revealed: {}", source.revealed_count),
        format!("Mode: {mode}"),
        format!("Zoom: {:.0}%", source.camera.zoom() * 100.0),
    ];
    for (row, text) in lines.into_iter().enumerate() {
        surface.push_overlay(DrawCommand::Text {
            position: Vec2::new(20.0, 20.0 + row as f32 * 20.0),
            text,
            size: LABEL_FONT_SIZE,
            color: Color::WHITE,
            anchor: TextAnchor::TopLeft,
            outline: None,
        });
    }
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed window for the hex map.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.
//!
//! The backend replays the retained [`Layers`] every frame, translating each
//! layer's camera into screen coordinates, and turns mouse, touch and keyboard
//! state into [`HostInput`] events for the frame callback.

mod input;
mod texture;

use std::{collections::VecDeque, time::Duration};

use anyhow::Result;
use glam::Vec2;
use hexfog_core::CameraView;
use hexfog_rendering::{
    dash_segments, Color, DrawCommand, FrameInput, HostInput, ImageEvent, ImageSource, Layers,
    Presentation, RenderingBackend, Stroke, TextAnchor, DASH_LENGTH,
};
use hexfog_system_geometry::world_to_screen;
use macroquad::{
    input::{is_key_down, is_key_pressed, simulate_mouse_with_touch, KeyCode},
    math::Vec2 as MacroquadVec2,
    shapes::{draw_circle, draw_circle_lines, draw_line, draw_rectangle, draw_triangle},
    text::{draw_text, measure_text},
    texture::{draw_texture_ex, DrawTextureParams, Texture2D},
};

use self::input::InputCapture;

/// How long a status line stays on screen.
const STATUS_LIFETIME: Duration = Duration::from_secs(3);
/// Status lines shown at once, newest at the bottom.
const STATUS_LINES: usize = 4;
const STATUS_FONT_SIZE: f32 = 18.0;
const OUTLINE_OFFSETS: [Vec2; 4] = [
    Vec2::new(-1.0, 0.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(0.0, -1.0),
    Vec2::new(0.0, 1.0),
];

/// Rendering backend implemented on top of macroquad.
#[derive(Debug, Default)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend logs the frame rate once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
}

impl FpsCounter {
    /// Records a frame and returns the frame rate once a full second has elapsed.
    fn record_frame(&mut self, frame: Duration) -> Option<f32> {
        self.elapsed += frame;
        self.frames = self.frames.saturating_add(1);
        if self.elapsed < Duration::from_secs(1) {
            return None;
        }
        let per_second = self.frames as f32 / self.elapsed.as_secs_f32();
        *self = Self::default();
        Some(per_second)
    }
}

/// Transient messages drawn in the bottom-left corner.
#[derive(Clone, Debug, Default)]
struct StatusBoard {
    lines: VecDeque<(String, Duration)>,
}

impl StatusBoard {
    fn post(&mut self, message: String, now: Duration) {
        self.lines.push_back((message, now + STATUS_LIFETIME));
        while self.lines.len() > STATUS_LINES {
            let _ = self.lines.pop_front();
        }
    }

    fn expire(&mut self, now: Duration) {
        self.lines.retain(|(_, until)| *until > now);
    }

    fn visible(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|(message, _)| message.as_str())
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update: F) -> Result<()>
    where
        F: FnMut(FrameInput, &mut Layers) -> hexfog_rendering::FrameOutput + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            width,
            height,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: i32::try_from(width).unwrap_or(i32::MAX),
            window_height: i32::try_from(height).unwrap_or(i32::MAX),
            window_resizable: true,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            simulate_mouse_with_touch(false);
            let background = to_macroquad_color(clear_color);
            let mut layers = Layers::default();
            let mut capture = InputCapture::default();
            let mut status = StatusBoard::default();
            let mut fps_counter = FpsCounter::default();
            let mut map_texture: Option<Texture2D> = None;
            let mut pending_image: Option<ImageSource> = None;
            let mut readout: Option<String> = None;

            loop {
                let elapsed = Duration::from_secs_f64(macroquad::time::get_time().max(0.0));
                let viewport = Vec2::new(
                    macroquad::window::screen_width(),
                    macroquad::window::screen_height(),
                );

                let quit_requested = command_held() && is_key_pressed(KeyCode::Q);
                let mut events = capture.poll(elapsed);
                if let Some(source) = pending_image.take() {
                    events.push(HostInput::Image(load_image(&source, &mut map_texture)));
                }

                let frame_input = FrameInput {
                    elapsed,
                    viewport,
                    visible: viewport.x > 0.0 && viewport.y > 0.0,
                    events,
                };
                let output = update(frame_input, &mut layers);
                for message in output.status {
                    status.post(message, elapsed);
                }
                status.expire(elapsed);
                if output.quit || quit_requested {
                    break;
                }
                pending_image = output.load_image;
                readout = output.readout;

                macroquad::window::clear_background(background);
                draw_layers(&layers, map_texture);
                draw_status(&status, viewport);
                if let Some(text) = readout.as_deref() {
                    draw_readout(text, viewport);
                }

                let frame = Duration::from_secs_f32(macroquad::time::get_frame_time().max(0.0));
                if let Some(per_second) = fps_counter.record_frame(frame) {
                    if show_fps {
                        tracing::info!(fps = per_second, "frame rate");
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

fn command_held() -> bool {
    is_key_down(KeyCode::LeftControl)
        || is_key_down(KeyCode::RightControl)
        || is_key_down(KeyCode::LeftSuper)
        || is_key_down(KeyCode::RightSuper)
}

fn load_image(source: &ImageSource, slot: &mut Option<Texture2D>) -> ImageEvent {
    match texture::decode(source) {
        Ok(image) => {
            *slot = Some(image.upload());
            tracing::debug!(
                ?source,
                width = image.width,
                height = image.height,
                "texture uploaded"
            );
            ImageEvent::Loaded { size: image.size() }
        }
        Err(error) => ImageEvent::Failed {
            reason: format!("{error:#}"),
        },
    }
}

/// Layer-to-screen transform: translate by pan, then scale by zoom.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Projection {
    pan: Vec2,
    zoom: f32,
}

impl Projection {
    const SCREEN: Self = Self {
        pan: Vec2::ZERO,
        zoom: 1.0,
    };

    fn from_camera(camera: CameraView) -> Self {
        Self {
            pan: camera.pan(),
            zoom: camera.zoom(),
        }
    }

    fn point(self, point: Vec2) -> Vec2 {
        world_to_screen(point, self.pan, self.zoom)
    }

    fn length(self, length: f32) -> f32 {
        length * self.zoom
    }
}

fn draw_layers(layers: &Layers, map_texture: Option<Texture2D>) {
    for surface in layers.in_order() {
        let projection = Projection::from_camera(surface.camera());
        for command in surface.commands() {
            draw_command(command, projection, map_texture);
        }
        for command in surface.overlay() {
            draw_command(command, Projection::SCREEN, map_texture);
        }
    }
}

fn draw_command(command: &DrawCommand, projection: Projection, map_texture: Option<Texture2D>) {
    match command {
        DrawCommand::Image { size } => {
            let Some(texture) = map_texture else {
                return;
            };
            let origin = projection.point(Vec2::ZERO);
            let size = *size * projection.zoom;
            draw_texture_ex(
                texture,
                origin.x,
                origin.y,
                macroquad::color::WHITE,
                DrawTextureParams {
                    dest_size: Some(MacroquadVec2::new(size.x, size.y)),
                    ..DrawTextureParams::default()
                },
            );
        }
        DrawCommand::Polygon {
            points,
            fill,
            stroke,
        } => {
            let screen: Vec<Vec2> = points.iter().map(|&point| projection.point(point)).collect();
            if let Some(fill) = fill {
                let color = to_macroquad_color(*fill);
                for [a, b, c] in fan_triangles(&screen) {
                    draw_triangle(to_mq(a), to_mq(b), to_mq(c), color);
                }
            }
            if let Some(stroke) = stroke {
                draw_outline(points, *stroke, projection);
            }
        }
        DrawCommand::Circle {
            center,
            radius,
            fill,
            stroke,
        } => {
            let center = projection.point(*center);
            let radius = projection.length(*radius);
            if let Some(fill) = fill {
                draw_circle(center.x, center.y, radius, to_macroquad_color(*fill));
            }
            if let Some(stroke) = stroke {
                draw_circle_lines(
                    center.x,
                    center.y,
                    radius,
                    projection.length(stroke.width),
                    to_macroquad_color(stroke.color),
                );
            }
        }
        DrawCommand::Text {
            position,
            text,
            size,
            color,
            anchor,
            outline,
        } => {
            let font_size = projection.length(*size).max(1.0);
            let dimensions = measure_text(text, None, font_size.round() as u16, 1.0);
            let baseline = text_baseline(
                *anchor,
                projection.point(*position),
                dimensions.width,
                dimensions.offset_y,
            );
            if let Some(outline) = outline {
                let outline = to_macroquad_color(*outline);
                for offset in OUTLINE_OFFSETS {
                    let at = baseline + offset;
                    draw_text(text, at.x, at.y, font_size, outline);
                }
            }
            draw_text(text, baseline.x, baseline.y, font_size, to_macroquad_color(*color));
        }
        DrawCommand::Rect { origin, size, fill } => {
            let origin = projection.point(*origin);
            let size = *size * projection.zoom;
            draw_rectangle(origin.x, origin.y, size.x, size.y, to_macroquad_color(*fill));
        }
    }
}

fn draw_outline(points: &[Vec2], stroke: Stroke, projection: Projection) {
    let color = to_macroquad_color(stroke.color);
    let thickness = projection.length(stroke.width);
    let segments = if stroke.dashed {
        dash_segments(points, true, DASH_LENGTH, DASH_LENGTH)
    } else {
        (0..points.len())
            .map(|index| (points[index], points[(index + 1) % points.len()]))
            .collect()
    };
    for (start, end) in segments {
        let start = projection.point(start);
        let end = projection.point(end);
        draw_line(start.x, start.y, end.x, end.y, thickness, color);
    }
}

fn draw_status(status: &StatusBoard, viewport: Vec2) {
    let lines: Vec<&str> = status.visible().collect();
    for (row, message) in lines.iter().rev().enumerate() {
        let y = viewport.y - 12.0 - row as f32 * (STATUS_FONT_SIZE + 4.0);
        for offset in OUTLINE_OFFSETS {
            draw_text(
                message,
                12.0 + offset.x,
                y + offset.y,
                STATUS_FONT_SIZE,
                macroquad::color::BLACK,
            );
        }
        draw_text(message, 12.0, y, STATUS_FONT_SIZE, macroquad::color::WHITE);
    }
}

fn draw_readout(text: &str, viewport: Vec2) {
    let size = measure_text(text, None, STATUS_FONT_SIZE as u16, 1.0);
    let x = viewport.x - size.width - 12.0;
    let y = 12.0 + size.offset_y;
    for offset in OUTLINE_OFFSETS {
        draw_text(
            text,
            x + offset.x,
            y + offset.y,
            STATUS_FONT_SIZE,
            macroquad::color::BLACK,
        );
    }
    draw_text(text, x, y, STATUS_FONT_SIZE, macroquad::color::WHITE);
}

/// Splits a convex polygon into triangles sharing its first vertex.
fn fan_triangles(points: &[Vec2]) -> Vec<[Vec2; 3]> {
    if points.len() < 3 {
        return Vec::new();
    }
    points
        .windows(2)
        .skip(1)
        .map(|pair| [points[0], pair[0], pair[1]])
        .collect()
}

/// Baseline origin for text of the given measured width and ascent.
fn text_baseline(anchor: TextAnchor, position: Vec2, width: f32, ascent: f32) -> Vec2 {
    match anchor {
        TextAnchor::Center => Vec2::new(position.x - width / 2.0, position.y + ascent / 2.0),
        TextAnchor::Top => Vec2::new(position.x - width / 2.0, position.y + ascent),
        TextAnchor::TopLeft => Vec2::new(position.x, position.y + ascent),
    }
}

fn to_mq(point: Vec2) -> MacroquadVec2 {
    MacroquadVec2::new(point.x, point.y)
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for hex map adapters.
//!
//! Frames are described as three retained draw lists, one per layer, each
//! carrying the camera transform it must be replayed with. Backends replay
//! the lists every frame; the lists themselves are rebuilt only when the
//! [`FrameScheduler`] reports the map as dirty.

mod image;
mod pipeline;
mod scheduler;

use anyhow::Result as AnyResult;
use glam::Vec2;
use hexfog_core::{CameraView, InputEvent, Key, Modifiers};
use std::time::Duration;

pub use image::{BackgroundImage, ImageEvent, ImageOutcome, ImageSource, ImageStatus};
pub use pipeline::{render_layers, FrameSource, FrameStats};
pub use scheduler::FrameScheduler;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    /// Opaque black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    /// Opaque red.
    pub const RED: Self = Self::new(1.0, 0.0, 0.0, 1.0);
    /// Opaque yellow.
    pub const YELLOW: Self = Self::new(1.0, 1.0, 0.0, 1.0);

    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Parses a `#RRGGBB` string into an opaque color.
    pub fn from_hex_str(value: &str) -> Result<Self, RenderingError> {
        let invalid = || RenderingError::InvalidColor {
            value: value.to_owned(),
        };
        let digits = value.strip_prefix('#').ok_or_else(invalid)?;
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| invalid())
        };
        Ok(Self::from_rgb_u8(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Returns the color with each channel scaled by `factor` and floored to a byte step.
    #[must_use]
    pub fn darken(self, factor: f32) -> Self {
        let factor = factor.clamp(0.0, 1.0);
        Self {
            red: darken_channel(self.red, factor),
            green: darken_channel(self.green, factor),
            blue: darken_channel(self.blue, factor),
            alpha: self.alpha,
        }
    }

    /// Returns the color with its alpha replaced.
    #[must_use]
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            ..self
        }
    }
}

fn darken_channel(channel: f32, factor: f32) -> f32 {
    (channel * 255.0 * factor).floor() / 255.0
}

/// Outline applied to a filled shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    /// Line color.
    pub color: Color,
    /// Line width in the layer's units.
    pub width: f32,
    /// Whether the outline is drawn as 5-on/5-off dashes.
    pub dashed: bool,
}

impl Stroke {
    /// Creates a solid stroke.
    #[must_use]
    pub const fn solid(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            dashed: false,
        }
    }

    /// Creates a dashed stroke.
    #[must_use]
    pub const fn dashed(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            dashed: true,
        }
    }
}

/// Point of a text run that its position refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextAnchor {
    /// Horizontally and vertically centred.
    Center,
    /// Horizontally centred, hanging below the position.
    Top,
    /// Left aligned, hanging below the position.
    TopLeft,
}

/// Retained drawing primitive.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// Background image drawn from the layer origin.
    Image {
        /// Drawn size in layer units.
        size: Vec2,
    },
    /// Closed polygon.
    Polygon {
        /// Polygon vertices in drawing order.
        points: Vec<Vec2>,
        /// Fill color, if filled.
        fill: Option<Color>,
        /// Outline, if stroked.
        stroke: Option<Stroke>,
    },
    /// Circle.
    Circle {
        /// Circle center.
        center: Vec2,
        /// Circle radius.
        radius: f32,
        /// Fill color, if filled.
        fill: Option<Color>,
        /// Outline, if stroked.
        stroke: Option<Stroke>,
    },
    /// Text run.
    Text {
        /// Anchor position.
        position: Vec2,
        /// Text content.
        text: String,
        /// Font size in layer units.
        size: f32,
        /// Fill color.
        color: Color,
        /// How `position` relates to the text extent.
        anchor: TextAnchor,
        /// Outline color drawn beneath the fill, if any.
        outline: Option<Color>,
    },
    /// Axis-aligned filled rectangle.
    Rect {
        /// Top-left corner.
        origin: Vec2,
        /// Width and height.
        size: Vec2,
        /// Fill color.
        fill: Color,
    },
}

/// One drawing surface and the camera transform it is composited with.
///
/// `commands` are replayed under the camera (translate by pan, then scale by
/// zoom); `overlay` commands are replayed in screen space on top.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayerSurface {
    camera: CameraView,
    commands: Vec<DrawCommand>,
    overlay: Vec<DrawCommand>,
}

impl LayerSurface {
    /// Empties the surface and installs the camera for the next frame.
    pub fn reset(&mut self, camera: CameraView) {
        self.camera = camera;
        self.commands.clear();
        self.overlay.clear();
    }

    /// Appends a world-space command.
    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    /// Appends a screen-space command.
    pub fn push_overlay(&mut self, command: DrawCommand) {
        self.overlay.push(command);
    }

    /// Camera the world-space commands are replayed with.
    #[must_use]
    pub const fn camera(&self) -> CameraView {
        self.camera
    }

    /// World-space commands in drawing order.
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Screen-space commands in drawing order.
    #[must_use]
    pub fn overlay(&self) -> &[DrawCommand] {
        &self.overlay
    }
}

/// The three composited layers, bottom to top.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Layers {
    /// Background image.
    pub map: LayerSurface,
    /// Fog and grid lines.
    pub grid: LayerSurface,
    /// Tokens and the debug overlay.
    pub tokens: LayerSurface,
}

impl Layers {
    /// Layers in compositing order.
    #[must_use]
    pub fn in_order(&self) -> [&LayerSurface; 3] {
        [&self.map, &self.grid, &self.tokens]
    }
}

/// Length of one dash and of one gap in dashed strokes.
pub const DASH_LENGTH: f32 = 5.0;

/// Splits a polyline into the visible segments of a dash pattern.
///
/// The pattern continues across vertices, and `closed` adds the edge from the
/// last point back to the first.
#[must_use]
pub fn dash_segments(points: &[Vec2], closed: bool, dash: f32, gap: f32) -> Vec<(Vec2, Vec2)> {
    let mut segments = Vec::new();
    if points.len() < 2 || dash <= 0.0 || gap < 0.0 {
        return segments;
    }
    let period = dash + gap;
    let mut phase = 0.0_f32;
    let edge_count = if closed {
        points.len()
    } else {
        points.len() - 1
    };
    for edge in 0..edge_count {
        let start = points[edge];
        let end = points[(edge + 1) % points.len()];
        let length = start.distance(end);
        if length <= f32::EPSILON {
            continue;
        }
        let direction = (end - start) / length;
        let mut travelled = 0.0;
        while travelled < length {
            let step = if phase < dash {
                dash - phase
            } else {
                period - phase
            }
            .min(length - travelled);
            if phase < dash {
                segments.push((
                    start + direction * travelled,
                    start + direction * (travelled + step),
                ));
            }
            travelled += step;
            phase = (phase + step) % period;
        }
    }
    segments
}

/// Window configuration handed to a backend.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Initial window width in pixels.
    pub width: u32,
    /// Initial window height in pixels.
    pub height: u32,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, width: u32, height: u32) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            width,
            height,
        }
    }
}

/// Input observed by a backend since the previous frame.
#[derive(Clone, Debug, PartialEq)]
pub enum HostInput {
    /// Mouse or touch event.
    Pointer(InputEvent),
    /// Two primary clicks in quick succession.
    DoubleClick {
        /// Screen position of the second click.
        position: Vec2,
    },
    /// Scroll wheel movement. Positive `delta_y` scrolls away from the user.
    Wheel {
        /// Cursor position.
        position: Vec2,
        /// Vertical scroll amount.
        delta_y: f32,
    },
    /// Key press.
    Key {
        /// Pressed key.
        key: Key,
        /// Modifier keys held during the press.
        modifiers: Modifiers,
    },
    /// Printable character typed by the user.
    Text(char),
    /// Background image load result.
    Image(ImageEvent),
}

/// Per-frame snapshot handed to the update closure.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameInput {
    /// Time since the backend started.
    pub elapsed: Duration,
    /// Window size in pixels.
    pub viewport: Vec2,
    /// Whether the window is currently shown. Hidden windows skip drawing.
    pub visible: bool,
    /// Input in arrival order.
    pub events: Vec<HostInput>,
}

/// Requests returned by the update closure.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameOutput {
    /// Image the backend should load; its result arrives as [`HostInput::Image`].
    pub load_image: Option<ImageSource>,
    /// Lines of status text drawn over the map.
    pub status: Vec<String>,
    /// Coordinate readout drawn in the top-right corner, if any.
    pub readout: Option<String>,
    /// Ends the loop after this frame.
    pub quit: bool,
}

/// Rendering backend capable of presenting hex map layers.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The `update` closure receives the frame's input and may rebuild the
    /// layers, which the backend then replays.
    fn run<F>(self, presentation: Presentation, update: F) -> AnyResult<()>
    where
        F: FnMut(FrameInput, &mut Layers) -> FrameOutput + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RenderingError {
    /// The string is not a `#RRGGBB` color.
    #[error("`{value}` is not a #RRGGBB color")]
    InvalidColor {
        /// Rejected input.
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        let color = Color::from_hex_str("#FF8000").expect("valid color");
        assert_eq!(color, Color::from_rgb_u8(255, 128, 0));
    }

    #[test]
    fn rejects_malformed_hex_colors() {
        for value in ["FF8000", "#FF80", "#GG0000", "#ff80000", "#ÿÿÿ"] {
            assert!(
                Color::from_hex_str(value).is_err(),
                "{value} should be rejected"
            );
        }
    }

    #[test]
    fn darken_floors_each_channel() {
        let darker = Color::from_rgb_u8(255, 0, 0).darken(0.6);
        assert_eq!(darker, Color::from_rgb_u8(153, 0, 0));
        let odd = Color::from_rgb_u8(0, 0, 101).darken(0.6);
        assert_eq!(odd, Color::from_rgb_u8(0, 0, 60));
    }

    #[test]
    fn dashes_alternate_along_an_edge() {
        let segments = dash_segments(&[Vec2::ZERO, Vec2::new(22.0, 0.0)], false, 5.0, 5.0);
        assert_eq!(
            segments,
            vec![
                (Vec2::ZERO, Vec2::new(5.0, 0.0)),
                (Vec2::new(10.0, 0.0), Vec2::new(15.0, 0.0)),
                (Vec2::new(20.0, 0.0), Vec2::new(22.0, 0.0)),
            ]
        );
    }

    #[test]
    fn dash_pattern_continues_around_corners() {
        let square = [
            Vec2::ZERO,
            Vec2::new(7.0, 0.0),
            Vec2::new(7.0, 7.0),
            Vec2::new(0.0, 7.0),
        ];
        let segments = dash_segments(&square, true, 5.0, 5.0);
        assert_eq!(segments[0], (Vec2::ZERO, Vec2::new(5.0, 0.0)));
        assert_eq!(
            segments[1],
            (Vec2::new(7.0, 3.0), Vec2::new(7.0, 7.0)),
            "gap spans the corner"
        );
        let total: f32 = segments.iter().map(|(a, b)| a.distance(*b)).sum();
        assert!((total - 15.0).abs() < 1e-4, "half of 28 rounded to dashes, got {total}");
    }
}

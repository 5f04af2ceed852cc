use std::fs;

use anyhow::{Context, Result};
use glam::Vec2;
use hexfog_rendering::ImageSource;
use macroquad::texture::{FilterMode, Texture2D};

const PLACEHOLDER_WIDTH: u16 = 1024;
const PLACEHOLDER_HEIGHT: u16 = 768;
const PLACEHOLDER_CELL: u16 = 64;
const PARCHMENT: [u8; 4] = [0xE8, 0xDC, 0xC0, 0xFF];
const PARCHMENT_LINE: [u8; 4] = [0xC8, 0xB8, 0x98, 0xFF];

/// RGBA8 pixels ready for upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct DecodedImage {
    pub(crate) width: u16,
    pub(crate) height: u16,
    pub(crate) pixels: Vec<u8>,
}

impl DecodedImage {
    pub(crate) fn size(&self) -> Vec2 {
        Vec2::new(f32::from(self.width), f32::from(self.height))
    }

    pub(crate) fn upload(&self) -> Texture2D {
        let texture = Texture2D::from_rgba8(self.width, self.height, &self.pixels);
        texture.set_filter(FilterMode::Linear);
        texture
    }
}

/// Reads and decodes the image behind `source`.
pub(crate) fn decode(source: &ImageSource) -> Result<DecodedImage> {
    match source {
        ImageSource::File(path) => {
            let bytes =
                fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
            let image = image::load_from_memory(&bytes)
                .with_context(|| format!("failed to decode {}", path.display()))?
                .to_rgba8();
            let width = u16::try_from(image.width()).context("map image is too wide")?;
            let height = u16::try_from(image.height()).context("map image is too tall")?;
            Ok(DecodedImage {
                width,
                height,
                pixels: image.into_raw(),
            })
        }
        ImageSource::Placeholder => Ok(placeholder()),
    }
}

/// Plain parchment with faint ruling, used when the user's map cannot be loaded.
pub(crate) fn placeholder() -> DecodedImage {
    let width = PLACEHOLDER_WIDTH;
    let height = PLACEHOLDER_HEIGHT;
    let mut pixels = Vec::with_capacity(usize::from(width) * usize::from(height) * 4);
    for y in 0..height {
        for x in 0..width {
            let ruled = x % PLACEHOLDER_CELL == 0 || y % PLACEHOLDER_CELL == 0;
            pixels.extend_from_slice(if ruled { &PARCHMENT_LINE } else { &PARCHMENT });
        }
    }
    DecodedImage {
        width,
        height,
        pixels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn placeholder_is_ruled_parchment() {
        let image = placeholder();
        assert_eq!(image.size(), Vec2::new(1024.0, 768.0));
        assert_eq!(image.pixels.len(), 1024 * 768 * 4);
        assert_eq!(&image.pixels[0..4], &PARCHMENT_LINE);
        let inside = (65 * 1024 + 65) * 4;
        assert_eq!(&image.pixels[inside..inside + 4], &PARCHMENT);
    }

    #[test]
    fn missing_files_report_the_path() {
        let source = ImageSource::File(PathBuf::from("definitely/not/here.png"));
        let error = decode(&source).expect_err("missing file");
        assert!(format!("{error:#}").contains("definitely/not/here.png"));
    }
}

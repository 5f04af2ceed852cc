use glam::Vec2;
use std::path::PathBuf;

/// Where a background image is loaded from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ImageSource {
    /// Image file chosen by the user.
    File(PathBuf),
    /// Image generated by the backend when the user's image is unusable.
    Placeholder,
}

/// Result of a load started for the current source.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageEvent {
    /// The image decoded successfully.
    Loaded {
        /// Image size in pixels.
        size: Vec2,
    },
    /// The image could not be read or decoded.
    Failed {
        /// Human-readable failure description.
        reason: String,
    },
}

/// Load state of the background image.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageStatus {
    /// No image requested.
    Idle,
    /// Waiting for a load result.
    Loading(ImageSource),
    /// An image is available.
    Ready {
        /// Source that produced the image.
        source: ImageSource,
        /// Image size in pixels.
        size: Vec2,
    },
    /// Both the requested image and the placeholder failed.
    Failed {
        /// Failure reported for the placeholder.
        reason: String,
    },
}

/// What the host should do after an image event.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageOutcome {
    /// The image is ready to draw.
    Ready {
        /// Image size in pixels.
        size: Vec2,
    },
    /// The requested image failed; load the placeholder next.
    Fallback {
        /// Failure reported for the requested image.
        reason: String,
    },
    /// The placeholder failed too. No further loads are attempted.
    Fatal {
        /// Failure reported for the placeholder.
        reason: String,
    },
    /// No load was in flight.
    Ignored,
}

/// Tracks the background image through one automatic fallback.
#[derive(Clone, Debug)]
pub struct BackgroundImage {
    status: ImageStatus,
}

impl Default for BackgroundImage {
    fn default() -> Self {
        Self::new()
    }
}

impl BackgroundImage {
    /// Creates a tracker with nothing requested.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            status: ImageStatus::Idle,
        }
    }

    /// Current load state.
    #[must_use]
    pub fn status(&self) -> &ImageStatus {
        &self.status
    }

    /// Size of the ready image, if any.
    #[must_use]
    pub fn size(&self) -> Option<Vec2> {
        match self.status {
            ImageStatus::Ready { size, .. } => Some(size),
            _ => None,
        }
    }

    /// Starts loading a new source, replacing any previous image.
    pub fn request(&mut self, source: ImageSource) -> ImageSource {
        self.status = ImageStatus::Loading(source.clone());
        source
    }

    /// Applies a load result for the source in flight.
    pub fn on_event(&mut self, event: ImageEvent) -> ImageOutcome {
        let ImageStatus::Loading(source) = self.status.clone() else {
            return ImageOutcome::Ignored;
        };
        match event {
            ImageEvent::Loaded { size } => {
                self.status = ImageStatus::Ready { source, size };
                ImageOutcome::Ready { size }
            }
            ImageEvent::Failed { reason } => {
                if source == ImageSource::Placeholder {
                    self.status = ImageStatus::Failed {
                        reason: reason.clone(),
                    };
                    ImageOutcome::Fatal { reason }
                } else {
                    self.status = ImageStatus::Loading(ImageSource::Placeholder);
                    ImageOutcome::Fallback { reason }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(reason: &str) -> ImageEvent {
        ImageEvent::Failed {
            reason: reason.to_owned(),
        }
    }

    #[test]
    fn falls_back_once_then_gives_up() {
        let mut image = BackgroundImage::new();
        let _ = image.request(ImageSource::File(PathBuf::from("map.png")));

        assert_eq!(
            image.on_event(failed("corrupt")),
            ImageOutcome::Fallback {
                reason: "corrupt".to_owned()
            }
        );
        assert_eq!(image.status(), &ImageStatus::Loading(ImageSource::Placeholder));
        assert_eq!(
            image.on_event(failed("no gpu")),
            ImageOutcome::Fatal {
                reason: "no gpu".to_owned()
            }
        );
        assert_eq!(image.on_event(failed("again")), ImageOutcome::Ignored);
        assert_eq!(image.size(), None);
    }

    #[test]
    fn loaded_image_reports_its_size() {
        let mut image = BackgroundImage::new();
        let _ = image.request(ImageSource::File(PathBuf::from("map.png")));
        let size = Vec2::new(800.0, 600.0);
        assert_eq!(
            image.on_event(ImageEvent::Loaded { size }),
            ImageOutcome::Ready { size }
        );
        assert_eq!(image.size(), Some(size));
    }

    #[test]
    fn events_without_request_are_ignored() {
        let mut image = BackgroundImage::new();
        assert_eq!(
            image.on_event(ImageEvent::Loaded { size: Vec2::ONE }),
            ImageOutcome::Ignored
        );
    }
}

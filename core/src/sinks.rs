use std::fmt;

use crate::{MapState, RawMapState};

/// Storage the engine saves its full state to.
///
/// Saving is fire-and-forget: implementations report their own failures
/// instead of returning them to the engine.
pub trait PersistenceSink {
    /// Stores the complete state, replacing any previous save.
    fn save(&mut self, state: &MapState);

    /// Returns the last saved record, unvalidated, if one exists.
    fn load(&mut self) -> Option<RawMapState>;
}

/// Severity of a user-visible notice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NoticeLevel {
    /// Neutral information.
    Info,
    /// A requested action completed.
    Success,
    /// Input was adjusted or an action was refused.
    Warning,
    /// An action failed.
    Error,
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

/// Message shown to the user in a status line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Message text.
    pub message: String,
}

impl Notice {
    /// Creates a notice.
    #[must_use]
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Receiver of user-visible notices.
pub trait StatusSink {
    /// Shows the notice.
    fn notify(&mut self, notice: Notice);
}

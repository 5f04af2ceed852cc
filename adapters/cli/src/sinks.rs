use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::mpsc::Sender,
};

use anyhow::{Context, Result};
use hexfog_core::{MapState, Notice, NoticeLevel, PersistenceSink, RawMapState, StatusSink};

/// Saves the map as pretty-printed JSON next to the working directory.
///
/// Writes go to a sibling temporary file first and are renamed into place,
/// so an interrupted save never truncates the previous state.
#[derive(Clone, Debug)]
pub(crate) struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the saved record. A missing file is not an error.
    pub(crate) fn read(&self) -> Result<Option<RawMapState>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("failed to read {}", self.path.display()))
            }
        };
        let raw = serde_json::from_slice(&bytes)
            .with_context(|| format!("{} is not a saved map", self.path.display()))?;
        Ok(Some(raw))
    }

    /// Writes the state, replacing any previous save.
    pub(crate) fn write(&self, state: &MapState) -> Result<()> {
        let json = serde_json::to_vec_pretty(state).context("failed to serialize map state")?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, json)
            .with_context(|| format!("failed to write {}", staging.display()))?;
        fs::rename(&staging, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

impl PersistenceSink for JsonFileStore {
    fn save(&mut self, state: &MapState) {
        match self.write(state) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "map saved"),
            Err(error) => tracing::error!(error = format!("{error:#}"), "map could not be saved"),
        }
    }

    fn load(&mut self) -> Option<RawMapState> {
        match self.read() {
            Ok(raw) => raw,
            Err(error) => {
                tracing::warn!(
                    error = format!("{error:#}"),
                    "ignoring unreadable saved map"
                );
                None
            }
        }
    }
}

/// Logs every notice and forwards its text to the window's status line.
#[derive(Clone, Debug)]
pub(crate) struct NoticeFeed {
    sender: Option<Sender<String>>,
}

impl NoticeFeed {
    /// Feed that only logs.
    pub(crate) const fn log_only() -> Self {
        Self { sender: None }
    }

    pub(crate) const fn forwarding(sender: Sender<String>) -> Self {
        Self {
            sender: Some(sender),
        }
    }
}

impl StatusSink for NoticeFeed {
    fn notify(&mut self, notice: Notice) {
        let Notice { level, message } = notice;
        match level {
            NoticeLevel::Info | NoticeLevel::Success => tracing::info!(%level, "{message}"),
            NoticeLevel::Warning => tracing::warn!("{message}"),
            NoticeLevel::Error => tracing::error!("{message}"),
        }
        if let Some(sender) = &self.sender {
            let _ = sender.send(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn missing_file_loads_nothing() {
        let directory = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(directory.path().join("absent.json"));
        assert!(store.read().expect("read").is_none());
    }

    #[test]
    fn saved_state_reads_back() {
        let directory = tempfile::tempdir().expect("tempdir");
        let mut store = JsonFileStore::new(directory.path().join("map.json"));
        let state = MapState::default();

        store.save(&state);

        let raw = store.load().expect("saved map");
        let loaded = raw.into_strict(&state.settings).expect("complete record");
        assert_eq!(loaded.state, state);
        assert!(!directory.path().join("map.json.tmp").exists());
    }

    #[test]
    fn corrupt_files_are_ignored_on_load() {
        let directory = tempfile::tempdir().expect("tempdir");
        let path = directory.path().join("map.json");
        fs::write(&path, "not json").expect("write");
        let mut store = JsonFileStore::new(path);

        assert!(store.read().is_err());
        assert!(store.load().is_none());
    }

    #[test]
    fn notices_reach_the_status_line() {
        let (sender, receiver) = mpsc::channel();
        let mut feed = NoticeFeed::forwarding(sender);
        feed.notify(Notice::new(NoticeLevel::Success, "Token added"));
        assert_eq!(receiver.try_recv().expect("message"), "Token added");
    }
}

use std::time::Duration;

/// Trailing debounce in front of the persistence sink.
///
/// Every change restarts the quiet period; the save fires once the host
/// clock has advanced `debounce` past the latest change.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PendingSave {
    debounce: Duration,
    changed_at: Option<Duration>,
}

impl PendingSave {
    pub(crate) const fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            changed_at: None,
        }
    }

    pub(crate) fn mark(&mut self, now: Duration) {
        self.changed_at = Some(now);
    }

    pub(crate) const fn is_pending(&self) -> bool {
        self.changed_at.is_some()
    }

    pub(crate) fn is_due(&self, now: Duration) -> bool {
        self.changed_at
            .is_some_and(|changed_at| now.saturating_sub(changed_at) >= self.debounce)
    }

    /// Clears the pending flag, returning whether a save was owed.
    pub(crate) fn take(&mut self) -> bool {
        self.changed_at.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_debounce_is_due_immediately() {
        let mut pending = PendingSave::new(Duration::ZERO);
        pending.mark(Duration::from_secs(3));
        assert!(pending.is_due(Duration::from_secs(3)));
    }

    #[test]
    fn later_changes_restart_the_quiet_period() {
        let debounce = Duration::from_millis(300);
        let mut pending = PendingSave::new(debounce);
        pending.mark(Duration::from_millis(0));
        pending.mark(Duration::from_millis(200));
        assert!(!pending.is_due(Duration::from_millis(400)));
        assert!(pending.is_due(Duration::from_millis(500)));
        assert!(pending.take());
        assert!(!pending.is_pending());
        assert!(!pending.take());
    }
}

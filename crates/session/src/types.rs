//! Observable status of the update operation.

/// Snapshot of the update status. Exactly one variant is observable at
/// any time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// Nothing has happened yet.
    Idle,
    /// An update is in progress; carries the visible progress line.
    Updating(String),
    /// The update completed successfully. Terminal: further triggers
    /// are ignored.
    Succeeded,
    /// The last trigger failed; triggering again is allowed.
    Failed(String),
}

impl Status {
    /// Whether the trigger control should be enabled for this status.
    pub fn can_trigger(&self) -> bool {
        matches!(self, Status::Idle | Status::Failed(_))
    }
}

/// Lifecycle phase of the single update call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Phase {
    Idle,
    InFlight,
    Succeeded,
    Failed(String),
}

/// Internal session state: the call phase plus the progress text fed by
/// the log topic. Progress text is advisory only and never moves the
/// phase.
#[derive(Debug)]
pub(crate) struct SessionState {
    pub(crate) phase: Phase,
    pub(crate) progress: String,
}

impl SessionState {
    pub(crate) fn new() -> Self {
        Self {
            phase: Phase::Idle,
            progress: String::new(),
        }
    }

    /// Reduces phase + progress to the single observable status.
    pub(crate) fn snapshot(&self) -> Status {
        match &self.phase {
            Phase::Failed(message) => Status::Failed(message.clone()),
            Phase::Succeeded => Status::Succeeded,
            Phase::InFlight => Status::Updating(self.progress.clone()),
            // Progress text can arrive without a local trigger (another
            // observer started the update); it still shows.
            Phase::Idle if !self.progress.is_empty() => Status::Updating(self.progress.clone()),
            Phase::Idle => Status::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_is_mutually_exclusive() {
        let mut state = SessionState::new();
        assert_eq!(state.snapshot(), Status::Idle);

        state.phase = Phase::InFlight;
        state.progress = "manager: unpacking".into();
        assert_eq!(
            state.snapshot(),
            Status::Updating("manager: unpacking".into())
        );

        state.phase = Phase::Succeeded;
        assert_eq!(state.snapshot(), Status::Succeeded);

        state.phase = Phase::Failed("X".into());
        assert_eq!(state.snapshot(), Status::Failed("X".into()));
    }

    #[test]
    fn idle_with_progress_shows_updating() {
        let mut state = SessionState::new();
        state.progress = "manager: running".into();
        assert_eq!(state.snapshot(), Status::Updating("manager: running".into()));
    }

    #[test]
    fn can_trigger_only_when_idle_or_failed() {
        assert!(Status::Idle.can_trigger());
        assert!(Status::Failed("boom".into()).can_trigger());
        assert!(!Status::Updating(String::new()).can_trigger());
        assert!(!Status::Succeeded.can_trigger());
    }
}

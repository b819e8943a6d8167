use std::time::Duration;

/// What a poll-on-toggle list does with its content when the history is
/// hidden again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HideBehavior {
    Keep,
    Clear,
    /// Keep records created within the window, e.g. the messages of the
    /// current chat exchange.
    RetainRecent(Duration),
}

/// How a feed reconciles with the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncPolicy {
    /// One fetch per "show history" transition, replacing local state.
    PollOnToggle { on_hide: HideBehavior },
    /// Standing listener; every snapshot replaces local state.
    Subscription,
}

/// What happens to an optimistic record whose write is rejected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PendingFailure {
    #[default]
    Discard,
    Retain,
}

/// Result of flipping a history toggle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToggleAction {
    /// Fetch once; the value identifies this transition.
    Fetch(u64),
    Hide(HideBehavior),
}

/// Visibility state of a poll-on-toggle history panel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HistoryToggle {
    visible: bool,
    transitions: u64,
}

impl HistoryToggle {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// True while the panel is still open from the transition `fetch` was
    /// issued for. Results of older fetches are dropped.
    pub fn is_current(&self, fetch: u64) -> bool {
        self.visible && self.transitions == fetch
    }

    /// Flips visibility; turning it on asks for exactly one fetch.
    pub fn toggle(&mut self, on_hide: HideBehavior) -> ToggleAction {
        self.visible = !self.visible;
        self.transitions += 1;
        if self.visible {
            ToggleAction::Fetch(self.transitions)
        } else {
            ToggleAction::Hide(on_hide)
        }
    }
}

use crate::settings::Settings;

/// Join for a batch of independent asynchronous registration attempts whose
/// completions may interleave on arbitrary threads. Callers serialize access
/// (the app keeps one behind a `Mutex`); `finish` hands out the aggregated
/// "did any succeed" exactly once, when the final completion lands.
#[derive(Debug)]
pub struct ClaimJoin {
    outstanding: usize,
    any_succeeded: bool,
}

impl ClaimJoin {
    pub fn new(attempts: usize) -> Self {
        ClaimJoin {
            outstanding: attempts,
            any_succeeded: false,
        }
    }

    /// Records one completion. Returns `Some(any_succeeded)` only for the
    /// last outstanding attempt; duplicate completions are ignored.
    pub fn finish(&mut self, succeeded: bool) -> Option<bool> {
        if self.outstanding == 0 {
            return None;
        }
        self.any_succeeded |= succeeded;
        self.outstanding -= 1;
        (self.outstanding == 0).then_some(self.any_succeeded)
    }
}

/// First-launch bookkeeping, run before the registrations go out: remember
/// which browser held default status, and keep links flowing there until the
/// user explicitly picks something else.
pub fn record_previous_default(settings: &impl Settings, current: Option<&str>, own_id: &str) {
    let Some(current) = current else { return };
    if current.eq_ignore_ascii_case(own_id) {
        return;
    }
    settings.set_previous_default(current);
    if settings.selection().selected.is_none() {
        settings.set_selected(current);
    }
}

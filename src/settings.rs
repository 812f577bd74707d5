/// Bundle identifier of the browser used when nothing else resolves.
pub const FALLBACK_BROWSER_ID: &str = "com.apple.Safari";

/// Persisted preference keys.
pub const SELECTED_BROWSER_KEY: &str = "SelectedBrowser";
pub const PREVIOUS_DEFAULT_KEY: &str = "PreviousDefaultBrowser";
pub const CLAIMED_DEFAULT_KEY: &str = "DidClaimDefault";

/// Snapshot of the three persisted selection settings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub selected: Option<String>,
    pub previous_default: Option<String>,
    pub claimed_default: bool,
}

impl SelectionState {
    /// Resolution order for the forwarding target: the user's explicit pick,
    /// then the default recorded before the first-launch claim, then the
    /// hardcoded fallback. Candidates matching `own_id` are skipped so the
    /// process can never forward a link back to itself.
    pub fn forwarding_target<'a>(&'a self, own_id: &str) -> &'a str {
        [self.selected.as_deref(), self.previous_default.as_deref()]
            .into_iter()
            .flatten()
            .find(|id| !id.is_empty() && !id.eq_ignore_ascii_case(own_id))
            .unwrap_or(FALLBACK_BROWSER_ID)
    }
}

/// Durable process-wide store for the selection settings. Backed by
/// `NSUserDefaults` in the app, by an in-memory map in tests.
pub trait Settings {
    fn selection(&self) -> SelectionState;
    fn set_selected(&self, identifier: &str);
    fn set_previous_default(&self, identifier: &str);
    fn set_claimed_default(&self);
}

#[cfg(test)]
pub mod test_store {
    use std::cell::RefCell;

    use super::{SelectionState, Settings};

    #[derive(Default)]
    pub struct MemorySettings {
        state: RefCell<SelectionState>,
    }

    impl MemorySettings {
        pub fn with_selected(identifier: &str) -> Self {
            let store = Self::default();
            store.set_selected(identifier);
            store
        }
    }

    impl Settings for MemorySettings {
        fn selection(&self) -> SelectionState {
            self.state.borrow().clone()
        }

        fn set_selected(&self, identifier: &str) {
            self.state.borrow_mut().selected = Some(identifier.to_owned());
        }

        fn set_previous_default(&self, identifier: &str) {
            self.state.borrow_mut().previous_default = Some(identifier.to_owned());
        }

        fn set_claimed_default(&self) {
            self.state.borrow_mut().claimed_default = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWN_ID: &str = "dev.linkrelay.LinkRelay";

    fn state(selected: Option<&str>, previous: Option<&str>) -> SelectionState {
        SelectionState {
            selected: selected.map(str::to_owned),
            previous_default: previous.map(str::to_owned),
            claimed_default: false,
        }
    }

    #[test]
    fn selected_browser_wins() {
        let state = state(Some("org.mozilla.firefox"), Some("com.google.Chrome"));
        assert_eq!(state.forwarding_target(OWN_ID), "org.mozilla.firefox");
    }

    #[test]
    fn previous_default_used_when_nothing_selected() {
        let state = state(None, Some("com.google.Chrome"));
        assert_eq!(state.forwarding_target(OWN_ID), "com.google.Chrome");
    }

    #[test]
    fn falls_back_when_both_absent() {
        let state = state(None, None);
        assert_eq!(state.forwarding_target(OWN_ID), FALLBACK_BROWSER_ID);
    }

    #[test]
    fn own_identifier_is_never_chosen() {
        {
            let state = state(Some("DEV.LINKRELAY.linkrelay"), Some("com.google.Chrome"));
            assert_eq!(state.forwarding_target(OWN_ID), "com.google.Chrome");
        }

        let state = state(Some(OWN_ID), None);
        assert_eq!(state.forwarding_target(OWN_ID), FALLBACK_BROWSER_ID);
    }

    #[test]
    fn empty_strings_are_treated_as_absent() {
        let state = state(Some(""), Some("com.google.Chrome"));
        assert_eq!(state.forwarding_target(OWN_ID), "com.google.Chrome");
    }
}

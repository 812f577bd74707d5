use std::mem;
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};
use url::Url;

use crate::settings::{SelectionState, FALLBACK_BROWSER_ID};

/// Startup lifecycle of the dispatcher. The transition to `Ready` happens
/// exactly once and is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Initializing,
    Ready,
}

/// OS-facing surface the dispatcher drives. The app wraps `NSWorkspace`;
/// tests substitute an in-memory fake.
pub trait BrowserHost {
    /// Current persisted selection settings.
    fn selection(&self) -> SelectionState;

    /// Point lookup: launch location for a bundle identifier, if installed.
    fn location_for(&self, identifier: &str) -> Option<PathBuf>;

    /// Fire-and-forget open of `url` with the application at `app`. Must
    /// launch that specific application, never the generic open call, which
    /// would route straight back through the interception point. When the
    /// launch fails asynchronously and `fallback` is set, the host retries
    /// once with the fallback location.
    fn open(&self, url: &Url, app: &Path, fallback: Option<PathBuf>);
}

/// Receives intercepted URL-open events and re-opens each link in the
/// currently selected browser. Events arriving before startup completes are
/// buffered in arrival order and drained on `mark_ready`.
pub struct Dispatcher<H> {
    host: H,
    own_id: String,
    phase: Phase,
    pending: Vec<Url>,
}

impl<H: BrowserHost> Dispatcher<H> {
    pub fn new(host: H, own_id: impl Into<String>) -> Self {
        Dispatcher {
            host,
            own_id: own_id.into(),
            phase: Phase::Initializing,
            pending: Vec::new(),
        }
    }

    /// Entry point for intercepted URL-open events. May be called before
    /// `mark_ready`.
    pub fn intercept(&mut self, raw: &str) {
        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(err) => {
                debug!(raw, %err, "dropping unparsable URL");
                return;
            }
        };

        // Only web links may be forwarded. Everything else (file, javascript,
        // ...) is refused at the interception boundary.
        if !matches!(url.scheme(), "http" | "https") {
            warn!(scheme = url.scheme(), "dropping URL with disallowed scheme");
            return;
        }

        match self.phase {
            Phase::Initializing => self.pending.push(url),
            Phase::Ready => self.dispatch(&url),
        }
    }

    /// Marks startup complete and drains the pending buffer in arrival
    /// order. Terminal; later calls are no-ops.
    pub fn mark_ready(&mut self) {
        if self.phase == Phase::Ready {
            return;
        }
        self.phase = Phase::Ready;
        for url in mem::take(&mut self.pending) {
            self.dispatch(&url);
        }
    }

    fn dispatch(&self, url: &Url) {
        let selection = self.host.selection();
        let target = selection.forwarding_target(&self.own_id);
        match self.host.location_for(target) {
            Some(app) => {
                let fallback = if target.eq_ignore_ascii_case(FALLBACK_BROWSER_ID) {
                    None
                } else {
                    self.host.location_for(FALLBACK_BROWSER_ID)
                };
                self.host.open(url, &app, fallback);
            }
            None => {
                warn!(target, "forwarding target not installed, using fallback");
                self.open_fallback(url);
            }
        }
    }

    fn open_fallback(&self, url: &Url) {
        match self.host.location_for(FALLBACK_BROWSER_ID) {
            Some(app) => self.host.open(url, &app, None),
            // No further fallback chain; recursing here could never
            // terminate.
            None => error!(%url, "no fallback browser available, dropping link"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::*;

    const OWN_ID: &str = "dev.linkrelay.LinkRelay";
    const FIREFOX: &str = "org.mozilla.firefox";
    const CHROME: &str = "com.google.Chrome";

    #[derive(Debug, PartialEq, Eq)]
    struct OpenCall {
        url: String,
        app: PathBuf,
        fallback: Option<PathBuf>,
    }

    #[derive(Default)]
    struct FakeHost {
        selection: SelectionState,
        installed: HashMap<String, PathBuf>,
        opened: RefCell<Vec<OpenCall>>,
    }

    impl FakeHost {
        fn install(mut self, identifier: &str) -> Self {
            self.installed.insert(
                identifier.to_owned(),
                PathBuf::from(format!("/Applications/{identifier}.app")),
            );
            self
        }

        fn select(mut self, identifier: &str) -> Self {
            self.selection.selected = Some(identifier.to_owned());
            self
        }

        fn opened_urls(&self) -> Vec<String> {
            self.opened.borrow().iter().map(|call| call.url.clone()).collect()
        }
    }

    impl BrowserHost for &FakeHost {
        fn selection(&self) -> SelectionState {
            self.selection.clone()
        }

        fn location_for(&self, identifier: &str) -> Option<PathBuf> {
            self.installed.get(identifier).cloned()
        }

        fn open(&self, url: &Url, app: &Path, fallback: Option<PathBuf>) {
            self.opened.borrow_mut().push(OpenCall {
                url: url.to_string(),
                app: app.to_path_buf(),
                fallback,
            });
        }
    }

    fn app_path(identifier: &str) -> PathBuf {
        PathBuf::from(format!("/Applications/{identifier}.app"))
    }

    #[test]
    fn disallowed_schemes_never_dispatch() {
        let host = FakeHost::default()
            .install(FIREFOX)
            .install(FALLBACK_BROWSER_ID)
            .select(FIREFOX);
        let mut dispatcher = Dispatcher::new(&host, OWN_ID);
        dispatcher.mark_ready();

        dispatcher.intercept("ftp://example.com/file");
        dispatcher.intercept("file:///etc/passwd");
        dispatcher.intercept("javascript:alert(1)");
        dispatcher.intercept("mailto:someone@example.com");

        assert!(host.opened.borrow().is_empty());
    }

    #[test]
    fn unparsable_urls_are_dropped_silently() {
        let host = FakeHost::default().install(FALLBACK_BROWSER_ID);
        let mut dispatcher = Dispatcher::new(&host, OWN_ID);
        dispatcher.mark_ready();

        dispatcher.intercept("not a url");
        dispatcher.intercept("");

        assert!(host.opened.borrow().is_empty());
    }

    #[test]
    fn uppercase_scheme_is_accepted() {
        let host = FakeHost::default().install(FALLBACK_BROWSER_ID);
        let mut dispatcher = Dispatcher::new(&host, OWN_ID);
        dispatcher.mark_ready();

        dispatcher.intercept("HTTP://example.com/");

        assert_eq!(host.opened_urls(), vec!["http://example.com/"]);
    }

    #[test]
    fn urls_buffered_while_initializing_drain_in_order_exactly_once() {
        let host = FakeHost::default().install(FIREFOX).select(FIREFOX);
        let mut dispatcher = Dispatcher::new(&host, OWN_ID);

        dispatcher.intercept("https://one.example/");
        dispatcher.intercept("https://two.example/");
        dispatcher.intercept("https://three.example/");
        assert!(host.opened.borrow().is_empty());

        dispatcher.mark_ready();
        assert_eq!(
            host.opened_urls(),
            vec![
                "https://one.example/",
                "https://two.example/",
                "https://three.example/",
            ],
        );

        // The transition is terminal and the buffer stays drained.
        dispatcher.mark_ready();
        assert_eq!(host.opened.borrow().len(), 3);

        dispatcher.intercept("https://four.example/");
        assert_eq!(host.opened.borrow().len(), 4);
    }

    #[test]
    fn selected_browser_receives_the_link() {
        let host = FakeHost::default()
            .install(FIREFOX)
            .install(FALLBACK_BROWSER_ID)
            .select(FIREFOX);
        let mut dispatcher = Dispatcher::new(&host, OWN_ID);
        dispatcher.mark_ready();

        dispatcher.intercept("https://example.com/");

        let opened = host.opened.borrow();
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].app, app_path(FIREFOX));
        // The fallback location rides along for the async-failure retry.
        assert_eq!(opened[0].fallback, Some(app_path(FALLBACK_BROWSER_ID)));
    }

    #[test]
    fn missing_target_falls_back_to_safe_browser() {
        let host = FakeHost::default().install(FALLBACK_BROWSER_ID).select(FIREFOX);
        let mut dispatcher = Dispatcher::new(&host, OWN_ID);
        dispatcher.mark_ready();

        dispatcher.intercept("https://example.com/");

        let opened = host.opened.borrow();
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].app, app_path(FALLBACK_BROWSER_ID));
        assert_eq!(opened[0].fallback, None);
    }

    #[test]
    fn own_identifier_is_never_a_forwarding_target() {
        // Even installed and selected, the process must not pick itself.
        let mut host = FakeHost::default()
            .install(OWN_ID)
            .install(CHROME)
            .select(OWN_ID);
        host.selection.previous_default = Some(CHROME.to_owned());

        let mut dispatcher = Dispatcher::new(&host, OWN_ID);
        dispatcher.mark_ready();
        dispatcher.intercept("https://example.com/");

        let opened = host.opened.borrow();
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].app, app_path(CHROME));
    }

    #[test]
    fn dispatch_to_fallback_carries_no_second_fallback() {
        let host = FakeHost::default().install(FALLBACK_BROWSER_ID);
        let mut dispatcher = Dispatcher::new(&host, OWN_ID);
        dispatcher.mark_ready();

        dispatcher.intercept("https://example.com/");

        let opened = host.opened.borrow();
        assert_eq!(opened[0].app, app_path(FALLBACK_BROWSER_ID));
        assert_eq!(opened[0].fallback, None);
    }

    #[test]
    fn nothing_opens_when_even_the_fallback_is_missing() {
        let host = FakeHost::default().select(FIREFOX);
        let mut dispatcher = Dispatcher::new(&host, OWN_ID);
        dispatcher.mark_ready();

        dispatcher.intercept("https://example.com/");

        assert!(host.opened.borrow().is_empty());
    }
}

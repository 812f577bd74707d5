use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use block2::RcBlock;
use objc2::rc::Retained;
use objc2_app_kit::{NSRunningApplication, NSWorkspace, NSWorkspaceOpenConfiguration};
use objc2_foundation::{NSArray, NSBundle, NSError, NSString, NSURL};
use tracing::{debug, warn};
use url::Url;

use super::defaults::UserDefaultsStore;
use super::directory;
use crate::claim::{self, ClaimJoin};
use crate::dispatch::BrowserHost;
use crate::settings::{SelectionState, Settings};

/// Identity used for self-exclusion when running unbundled during
/// development (no Info.plist, no bundle identifier).
const UNBUNDLED_ID: &str = "dev.linkrelay.LinkRelay";

const SCHEMES: [&str; 2] = ["http", "https"];

pub fn own_bundle_id() -> String {
    unsafe { NSBundle::mainBundle().bundleIdentifier() }
        .map(|identifier| identifier.to_string())
        .unwrap_or_else(|| UNBUNDLED_ID.to_string())
}

fn own_bundle_url() -> Retained<NSURL> {
    unsafe { NSBundle::mainBundle().bundleURL() }
}

fn file_url(path: &Path) -> Option<Retained<NSURL>> {
    Some(unsafe { NSURL::fileURLWithPath(&NSString::from_str(path.to_str()?)) })
}

/// `BrowserHost` over the shared `NSWorkspace`.
pub struct WorkspaceHost {
    settings: UserDefaultsStore,
}

impl WorkspaceHost {
    pub fn new() -> Self {
        WorkspaceHost {
            settings: UserDefaultsStore::new(),
        }
    }
}

impl BrowserHost for WorkspaceHost {
    fn selection(&self) -> SelectionState {
        self.settings.selection()
    }

    fn location_for(&self, identifier: &str) -> Option<PathBuf> {
        directory::location_for_identifier(identifier)
    }

    fn open(&self, url: &Url, app: &Path, fallback: Option<PathBuf>) {
        open_at(url, app, fallback);
    }
}

/// Opens `url` with the application at `app` specifically. Launch failures
/// are reported asynchronously, possibly on another thread; one retry with
/// `fallback` happens from there.
fn open_at(url: &Url, app: &Path, fallback: Option<PathBuf>) {
    let Some(app_url) = file_url(app) else {
        warn!(app = %app.display(), "application path is not valid UTF-8");
        return;
    };
    let Some(link) = (unsafe { NSURL::URLWithString(&NSString::from_str(url.as_str())) }) else {
        debug!(%url, "URL not representable as NSURL");
        return;
    };
    let links = NSArray::from_retained_slice(&[link]);
    let configuration = unsafe { NSWorkspaceOpenConfiguration::configuration() };

    let opened = url.clone();
    let handler = RcBlock::new(
        move |_app: *mut NSRunningApplication, error: *mut NSError| {
            if error.is_null() {
                debug!(url = %opened, "forwarded link");
                return;
            }
            let description = unsafe { (*error).localizedDescription() }.to_string();
            match &fallback {
                Some(retry) => {
                    warn!(url = %opened, %description, "launch failed, retrying with fallback browser");
                    open_at(&opened, retry, None);
                }
                None => {
                    tracing::error!(url = %opened, %description, "launch failed, no fallback available");
                }
            }
        },
    );

    unsafe {
        NSWorkspace::sharedWorkspace().openURLs_withApplicationAtURL_configuration_completionHandler(
            &links,
            &app_url,
            &configuration,
            Some(&*handler),
        );
    }
}

/// Registers this process as the handler for both web schemes. The two
/// registrations are independent; `done` receives the aggregated "did any
/// succeed" once both completions have landed, in whatever order they
/// arrive.
fn register_as_default(done: impl Fn(bool) + Send + Sync + 'static) {
    let app_url = own_bundle_url();
    let workspace = unsafe { NSWorkspace::sharedWorkspace() };
    let join = Arc::new(Mutex::new(ClaimJoin::new(SCHEMES.len())));
    let done = Arc::new(done);

    for scheme in SCHEMES {
        let join = Arc::clone(&join);
        let done = Arc::clone(&done);
        let handler = RcBlock::new(move |error: *mut NSError| {
            let succeeded = error.is_null();
            if !succeeded {
                let description = unsafe { (*error).localizedDescription() }.to_string();
                warn!(scheme, %description, "default-handler registration failed");
            }
            let outcome = join.lock().ok().and_then(|mut join| join.finish(succeeded));
            if let Some(any_succeeded) = outcome {
                done(any_succeeded);
            }
        });
        unsafe {
            workspace.setDefaultApplicationAtURL_toOpenURLsWithScheme_completionHandler(
                &app_url,
                &NSString::from_str(scheme),
                Some(&*handler),
            );
        }
    }
}

/// One-time default-handler claim, gated by the persisted flag. Records the
/// incumbent default and pre-seeds the selection first, synchronously; the
/// flag itself is only persisted after both registrations complete, and only
/// if at least one succeeded, so a total failure retries next launch.
pub fn claim_default_once(own_id: &str) {
    let settings = UserDefaultsStore::new();
    if settings.selection().claimed_default {
        return;
    }

    claim::record_previous_default(&settings, directory::default_browser_id().as_deref(), own_id);

    register_as_default(|any_succeeded| {
        if any_succeeded {
            UserDefaultsStore::new().set_claimed_default();
            debug!("claimed default-browser status");
        } else {
            warn!("all default-handler registrations failed, will retry next launch");
        }
    });
}

/// Re-asserts default-handler status regardless of the claim flag. Safe to
/// invoke repeatedly.
pub fn reclaim_default() {
    register_as_default(|any_succeeded| {
        if any_succeeded {
            debug!("reasserted default-handler status");
        } else {
            warn!("default-handler reassertion failed for both schemes");
        }
    });
}

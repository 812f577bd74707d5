use std::path::{Path, PathBuf};

use objc2::rc::Retained;
use objc2_app_kit::{NSImage, NSWorkspace};
use objc2_foundation::{NSBundle, NSSize, NSString, NSURL};

use crate::directory::{display_name_from_path, normalize, BrowserEntry};

/// Probe link handed to Launch Services when asking which applications can
/// open web URLs.
const PROBE_URL: &str = "https://example.com";

/// Menu icons are rendered at 18x18 logical units.
const ICON_SIZE: f64 = 18.0;

fn probe_url() -> Option<Retained<NSURL>> {
    unsafe { NSURL::URLWithString(&NSString::from_str(PROBE_URL)) }
}

fn bundle_identifier(app_url: &NSURL) -> Option<String> {
    let bundle = unsafe { NSBundle::bundleWithURL(app_url) }?;
    let identifier = unsafe { bundle.bundleIdentifier() }?;
    Some(identifier.to_string())
}

fn path_of(url: &NSURL) -> Option<PathBuf> {
    Some(PathBuf::from(unsafe { url.path() }?.to_string()))
}

/// Every installed application registered for web links, deduplicated,
/// name-sorted, with this process excluded. Queried fresh on every call.
pub fn installed_browsers(own_id: &str) -> Vec<BrowserEntry> {
    let Some(probe) = probe_url() else {
        return Vec::new();
    };
    let workspace = unsafe { NSWorkspace::sharedWorkspace() };
    let app_urls = unsafe { workspace.URLsForApplicationsToOpenURL(&probe) };

    let mut entries = Vec::new();
    for app_url in &app_urls {
        let Some(identifier) = bundle_identifier(&app_url) else {
            continue;
        };
        let Some(location) = path_of(&app_url) else {
            continue;
        };
        entries.push(BrowserEntry {
            identifier,
            display_name: display_name_from_path(&location),
            location,
        });
    }
    normalize(entries, own_id)
}

/// Point lookup: launch location for a bundle identifier, if installed.
pub fn location_for_identifier(identifier: &str) -> Option<PathBuf> {
    let workspace = unsafe { NSWorkspace::sharedWorkspace() };
    let url = unsafe {
        workspace.URLForApplicationWithBundleIdentifier(&NSString::from_str(identifier))
    }?;
    path_of(&url)
}

/// Bundle identifier of the application currently registered as the OS-wide
/// web-link handler.
pub fn default_browser_id() -> Option<String> {
    let probe = probe_url()?;
    let workspace = unsafe { NSWorkspace::sharedWorkspace() };
    let url = unsafe { workspace.URLForApplicationToOpenURL(&probe) }?;
    bundle_identifier(&url)
}

/// Menu-sized application icon, or `None` when it cannot be resolved.
pub fn menu_icon(location: &Path) -> Option<Retained<NSImage>> {
    let path = location.to_str()?;
    let icon = unsafe { NSWorkspace::sharedWorkspace().iconForFile(&NSString::from_str(path)) };
    unsafe { icon.setSize(NSSize::new(ICON_SIZE, ICON_SIZE)) };
    Some(icon)
}

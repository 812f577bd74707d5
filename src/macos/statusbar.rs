use objc2::rc::Retained;
use objc2::runtime::{AnyObject, ProtocolObject, Sel};
use objc2_app_kit::{
    NSControlStateValueOff, NSControlStateValueOn, NSImage, NSMenu, NSMenuDelegate, NSMenuItem,
    NSStatusBar, NSStatusItem, NSVariableStatusItemLength,
};
use objc2_foundation::{MainThreadMarker, NSString};

use crate::directory::BrowserEntry;

use super::directory;
use super::login_item;

/// Shown in the status bar while no browser icon is resolvable.
const FALLBACK_GLYPH: &str = "\u{1F310}"; // 🌐

pub struct StatusBar {
    status_item: Retained<NSStatusItem>,
    menu: Retained<NSMenu>,
}

impl StatusBar {
    pub fn new(mtm: MainThreadMarker, delegate: &ProtocolObject<dyn NSMenuDelegate>) -> Self {
        let status_bar = NSStatusBar::systemStatusBar();
        let status_item = status_bar.statusItemWithLength(NSVariableStatusItemLength);

        if let Some(button) = status_item.button(mtm) {
            button.setTitle(&NSString::from_str(FALLBACK_GLYPH));
        }

        // The delegate rebuilds the item list every time the menu is about
        // to be shown, so the browser listing is never stale.
        let menu = NSMenu::new(mtm);
        unsafe { menu.setDelegate(Some(delegate)) };
        status_item.setMenu(Some(&menu));

        StatusBar { status_item, menu }
    }

    /// Rebuilds the dropdown from a fresh directory listing.
    pub fn rebuild_menu(
        &self,
        browsers: &[BrowserEntry],
        current_target: &str,
        is_default: bool,
        mtm: MainThreadMarker,
    ) {
        unsafe { self.menu.removeAllItems() };

        for browser in browsers {
            let item = menu_item(mtm, &browser.display_name, Some(c"selectBrowser:"), "");
            let identifier = NSString::from_str(&browser.identifier);
            let represented: &AnyObject = &identifier;
            unsafe { item.setRepresentedObject(Some(represented)) };
            if let Some(icon) = directory::menu_icon(&browser.location) {
                unsafe { item.setImage(Some(&icon)) };
            }
            let state = if browser.identifier.eq_ignore_ascii_case(current_target) {
                NSControlStateValueOn
            } else {
                NSControlStateValueOff
            };
            unsafe { item.setState(state) };
            self.menu.addItem(&item);
        }

        if browsers.is_empty() {
            let placeholder = menu_item(mtm, "No Browsers Found", None, "");
            unsafe { placeholder.setEnabled(false) };
            self.menu.addItem(&placeholder);
        }

        self.menu.addItem(&NSMenuItem::separatorItem(mtm));

        let refresh_item = menu_item(mtm, "Refresh Browsers", Some(c"refreshBrowsers:"), "");
        self.menu.addItem(&refresh_item);

        // Only offered while some other application holds default status.
        if !is_default {
            let reclaim_item =
                menu_item(mtm, "Set as Default Browser", Some(c"reclaimDefault:"), "");
            self.menu.addItem(&reclaim_item);
        }

        if login_item::supported() {
            let toggle_item = menu_item(mtm, "Launch at Login", Some(c"toggleLoginItem:"), "");
            let state = if login_item::enabled() {
                NSControlStateValueOn
            } else {
                NSControlStateValueOff
            };
            unsafe { toggle_item.setState(state) };
            self.menu.addItem(&toggle_item);
        }

        self.menu.addItem(&NSMenuItem::separatorItem(mtm));

        let quit_item = menu_item(mtm, "Quit", Some(c"terminate:"), "q");
        self.menu.addItem(&quit_item);
    }

    /// Status-bar button shows the forwarding target's icon when resolvable,
    /// the generic glyph otherwise.
    pub fn update_icon(&self, icon: Option<Retained<NSImage>>, mtm: MainThreadMarker) {
        let Some(button) = self.status_item.button(mtm) else {
            return;
        };
        match icon {
            Some(icon) => {
                unsafe { button.setImage(Some(&icon)) };
                button.setTitle(&NSString::from_str(""));
            }
            None => {
                unsafe { button.setImage(None) };
                button.setTitle(&NSString::from_str(FALLBACK_GLYPH));
            }
        }
    }
}

// Action-less items (selector None) stay inert; everything else routes
// through the responder chain to the app delegate.
fn menu_item(
    mtm: MainThreadMarker,
    title: &str,
    action: Option<&'static std::ffi::CStr>,
    key_equivalent: &str,
) -> Retained<NSMenuItem> {
    unsafe {
        NSMenuItem::initWithTitle_action_keyEquivalent(
            mtm.alloc(),
            &NSString::from_str(title),
            action.map(Sel::register),
            &NSString::from_str(key_equivalent),
        )
    }
}

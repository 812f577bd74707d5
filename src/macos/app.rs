use std::cell::RefCell;

use objc2::rc::Retained;
use objc2::runtime::{AnyObject, ProtocolObject};
use objc2::{define_class, msg_send, sel, DefinedClass, MainThreadOnly};
use objc2_app_kit::{
    NSApplicationDelegate, NSControlStateValueOff, NSControlStateValueOn, NSMenu, NSMenuDelegate,
    NSMenuItem,
};
use objc2_foundation::{
    MainThreadMarker, NSAppleEventDescriptor, NSAppleEventManager, NSNotification, NSObject,
    NSObjectProtocol, NSString,
};
use tracing::{debug, warn};

use crate::dispatch::Dispatcher;
use crate::settings::Settings;

use super::defaults::UserDefaultsStore;
use super::directory;
use super::login_item;
use super::statusbar::StatusBar;
use super::workspace::{self, WorkspaceHost};

/// Four-char codes for the kAEGetURL Apple Event ('GURL') and its direct
/// parameter ('----').
const INTERNET_EVENT_CLASS: u32 = u32::from_be_bytes(*b"GURL");
const GET_URL_EVENT_ID: u32 = u32::from_be_bytes(*b"GURL");
const KEY_DIRECT_OBJECT: u32 = u32::from_be_bytes(*b"----");

pub struct AppDelegateIvars {
    dispatcher: RefCell<Dispatcher<WorkspaceHost>>,
    settings: UserDefaultsStore,
    status_bar: RefCell<Option<StatusBar>>,
    own_id: String,
}

define_class!(
    #[unsafe(super(NSObject))]
    #[thread_kind = MainThreadOnly]
    #[name = "AppDelegate"]
    #[ivars = AppDelegateIvars]
    pub struct AppDelegate;

    unsafe impl NSObjectProtocol for AppDelegate {}

    unsafe impl NSApplicationDelegate for AppDelegate {
        #[unsafe(method(applicationWillFinishLaunching:))]
        fn application_will_finish_launching(&self, _notification: &NSNotification) {
            // URL events can be delivered before startup finishes, so the
            // handler must be installed before the run loop starts serving
            // them. The dispatcher buffers anything that arrives early.
            let target: &AnyObject = unsafe { &*(self as *const Self as *const AnyObject) };
            let manager = unsafe { NSAppleEventManager::sharedAppleEventManager() };
            unsafe {
                manager.setEventHandler_andSelector_forEventClass_andEventID(
                    target,
                    sel!(handleGetURLEvent:withReplyEvent:),
                    INTERNET_EVENT_CLASS,
                    GET_URL_EVENT_ID,
                );
            }
        }

        #[unsafe(method(applicationDidFinishLaunching:))]
        fn application_did_finish_launching(&self, _notification: &NSNotification) {
            let mtm = MainThreadMarker::from(self);

            let delegate: &ProtocolObject<dyn NSMenuDelegate> = ProtocolObject::from_ref(self);
            *self.ivars().status_bar.borrow_mut() = Some(StatusBar::new(mtm, delegate));

            // Runs before the Ready transition so buffered links already see
            // the pre-seeded selection.
            workspace::claim_default_once(&self.ivars().own_id);
            self.refresh_status_icon();

            self.ivars().dispatcher.borrow_mut().mark_ready();
            debug!("startup complete, dispatching live");
        }
    }

    unsafe impl NSMenuDelegate for AppDelegate {
        #[unsafe(method(menuNeedsUpdate:))]
        fn menu_needs_update(&self, _menu: &NSMenu) {
            self.rebuild_menu();
        }
    }

    // --- URL interception (kAEGetURL) ---
    impl AppDelegate {
        #[unsafe(method(handleGetURLEvent:withReplyEvent:))]
        fn handle_get_url_event(
            &self,
            event: &NSAppleEventDescriptor,
            _reply: &NSAppleEventDescriptor,
        ) {
            let raw = unsafe { event.paramDescriptorForKeyword(KEY_DIRECT_OBJECT) }
                .and_then(|descriptor| unsafe { descriptor.stringValue() });
            let Some(raw) = raw else {
                debug!("URL event without a direct parameter");
                return;
            };
            self.ivars().dispatcher.borrow_mut().intercept(&raw.to_string());
        }
    }

    // --- Menu actions (routed through the responder chain) ---
    impl AppDelegate {
        #[unsafe(method(selectBrowser:))]
        fn select_browser(&self, sender: &AnyObject) {
            let Some(item) = sender.downcast_ref::<NSMenuItem>() else {
                return;
            };
            let identifier = unsafe { item.representedObject() }
                .and_then(|object| object.downcast::<NSString>().ok());
            let Some(identifier) = identifier else {
                return;
            };
            self.ivars().settings.set_selected(&identifier.to_string());
            self.refresh_status_icon();
        }

        #[unsafe(method(refreshBrowsers:))]
        fn refresh_browsers(&self, _sender: &AnyObject) {
            self.rebuild_menu();
        }

        #[unsafe(method(reclaimDefault:))]
        fn reclaim_default(&self, _sender: &AnyObject) {
            workspace::reclaim_default();
        }

        #[unsafe(method(toggleLoginItem:))]
        fn toggle_login_item(&self, sender: &AnyObject) {
            let enable = !login_item::enabled();
            match login_item::set_enabled(enable) {
                Ok(()) => {
                    // Menu state only moves when the registration call took.
                    if let Some(item) = sender.downcast_ref::<NSMenuItem>() {
                        let state = if enable {
                            NSControlStateValueOn
                        } else {
                            NSControlStateValueOff
                        };
                        unsafe { item.setState(state) };
                    }
                }
                Err(error) => warn!(%error, "login item toggle failed"),
            }
        }
    }
);

impl AppDelegate {
    pub fn new(mtm: MainThreadMarker) -> Retained<Self> {
        let own_id = workspace::own_bundle_id();
        let this = mtm.alloc().set_ivars(AppDelegateIvars {
            dispatcher: RefCell::new(Dispatcher::new(WorkspaceHost::new(), own_id.clone())),
            settings: UserDefaultsStore::new(),
            status_bar: RefCell::new(None),
            own_id,
        });
        unsafe { msg_send![super(this), init] }
    }

    fn current_target(&self) -> String {
        let selection = self.ivars().settings.selection();
        selection.forwarding_target(&self.ivars().own_id).to_string()
    }

    fn rebuild_menu(&self) {
        let mtm = MainThreadMarker::from(self);
        let browsers = directory::installed_browsers(&self.ivars().own_id);
        let target = self.current_target();
        let is_default = directory::default_browser_id()
            .is_some_and(|identifier| identifier.eq_ignore_ascii_case(&self.ivars().own_id));
        if let Some(status_bar) = self.ivars().status_bar.borrow().as_ref() {
            status_bar.rebuild_menu(&browsers, &target, is_default, mtm);
        }
    }

    fn refresh_status_icon(&self) {
        let mtm = MainThreadMarker::from(self);
        let icon = directory::location_for_identifier(&self.current_target())
            .and_then(|location| directory::menu_icon(&location));
        if let Some(status_bar) = self.ivars().status_bar.borrow().as_ref() {
            status_bar.update_icon(icon, mtm);
        }
    }
}

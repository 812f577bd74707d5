use objc2::rc::Retained;
use objc2::runtime::AnyObject;
use objc2_foundation::{NSString, NSUserDefaults};

use crate::settings::{
    SelectionState, Settings, CLAIMED_DEFAULT_KEY, PREVIOUS_DEFAULT_KEY, SELECTED_BROWSER_KEY,
};

/// `Settings` over the standard user-defaults domain. `NSUserDefaults` is
/// thread-safe, so completion handlers may persist through this from any
/// thread.
pub struct UserDefaultsStore {
    defaults: Retained<NSUserDefaults>,
}

impl UserDefaultsStore {
    pub fn new() -> Self {
        UserDefaultsStore {
            defaults: unsafe { NSUserDefaults::standardUserDefaults() },
        }
    }

    fn string_for(&self, key: &str) -> Option<String> {
        let value = unsafe { self.defaults.stringForKey(&NSString::from_str(key)) }?;
        let value = value.to_string();
        (!value.is_empty()).then_some(value)
    }

    fn set_string(&self, key: &str, value: &str) {
        let value = NSString::from_str(value);
        let object: &AnyObject = &value;
        unsafe {
            self.defaults.setObject_forKey(Some(object), &NSString::from_str(key));
        }
    }
}

impl Settings for UserDefaultsStore {
    fn selection(&self) -> SelectionState {
        SelectionState {
            selected: self.string_for(SELECTED_BROWSER_KEY),
            previous_default: self.string_for(PREVIOUS_DEFAULT_KEY),
            claimed_default: unsafe {
                self.defaults.boolForKey(&NSString::from_str(CLAIMED_DEFAULT_KEY))
            },
        }
    }

    fn set_selected(&self, identifier: &str) {
        self.set_string(SELECTED_BROWSER_KEY, identifier);
    }

    fn set_previous_default(&self, identifier: &str) {
        self.set_string(PREVIOUS_DEFAULT_KEY, identifier);
    }

    fn set_claimed_default(&self) {
        unsafe {
            self.defaults
                .setBool_forKey(true, &NSString::from_str(CLAIMED_DEFAULT_KEY));
        }
    }
}

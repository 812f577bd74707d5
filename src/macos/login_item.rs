use objc2_foundation::NSProcessInfo;
use objc2_service_management::{SMAppService, SMAppServiceStatus};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("login item registration failed: {0}")]
pub struct LoginItemError(String);

/// `SMAppService` main-app registration needs macOS 13.
pub fn supported() -> bool {
    let version = NSProcessInfo::processInfo().operatingSystemVersion();
    version.majorVersion >= 13
}

pub fn enabled() -> bool {
    let service = unsafe { SMAppService::mainAppService() };
    unsafe { service.status() } == SMAppServiceStatus::Enabled
}

/// Flips registration. Callers only update menu state on success; a failure
/// is logged and leaves the UI untouched.
pub fn set_enabled(enable: bool) -> Result<(), LoginItemError> {
    let service = unsafe { SMAppService::mainAppService() };
    let result = if enable {
        unsafe { service.registerAndReturnError() }
    } else {
        unsafe { service.unregisterAndReturnError() }
    };
    result.map_err(|error| LoginItemError(error.localizedDescription().to_string()))
}

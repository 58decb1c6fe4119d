use std::ffi::CStr;
use std::os::raw::{c_char, c_void};
use std::ptr;

use crate::error::{Error, Result};
use crate::sys::*;
use crate::{DeviceType, OidnError};

/// An OIDN device. Parameters such as the thread count must be set before
/// [`Device::commit`] is called.
pub struct Device {
    pub(crate) handle: OIDNDevice,
}

impl Device {
    /// Create a device using the fastest device available to run denoising
    pub fn new() -> Result<Device> {
        let handle = unsafe { oidnNewDevice(DeviceType::DEFAULT) };
        if handle.is_null() {
            return Err(take_error(ptr::null_mut()).unwrap_or(Error::Creation("device")));
        }
        unsafe {
            oidnSetDeviceErrorFunction(handle, Some(log_device_error), ptr::null_mut());
        }
        Ok(Device { handle })
    }

    /// Limit the number of worker threads. Zero leaves the choice to OIDN.
    pub fn set_threads(&mut self, threads: u32) -> &mut Device {
        if threads > 0 {
            let threads = i32::try_from(threads).unwrap_or(i32::MAX);
            unsafe { oidnSetDeviceInt(self.handle, c"numThreads".as_ptr(), threads) };
        }
        self
    }

    /// Pin worker threads to physical cores.
    pub fn set_affinity(&mut self, affinity: bool) -> &mut Device {
        if affinity {
            unsafe { oidnSetDeviceBool(self.handle, c"setAffinity".as_ptr(), true) };
        }
        self
    }

    pub fn commit(&mut self) -> Result<()> {
        unsafe { oidnCommitDevice(self.handle) };
        self.get_error()
    }

    /// Library version as `(major, minor, patch)`.
    pub fn version(&self) -> (i32, i32, i32) {
        unsafe {
            (
                oidnGetDeviceInt(self.handle, c"versionMajor".as_ptr()),
                oidnGetDeviceInt(self.handle, c"versionMinor".as_ptr()),
                oidnGetDeviceInt(self.handle, c"versionPatch".as_ptr()),
            )
        }
    }

    pub fn sync(&self) {
        unsafe { oidnSyncDevice(self.handle) };
    }

    /// Returns and clears the first error the device recorded since the last query.
    pub fn get_error(&self) -> Result<()> {
        match take_error(self.handle) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn take_error(handle: OIDNDevice) -> Option<Error> {
    let mut err_msg: *const c_char = ptr::null();
    let code = unsafe { oidnGetDeviceError(handle, &mut err_msg as *mut *const c_char) };
    if matches!(OidnError::try_from(code), Ok(OidnError::NONE)) {
        return None;
    }
    let message = if err_msg.is_null() {
        String::from("unknown error")
    } else {
        unsafe { CStr::from_ptr(err_msg).to_string_lossy().into_owned() }
    };
    Some(Error::Oidn { code, message })
}

unsafe extern "C" fn log_device_error(_user_ptr: *mut c_void, code: u32, message: *const c_char) {
    let message = if message.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(message).to_string_lossy().into_owned() }
    };
    match OidnError::try_from(code) {
        Ok(kind) => tracing::debug!("[OIDN] {:?}: {}", kind, message),
        Err(_) => tracing::debug!("[OIDN] error {}: {}", code, message),
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        unsafe {
            oidnReleaseDevice(self.handle);
        }
    }
}

unsafe impl Send for Device {}

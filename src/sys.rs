//! Raw bindings to the parts of the OpenImageDenoise C API used by the denoiser.

use std::os::raw::{c_char, c_int, c_void};

use num_enum::{IntoPrimitive, TryFromPrimitive};

#[repr(C)]
pub struct OIDNDeviceImpl {
    _private: [u8; 0],
}

#[repr(C)]
pub struct OIDNFilterImpl {
    _private: [u8; 0],
}

pub type OIDNDevice = *mut OIDNDeviceImpl;
pub type OIDNFilter = *mut OIDNFilterImpl;

#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
pub enum OIDNDeviceType {
    DEFAULT = 0,
    CPU = 1,
    SYCL = 2,
    CUDA = 3,
    HIP = 4,
    METAL = 5,
}

#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
pub enum OIDNError {
    NONE = 0,
    UNKNOWN = 1,
    INVALID_ARGUMENT = 2,
    INVALID_OPERATION = 3,
    OUT_OF_MEMORY = 4,
    UNSUPPORTED_HARDWARE = 5,
    CANCELLED = 6,
}

#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
pub enum OIDNFormat {
    UNDEFINED = 0,
    FLOAT = 1,
    FLOAT2 = 2,
    FLOAT3 = 3,
    FLOAT4 = 4,
}

// Error codes cross the boundary as plain integers and are decoded with
// `OIDNError::try_from`, an out of range value from C is not a valid enum.
pub type OIDNErrorFunction =
    Option<unsafe extern "C" fn(user_ptr: *mut c_void, code: u32, message: *const c_char)>;
pub type OIDNProgressMonitorFunction =
    Option<unsafe extern "C" fn(user_ptr: *mut c_void, n: f64) -> bool>;

unsafe extern "C" {
    pub fn oidnNewDevice(type_: OIDNDeviceType) -> OIDNDevice;
    pub fn oidnRetainDevice(device: OIDNDevice);
    pub fn oidnReleaseDevice(device: OIDNDevice);
    pub fn oidnSetDeviceBool(device: OIDNDevice, name: *const c_char, value: bool);
    pub fn oidnSetDeviceInt(device: OIDNDevice, name: *const c_char, value: c_int);
    pub fn oidnGetDeviceInt(device: OIDNDevice, name: *const c_char) -> c_int;
    pub fn oidnSetDeviceErrorFunction(
        device: OIDNDevice,
        func: OIDNErrorFunction,
        user_ptr: *mut c_void,
    );
    pub fn oidnGetDeviceError(device: OIDNDevice, out_message: *mut *const c_char) -> u32;
    pub fn oidnCommitDevice(device: OIDNDevice);
    pub fn oidnSyncDevice(device: OIDNDevice);

    pub fn oidnNewFilter(device: OIDNDevice, type_: *const c_char) -> OIDNFilter;
    pub fn oidnReleaseFilter(filter: OIDNFilter);
    pub fn oidnSetSharedFilterImage(
        filter: OIDNFilter,
        name: *const c_char,
        dev_ptr: *mut c_void,
        format: OIDNFormat,
        width: usize,
        height: usize,
        byte_offset: usize,
        pixel_byte_stride: usize,
        row_byte_stride: usize,
    );
    pub fn oidnUnsetFilterImage(filter: OIDNFilter, name: *const c_char);
    pub fn oidnSetFilterBool(filter: OIDNFilter, name: *const c_char, value: bool);
    pub fn oidnSetFilterInt(filter: OIDNFilter, name: *const c_char, value: c_int);
    pub fn oidnSetFilterProgressMonitorFunction(
        filter: OIDNFilter,
        func: OIDNProgressMonitorFunction,
        user_ptr: *mut c_void,
    );
    pub fn oidnCommitFilter(filter: OIDNFilter);
    pub fn oidnExecuteFilter(filter: OIDNFilter);
}

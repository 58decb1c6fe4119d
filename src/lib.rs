//! Denoise rendered images with Intel OpenImageDenoise.
//!
//! The crate loads a beauty image and optional albedo/normal AOVs, converts
//! them to the float3 layout OIDN expects, runs the "RT" filter and writes the
//! result back in the beauty's own channel layout.

#[cfg(oidn)]
#[allow(non_upper_case_globals)]
#[allow(non_camel_case_types)]
#[allow(non_snake_case)]
#[allow(clippy::upper_case_acronyms)]
pub mod sys;

#[cfg(oidn)]
pub mod device;
#[cfg(oidn)]
pub mod filter;

pub mod convert;
pub mod denoiser;
pub mod error;
pub mod image_io;
pub mod logging;
pub mod options;
pub mod pipeline;

#[cfg(oidn)]
pub use sys::OIDNDeviceType as DeviceType;
#[cfg(oidn)]
pub use sys::OIDNError as OidnError;
#[cfg(oidn)]
pub use sys::OIDNFormat as Format;

#[cfg(oidn)]
pub use device::Device;
#[cfg(oidn)]
pub use filter::RayTracing;

pub use denoiser::{DenoiseJob, Denoiser, OidnDenoiser};
pub use error::{Error, Result};
pub use image_io::PixelImage;
pub use options::DenoiseOptions;
pub use pipeline::Request;

#[cfg(all(test, oidn))]
mod tests;

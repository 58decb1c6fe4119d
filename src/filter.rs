use std::ffi::CStr;
use std::marker::PhantomData;
use std::os::raw::c_void;
use std::ptr;
use std::time::{Duration, Instant};

use crate::Format;
use crate::device::Device;
use crate::error::{Error, Result};
use crate::sys::*;

/// Float3 images handed to the filter. Albedo is required whenever a normal
/// image is given.
#[derive(Clone, Copy)]
pub struct FilterImages<'i> {
    pub color: &'i [f32],
    pub albedo: Option<&'i [f32]>,
    pub normal: Option<&'i [f32]>,
}

/// A generic ray tracing denoising filter for denoising
/// images produced with Monte Carlo ray tracing methods
/// such as path tracing.
pub struct RayTracing<'a> {
    handle: OIDNFilter,
    device: &'a Device,
    hdr: bool,
    srgb: bool,
    clean_aux: bool,
    max_memory_mb: Option<u32>,
    img_dims: (usize, usize),
}

impl<'a> RayTracing<'a> {
    pub fn new(device: &'a Device) -> Result<RayTracing<'a>> {
        let filter = unsafe { oidnNewFilter(device.handle, c"RT".as_ptr()) };
        if filter.is_null() {
            return Err(device
                .get_error()
                .err()
                .unwrap_or(Error::Creation("RT filter")));
        }
        unsafe {
            oidnRetainDevice(device.handle);
            oidnSetFilterProgressMonitorFunction(filter, Some(log_progress), ptr::null_mut());
        }
        Ok(RayTracing {
            handle: filter,
            device,
            hdr: true,
            srgb: false,
            clean_aux: false,
            max_memory_mb: None,
            img_dims: (0, 0),
        })
    }

    pub fn set_hdr(&mut self, hdr: bool) -> &mut RayTracing<'a> {
        self.hdr = hdr;
        self
    }

    pub fn set_srgb(&mut self, srgb: bool) -> &mut RayTracing<'a> {
        self.srgb = srgb;
        self
    }

    /// Whether the albedo and normal images are noise free.
    pub fn set_clean_aux(&mut self, clean_aux: bool) -> &mut RayTracing<'a> {
        self.clean_aux = clean_aux;
        self
    }

    pub fn set_max_memory_mb(&mut self, max_memory_mb: Option<u32>) -> &mut RayTracing<'a> {
        self.max_memory_mb = max_memory_mb;
        self
    }

    pub fn set_img_dims(&mut self, width: usize, height: usize) -> &mut RayTracing<'a> {
        self.img_dims = (width, height);
        self
    }

    pub fn execute(&mut self, color: &[f32], output: &mut [f32]) -> Result<Duration> {
        let images = FilterImages {
            color,
            albedo: None,
            normal: None,
        };
        self.bind(images, output)?.execute()
    }

    /// Binds the images and commits the filter. The returned guard can be
    /// executed any number of times and unbinds the images when dropped.
    pub fn bind<'f, 'i>(
        &'f mut self,
        images: FilterImages<'i>,
        output: &'i mut [f32],
    ) -> Result<BoundFilter<'f, 'a, 'i>> {
        let buffer_dims = 3 * self.img_dims.0 * self.img_dims.1;
        if buffer_dims == 0 || images.color.len() != buffer_dims || output.len() != buffer_dims {
            return Err(Error::InvalidImageDimensions);
        }
        if images.normal.is_some() && images.albedo.is_none() {
            return Err(Error::NormalWithoutAlbedo);
        }
        for aux in [images.albedo, images.normal].into_iter().flatten() {
            if aux.len() != buffer_dims {
                return Err(Error::InvalidImageDimensions);
            }
        }

        // OIDN only reads the inputs; the mutable pointer is part of the C signature.
        self.set_image(c"color", images.color.as_ptr() as *mut c_void);
        if let Some(albedo) = images.albedo {
            self.set_image(c"albedo", albedo.as_ptr() as *mut c_void);
        }
        if let Some(normal) = images.normal {
            self.set_image(c"normal", normal.as_ptr() as *mut c_void);
        }
        self.set_image(c"output", output.as_mut_ptr() as *mut c_void);

        let mut bound = BoundFilter {
            filter: self,
            _images: PhantomData,
        };
        bound.filter.commit()?;
        Ok(bound)
    }

    fn commit(&mut self) -> Result<()> {
        unsafe {
            oidnSetFilterBool(self.handle, c"hdr".as_ptr(), self.hdr);
            oidnSetFilterBool(self.handle, c"srgb".as_ptr(), self.srgb);
            oidnSetFilterBool(self.handle, c"cleanAux".as_ptr(), self.clean_aux);
            if let Some(max_mem) = self.max_memory_mb {
                let max_mem = i32::try_from(max_mem).unwrap_or(i32::MAX);
                oidnSetFilterInt(self.handle, c"maxMemoryMB".as_ptr(), max_mem);
            }
            oidnCommitFilter(self.handle);
        }
        self.device.get_error()
    }

    fn set_image(&mut self, name: &CStr, data: *mut c_void) {
        unsafe {
            oidnSetSharedFilterImage(
                self.handle,
                name.as_ptr(),
                data,
                Format::FLOAT3,
                self.img_dims.0,
                self.img_dims.1,
                0,
                0,
                0,
            );
        }
    }
}

/// A committed filter whose shared images borrow the caller's buffers.
pub struct BoundFilter<'f, 'a, 'i> {
    filter: &'f mut RayTracing<'a>,
    _images: PhantomData<&'i mut [f32]>,
}

impl BoundFilter<'_, '_, '_> {
    /// Runs the denoiser once and waits for it to finish.
    pub fn execute(&mut self) -> Result<Duration> {
        let start = Instant::now();
        unsafe { oidnExecuteFilter(self.filter.handle) };
        self.filter.device.sync();
        let elapsed = start.elapsed();
        self.filter.device.get_error()?;
        Ok(elapsed)
    }
}

// Shared images point into the borrowed slices, unset them before the borrow ends.
impl Drop for BoundFilter<'_, '_, '_> {
    fn drop(&mut self) {
        for name in [c"color", c"albedo", c"normal", c"output"] {
            unsafe { oidnUnsetFilterImage(self.filter.handle, name.as_ptr()) };
        }
    }
}

unsafe extern "C" fn log_progress(_user_ptr: *mut c_void, n: f64) -> bool {
    tracing::debug!("{}% complete", (n * 100.0) as i32);
    true
}

impl<'a> Drop for RayTracing<'a> {
    fn drop(&mut self) {
        unsafe {
            oidnReleaseFilter(self.handle);
            oidnReleaseDevice(self.device.handle);
        }
    }
}

unsafe impl<'a> Send for RayTracing<'a> {}

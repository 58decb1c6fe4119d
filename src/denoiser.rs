use std::time::Duration;

use crate::error::Result;
use crate::options::DenoiseOptions;

/// Float3 buffers for one denoising job, each `3 * width * height` samples.
#[derive(Clone, Copy, Debug)]
pub struct DenoiseJob<'i> {
    pub width: usize,
    pub height: usize,
    pub color: &'i [f32],
    pub albedo: Option<&'i [f32]>,
    pub normal: Option<&'i [f32]>,
}

/// Called after every completed pass with the 1-based run number and its duration.
pub type RunObserver<'o> = &'o mut dyn FnMut(u32, Duration);

/// Something that turns a noisy float3 image into a clean one.
pub trait Denoiser {
    /// Denoises `job` into `output`, repeating the pass `runs` times.
    fn denoise(
        &mut self,
        job: &DenoiseJob<'_>,
        output: &mut [f32],
        runs: u32,
        on_run: RunObserver<'_>,
    ) -> Result<()>;
}

/// Denoiser backed by the OpenImageDenoise "RT" filter.
#[derive(Clone, Copy, Debug, Default)]
pub struct OidnDenoiser {
    #[cfg_attr(not(oidn), allow(dead_code))]
    options: DenoiseOptions,
}

impl OidnDenoiser {
    pub fn new(options: DenoiseOptions) -> OidnDenoiser {
        OidnDenoiser { options }
    }
}

#[cfg(oidn)]
impl Denoiser for OidnDenoiser {
    fn denoise(
        &mut self,
        job: &DenoiseJob<'_>,
        output: &mut [f32],
        runs: u32,
        on_run: RunObserver<'_>,
    ) -> Result<()> {
        use crate::device::Device;
        use crate::filter::{FilterImages, RayTracing};

        tracing::info!("Initializing OIDN");
        let mut device = Device::new()?;
        device
            .set_threads(self.options.threads)
            .set_affinity(self.options.affinity);
        device.commit()?;
        let (major, minor, patch) = device.version();
        tracing::info!("Using OIDN version {}.{}.{}", major, minor, patch);

        let mut filter = RayTracing::new(&device)?;
        filter
            .set_hdr(self.options.hdr)
            .set_srgb(self.options.srgb)
            .set_clean_aux(self.options.clean_aux)
            .set_max_memory_mb(self.options.max_memory_mb)
            .set_img_dims(job.width, job.height);

        let images = FilterImages {
            color: job.color,
            albedo: job.albedo,
            normal: job.normal,
        };
        let mut bound = filter.bind(images, output)?;
        for run in 1..=runs.max(1) {
            tracing::info!("Denoising...");
            let elapsed = bound.execute()?;
            on_run(run, elapsed);
        }
        Ok(())
    }
}

#[cfg(not(oidn))]
impl Denoiser for OidnDenoiser {
    fn denoise(
        &mut self,
        _job: &DenoiseJob<'_>,
        _output: &mut [f32],
        _runs: u32,
        _on_run: RunObserver<'_>,
    ) -> Result<()> {
        Err(crate::error::Error::BackendUnavailable)
    }
}

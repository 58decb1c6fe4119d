/// Settings forwarded to the denoising device and filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DenoiseOptions {
    /// Input is high dynamic range.
    pub hdr: bool,
    /// Input is LDR and encoded with the sRGB (or 2.2 gamma) curve.
    pub srgb: bool,
    /// Albedo and normal images are noise free.
    pub clean_aux: bool,
    /// Worker threads, 0 lets the library use every core.
    pub threads: u32,
    /// Pin worker threads to physical cores.
    pub affinity: bool,
    /// How many times to run the denoiser.
    pub repeat: u32,
    /// Memory cap for the denoiser in MB.
    pub max_memory_mb: Option<u32>,
}

impl Default for DenoiseOptions {
    fn default() -> Self {
        DenoiseOptions {
            hdr: true,
            srgb: false,
            clean_aux: false,
            threads: 0,
            affinity: false,
            repeat: 1,
            max_memory_mb: None,
        }
    }
}

impl DenoiseOptions {
    /// Resolves conflicting flags: HDR input cannot be sRGB and the denoiser
    /// always runs at least once.
    pub fn reconcile(mut self) -> Self {
        if self.hdr && self.srgb {
            tracing::info!("Disabling sRGB, incompatible with HDR input");
            self.srgb = false;
        }
        self.repeat = self.repeat.max(1);
        self
    }
}

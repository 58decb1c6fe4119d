//! The load, validate, convert, denoise, convert back, save sequence.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::convert;
use crate::denoiser::{DenoiseJob, Denoiser};
use crate::error::{Error, Result};
use crate::image_io::{self, PixelImage};
use crate::options::DenoiseOptions;

/// Everything one invocation needs.
#[derive(Clone, Debug, Default)]
pub struct Request {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub albedo: Option<PathBuf>,
    pub normal: Option<PathBuf>,
    pub options: DenoiseOptions,
}

/// Paths checked before any image is decoded.
pub struct ValidPaths<'r> {
    pub input: &'r Path,
    pub output: &'r Path,
    pub albedo: Option<&'r Path>,
    pub normal: Option<&'r Path>,
}

pub fn validate_request(request: &Request) -> Result<ValidPaths<'_>> {
    let input = request.input.as_deref().ok_or(Error::MissingInput)?;
    if request.normal.is_some() && request.albedo.is_none() {
        return Err(Error::NormalWithoutAlbedo);
    }
    let output = request.output.as_deref().ok_or(Error::MissingOutput)?;
    if output.extension().is_none_or(|ext| ext.is_empty()) {
        return Err(Error::MissingExtension);
    }
    Ok(ValidPaths {
        input,
        output,
        albedo: request.albedo.as_deref(),
        normal: request.normal.as_deref(),
    })
}

/// Auxiliary images must share the beauty's resolution.
pub fn check_resolution(kind: &'static str, aux: &PixelImage, beauty: &PixelImage) -> Result<()> {
    let (found_w, found_h) = aux.resolution();
    let (want_w, want_h) = beauty.resolution();
    if (found_w, found_h) != (want_w, want_h) {
        return Err(Error::ResolutionMismatch {
            kind,
            found_w,
            found_h,
            want_w,
            want_h,
        });
    }
    Ok(())
}

fn load(kind: &'static str, path: &Path) -> Result<PixelImage> {
    tracing::debug!("{} image: {}", kind, path.display());
    let image = image_io::load(kind, path)?;
    let (w, h) = image.resolution();
    tracing::debug!("Loaded successfully ({}x{}, {} channels)", w, h, image.channels());
    Ok(image)
}

fn load_aux(kind: &'static str, path: Option<&Path>, beauty: &PixelImage) -> Result<Option<Vec<f32>>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let image = load(kind, path)?;
    check_resolution(kind, &image, beauty)?;
    let rgb = to_float3(kind, &image)?;
    Ok(Some(rgb))
}

fn to_float3(kind: &'static str, image: &PixelImage) -> Result<Vec<f32>> {
    convert::to_float3(image.samples(), image.channels()).map_err(|e| Error::Conversion {
        kind,
        target: "float3",
        source: Box::new(e),
    })
}

fn seconds(d: Duration) -> String {
    format!("{}.{:03}", d.as_secs(), d.subsec_millis())
}

/// Runs one denoising job from disk to disk.
pub fn run(request: &Request, denoiser: &mut dyn Denoiser) -> Result<()> {
    let paths = validate_request(request)?;
    let options = request.options;

    let mut beauty = load("beauty", paths.input)?;
    let albedo = load_aux("albedo", paths.albedo, &beauty)?;
    let normal = load_aux("normal", paths.normal, &beauty)?;
    let color = to_float3("beauty", &beauty)?;

    let (width, height) = beauty.resolution();
    let job = DenoiseJob {
        width: width as usize,
        height: height as usize,
        color: &color,
        albedo: albedo.as_deref(),
        normal: normal.as_deref(),
    };
    let mut output = vec![0f32; color.len()];
    let runs = options.repeat.max(1);
    let mut total = Duration::ZERO;
    denoiser.denoise(&job, &mut output, runs, &mut |run, elapsed| {
        total += elapsed;
        if runs > 1 {
            tracing::info!("Denoising run {} complete in {} seconds", run, seconds(elapsed));
        } else {
            tracing::info!("Denoising complete in {} seconds", seconds(elapsed));
        }
    })?;
    if runs > 1 {
        tracing::info!(
            "Denoising avg of {} complete in {} seconds",
            runs,
            seconds(total / runs)
        );
    }

    if image_io::remove_existing(paths.output)? {
        tracing::debug!("Removed existing {}", paths.output.display());
    }

    let channels = beauty.channels();
    convert::from_float3(&output, beauty.samples_mut(), channels).map_err(|e| {
        Error::Conversion {
            kind: "output",
            target: "original format",
            source: Box::new(e),
        }
    })?;

    tracing::info!("Saving to: {}", paths.output.display());
    image_io::save(&beauty, paths.output)?;
    tracing::info!("Done!");
    Ok(())
}

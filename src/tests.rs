//! Tests that drive the native OpenImageDenoise library.

use std::time::Duration;

use rand::Rng;

use crate::filter::FilterImages;
use crate::{DenoiseJob, DenoiseOptions, Denoiser, Device, Error, OidnDenoiser, RayTracing};

const WIDTH: usize = 32;
const HEIGHT: usize = 16;
const BUFFER_LEN: usize = WIDTH * HEIGHT * 3;

fn noise() -> Vec<f32> {
    let mut rng = rand::rng();
    (0..BUFFER_LEN).map(|_| rng.random()).collect()
}

fn committed_device() -> Device {
    let mut device = Device::new().unwrap();
    device.set_threads(2);
    device.commit().unwrap();
    device
}

#[test]
fn device_reports_version() {
    let device = committed_device();
    let (major, minor, patch) = device.version();
    assert!(major >= 1, "version {major}.{minor}.{patch}");
    if let Err(e) = device.get_error() {
        panic!("test failed with {e}")
    }
}

#[test]
fn filter_denoises_noise() {
    let device = committed_device();
    let mut filter = RayTracing::new(&device).unwrap();
    filter.set_hdr(false).set_srgb(true).set_img_dims(WIDTH, HEIGHT);

    let input = noise();
    let mut output = vec![0.0; BUFFER_LEN];
    filter.execute(&input, &mut output).unwrap();
    assert!(output.iter().all(|v| v.is_finite()));
    assert!(output.iter().any(|&v| v != 0.0));
}

#[test]
fn filter_rejects_mismatched_buffers() {
    let device = committed_device();
    let mut filter = RayTracing::new(&device).unwrap();
    filter.set_img_dims(WIDTH, HEIGHT);

    let input = noise();
    let mut short = vec![0.0; BUFFER_LEN - 3];
    assert!(matches!(
        filter.execute(&input, &mut short),
        Err(Error::InvalidImageDimensions)
    ));

    let albedo = vec![0.5; 3];
    let mut output = vec![0.0; BUFFER_LEN];
    let images = FilterImages {
        color: &input,
        albedo: Some(&albedo),
        normal: None,
    };
    assert!(matches!(
        filter.bind(images, &mut output),
        Err(Error::InvalidImageDimensions)
    ));
}

#[test]
fn bound_filter_runs_repeatedly_with_aux() {
    let device = committed_device();
    let mut filter = RayTracing::new(&device).unwrap();
    filter
        .set_clean_aux(true)
        .set_max_memory_mb(Some(256))
        .set_img_dims(WIDTH, HEIGHT);

    let color = noise();
    let albedo = vec![0.5; BUFFER_LEN];
    let normal = vec![0.0; BUFFER_LEN];
    let mut output = vec![0.0; BUFFER_LEN];
    let images = FilterImages {
        color: &color,
        albedo: Some(&albedo),
        normal: Some(&normal),
    };
    let mut bound = filter.bind(images, &mut output).unwrap();
    for _ in 0..2 {
        bound.execute().unwrap();
    }
}

#[test]
fn oidn_denoiser_reports_every_run() {
    let color = noise();
    let mut output = vec![0.0; BUFFER_LEN];
    let job = DenoiseJob {
        width: WIDTH,
        height: HEIGHT,
        color: &color,
        albedo: None,
        normal: None,
    };
    let mut denoiser = OidnDenoiser::new(DenoiseOptions::default());
    let mut runs: Vec<(u32, Duration)> = Vec::new();
    denoiser
        .denoise(&job, &mut output, 3, &mut |run, elapsed| runs.push((run, elapsed)))
        .unwrap();
    assert_eq!(runs.iter().map(|r| r.0).collect::<Vec<_>>(), vec![1, 2, 3]);
}

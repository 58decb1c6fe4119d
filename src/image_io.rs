//! Loading and saving images through the `image` crate.
//!
//! Decoded pixels are kept in their native channel layout as normalised `f32`
//! samples, together with the sample depth of the source so the result can be
//! written back at the same precision.

use std::fs;
use std::io;
use std::path::Path;

use image::{
    DynamicImage, ImageBuffer, ImageError, ImageFormat, ImageReader, Luma, LumaA, Rgb, Rgb32FImage,
    Rgba, Rgba32FImage,
};

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleDepth {
    U8,
    U16,
    F32,
}

/// Interleaved image samples, `width * height * channels` long.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelImage {
    width: u32,
    height: u32,
    channels: usize,
    depth: SampleDepth,
    samples: Vec<f32>,
}

impl PixelImage {
    pub fn new(
        width: u32,
        height: u32,
        channels: usize,
        depth: SampleDepth,
        samples: Vec<f32>,
    ) -> Result<PixelImage> {
        if samples.len() != width as usize * height as usize * channels {
            return Err(Error::InvalidImageDimensions);
        }
        Ok(PixelImage {
            width,
            height,
            channels,
            depth,
            samples,
        })
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn depth(&self) -> SampleDepth {
        self.depth
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    pub fn from_dynamic(img: DynamicImage) -> PixelImage {
        let (width, height) = (img.width(), img.height());
        let (channels, depth, samples) = match img {
            DynamicImage::ImageLuma8(b) => (1, SampleDepth::U8, unorm(b.as_raw(), u8::MAX)),
            DynamicImage::ImageLumaA8(b) => (2, SampleDepth::U8, unorm(b.as_raw(), u8::MAX)),
            DynamicImage::ImageRgb8(b) => (3, SampleDepth::U8, unorm(b.as_raw(), u8::MAX)),
            DynamicImage::ImageRgba8(b) => (4, SampleDepth::U8, unorm(b.as_raw(), u8::MAX)),
            DynamicImage::ImageLuma16(b) => (1, SampleDepth::U16, unorm(b.as_raw(), u16::MAX)),
            DynamicImage::ImageLumaA16(b) => (2, SampleDepth::U16, unorm(b.as_raw(), u16::MAX)),
            DynamicImage::ImageRgb16(b) => (3, SampleDepth::U16, unorm(b.as_raw(), u16::MAX)),
            DynamicImage::ImageRgba16(b) => (4, SampleDepth::U16, unorm(b.as_raw(), u16::MAX)),
            DynamicImage::ImageRgb32F(b) => (3, SampleDepth::F32, b.into_raw()),
            DynamicImage::ImageRgba32F(b) => (4, SampleDepth::F32, b.into_raw()),
            other => (4, SampleDepth::F32, other.to_rgba32f().into_raw()),
        };
        PixelImage {
            width,
            height,
            channels,
            depth,
            samples,
        }
    }

    /// Rebuilds an image in the same layout and depth the pixels were loaded with.
    /// Float images with fewer than three channels have no float representation
    /// in `image` and come back as 16-bit.
    pub fn to_dynamic(&self) -> Result<DynamicImage> {
        let (w, h) = (self.width, self.height);
        let img = match (self.depth, self.channels) {
            (SampleDepth::U8, 1) => {
                ImageBuffer::<Luma<u8>, _>::from_raw(w, h, quantize(&self.samples, u8::MAX))
                    .map(DynamicImage::ImageLuma8)
            }
            (SampleDepth::U8, 2) => {
                ImageBuffer::<LumaA<u8>, _>::from_raw(w, h, quantize(&self.samples, u8::MAX))
                    .map(DynamicImage::ImageLumaA8)
            }
            (SampleDepth::U8, 3) => {
                ImageBuffer::<Rgb<u8>, _>::from_raw(w, h, quantize(&self.samples, u8::MAX))
                    .map(DynamicImage::ImageRgb8)
            }
            (SampleDepth::U8, 4) => {
                ImageBuffer::<Rgba<u8>, _>::from_raw(w, h, quantize(&self.samples, u8::MAX))
                    .map(DynamicImage::ImageRgba8)
            }
            (SampleDepth::U16 | SampleDepth::F32, 1) => {
                ImageBuffer::<Luma<u16>, _>::from_raw(w, h, quantize(&self.samples, u16::MAX))
                    .map(DynamicImage::ImageLuma16)
            }
            (SampleDepth::U16 | SampleDepth::F32, 2) => {
                ImageBuffer::<LumaA<u16>, _>::from_raw(w, h, quantize(&self.samples, u16::MAX))
                    .map(DynamicImage::ImageLumaA16)
            }
            (SampleDepth::U16, 3) => {
                ImageBuffer::<Rgb<u16>, _>::from_raw(w, h, quantize(&self.samples, u16::MAX))
                    .map(DynamicImage::ImageRgb16)
            }
            (SampleDepth::U16, 4) => {
                ImageBuffer::<Rgba<u16>, _>::from_raw(w, h, quantize(&self.samples, u16::MAX))
                    .map(DynamicImage::ImageRgba16)
            }
            (SampleDepth::F32, 3) => {
                Rgb32FImage::from_raw(w, h, self.samples.clone()).map(DynamicImage::ImageRgb32F)
            }
            (SampleDepth::F32, 4) => {
                Rgba32FImage::from_raw(w, h, self.samples.clone()).map(DynamicImage::ImageRgba32F)
            }
            (_, channels) => {
                return Err(Error::UnsupportedConversion {
                    from: channels,
                    to: channels,
                });
            }
        };
        img.ok_or(Error::InvalidImageDimensions)
    }
}

fn unorm<T: Copy + Into<f32>>(raw: &[T], max: T) -> Vec<f32> {
    let max = max.into();
    raw.iter().map(|&v| v.into() / max).collect()
}

fn quantize<T: TryFrom<u32> + Default + Copy + Into<f32>>(samples: &[f32], max: T) -> Vec<T> {
    let max = max.into();
    samples
        .iter()
        .map(|&v| {
            let v = (v.clamp(0.0, 1.0) * max).round();
            T::try_from(v as u32).unwrap_or_default()
        })
        .collect()
}

/// Decodes the image at `path`. `kind` names the image in error messages.
pub fn load(kind: &'static str, path: &Path) -> Result<PixelImage> {
    let load_err = |source| Error::Load {
        kind,
        path: path.to_path_buf(),
        source,
    };
    let img = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| load_err(ImageError::IoError(e)))?
        .decode()
        .map_err(load_err)?;
    Ok(PixelImage::from_dynamic(img))
}

/// Encodes `image` in the format implied by the extension of `path`.
pub fn save(image: &PixelImage, path: &Path) -> Result<()> {
    let save_err = |source| Error::Save {
        path: path.to_path_buf(),
        source,
    };
    let format = ImageFormat::from_path(path).map_err(save_err)?;
    let img = encodable(image.to_dynamic()?, format);
    img.save_with_format(path, format).map_err(save_err)
}

/// Converts to a layout the encoder for `format` accepts.
fn encodable(img: DynamicImage, format: ImageFormat) -> DynamicImage {
    let alpha = img.color().has_alpha();
    match format {
        ImageFormat::OpenExr if alpha => img.to_rgba32f().into(),
        ImageFormat::OpenExr | ImageFormat::Hdr => img.to_rgb32f().into(),
        ImageFormat::Jpeg if img.color().has_color() => img.to_rgb8().into(),
        ImageFormat::Jpeg => img.to_luma8().into(),
        ImageFormat::Png | ImageFormat::Tiff => match img {
            DynamicImage::ImageRgb32F(_) => img.to_rgb16().into(),
            DynamicImage::ImageRgba32F(_) => img.to_rgba16().into(),
            // The TIFF encoder has no gray + alpha layout.
            DynamicImage::ImageLumaA8(_) if format == ImageFormat::Tiff => img.to_rgba8().into(),
            DynamicImage::ImageLumaA16(_) if format == ImageFormat::Tiff => img.to_rgba16().into(),
            other => other,
        },
        _ if alpha => img.to_rgba8().into(),
        _ => img.to_rgb8().into(),
    }
}

/// Deletes a previous output so a failed save never leaves a stale result behind.
/// Returns whether a file was removed.
pub fn remove_existing(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(Error::RemoveOutput {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(channels: usize, depth: SampleDepth) -> PixelImage {
        let (w, h) = (4u32, 3u32);
        let n = w as usize * h as usize * channels;
        let samples = (0..n).map(|i| i as f32 / (n - 1) as f32).collect();
        PixelImage::new(w, h, channels, depth, samples).unwrap()
    }

    #[test]
    fn new_rejects_wrong_sample_count() {
        let err = PixelImage::new(2, 2, 3, SampleDepth::F32, vec![0.0; 11]).unwrap_err();
        assert!(matches!(err, Error::InvalidImageDimensions));
    }

    #[test]
    fn u8_samples_are_normalised() {
        let buf = ImageBuffer::<Luma<u8>, _>::from_raw(2, 1, vec![0u8, 255]).unwrap();
        let img = PixelImage::from_dynamic(DynamicImage::ImageLuma8(buf));
        assert_eq!(img.channels(), 1);
        assert_eq!(img.depth(), SampleDepth::U8);
        assert_eq!(img.samples(), &[0.0, 1.0]);
    }

    #[test]
    fn quantize_clamps_out_of_range() {
        let q: Vec<u8> = quantize(&[-0.5, 0.5, 2.0, f32::NAN], u8::MAX);
        assert_eq!(q, vec![0, 128, 255, 0]);
    }

    #[test]
    fn png_keeps_alpha_and_depth() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rgba.png");
        let img = gradient(4, SampleDepth::U16);
        save(&img, &path).unwrap();

        let back = load("beauty", &path).unwrap();
        assert_eq!(back.resolution(), (4, 3));
        assert_eq!(back.channels(), 4);
        assert_eq!(back.depth(), SampleDepth::U16);
        for (a, b) in img.samples().iter().zip(back.samples()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn float_rgb_written_as_png_becomes_16_bit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("float.png");
        save(&gradient(3, SampleDepth::F32), &path).unwrap();
        let back = load("beauty", &path).unwrap();
        assert_eq!(back.depth(), SampleDepth::U16);
        assert_eq!(back.channels(), 3);
    }

    #[test]
    fn gray_alpha_tiff_is_widened_to_rgba() {
        let dir = tempfile::tempdir().unwrap();
        for (depth, read_back) in [
            (SampleDepth::U8, SampleDepth::U8),
            (SampleDepth::U16, SampleDepth::U16),
            (SampleDepth::F32, SampleDepth::U16),
        ] {
            let path = dir.path().join(format!("la_{depth:?}.tif"));
            let img = gradient(2, depth);
            save(&img, &path).unwrap();

            let back = load("beauty", &path).unwrap();
            assert_eq!(back.resolution(), (4, 3));
            assert_eq!(back.channels(), 4);
            assert_eq!(back.depth(), read_back);
            for (got, want) in back.samples().chunks(4).zip(img.samples().chunks(2)) {
                for c in 0..3 {
                    assert!((got[c] - want[0]).abs() < 1e-2, "{depth:?}");
                }
                assert!((got[3] - want[1]).abs() < 1e-2, "{depth:?}");
            }
        }
    }

    #[test]
    fn exr_keeps_float_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hdr.exr");
        let mut img = gradient(3, SampleDepth::F32);
        img.samples_mut()[0] = 12.5;
        save(&img, &path).unwrap();

        let back = load("beauty", &path).unwrap();
        assert_eq!(back.depth(), SampleDepth::F32);
        assert_eq!(back.samples()[0], 12.5);
    }

    #[test]
    fn jpeg_drops_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jpg");
        save(&gradient(4, SampleDepth::U8), &path).unwrap();
        assert_eq!(load("beauty", &path).unwrap().channels(), 3);
    }

    #[test]
    fn missing_file_reports_kind_and_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.png");
        match load("albedo", &path) {
            Err(Error::Load { kind, path: p, .. }) => {
                assert_eq!(kind, "albedo");
                assert_eq!(p, path);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn remove_existing_is_quiet_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        assert!(!remove_existing(&path).unwrap());
        fs::write(&path, b"stale").unwrap();
        assert!(remove_existing(&path).unwrap());
        assert!(!path.exists());
    }
}

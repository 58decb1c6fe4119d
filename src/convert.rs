//! Channel layout conversion between decoded images and the float3 buffers
//! the denoiser consumes.
//!
//! A pixel with `n` channels converts to one with `m` channels by copying the
//! first `min(n, m)` samples. Destination samples past that are left alone,
//! which is what keeps the alpha channel of the beauty intact when the
//! denoised RGB is written back into it.

use rayon::prelude::*;

use crate::error::{Error, Result};

/// Widest pixel layout the conversion table covers.
pub const MAX_CHANNELS: usize = 4;

/// Channel count of the denoiser's buffers.
pub const FLOAT3: usize = 3;

fn check_channels(from: usize, to: usize) -> Result<()> {
    let supported = 1..=MAX_CHANNELS;
    if supported.contains(&from) && supported.contains(&to) {
        Ok(())
    } else {
        Err(Error::UnsupportedConversion { from, to })
    }
}

/// Converts a single pixel; the slice lengths are the channel counts.
pub fn convert_pixel(src: &[f32], dst: &mut [f32]) -> Result<()> {
    check_channels(src.len(), dst.len())?;
    let n = src.len().min(dst.len());
    dst[..n].copy_from_slice(&src[..n]);
    Ok(())
}

/// Converts every pixel of `src` into the matching pixel of `dst`.
pub fn convert_buffer(
    src: &[f32],
    src_channels: usize,
    dst: &mut [f32],
    dst_channels: usize,
) -> Result<()> {
    check_channels(src_channels, dst_channels)?;
    if src.len() % src_channels != 0 {
        return Err(Error::RaggedBuffer {
            len: src.len(),
            channels: src_channels,
        });
    }
    if dst.len() % dst_channels != 0 {
        return Err(Error::RaggedBuffer {
            len: dst.len(),
            channels: dst_channels,
        });
    }
    if src.len() / src_channels != dst.len() / dst_channels {
        return Err(Error::InvalidImageDimensions);
    }

    src.par_chunks_exact(src_channels)
        .zip(dst.par_chunks_exact_mut(dst_channels))
        .try_for_each(|(s, d)| convert_pixel(s, d))
}

/// Expands or narrows interleaved samples into a fresh float3 buffer.
/// Channels the source lacks stay zero.
pub fn to_float3(samples: &[f32], channels: usize) -> Result<Vec<f32>> {
    if channels == 0 {
        return Err(Error::UnsupportedConversion {
            from: channels,
            to: FLOAT3,
        });
    }
    let mut rgb = vec![0f32; samples.len() / channels * FLOAT3];
    convert_buffer(samples, channels, &mut rgb, FLOAT3)?;
    Ok(rgb)
}

/// Writes a float3 buffer back into `samples` in its own layout.
pub fn from_float3(rgb: &[f32], samples: &mut [f32], channels: usize) -> Result<()> {
    convert_buffer(rgb, FLOAT3, samples, channels)
}

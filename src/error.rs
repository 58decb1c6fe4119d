use std::path::PathBuf;

use thiserror::Error;

/// Everything that can stop a denoising run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to load {kind} image {}", path.display())]
    Load {
        kind: &'static str,
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("could not save file {}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("could not remove existing output {}", path.display())]
    RemoveOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no input image could be loaded")]
    MissingInput,

    #[error("no output image path given")]
    MissingOutput,

    #[error("no output file extension")]
    MissingExtension,

    #[error("you cannot use a normal AOV without an albedo")]
    NormalWithoutAlbedo,

    #[error("{kind} image not same resolution as beauty ({found_w}x{found_h} vs {want_w}x{want_h})")]
    ResolutionMismatch {
        kind: &'static str,
        found_w: u32,
        found_h: u32,
        want_w: u32,
        want_h: u32,
    },

    #[error("unsupported channel conversion from {from} to {to} channels")]
    UnsupportedConversion { from: usize, to: usize },

    #[error("failed to convert {kind} to {target}")]
    Conversion {
        kind: &'static str,
        target: &'static str,
        #[source]
        source: Box<Error>,
    },

    #[error("pixel buffer holds {len} samples, expected a multiple of {channels}")]
    RaggedBuffer { len: usize, channels: usize },

    #[error("invalid image dimensions for the denoising filter")]
    InvalidImageDimensions,

    #[error("[OIDN]: {message} (code {code})")]
    Oidn { code: u32, message: String },

    #[error("failed to create the OIDN {0}")]
    Creation(&'static str),

    #[error("built without OpenImageDenoise; set OIDN_DIR or install it for pkg-config and rebuild")]
    BackendUnavailable,
}

pub type Result<T> = std::result::Result<T, Error>;

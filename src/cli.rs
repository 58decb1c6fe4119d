use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgAction, Parser};

use oidn_denoise::{DenoiseOptions, Request};

/// Flags that take the single-dash long form, e.g. `-hdr 0`.
const SINGLE_DASH_LONG: &[&str] = &["hdr", "srgb", "affinity", "repeat", "maxmem", "clean_aux"];

#[derive(Parser, Debug)]
#[command(
    name = "denoise",
    version,
    about = "OIDN AI Denoiser command line app",
    disable_help_flag = true,
    after_help = "Single-dash spellings such as -hdr 0, -hdr=0 or -clean_aux 1 are accepted as well."
)]
pub struct CliArgs {
    /// print the parameter list; denoising still runs when other flags are given
    #[arg(short = 'h', long = "help", action = ArgAction::SetTrue)]
    pub help: bool,

    /// path to input image
    #[arg(short = 'i', long = "input", value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// path to output image
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// path to input albedo AOV (optional)
    #[arg(short = 'a', long = "albedo", value_name = "PATH")]
    pub albedo: Option<PathBuf>,

    /// path to input normal AOV (optional, requires albedo AOV)
    #[arg(short = 'n', long = "normal", value_name = "PATH")]
    pub normal: Option<PathBuf>,

    /// Image is a HDR image. Disabling will assume the image is in sRGB (default 1 i.e. enabled)
    #[arg(long = "hdr", value_name = "INT", allow_negative_numbers = true)]
    pub hdr: Option<i32>,

    /// whether the main input image is encoded with the sRGB (or 2.2 gamma) curve (LDR only) or is linear (default 0 i.e. disabled)
    #[arg(long = "srgb", value_name = "INT", allow_negative_numbers = true)]
    pub srgb: Option<i32>,

    /// number of threads to use (default is all)
    #[arg(
        short = 't',
        long = "threads",
        value_name = "INT",
        default_value_t = 0,
        allow_negative_numbers = true
    )]
    pub threads: i32,

    /// Enable affinity. This pins virtual threads to physical cores and can improve performance (default 0 i.e. disabled)
    #[arg(long = "affinity", value_name = "INT", allow_negative_numbers = true)]
    pub affinity: Option<i32>,

    /// Execute the denoiser N times. Useful for profiling.
    #[arg(long = "repeat", value_name = "INT", default_value_t = 1, allow_negative_numbers = true)]
    pub repeat: i32,

    /// Maximum memory size used by the denoiser in MB
    #[arg(long = "maxmem", value_name = "INT", allow_negative_numbers = true)]
    pub maxmem: Option<i32>,

    /// Whether the auxiliary feature (albedo, normal) images are noise-free; recommended for highest quality but should *not* be enabled for noisy auxiliary images to avoid residual noise (default 0 i.e. disabled)
    #[arg(long = "clean_aux", value_name = "INT", allow_negative_numbers = true)]
    pub clean_aux: Option<i32>,

    /// log verbosity level 0:disabled 1:simple 2:full
    #[arg(short = 'v', long = "verbosity", value_name = "INT", default_value_t = 2)]
    pub verbosity: u8,
}

/// Rewrites `-hdr` and `-hdr=0` style flags to `--hdr` so clap can parse them.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some(s) if is_single_dash_long(s) => OsString::from(format!("-{s}")),
            _ => arg,
        })
        .collect()
}

fn is_single_dash_long(arg: &str) -> bool {
    let Some(rest) = arg.strip_prefix('-') else {
        return false;
    };
    let name = rest.split_once('=').map_or(rest, |(name, _)| name);
    SINGLE_DASH_LONG.contains(&name)
}

fn enabled(flag: Option<i32>) -> bool {
    flag.is_some_and(|v| v != 0)
}

impl CliArgs {
    /// `-h` with nothing to denoise: print the parameters and stop.
    pub fn help_only(&self) -> bool {
        self.help && self.input.is_none() && self.output.is_none()
    }

    pub fn options(&self) -> DenoiseOptions {
        let hdr = self.hdr.is_none_or(|v| v != 0);
        let srgb = match self.srgb {
            Some(v) => v != 0,
            None => !hdr,
        };
        DenoiseOptions {
            hdr,
            srgb,
            clean_aux: enabled(self.clean_aux),
            threads: u32::try_from(self.threads).unwrap_or(0),
            affinity: enabled(self.affinity),
            repeat: u32::try_from(self.repeat.max(1)).unwrap_or(1),
            max_memory_mb: self.maxmem.and_then(|mb| u32::try_from(mb).ok()),
        }
    }

    /// Echoes the settings to the log and builds the request.
    pub fn into_request(self) -> Request {
        let options = self.options();
        if let Some(path) = &self.output {
            tracing::debug!("Output image: {}", path.display());
        }
        if self.hdr.is_some() {
            tracing::debug!(
                "HDR training data {}",
                if options.hdr { "enabled" } else { "disabled" }
            );
        }
        if !options.hdr && self.srgb.is_none() {
            tracing::info!("Enabling sRGB mode due to LDR");
        }
        if self.srgb.is_some() {
            tracing::debug!(
                "sRGB mode {}",
                if options.srgb { "enabled" } else { "disabled" }
            );
        }
        if options.threads > 0 {
            tracing::debug!("Number of threads set to {}", options.threads);
        }
        if self.affinity.is_some() {
            tracing::debug!(
                "Affinity {}",
                if options.affinity { "enabled" } else { "disabled" }
            );
        }
        if options.repeat > 1 {
            tracing::debug!("Number of repeats set to {}", options.repeat);
        }
        if let Some(mb) = options.max_memory_mb {
            tracing::debug!("Maximum denoiser memory set to {}MB", mb);
        }
        if self.clean_aux.is_some() {
            tracing::debug!(
                "cleanAux {}",
                if options.clean_aux { "enabled" } else { "disabled" }
            );
        }

        Request {
            input: self.input,
            output: self.output,
            albedo: self.albedo,
            normal: self.normal,
            options: options.reconcile(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<CliArgs, clap::Error> {
        let argv = std::iter::once("denoise")
            .chain(args.iter().copied())
            .map(OsString::from);
        CliArgs::try_parse_from(normalize_args(argv))
    }

    #[test]
    fn single_dash_long_flags_are_rewritten() {
        let args: Vec<OsString> = ["-hdr", "0", "--srgb", "-i", "-clean_aux", "-hdrx"]
            .into_iter()
            .map(OsString::from)
            .collect();
        let normalized = normalize_args(args);
        assert_eq!(
            normalized,
            ["--hdr", "0", "--srgb", "-i", "--clean_aux", "-hdrx"]
                .map(OsString::from)
                .to_vec()
        );
    }

    #[test]
    fn parses_the_classic_command_line() {
        let args = parse(&[
            "-i", "beauty.exr", "-o", "out.exr", "-a", "albedo.exr", "-n", "normal.exr", "-hdr",
            "1", "-t", "8", "-affinity", "1", "-repeat", "4", "-maxmem", "1024", "-clean_aux",
            "1", "-v", "1",
        ])
        .unwrap();
        assert_eq!(args.verbosity, 1);
        let request = args.into_request();
        assert_eq!(request.input, Some(PathBuf::from("beauty.exr")));
        assert_eq!(request.albedo, Some(PathBuf::from("albedo.exr")));
        assert_eq!(request.normal, Some(PathBuf::from("normal.exr")));
        assert_eq!(
            request.options,
            DenoiseOptions {
                hdr: true,
                srgb: false,
                clean_aux: true,
                threads: 8,
                affinity: true,
                repeat: 4,
                max_memory_mb: Some(1024),
            }
        );
    }

    #[test]
    fn defaults_match_the_help_text() {
        let args = parse(&["-i", "a.png", "-o", "b.png"]).unwrap();
        assert_eq!(args.verbosity, 2);
        assert_eq!(args.into_request().options, DenoiseOptions::default());
    }

    #[test]
    fn ldr_implies_srgb_unless_told_otherwise() {
        let implied = parse(&["-hdr", "0"]).unwrap().options();
        assert!(!implied.hdr);
        assert!(implied.srgb);

        let linear = parse(&["-hdr", "0", "-srgb", "0"]).unwrap().options();
        assert!(!linear.srgb);
    }

    #[test]
    fn srgb_is_dropped_for_hdr_input() {
        let request = parse(&["-srgb", "1"]).unwrap().into_request();
        assert!(request.options.hdr);
        assert!(!request.options.srgb);
    }

    #[test]
    fn out_of_range_numbers_fall_back() {
        let options = parse(&["-repeat", "-3", "-maxmem", "-1"]).unwrap().options();
        assert_eq!(options.repeat, 1);
        assert_eq!(options.max_memory_mb, None);
    }

    #[test]
    fn bare_help_stops_after_printing() {
        assert!(parse(&["-h"]).unwrap().help_only());
        assert!(parse(&["--help"]).unwrap().help_only());
        assert!(!parse(&["-i", "a.exr"]).unwrap().help_only());
    }

    #[test]
    fn help_mid_line_still_denoises() {
        let args = parse(&["-i", "a.exr", "-o", "b.exr", "-h"]).unwrap();
        assert!(args.help);
        assert!(!args.help_only());
        let request = args.into_request();
        assert_eq!(request.input, Some(PathBuf::from("a.exr")));
        assert_eq!(request.output, Some(PathBuf::from("b.exr")));
    }

    #[test]
    fn unknown_flags_are_rejected() {
        let unknown = parse(&["-x", "1"]).unwrap_err();
        assert_eq!(unknown.kind(), ErrorKind::UnknownArgument);
        assert!(unknown.use_stderr());
    }

    #[test]
    fn negative_values_are_read_like_stoi() {
        let options = parse(&[
            "-t", "-1", "-hdr", "-1", "-srgb", "-1", "-affinity", "-1", "-clean_aux", "-1",
        ])
        .unwrap()
        .options();
        assert_eq!(options.threads, 0);
        assert!(options.hdr);
        assert!(options.srgb);
        assert!(options.affinity);
        assert!(options.clean_aux);
    }

    #[test]
    fn equals_form_is_rewritten() {
        let args: Vec<OsString> = ["-hdr=0", "-clean_aux=1", "-x=1"]
            .into_iter()
            .map(OsString::from)
            .collect();
        assert_eq!(
            normalize_args(args),
            ["--hdr=0", "--clean_aux=1", "-x=1"].map(OsString::from).to_vec()
        );

        let options = parse(&["-hdr=0", "-srgb=0"]).unwrap().options();
        assert!(!options.hdr);
        assert!(!options.srgb);
    }

    #[test]
    fn non_numeric_flag_values_are_rejected() {
        assert!(parse(&["-hdr", "yes"]).is_err());
        assert!(parse(&["-t", "many"]).is_err());
    }
}

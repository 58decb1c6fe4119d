//! `denoise` entrypoint: parse flags, set up logging, run the pipeline and
//! map the outcome to the process exit status.

use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context as _;
use clap::{CommandFactory, Parser};

use oidn_denoise::{OidnDenoiser, logging, pipeline};

mod cli;

fn main() -> ExitCode {
    let start = Instant::now();
    let argv = cli::normalize_args(std::env::args_os());
    if argv.len() <= 1 {
        let _ = cli::CliArgs::command().print_help();
        return ExitCode::SUCCESS;
    }
    let args = match cli::CliArgs::try_parse_from(argv) {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    if args.help {
        let _ = cli::CliArgs::command().print_help();
        if args.help_only() {
            return ExitCode::SUCCESS;
        }
    }

    logging::init(args.verbosity, start);
    tracing::info!(
        "Launching OIDN AI Denoiser command line app v{}",
        env!("CARGO_PKG_VERSION")
    );

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            for cause in e.chain() {
                tracing::error!("{}", cause);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: cli::CliArgs) -> anyhow::Result<()> {
    let request = args.into_request();
    let mut denoiser = OidnDenoiser::new(request.options);
    pipeline::run(&request, &mut denoiser).context("denoising failed")
}

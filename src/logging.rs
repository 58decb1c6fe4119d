//! Console output in the denoiser's classic layout: time since start, an
//! optional severity tag and the message.
//!
//! ```text
//! 00:00:012       | Input image: beauty.exr
//! 00:01:530 ERROR | Normal image not same resolution as beauty
//! ```

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{Event, Level, Subscriber};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Maps the `-v` level to a filter: 0 keeps errors only, 1 adds progress
/// messages, 2 and above add per-file detail.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::ERROR,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    }
}

/// `MM:SS:mmm`
pub fn clock(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!(
        "{:02}:{:02}:{:03}",
        secs / 60,
        secs % 60,
        elapsed.subsec_millis()
    )
}

pub struct ElapsedFormat {
    start: Instant,
}

impl ElapsedFormat {
    pub fn new(start: Instant) -> ElapsedFormat {
        ElapsedFormat { start }
    }
}

impl<S, N> FormatEvent<S, N> for ElapsedFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let tag = match *event.metadata().level() {
            Level::ERROR => "ERROR",
            Level::WARN => " WARN",
            _ => "     ",
        };
        write!(writer, "{} {} | ", clock(self.start.elapsed()), tag)?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Installs the global subscriber. Warnings and errors go to stderr, the rest to stdout.
pub fn init(verbosity: u8, start: Instant) {
    let writer = std::io::stderr
        .with_max_level(Level::WARN)
        .or_else(std::io::stdout);
    let _ = tracing_subscriber::fmt()
        .with_max_level(level_for(verbosity))
        .with_writer(writer)
        .event_format(ElapsedFormat::new(start))
        .try_init();
}

//! `tracing` subscriber: a terminal formatter and a plain-text log file.
use std::fmt;
use std::fs;
use std::io::Write as _;
use std::sync::{Mutex, PoisonError};

use tracing::Level;
use tracing::field::{Field, Visit};

use super::types::{DRY_RUN, OUTPUT, STAGE};
use super::utils::{log_path, plain_text, utc_now};

/// Fields jumpstart events carry.
#[derive(Default)]
struct Fields {
    message: String,
    stderr: bool,
}

impl Fields {
    fn of(event: &tracing::Event<'_>) -> Self {
        let mut fields = Self::default();
        event.record(&mut fields);
        fields
    }
}

impl Visit for Fields {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            value.clone_into(&mut self.message);
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == "stderr" {
            self.stderr = value;
        }
    }
}

/// Writes every event, debug included, to the command's log file.
#[derive(Debug)]
struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Truncate the log for `command` and start it with a header.
    fn open(command: &str) -> Option<Self> {
        let path = log_path(command)?;
        let mut file = fs::File::create(&path).ok()?;
        writeln!(
            file,
            "# jumpstart {} {command} started {} UTC",
            crate::commands::version::version(),
            utc_now("%Y-%m-%d %H:%M:%S"),
        )
        .ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }

    fn line(level: Level, target: &str, fields: &Fields) -> String {
        let msg = plain_text(&fields.message);
        let tag = match (level, target) {
            (_, OUTPUT) if fields.stderr => "err|",
            (_, OUTPUT) => "out|",
            (_, STAGE) => "====",
            (_, DRY_RUN) => "plan",
            (Level::ERROR, _) => "ERR ",
            (Level::WARN, _) => "WARN",
            (Level::DEBUG | Level::TRACE, _) => "dbg ",
            _ => "    ",
        };
        format!("{} {tag} {msg}", utc_now("%H:%M:%S%.3f"))
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let meta = event.metadata();
        let line = Self::line(*meta.level(), meta.target(), &Fields::of(event));
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(file, "{line}").ok();
    }
}

/// Terminal layout: stage headers in bold, relayed output indented.
struct ConsoleFormatter;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for ConsoleFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        let Fields { message, stderr } = Fields::of(event);
        match (*meta.level(), meta.target()) {
            (Level::ERROR, _) => writeln!(writer, "\x1b[1;31merror:\x1b[0m {message}"),
            (Level::WARN, _) => writeln!(writer, "\x1b[1;33mwarning:\x1b[0m {message}"),
            (_, STAGE) => writeln!(writer, "\x1b[1;34m::\x1b[0m \x1b[1m{message}\x1b[0m"),
            (_, DRY_RUN) => writeln!(writer, "   \x1b[36mwould run\x1b[0m {message}"),
            (_, OUTPUT) if stderr => writeln!(writer, "   \x1b[2m│ {message}\x1b[0m"),
            (_, OUTPUT) => writeln!(writer, "   │ {message}"),
            (Level::INFO, _) => writeln!(writer, "   {message}"),
            _ => writeln!(writer, "   \x1b[2m{message}\x1b[0m"),
        }
    }
}

/// Install the global subscriber. Call once, before anything logs.
///
/// The console shows `info` and up (`debug` too when `verbose`), with
/// warnings and errors on stderr. The log file for `command` always gets
/// `debug` and up; if it cannot be created the run continues without it.
pub fn init_subscriber(verbose: bool, command: &str) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let console_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let writer = std::io::stderr
        .with_max_level(Level::WARN)
        .and(std::io::stdout.with_min_level(Level::INFO));
    let console = fmt::layer()
        .event_format(ConsoleFormatter)
        .with_writer(writer)
        .with_filter(console_level);
    let file = FileLayer::open(command).map(|layer| layer.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry().with(console).with(file).init();
}

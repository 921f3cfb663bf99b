//! Global subscriber: console output on stdout/stderr plus the run log.
//!
//! Console lines follow the tool's plain style. Progress goes to stdout as
//! is, problems go to stderr prefixed with `warning:` or `error:`. The run
//! log gets every event with a timestamp, below a header naming the
//! operands of the run.
use std::fs;
use std::io::Write as _;
use std::sync::Mutex;

use tracing::Level;
use tracing_subscriber::filter::LevelFilter;

use super::utils::{format_utc_datetime, format_utc_time, log_file_path, strip_ansi};

/// Target used for stage headers.
pub(super) const STAGE_TARGET: &str = "pkg_install::stage";
/// Target used for dry-run command echoes.
pub(super) const DRY_RUN_TARGET: &str = "pkg_install::dry_run";

/// How an event is rendered, decided by its level and target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Stage,
    DryRun,
    Info,
    Debug,
    Warning,
    Error,
}

impl LineKind {
    fn of(level: Level, target: &str) -> Self {
        match level {
            Level::ERROR => Self::Error,
            Level::WARN => Self::Warning,
            Level::INFO if target == STAGE_TARGET => Self::Stage,
            Level::INFO if target == DRY_RUN_TARGET => Self::DryRun,
            Level::INFO => Self::Info,
            _ => Self::Debug,
        }
    }

    /// Console text for `msg`, colours included.
    fn console(self, msg: &str) -> String {
        match self {
            Self::Stage => format!("\x1b[1m==> {msg}\x1b[0m"),
            Self::DryRun => format!("\x1b[36m[dry run]\x1b[0m {msg}"),
            Self::Info => msg.to_string(),
            Self::Debug => format!("\x1b[2m{msg}\x1b[0m"),
            Self::Warning => format!("\x1b[33mwarning:\x1b[0m {msg}"),
            Self::Error => format!("\x1b[31merror:\x1b[0m {msg}"),
        }
    }

    /// Tag written after the timestamp in the run log.
    const fn tag(self) -> Option<&'static str> {
        match self {
            Self::Stage => Some("==>"),
            Self::DryRun => Some("[dry run]"),
            Self::Info => None,
            Self::Debug => Some("[debug]"),
            Self::Warning => Some("[warn]"),
            Self::Error => Some("[error]"),
        }
    }
}

/// One run-log line: timestamp, optional tag, message without colours.
fn file_line(ts: &str, kind: LineKind, msg: &str) -> String {
    let msg = strip_ansi(msg);
    match kind.tag() {
        Some(tag) => format!("[{ts}] {tag} {msg}"),
        None => format!("[{ts}] {msg}"),
    }
}

/// Header opening the run log.
fn file_header(operands: &[String]) -> String {
    let operands = if operands.is_empty() {
        "(none)".to_string()
    } else {
        operands.join(" ")
    };
    format!(
        "# pkg-install {} started {}\n# operands: {operands}\n",
        crate::version(),
        format_utc_datetime(),
    )
}

/// Console verbosity: directive traces are `debug` and shown only with
/// `--verbose`.
const fn console_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    }
}

fn event_message(event: &tracing::Event<'_>) -> String {
    let mut visitor = MessageVisitor::default();
    event.record(&mut visitor);
    visitor.0
}

#[derive(Default)]
struct MessageVisitor(String);

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.0 = value.to_string();
        }
    }
}

/// Layer appending every event to the run log, whatever the console
/// verbosity.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Truncate the log for `command`, write the header and open it for
    /// appending. `None` when the cache directory is unusable.
    pub(super) fn new(command: &str, operands: &[String]) -> Option<Self> {
        let path = log_file_path(command)?;
        fs::write(&path, file_header(operands)).ok()?;
        let file = fs::OpenOptions::new().append(true).open(&path).ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let metadata = event.metadata();
        let kind = LineKind::of(*metadata.level(), metadata.target());
        let line = file_line(&format_utc_time(), kind, &event_message(event));
        if let Ok(mut f) = self.file.lock() {
            writeln!(f, "{line}").ok();
        }
    }
}

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
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let kind = LineKind::of(*metadata.level(), metadata.target());
        writeln!(writer, "{}", kind.console(&event_message(event)))
    }
}

/// Install the global subscriber. Call once at startup.
///
/// `warning:` and `error:` lines go to stderr, everything else to stdout.
/// The run log at `$XDG_CACHE_HOME/pkg-install/<command>.log` records every
/// event including `debug`, and its header lists `operands`.
pub fn init_subscriber(verbose: bool, command: &str, operands: &[String]) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
    };

    let make_writer = std::io::stderr
        .with_max_level(Level::WARN)
        .and(std::io::stdout.with_min_level(Level::INFO));

    let console_layer = fmt::layer()
        .event_format(ConsoleFormatter)
        .with_writer(make_writer)
        .with_filter(console_level(verbose));

    let file_layer =
        FileLayer::new(command, operands).map(|l| l.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
}

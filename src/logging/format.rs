use colored::Color;
use std::fmt;
use std::fmt::Write;
use std::fmt::{Debug, Display};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, FormattedFields};
use tracing_subscriber::registry::LookupSpan;

/// One line per event:
/// `2026-01-31 23:59:59.000 INF routes::admin@<trace_id> {span fields} message key=value`
pub(super) struct Formatter {
    use_colors: bool,
}

impl Formatter {
    pub(super) fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }
}

impl<S, N> FormatEvent<S, N> for Formatter
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
        let meta = event.metadata();
        let now = chrono::Local::now();
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let mut trace_id = String::new();
        let mut span_fields = String::new();
        for span in ctx
            .event_scope()
            .into_iter()
            .flat_map(tracing_subscriber::registry::Scope::from_root)
        {
            let exts = span.extensions();
            let Some(fields) = exts.get::<FormattedFields<N>>() else {
                continue;
            };
            if fields.is_empty() {
                continue;
            }
            if let Some(id) = fields.strip_prefix("trace_id=") {
                trace_id = format!("@{id}");
                continue;
            }
            span_fields.push_str(if span_fields.is_empty() { " {" } else { " " });
            span_fields.push_str(fields);
        }
        if !span_fields.is_empty() {
            span_fields.push('}');
        }
        let target = meta
            .target()
            .strip_prefix("devicegate::")
            .unwrap_or(meta.target());
        let level = LevelLabel::new(meta.level(), self.use_colors);
        let location = format!("{target}{trace_id}{span_fields}");

        if self.use_colors {
            write!(
                writer,
                "{} {} {} {}{}",
                Dimmed(now.format("%F %X%.3f")),
                level,
                Dimmed(location),
                visitor.message,
                visitor.fields
            )?;
        } else {
            write!(
                writer,
                "{} {} {} {}{}",
                now.format("%F %X%.3f"),
                level,
                location,
                visitor.message,
                visitor.fields
            )?;
        }
        writeln!(writer)
    }
}

#[derive(Default)]
struct EventVisitor {
    message: String,
    fields: String,
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            write!(self.fields, " {}={}", field.name(), value).ok();
        }
    }
    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == "message" {
            write!(self.message, "{:?}", value).ok();
        } else {
            write!(self.fields, " {}={:?}", field.name(), value).ok();
        }
    }
}

struct LevelLabel {
    label: &'static str,
    color: Option<Color>,
}

impl LevelLabel {
    fn new(level: &Level, use_colors: bool) -> Self {
        let (label, color) = match *level {
            Level::ERROR => ("ERR", Color::BrightRed),
            Level::WARN => ("WRN", Color::BrightYellow),
            Level::INFO => ("INF", Color::BrightBlue),
            Level::DEBUG => ("DBG", Color::BrightMagenta),
            Level::TRACE => ("TRC", Color::BrightWhite),
        };
        Self {
            label,
            color: use_colors.then_some(color),
        }
    }
}

impl Display for LevelLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.color {
            Some(color) => write!(f, "\x1B[{}m{}\x1B[0m", color.to_fg_str(), self.label),
            None => f.write_str(self.label),
        }
    }
}

struct Dimmed<T>(T);

impl<T: Display> Display for Dimmed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\x1B[{}m{}\x1B[0m", Color::BrightBlack.to_fg_str(), self.0)
    }
}

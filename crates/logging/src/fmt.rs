//! Render `tracing` events into concise logfmt strings.
//!
//! [`render_event`] extracts level, target, message and the remaining fields
//! of an event; [`LogfmtLayer`] writes one rendered line per event.

use std::{
    fmt::{Debug, Write as _},
    io::{self, Write as _},
};

use tracing::{
    Event, Metadata, Subscriber,
    field::{Field, Visit},
};
use tracing_subscriber::{Layer, fmt::MakeWriter, layer::Context};

/// Rendered fields extracted from a tracing Event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLog {
    /// Severity level (e.g., INFO, WARN) for the event.
    pub level: String,
    /// Event target (typically the module path).
    pub target: String,
    /// Human-readable message, or the rendered fields when there is none.
    pub message: String,
    /// Non-message fields as `(key, value)` pairs, in record order.
    pub fields: Vec<(String, String)>,
}

impl RenderedLog {
    /// Render as a single logfmt line.
    pub fn to_logfmt(&self) -> String {
        let mut out = format!(
            "level={} target={} msg={}",
            self.level.to_ascii_lowercase(),
            self.target,
            quote(&self.message)
        );
        for (key, value) in &self.fields {
            let _ignored = write!(out, " {}={}", key, quote(value));
        }
        out
    }
}

/// Quote a logfmt value when it contains spaces, quotes or `=`.
fn quote(value: &str) -> String {
    if value.is_empty() || value.contains([' ', '"', '=']) {
        format!("{value:?}")
    } else {
        value.to_string()
    }
}

/// Extract level, target, message and fields from a tracing Event.
///
/// Behavior:
/// - If the event contains a `message` field, use it.
/// - Otherwise, the message is the `key=value` pairs of the remaining fields.
pub fn render_event(event: &Event<'_>) -> RenderedLog {
    struct MsgVisitor {
        /// Captured `message` field, if present.
        msg: Option<String>,
        /// Non-message fields.
        fields: Vec<(String, String)>,
    }
    impl Visit for MsgVisitor {
        fn record_str(&mut self, field: &Field, value: &str) {
            if field.name() == "message" {
                self.msg = Some(value.to_string());
            } else {
                self.fields
                    .push((field.name().to_string(), value.to_string()));
            }
        }
        fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
            if field.name() == "message" {
                self.msg = Some(format!("{:?}", value));
            } else {
                self.fields
                    .push((field.name().to_string(), format!("{:?}", value)));
            }
        }
    }
    let meta: &Metadata<'_> = event.metadata();
    let mut vis = MsgVisitor {
        msg: None,
        fields: Vec::new(),
    };
    event.record(&mut vis);
    let message = vis.msg.unwrap_or_else(|| {
        vis.fields
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ")
    });
    RenderedLog {
        level: meta.level().to_string(),
        target: meta.target().to_string(),
        message,
        fields: vis.fields,
    }
}

/// Layer writing every event as one logfmt line.
pub struct LogfmtLayer<W> {
    /// Destination factory.
    make_writer: W,
}

impl LogfmtLayer<fn() -> io::Stderr> {
    /// Layer writing to standard error.
    pub fn stderr() -> Self {
        Self {
            make_writer: io::stderr,
        }
    }
}

impl<W> LogfmtLayer<W>
where
    W: for<'a> MakeWriter<'a> + 'static,
{
    /// Layer writing to `make_writer`.
    pub fn new(make_writer: W) -> Self {
        Self { make_writer }
    }
}

impl<S, W> Layer<S> for LogfmtLayer<W>
where
    S: Subscriber,
    W: for<'a> MakeWriter<'a> + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let line = render_event(event).to_logfmt();
        let mut writer = self.make_writer.make_writer();
        let _ignored = writeln!(writer, "{line}");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tracing::{info, subscriber::with_default, warn};
    use tracing_subscriber::{layer::SubscriberExt, registry};

    use super::*;

    #[derive(Clone, Default)]
    struct Buf(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Buf {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(data);
            Ok(data.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture(f: impl FnOnce()) -> Vec<String> {
        let buf = Buf::default();
        let sink = buf.clone();
        let subscriber = registry().with(LogfmtLayer::new(move || sink.clone()));
        with_default(subscriber, f);
        let bytes = buf.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn message_and_fields_render_as_logfmt() {
        let lines = capture(|| info!(window = "w1", slot = "exit", "animation started"));
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("level=info target="), "{}", lines[0]);
        assert!(lines[0].contains("msg=\"animation started\""));
        assert!(lines[0].ends_with("window=w1 slot=exit"), "{}", lines[0]);
    }

    #[test]
    fn fields_become_message_when_absent() {
        let lines = capture(|| warn!(count = 3));
        assert!(lines[0].contains("level=warn"));
        assert!(lines[0].contains("msg=\"count=3\"") || lines[0].contains("msg=count=3"));
    }

    #[test]
    fn quoting_rules() {
        assert_eq!(quote("plain"), "plain");
        assert_eq!(quote("two words"), "\"two words\"");
        assert_eq!(quote(""), "\"\"");
    }
}

//! Output and notification sinks
//!
//! `OutputSink` is the line-write target used for diagnostics, `info`
//! printing, and default monitor formatting. `NotificationSink` selects how
//! a monitor reports changes: a formatted write through an `OutputSink`, or
//! a user-supplied callback.

use crate::provider::MonitorCallback;
use crate::types::Notification;
use std::io::Write;
use std::sync::{Arc, Mutex};

/// Line-write capable output target
pub trait OutputSink: Send + Sync {
    /// Write one line (newline appended by the sink)
    fn write_line(&self, line: &str);
}

/// Default output sink — writes to standard output
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn write_line(&self, line: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", line);
    }
}

/// In-memory output sink for testing
///
/// Captures lines in memory — lost on drop, but useful for tests and for
/// embedding code that wants to inspect session diagnostics.
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    /// All lines written so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    /// Discard captured lines
    pub fn clear(&self) {
        self.lines.lock().unwrap().clear();
    }
}

impl OutputSink for MemorySink {
    fn write_line(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }
}

/// Where a monitor's change notifications go
///
/// Exactly one variant is attached per monitor, selected at registration
/// time.
pub enum NotificationSink {
    /// Format each notification and write it through an output sink
    Writer(Arc<dyn OutputSink>),
    /// Hand each notification to a user-supplied callback
    Callback(MonitorCallback),
}

impl NotificationSink {
    /// Formatted-write sink backed by `sink`
    pub fn writer(sink: Arc<dyn OutputSink>) -> Self {
        NotificationSink::Writer(sink)
    }

    /// User-callback sink
    pub fn callback(f: impl Fn(Notification) + Send + Sync + 'static) -> Self {
        NotificationSink::Callback(Arc::new(f))
    }

    /// Lower to the callback the PV handle subscribes
    pub(crate) fn into_callback(self) -> MonitorCallback {
        match self {
            NotificationSink::Callback(f) => f,
            NotificationSink::Writer(sink) => Arc::new(move |notification: Notification| {
                sink.write_line(&format_notification(&notification));
            }),
        }
    }
}

/// Default monitor line format: name (truncated to 32 chars), timestamp,
/// then the formatted value or its plain rendering
pub fn format_notification(notification: &Notification) -> String {
    format!(
        "{:.32} {} {}",
        notification.pv_name,
        notification.timestamp.format("%Y-%m-%d %H:%M:%S%.6f"),
        notification.rendered(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PvValue;

    #[test]
    fn test_memory_sink_captures_lines() {
        let sink = MemorySink::default();
        sink.write_line("first");
        sink.write_line("second");
        assert_eq!(sink.lines(), vec!["first", "second"]);

        sink.clear();
        assert!(sink.lines().is_empty());
    }

    #[test]
    fn test_format_notification_truncates_name() {
        let long_name = "X".repeat(50);
        let n = Notification::new(long_name, PvValue::Int(3), None);
        let line = format_notification(&n);
        assert!(line.starts_with(&"X".repeat(32)));
        assert!(!line.contains(&"X".repeat(33)));
        assert!(line.ends_with(" 3"));
    }

    #[test]
    fn test_format_notification_prefers_formatted_value() {
        let n = Notification::new("XPP:SHUTTER", PvValue::Enum(1), Some("OPEN".into()));
        assert!(format_notification(&n).ends_with(" OPEN"));

        let n = Notification::new("XPP:SHUTTER", PvValue::Enum(1), None);
        assert!(format_notification(&n).ends_with(" 1"));
    }

    #[test]
    fn test_writer_sink_formats_through_output() {
        let output = Arc::new(MemorySink::default());
        let callback = NotificationSink::writer(output.clone()).into_callback();

        callback(Notification::new("XPP:GON:X.VAL", PvValue::Double(1.25), None));

        let lines = output.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("XPP:GON:X.VAL"));
        assert!(lines[0].ends_with(" 1.25"));
    }

    #[test]
    fn test_callback_sink_passes_record_through() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = seen.clone();
        let callback = NotificationSink::callback(move |n: Notification| {
            captured.lock().unwrap().push(n.pv_name);
        })
        .into_callback();

        callback(Notification::new("A:PV", PvValue::Int(1), None));
        callback(Notification::new("B:PV", PvValue::Int(2), None));

        assert_eq!(seen.lock().unwrap().as_slice(), &["A:PV", "B:PV"]);
    }
}

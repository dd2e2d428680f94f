use crate::event::LogEvent;
use crate::record::StructuredRecord;
use chrono::SecondsFormat;
use std::fmt::Write;
use uuid::Uuid;

/// Pure conversion from a [`LogEvent`] into a [`StructuredRecord`].
///
/// Implementations must be total: no I/O, no failure, no mutation of the
/// event. Every call yields a record with a fresh identifier.
pub trait Formatter: Send + Sync {
    fn format(&self, event: &LogEvent) -> StructuredRecord;
}

/// Default formatter: projects the event fields, resolves the message and
/// stamps a random UUIDv4.
///
/// The timestamp is the event's own capture time, rendered as RFC 3339 with
/// microseconds, or with a strftime pattern when built via
/// [`RecordFormatter::with_datefmt`]. An unusable pattern falls back to
/// RFC 3339.
#[derive(Debug, Clone, Default)]
pub struct RecordFormatter {
    datefmt: Option<String>,
}

impl RecordFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_datefmt(datefmt: impl Into<String>) -> Self {
        RecordFormatter {
            datefmt: Some(datefmt.into()),
        }
    }
}

impl Formatter for RecordFormatter {
    fn format(&self, event: &LogEvent) -> StructuredRecord {
        let timestamp = self
            .datefmt
            .as_deref()
            .and_then(|fmt| {
                let mut out = String::new();
                write!(out, "{}", event.created.format(fmt)).ok()?;
                Some(out)
            })
            .unwrap_or_else(|| event.created.to_rfc3339_opts(SecondsFormat::Micros, true));

        StructuredRecord {
            id: Uuid::new_v4(),
            level: event.level.as_str().to_string(),
            timestamp,
            created: event.created,
            message: event.message(),
            name: event.name.clone(),
            module: event.module.clone(),
            function: event.function.clone(),
            line: event.line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use chrono::{TimeZone, Utc};
    use std::collections::HashSet;
    use std::sync::Arc;

    fn sample() -> LogEvent {
        LogEvent::new(Level::Warning, "billing", "charge %s failed")
            .with_args(["ch_42"])
            .with_location("billing::charge", "retry_charge", 87)
            .with_created(Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap())
    }

    #[test]
    fn projects_event_fields() {
        let event = sample();
        let record = RecordFormatter::new().format(&event);

        assert_eq!(record.level, "WARNING");
        assert_eq!(record.name, event.name);
        assert_eq!(record.module, event.module);
        assert_eq!(record.function, event.function);
        assert_eq!(record.line, event.line);
        assert_eq!(record.message, "charge ch_42 failed");
        assert_eq!(record.created, event.created);
        assert_eq!(record.timestamp, "2024-03-01T12:30:05.000000Z");
        assert_eq!(record.id.get_version_num(), 4);
    }

    #[test]
    fn leaves_event_untouched() {
        let event = sample();
        let before = event.clone();
        let _ = RecordFormatter::new().format(&event);
        assert_eq!(event, before);
    }

    #[test]
    fn datefmt_controls_timestamp_text() {
        let record = RecordFormatter::with_datefmt("%Y-%m-%d %H:%M:%S").format(&sample());
        assert_eq!(record.timestamp, "2024-03-01 12:30:05");
    }

    #[test]
    fn invalid_datefmt_falls_back_to_rfc3339() {
        let record = RecordFormatter::with_datefmt("%Q").format(&sample());
        assert_eq!(record.timestamp, "2024-03-01T12:30:05.000000Z");
    }

    #[test]
    fn identifiers_do_not_collide_across_threads() {
        let formatter = Arc::new(RecordFormatter::new());
        let event = Arc::new(sample());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let formatter = Arc::clone(&formatter);
                let event = Arc::clone(&event);
                std::thread::spawn(move || {
                    (0..2_000)
                        .map(|_| formatter.format(&event).id)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(seen.len(), 16_000);
    }

    #[test]
    fn serializes_with_document_field_names() {
        let record = RecordFormatter::new().format(&sample());
        let value = serde_json::to_value(&record).unwrap();
        let obj = value.as_object().unwrap();

        let mut keys: Vec<_> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            ["function", "id", "levelname", "lineno", "message", "module", "name", "timestamp"]
        );
        assert_eq!(obj["levelname"], "WARNING");
        assert_eq!(obj["lineno"], 87);
        assert_eq!(obj["id"], record.id.to_string());
    }
}

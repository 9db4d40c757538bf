//! Observability
//!
//! Structured, synchronous JSON logging of typed lifecycle events. Output
//! goes to stderr so that stdout stays free for command results.
//!
//! ```ignore
//! use tablestore::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::DumpComplete, &[("records", "42")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

fn severity_of(event: Event) -> Severity {
    if event.is_fatal() {
        Severity::Fatal
    } else if event.is_failure() {
        Severity::Warn
    } else {
        Severity::Info
    }
}

/// Log a lifecycle event
pub fn log_event(event: Event) {
    Logger::log(severity_of(event), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(severity_of(event), event.as_str(), fields);
}

//! Observability subsystem for campusdb
//!
//! Lifecycle events are emitted through `tracing`; counters live in a
//! [`MetricsRegistry`] owned by each database.
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on execution
//! 3. No background threads
//!
//! The subscriber is installed by the binary, never by the library.

mod events;
mod metrics;

pub use events::Event;
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Log a lifecycle event with no extra fields
pub fn log_event(event: Event) {
    if event.is_fatal() {
        tracing::error!(event = %event);
    } else {
        tracing::info!(event = %event);
    }
}

// ── Diagnostic side channel ──
//
// Observability events emitted outside the control flow. The default sink
// writes structured `tracing` events; `RecordingDiagnostics` keeps them in
// memory for summaries and tests.

use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tracing::warn;

/// A diagnostic event. Carries no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DiagnosticEvent {
    /// The user declined (or dismissed) the notification permission prompt.
    PushPermissionDenied,
}

pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, event: DiagnosticEvent);
}

/// Emits each event as a `tracing` warning with an `event` field.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn emit(&self, event: DiagnosticEvent) {
        let name: &'static str = event.into();
        warn!(event = name, "diagnostic");
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events recorded so far, oldest first.
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self, event: DiagnosticEvent) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| **e == event)
            .count()
    }
}

impl DiagnosticSink for RecordingDiagnostics {
    fn emit(&self, event: DiagnosticEvent) {
        TracingDiagnostics.emit(event);
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

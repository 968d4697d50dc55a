use parking_lot::Mutex;
use tracing::{debug, warn};

use super::stage::{Stage, StageError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageEvent {
    Started(Stage),
    Completed(Stage),
    Skipped(Stage),
    Failed(Stage, String),
}

/// Receives a notification for every stage transition of a run
pub trait StageObserver: Send + Sync {
    fn on_event(&self, event: &StageEvent);
}

/// Default observer: stage transitions go to the log
#[derive(Debug, Default)]
pub struct TracingObserver;

impl StageObserver for TracingObserver {
    fn on_event(&self, event: &StageEvent) {
        match event {
            StageEvent::Started(stage) => debug!(stage = %stage, "stage started"),
            StageEvent::Completed(stage) => debug!(stage = %stage, "stage completed"),
            StageEvent::Skipped(stage) => debug!(stage = %stage, "stage skipped"),
            StageEvent::Failed(stage, message) => {
                warn!(stage = %stage, error = %message, "stage failed")
            }
        }
    }
}

/// Keeps every event; handy for asserting on stage order
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<StageEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<StageEvent> {
        self.events.lock().clone()
    }

    /// Stages whose work actually completed, in order
    pub fn executed(&self) -> Vec<Stage> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                StageEvent::Completed(stage) => Some(*stage),
                _ => None,
            })
            .collect()
    }

    pub fn skipped(&self) -> Vec<Stage> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                StageEvent::Skipped(stage) => Some(*stage),
                _ => None,
            })
            .collect()
    }

    pub fn was_started(&self, stage: Stage) -> bool {
        self.events
            .lock()
            .iter()
            .any(|e| *e == StageEvent::Started(stage))
    }
}

impl StageObserver for RecordingObserver {
    fn on_event(&self, event: &StageEvent) {
        self.events.lock().push(event.clone());
    }
}

impl StageEvent {
    pub fn failed(err: &StageError) -> Self {
        StageEvent::Failed(err.stage, err.kind.to_string())
    }
}

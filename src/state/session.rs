use super::run::RunState;
use crate::types::StreamEvent;

/// Owns the current run plus the generation counter that fences it.
///
/// A new submission does not abort the previous stream's transport; its task
/// keeps forwarding events tagged with the old generation, and `dispatch`
/// drops them here so an abandoned run can never contaminate the current one.
#[derive(Default)]
pub struct Session {
    run: RunState,
    generation: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run(&self) -> &RunState {
        &self.run
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Starts a new run, discarding all prior state. Valid from Idle or a
    /// terminal phase only; while a run is in flight the submit control is
    /// disabled and this returns None.
    pub fn submit(&mut self, query: &str) -> Option<u64> {
        if self.run.is_running() {
            return None;
        }
        self.generation += 1;
        self.run = RunState::start(self.generation, query);
        Some(self.generation)
    }

    /// Applies one stream event. Returns false when the event belonged to a
    /// stale generation and was silently discarded.
    pub fn dispatch(&mut self, generation: u64, event: StreamEvent) -> bool {
        if generation != self.generation {
            return false;
        }
        self.run.apply(event);
        true
    }

    /// Transport failure for the given generation (connection drop,
    /// non-success response). Stale generations are ignored.
    pub fn fail(&mut self, generation: u64, message: String) -> bool {
        if generation != self.generation {
            return false;
        }
        self.run.fail_transport(message);
        true
    }

    /// End-of-stream without a terminal event is a transport failure: the
    /// backend always closes with `complete` or `error`.
    pub fn stream_closed(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.run.is_terminal() {
            return false;
        }
        self.run
            .fail_transport("stream ended before the report completed".to_string());
        true
    }
}

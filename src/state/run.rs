use crate::types::{LogEntry, ResultPayload, Stage, StageStatus, StreamEvent};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

/// Mutable state of one research run. Created fresh per submission and
/// mutated only through `apply` (single writer: the app's update loop).
#[derive(Debug, Default)]
pub struct RunState {
    generation: u64,
    query: String,
    phase: RunPhase,
    stages: [StageStatus; Stage::PIPELINE.len()],
    log: Vec<LogEntry>,
    result: Option<ResultPayload>,
    error: Option<String>,
    started_at: Option<Instant>,
}

impl RunState {
    pub(super) fn start(generation: u64, query: &str) -> Self {
        Self {
            generation,
            query: query.to_string(),
            phase: RunPhase::Running,
            started_at: Some(Instant::now()),
            ..Self::default()
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == RunPhase::Running
    }

    pub fn is_completed(&self) -> bool {
        self.phase == RunPhase::Completed
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, RunPhase::Completed | RunPhase::Failed)
    }

    pub fn stage_status(&self, stage: Stage) -> StageStatus {
        self.stages[stage.index()]
    }

    /// Stage statuses in fixed pipeline order, regardless of arrival order.
    pub fn stage_statuses(&self) -> [(Stage, StageStatus); Stage::PIPELINE.len()] {
        let mut out = [(Stage::Planning, StageStatus::Pending); Stage::PIPELINE.len()];
        for (slot, stage) in out.iter_mut().zip(Stage::PIPELINE) {
            *slot = (stage, self.stages[stage.index()]);
        }
        out
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn result(&self) -> Option<&ResultPayload> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Time since submission; None before the first submit.
    pub fn elapsed(&self) -> Option<Duration> {
        self.started_at.map(|t| t.elapsed())
    }

    /// The event-dispatcher transition table.
    ///
    /// Log entries are appended even after a terminal phase, for
    /// observability; nothing else may mutate a terminal run, and a `Done`
    /// stage never reverts within a run.
    pub fn apply(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::AgentLog(entry) => self.log.push(entry),
            _ if self.is_terminal() => {}
            StreamEvent::Status {
                stage: Some(stage),
                done,
                ..
            } => {
                let slot = &mut self.stages[stage.index()];
                if *slot == StageStatus::Done {
                    return;
                }
                *slot = if done {
                    StageStatus::Done
                } else {
                    StageStatus::Active
                };
            }
            StreamEvent::Status { stage: None, .. } => {}
            StreamEvent::Complete(payload) => {
                self.result = Some(payload);
                self.phase = RunPhase::Completed;
            }
            StreamEvent::Error { message } => {
                self.error = Some(message);
                self.phase = RunPhase::Failed;
            }
            StreamEvent::Unknown => {}
        }
    }

    /// Transport-level failure: the stream broke before a terminal event.
    pub(super) fn fail_transport(&mut self, message: String) {
        if self.is_terminal() {
            return;
        }
        self.error = Some(message);
        self.phase = RunPhase::Failed;
    }
}

use serde::Deserialize;

/// One complete SSE frame: the `event:` line's name plus the parsed `data:` JSON.
#[derive(Debug, Clone)]
pub struct EventRecord {
    pub event: String,
    pub data: serde_json::Value,
}

/// Pipeline stages in the order the dashboard renders them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Planning,
    Searching,
    Writing,
    Verifying,
}

impl Stage {
    pub const PIPELINE: [Stage; 4] = [
        Stage::Planning,
        Stage::Searching,
        Stage::Writing,
        Stage::Verifying,
    ];

    pub fn from_name(name: &str) -> Option<Stage> {
        match name {
            "planning" => Some(Stage::Planning),
            "searching" => Some(Stage::Searching),
            "writing" => Some(Stage::Writing),
            "verifying" => Some(Stage::Verifying),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Stage::Planning => 0,
            Stage::Searching => 1,
            Stage::Writing => 2,
            Stage::Verifying => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Planning => "Planning",
            Stage::Searching => "Searching",
            Stage::Writing => "Writing",
            Stage::Verifying => "Verifying",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StageStatus {
    #[default]
    Pending,
    Active,
    Done,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub agent: String,
    pub action: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct StatusData {
    stage: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorData {
    message: String,
}

/// A typed event from the research stream.
///
/// `Status` carries `stage: None` for backend stages that are not part of the
/// rendered pipeline (the backend emits a `start` stage before planning).
#[derive(Debug, Clone)]
pub enum StreamEvent {
    Status {
        stage: Option<Stage>,
        message: Option<String>,
        done: bool,
    },
    AgentLog(LogEntry),
    Complete(super::ResultPayload),
    Error {
        message: String,
    },
    Unknown,
}

impl StreamEvent {
    /// Maps a decoded frame to a typed event. Unrecognized event names become
    /// `Unknown`; a payload that does not deserialize for a recognized name is
    /// a per-record error the caller skips.
    pub fn from_record(record: &EventRecord) -> Result<StreamEvent, serde_json::Error> {
        match record.event.as_str() {
            "status" => {
                let status: StatusData = serde_json::from_value(record.data.clone())?;
                Ok(StreamEvent::Status {
                    stage: Stage::from_name(&status.stage),
                    message: status.message,
                    done: status.done,
                })
            }
            "agent_log" => {
                let entry: LogEntry = serde_json::from_value(record.data.clone())?;
                Ok(StreamEvent::AgentLog(entry))
            }
            "complete" => {
                let payload = serde_json::from_value(record.data.clone())?;
                Ok(StreamEvent::Complete(payload))
            }
            "error" => {
                let error: ErrorData = serde_json::from_value(record.data.clone())?;
                Ok(StreamEvent::Error {
                    message: error.message,
                })
            }
            _ => Ok(StreamEvent::Unknown),
        }
    }
}

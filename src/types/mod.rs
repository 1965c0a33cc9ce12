mod events;
mod payloads;

pub use events::{EventRecord, LogEntry, Stage, StageStatus, StreamEvent};
pub use payloads::{ChartData, FactCheck, HistoryDetail, HistoryItem, ResultPayload, Verification};

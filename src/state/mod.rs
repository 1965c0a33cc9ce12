mod run;
mod session;

pub use run::{RunPhase, RunState};
pub use session::Session;

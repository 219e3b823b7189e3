//! Client-side driver of server processes.

pub mod error;
pub mod machine;
pub mod phase;

pub use error::{ClientError, ClientResult};
pub use machine::{ClientChannels, ClientId, Dispatch, ProcessExecutionClient};
pub use phase::{ActionOutcome, ActionSet, ClientPhase, IgnoreReason};

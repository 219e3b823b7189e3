//! Remote service capabilities.
//!
//! - [`base`]: the service traits and the stub contract
//! - [`handle`]: capability registry over a registered stub
//! - [`scripted`]: in-memory stub driven by process scripts

pub mod base;
pub mod handle;
pub mod scripted;

pub use base::{AuthService, Capability, CommandService, ServiceStub, StorageService};
pub use handle::RemoteServiceHandle;
pub use scripted::ScriptedServer;

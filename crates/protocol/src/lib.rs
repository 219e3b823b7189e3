//! # pd-protocol
//!
//! Core protocol definitions and data models for procdesk.
//!
//! This crate defines all shared data structures used for:
//! - Describing and starting server-side processes
//! - Execution snapshots exchanged on every round-trip
//! - The `EXECUTE_PROCESS` command and client lifecycle events
//! - The service error contract
//! - Configuration and process script files
//!
//! ## Modules
//!
//! - [`process_models`]: Process descriptors, snapshots and execution modes
//! - [`error_models`]: Recoverable and unrecoverable service errors
//! - [`ipc`]: Commands sent to the server and events sent to the shell
//! - [`session_models`]: Credentials and authenticated user data
//! - [`config_models`]: Client configuration from config.toml
//! - [`script_models`]: Scripted process definitions
//!
//! ## Design Principles
//!
//! - Minimal dependencies: serde, ts-rs, uuid, chrono and thiserror
//! - TypeScript generation: All types derive `TS` for the browser front-end
//! - Independent compilation: No dependencies on other procdesk crates

pub mod config_models;
pub mod error_models;
pub mod ipc;
pub mod process_models;
pub mod script_models;
pub mod session_models;

// Re-export all public types for convenience
pub use config_models::*;
pub use error_models::*;
pub use ipc::*;
pub use process_models::*;
pub use script_models::*;
pub use session_models::*;

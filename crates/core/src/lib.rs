//! # pd-core
//!
//! Client-side process execution for procdesk.
//!
//! This crate provides:
//! - A state machine driving one server-side process through its steps
//! - An application shell of parent-delegating panel managers
//! - A capability registry over the remote service stub
//! - Configuration loading from the `.procdesk/` directory
//!
//! ## Modules
//!
//! - [`client`]: Process execution client
//! - [`shell`]: Application shell and panel tree
//! - [`services`]: Service traits, capability handle and scripted stub
//! - [`ui`]: UI toolkit contract
//! - [`config`]: Configuration loading and management

pub mod client;
pub mod config;
pub mod services;
pub mod shell;
pub mod ui;

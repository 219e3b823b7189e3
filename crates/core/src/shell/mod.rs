//! Application shell: a rooted tree of panel managers around the client of
//! the main process.
//!
//! - [`panel`]: the delegating `PanelManager` trait
//! - [`root`]: the root panel and the application session
//! - [`panels`]: toolbar, login and message panels
//! - [`app`]: the shell that owns and drives them

pub mod app;
pub mod error;
pub mod panel;
pub mod panels;
pub mod root;

pub use app::{ApplicationShell, ShellAction, ShellPhase, LAST_USER_KEY};
pub use error::{ShellError, ShellResult};
pub use panel::PanelManager;
pub use root::{ApplicationSession, RootPanel};

//! Client configuration models for `.procdesk/config.toml`.

use serde::Deserialize;
use serde::Serialize;
use ts_rs::TS;

use crate::process_models::Viewport;

/// Represents client settings from `.procdesk/config.toml`.
///
/// # Example
///
/// ```toml
/// # .procdesk/config.toml
/// main_process = "Checkout"
/// locale = "de-DE"
/// auto_continue = true
///
/// [viewport]
/// width = 1280
/// height = 800
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct ClientConfig {
    /// Process started after login.
    #[serde(default = "default_main_process")]
    pub main_process: String,

    /// Locale used when the logged-in user has none.
    #[serde(default = "default_locale")]
    pub locale: String,

    #[serde(default = "default_viewport")]
    pub viewport: Viewport,

    /// Whether auto-continuing steps run without pausing.
    #[serde(default = "default_auto_continue")]
    pub auto_continue: bool,
}

fn default_main_process() -> String {
    "Main".to_string()
}

fn default_locale() -> String {
    "en-US".to_string()
}

fn default_viewport() -> Viewport {
    Viewport {
        width: 1024,
        height: 768,
    }
}

fn default_auto_continue() -> bool {
    true
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            main_process: default_main_process(),
            locale: default_locale(),
            viewport: default_viewport(),
            auto_continue: default_auto_continue(),
        }
    }
}

//! Settings schema definitions.
//!
//! All settings structs use `#[serde(default)]` to allow partial configuration files.
//! Missing fields are filled with defaults.

use serde::{Deserialize, Serialize};

/// Root settings structure.
///
/// Loaded from `~/.flockbot/settings.toml` with environment variable interpolation support.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotSettings {
    /// Schema version for migrations
    pub version: u32,

    /// Listening address
    pub server: ServerSettings,

    /// Messenger Platform app and page credentials
    pub messenger: MessengerSettings,

    /// Where finished reports go
    pub store: StoreSettings,

    /// Conversation behaviour
    pub dialogue: DialogueSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Messenger Platform settings. Secrets support `$ENV_VAR` syntax.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessengerSettings {
    /// App secret, keys the webhook signature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_secret: Option<String>,

    /// Token echoed back in the subscription handshake
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_access_token: Option<String>,

    /// Public base URL of this server, used for asset links
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,

    pub graph_api_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StoreSettings {
    /// Reports service endpoint. Reports stay in memory when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reports_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueSettings {
    /// Words that start a report (case-insensitive)
    pub trigger_keywords: Vec<String>,

    /// Words that leave an exact-value question
    pub cancel_keywords: Vec<String>,

    /// `reporterName` of every report
    pub reporter_name: String,

    /// `flockId` of every report
    pub flock_id: String,

    /// Drop sessions idle for this long. Unset keeps them forever.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_ttl_secs: Option<u64>,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSettings::default(),
            messenger: MessengerSettings::default(),
            store: StoreSettings::default(),
            dialogue: DialogueSettings::default(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for MessengerSettings {
    fn default() -> Self {
        Self {
            app_secret: None,
            validation_token: None,
            page_access_token: None,
            server_url: None,
            graph_api_url: "https://graph.facebook.com/v2.6".to_string(),
        }
    }
}

impl Default for DialogueSettings {
    fn default() -> Self {
        Self {
            trigger_keywords: vec!["דווח".to_string(), "report".to_string()],
            cancel_keywords: vec!["בטל".to_string(), "cancel".to_string()],
            reporter_name: "בוט ציפורים".to_string(),
            flock_id: "2357".to_string(),
            session_ttl_secs: None,
        }
    }
}

impl DialogueSettings {
    /// Keyword quoted in help texts.
    pub fn primary_trigger(&self) -> &str {
        self.trigger_keywords.first().map(String::as_str).unwrap_or("דווח")
    }

    /// Keyword quoted in the number reprompt.
    pub fn primary_cancel(&self) -> &str {
        self.cancel_keywords.first().map(String::as_str).unwrap_or("בטל")
    }
}

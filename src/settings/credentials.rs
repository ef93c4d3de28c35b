//! Startup credentials.
//!
//! Each value comes from the settings file, falling back to the environment
//! variable of the same name. All four are required.

use url::Url;

use super::loader::get_with_env_fallback;
use super::schema::MessengerSettings;
use crate::error::{BotError, Result};

pub const APP_SECRET_ENV: &str = "MESSENGER_APP_SECRET";
pub const VALIDATION_TOKEN_ENV: &str = "MESSENGER_VALIDATION_TOKEN";
pub const PAGE_ACCESS_TOKEN_ENV: &str = "MESSENGER_PAGE_ACCESS_TOKEN";
pub const SERVER_URL_ENV: &str = "SERVER_URL";

#[derive(Clone)]
pub struct Credentials {
    pub app_secret: String,
    pub validation_token: String,
    pub page_access_token: String,
    pub server_url: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("server_url", &self.server_url)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    pub fn resolve(messenger: &MessengerSettings) -> Result<Self> {
        let mut missing = Vec::new();
        let mut lookup = |setting: &Option<String>, env: &'static str| {
            get_with_env_fallback(setting, &[env], None).unwrap_or_else(|| {
                missing.push(env);
                String::new()
            })
        };

        let credentials = Self {
            app_secret: lookup(&messenger.app_secret, APP_SECRET_ENV),
            validation_token: lookup(&messenger.validation_token, VALIDATION_TOKEN_ENV),
            page_access_token: lookup(&messenger.page_access_token, PAGE_ACCESS_TOKEN_ENV),
            server_url: lookup(&messenger.server_url, SERVER_URL_ENV),
        };

        if !missing.is_empty() {
            return Err(BotError::Config(format!(
                "Missing config values: {}",
                missing.join(", ")
            )));
        }

        validate_url("server_url", &credentials.server_url)?;
        Ok(credentials)
    }
}

/// Parse `value` as an absolute http(s) URL.
pub fn validate_url(field: &str, value: &str) -> Result<Url> {
    let url = Url::parse(value)
        .map_err(|e| BotError::Config(format!("{} `{}` is not a valid URL: {}", field, value, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(BotError::Config(format!(
            "{} must be http or https, got `{}`",
            field, other
        ))),
    }
}

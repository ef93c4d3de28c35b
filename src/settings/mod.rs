//! TOML-based settings.
//!
//! Settings are loaded from `~/.flockbot/settings.toml` (or `--config`) with
//! environment variable interpolation. Credentials fall back to their
//! environment variables through [`get_with_env_fallback`].
//!
//! ```rust,ignore
//! let manager = SettingsManager::load(path).await?;
//! let settings = manager.get().await;
//! let credentials = Credentials::resolve(&settings.messenger)?;
//! ```

pub mod credentials;
pub mod loader;
pub mod schema;

pub use credentials::{validate_url, Credentials};
pub use loader::{get_with_env_fallback, settings_path, SettingsManager};
pub use schema::BotSettings;

//! Configuration management module.

pub mod paths;
pub mod schema;
pub mod store;
pub mod validation;

pub use paths::{PathError, Paths};
pub use schema::{
    ChannelConfig, Config, DefaultsConfig, EmailConfig, LoggingConfig, NotifiersConfig,
    SlackApiConfig, SlackWebhookConfig,
};
pub use store::{ChannelConfigStore, ConfigError, ConfigFile};
pub use validation::{ValidationError, ValidationResult, ValidationWarning, validate_config};

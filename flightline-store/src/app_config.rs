use serde::Deserialize;
use std::env;
use uuid::Uuid;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub identity: IdentityConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    #[serde(default)]
    pub seed_demo: bool,
}

/// Remote data-source endpoint for engine hosts. The development service
/// ignores this section and serves its own in-memory source.
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IdentityConfig {
    pub profile_id: Uuid,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file
            // Default to 'development' env
            // Note that this file is _optional_
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of FLIGHTLINE)
            // Eg.. `FLIGHTLINE__SERVER__PORT=8080` would set the server port
            .add_source(config::Environment::with_prefix("FLIGHTLINE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

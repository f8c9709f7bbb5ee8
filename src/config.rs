use std::env;

use crate::{Result, SimulatorError};

pub const DEFAULT_API_KEY: &str = "f22e8e0c4fcab646939943357ca7c201";
pub const DEFAULT_APPLICATION_KEY: &str = "5469722d1b56bc1e652698267eb979c10b7f7216";

/// The key pair every authenticated endpoint expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub application_key: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            api_key: DEFAULT_API_KEY.to_string(),
            application_key: DEFAULT_APPLICATION_KEY.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub credentials: Credentials,
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            credentials: Credentials::default(),
            seed: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let port = match lookup("PORT") {
            Some(port) => port
                .parse::<u16>()
                .map_err(|e| SimulatorError::Config(format!("invalid PORT {port:?}: {e}")))?,
            None => defaults.port,
        };

        let seed = lookup("SIMULATOR_SEED")
            .map(|seed| {
                seed.parse::<u64>().map_err(|e| {
                    SimulatorError::Config(format!("invalid SIMULATOR_SEED {seed:?}: {e}"))
                })
            })
            .transpose()?;

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port,
            credentials: Credentials {
                api_key: lookup("DD_API_KEY").unwrap_or(defaults.credentials.api_key),
                application_key: lookup("DD_APPLICATION_KEY")
                    .unwrap_or(defaults.credentials.application_key),
            },
            seed,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

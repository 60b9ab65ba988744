//! Configuration for the task form controller

use serde::{Deserialize, Serialize};
use std::path::Path;
use log::debug;

/// Base url shown in the form until the user edits it
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig
{   /// API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String
  , /// Request timeout in seconds; transport default when unset
    #[serde(default)]
    pub timeout_secs: Option<u64>
  , /// Enable detailed logging
    #[serde(default)]
    pub verbose: Option<bool>
}

fn default_api_base() -> String
{   DEFAULT_API_BASE.to_string()
}

impl Default for ClientConfig
{   fn default() -> Self
    {   ClientConfig
        {   api_base: default_api_base()
          , timeout_secs: None
          , verbose: None
        }
    }
}

impl ClientConfig
{   /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>)
      -> Result<Self, crate::error::Error>
    {   let path = path.as_ref();
        debug!("Loading config from {}", path.display());
        let config_str = std::fs::read_to_string(path)
          .map_err(|e| {
            crate::error::Error::InvalidConfiguration(
              format!("{}: {}", path.display(), e)
            )
          })?;
        let config: ClientConfig
          = serde_json::from_str(&config_str).map_err(|e| {
            crate::error::Error::InvalidConfiguration(
              format!("{}: {}", path.display(), e)
            )
          })?;
        Ok(config)
    }

    /// Defaults overlaid with `AITASK_API_BASE`,
    /// `AITASK_TIMEOUT_SECS` and `AITASK_VERBOSE`
    pub fn from_env() -> Result<Self, crate::error::Error>
    {   Self::default().overlay(|name| std::env::var(name).ok())
    }

    /// Apply overrides from a variable lookup
    pub fn overlay<F>(mut self, lookup: F)
      -> Result<Self, crate::error::Error>
    where
      F: Fn(&str) -> Option<String>
    {   if let Some(base) = lookup("AITASK_API_BASE")
        {   let base = base.trim().to_string();
            if base.is_empty()
            {   return Err(crate::error::Error::InvalidConfiguration(
                  "AITASK_API_BASE is empty".to_string()
                ));
            }
            debug!("api_base from env: {}", base);
            self.api_base = base;
        }

        if let Some(secs) = lookup("AITASK_TIMEOUT_SECS")
        {   let secs = secs.trim().parse::<u64>().map_err(|_| {
              crate::error::Error::InvalidConfiguration(
                format!("AITASK_TIMEOUT_SECS not a number: {}", secs)
              )
            })?;
            self.timeout_secs = Some(secs);
        }

        if let Some(flag) = lookup("AITASK_VERBOSE")
        {   let verbose = match flag.trim().to_ascii_lowercase().as_str()
            {   "1" | "true" | "yes" | "on" => true
              , "" | "0" | "false" | "no" | "off" => false
              , _ => {
                  return Err(crate::error::Error::InvalidConfiguration(
                    format!("AITASK_VERBOSE not a flag: {}", flag)
                  ));
                }
            };
            self.verbose = Some(verbose);
        }

        Ok(self)
    }

    /// Log level forced by `verbose`; `None` leaves `RUST_LOG` in charge
    pub fn log_filter(&self) -> Option<log::LevelFilter>
    {   match self.verbose
        {   Some(true) => Some(log::LevelFilter::Debug)
          , _ => None
        }
    }

    /// Build the HTTP client for this configuration
    pub fn http_client(&self)
      -> Result<reqwest::Client, crate::error::Error>
    {   let mut builder = reqwest::Client::builder();
        if let Some(secs) = self.timeout_secs
        {   builder = builder.timeout(
              std::time::Duration::from_secs(secs)
            );
        }
        builder.build().map_err(|e| {
          crate::error::Error::InvalidConfiguration(e.to_string())
        })
    }
}

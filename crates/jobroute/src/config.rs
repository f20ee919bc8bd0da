//! Application configuration.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use jobroute_store::{Credentials, PocketBaseClient};

/// Configuration loading failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment configuration: {0}")]
    Env(String),
}

impl From<envy::Error> for ConfigError {
    fn from(err: envy::Error) -> Self {
        ConfigError::Env(err.to_string())
    }
}

/// Collection names used by the engines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collections {
    pub job: String,
    pub route: String,
    pub machine: String,
    pub machine_master: String,
    pub staging: String,
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            job: default_job_collection(),
            route: default_route_collection(),
            machine: default_machine_collection(),
            machine_master: default_machine_master_collection(),
            staging: default_staging_collection(),
        }
    }
}

/// Configuration loaded from environment variables.
///
/// Environment variables are prefixed with `JOBROUTE_`:
/// - `JOBROUTE_URL`: record store base URL (default: "http://127.0.0.1:8090")
/// - `JOBROUTE_EMAIL` / `JOBROUTE_PASSWORD`: admin credentials
/// - `JOBROUTE_REQUEST_TIMEOUT_SECS`: per-request timeout (default: 30)
/// - `JOBROUTE_WORK_ORDER_PREFIX`: prepended to work order suffixes (default: "IA-2026-")
/// - `JOBROUTE_*_COLLECTION`: collection name overrides
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_url")]
    pub url: String,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_work_order_prefix")]
    pub work_order_prefix: String,

    #[serde(default = "default_job_collection")]
    pub job_collection: String,

    #[serde(default = "default_route_collection")]
    pub route_collection: String,

    #[serde(default = "default_machine_collection")]
    pub machine_collection: String,

    #[serde(default = "default_machine_master_collection")]
    pub machine_master_collection: String,

    #[serde(default = "default_staging_collection")]
    pub staging_collection: String,
}

fn default_url() -> String {
    "http://127.0.0.1:8090".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_work_order_prefix() -> String {
    "IA-2026-".to_string()
}

fn default_job_collection() -> String {
    "ASWNDUBAI_Job".to_string()
}

fn default_route_collection() -> String {
    "ASWNDUBAI_jobProductReceipeRoutes".to_string()
}

fn default_machine_collection() -> String {
    "ASWNDUBAI_receipeRouteMachines".to_string()
}

fn default_machine_master_collection() -> String {
    "ASWNDUBAI_machineMaster".to_string()
}

fn default_staging_collection() -> String {
    "erpConsolidateData".to_string()
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(envy::prefixed("JOBROUTE_").from_env::<AppConfig>()?)
    }

    pub fn collections(&self) -> Collections {
        Collections {
            job: self.job_collection.clone(),
            route: self.route_collection.clone(),
            machine: self.machine_collection.clone(),
            machine_master: self.machine_master_collection.clone(),
            staging: self.staging_collection.clone(),
        }
    }

    /// Credentials, if both halves are set.
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.email, &self.password) {
            (Some(email), Some(password)) => Some(Credentials::new(email, password)),
            _ => None,
        }
    }

    /// Build the store client. Authentication happens on first use.
    pub fn store_client(&self) -> PocketBaseClient {
        PocketBaseClient::new(
            &self.url,
            self.credentials(),
            Duration::from_secs(self.request_timeout_secs),
        )
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            email: None,
            password: None,
            request_timeout_secs: default_timeout(),
            work_order_prefix: default_work_order_prefix(),
            job_collection: default_job_collection(),
            route_collection: default_route_collection(),
            machine_collection: default_machine_collection(),
            machine_master_collection: default_machine_master_collection(),
            staging_collection: default_staging_collection(),
        }
    }
}

use crate::services::media_storage::DEFAULT_ENDPOINT;
use anyhow::{Context, Result};
use clap::Args;
use std::env;

/// Centralized client configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base media endpoint, e.g. `https://mss.ricohapi.com/v1/media`.
    pub endpoint: String,
    /// Token handed to the static session provider, if any.
    pub access_token: Option<String>,
    /// Whole-request timeout. `None` leaves requests unbounded.
    pub timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            access_token: None,
            timeout_secs: None,
        }
    }
}

/// Connection flags shared by every CLI subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Media endpoint (overrides MEDIA_STORAGE_ENDPOINT)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Access token (overrides MEDIA_STORAGE_TOKEN)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Request timeout in seconds (overrides MEDIA_STORAGE_TIMEOUT_SECS)
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,
}

impl ClientConfig {
    /// Read configuration from the environment only.
    pub fn from_env() -> Result<Self> {
        Self::from_env_and_args(&ConnectionArgs::default())
    }

    /// Merge CLI args over environment variables over defaults.
    pub fn from_env_and_args(args: &ConnectionArgs) -> Result<Self> {
        // --- Environment fallback ---
        let env_endpoint =
            env::var("MEDIA_STORAGE_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.into());
        let env_token = env::var("MEDIA_STORAGE_TOKEN").ok();
        let env_timeout = match env::var("MEDIA_STORAGE_TIMEOUT_SECS") {
            Ok(value) => Some(value.parse::<u64>().with_context(|| {
                format!("parsing MEDIA_STORAGE_TIMEOUT_SECS value `{}`", value)
            })?),
            Err(env::VarError::NotPresent) => None,
            Err(err) => return Err(err).context("reading MEDIA_STORAGE_TIMEOUT_SECS"),
        };

        // --- Merge ---
        Ok(Self {
            endpoint: args.endpoint.clone().unwrap_or(env_endpoint),
            access_token: args.token.clone().or(env_token),
            timeout_secs: args.timeout_secs.or(env_timeout),
        })
    }
}

//! Auth Config

use clap::Args;

/// API token settings.
#[derive(Debug, Args)]
pub struct AuthConfig {
    /// Server-side key used to verify API token secrets
    #[arg(long, env = "API_TOKEN_KEY", hide_env_values = true)]
    pub api_token_key: String,
}

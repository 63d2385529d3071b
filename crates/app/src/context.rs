//! App Context

use std::{fmt, sync::Arc};

use thiserror::Error;

use crate::{
    auth::{ApiTokenHasher, ApiTokenHasherError, AuthService, PgAuthService},
    database::{self, Db},
    domain::{
        orders::{OrdersService, PgOrdersService},
        payments::{DEFAULT_CURRENCY, PaymentsService, PgPaymentsService},
        webhooks::{PgWebhooksService, WebhooksService},
    },
    gateway::{GatewayError, PaymentGateway, StripeConfig, StripeGateway},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to apply database migrations")]
    Migrate(#[source] sqlx::migrate::MigrateError),

    #[error("invalid API token key")]
    TokenKey(#[source] ApiTokenHasherError),

    #[error("failed to build payment gateway client")]
    Gateway(#[source] GatewayError),
}

/// Everything needed to wire the services together.
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub api_token_key: String,
    pub stripe: StripeConfig,
    pub currency: String,
    pub run_migrations: bool,
}

impl AppConfig {
    #[must_use]
    pub fn new(database_url: String, api_token_key: String, stripe: StripeConfig) -> Self {
        Self {
            database_url,
            api_token_key,
            stripe,
            currency: DEFAULT_CURRENCY.to_string(),
            run_migrations: false,
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &"<redacted>")
            .field("api_token_key", &"<redacted>")
            .field("stripe", &self.stripe)
            .field("currency", &self.currency)
            .field("run_migrations", &self.run_migrations)
            .finish()
    }
}

#[derive(Clone)]
pub struct AppContext {
    pub orders: Arc<dyn OrdersService>,
    pub payments: Arc<dyn PaymentsService>,
    pub webhooks: Arc<dyn WebhooksService>,
    pub auth: Arc<dyn AuthService>,
}

impl AppContext {
    /// Connect to the database and build every service on top of it.
    ///
    /// # Errors
    ///
    /// Returns an error when the database is unreachable, migrations fail, the
    /// token key is unusable or the gateway client cannot be built.
    pub async fn from_config(config: AppConfig) -> Result<Self, AppInitError> {
        let pool = database::connect(&config.database_url)
            .await
            .map_err(AppInitError::Database)?;

        if config.run_migrations {
            database::migrate(&pool)
                .await
                .map_err(AppInitError::Migrate)?;
        }

        let hasher = ApiTokenHasher::new(config.api_token_key.into_bytes())
            .map_err(AppInitError::TokenKey)?;

        let gateway: Arc<dyn PaymentGateway> =
            Arc::new(StripeGateway::new(config.stripe).map_err(AppInitError::Gateway)?);

        let db = Db::new(pool.clone());

        Ok(Self {
            orders: Arc::new(PgOrdersService::new(db.clone())),
            payments: Arc::new(PgPaymentsService::new(
                db.clone(),
                gateway.clone(),
                config.currency,
            )),
            webhooks: Arc::new(PgWebhooksService::new(db, gateway)),
            auth: Arc::new(PgAuthService::new(pool, hasher)),
        })
    }
}

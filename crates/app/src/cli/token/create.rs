use clap::Args;
use storefront_app::{
    auth::{ApiTokenHasher, PgAuthService},
    database,
    domain::users::records::UserUuid,
};
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct CreateTokenArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// User UUID that should own the token
    #[arg(long)]
    user_uuid: Uuid,

    /// Server-side key used to hash token secrets
    #[arg(long, env = "API_TOKEN_KEY", hide_env_values = true)]
    api_token_key: String,
}

pub(crate) async fn run(args: CreateTokenArgs) -> Result<(), String> {
    let hasher = ApiTokenHasher::new(args.api_token_key)
        .map_err(|error| format!("invalid api token key: {error}"))?;

    let pool = database::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let service = PgAuthService::new(pool, hasher);

    let issued = service
        .issue_api_token(UserUuid::from(args.user_uuid))
        .await
        .map_err(|error| format!("failed to create token: {error}"))?;

    println!("token_uuid: {}", issued.metadata.uuid);
    println!("user_uuid: {}", issued.metadata.user_uuid);
    println!("token_version: {}", issued.metadata.version.as_i16());
    println!("token_created_at: {}", issued.metadata.created_at);
    println!("api_token: {}", issued.token);
    println!("store this token now; it is only shown once");

    Ok(())
}

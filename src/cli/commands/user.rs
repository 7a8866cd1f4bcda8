use clap::Args;
use serde_json::json;

use crate::app::AppState;
use crate::auth::hash_password;
use crate::cli::{utils::output_success, OutputFormat};
use crate::config::{AppConfig, StoreBackend};
use crate::database::models::NewUser;

#[derive(Debug, Args)]
pub struct CreateUserArgs {
    #[arg(help = "Login name")]
    pub username: String,

    #[arg(long, help = "Password for the new account")]
    pub password: String,

    #[arg(long, default_value = "", help = "Email address")]
    pub email: String,

    #[arg(long, help = "Grant superuser status")]
    pub superuser: bool,
}

pub async fn handle(args: CreateUserArgs, config: AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    if config.database.backend == StoreBackend::Memory {
        tracing::warn!("The in-memory store is discarded when this command exits");
    }

    let state = AppState::from_config(config).await?;
    let user = state
        .users
        .create_user(NewUser {
            username: args.username,
            email: args.email,
            password_hash: hash_password(&args.password)?,
            is_superuser: args.superuser,
        })
        .await?;

    output_success(
        &output_format,
        &format!("Created user '{}' (id {})", user.username, user.id),
        Some(json!({ "user": user })),
    )
}

#[derive(Debug, Args)]
pub struct SetActiveArgs {
    #[arg(help = "Login name")]
    pub username: String,

    #[arg(long, help = "Deactivate instead of activate; inactive accounts cannot obtain or use tokens")]
    pub inactive: bool,
}

pub async fn handle_set_active(
    args: SetActiveArgs,
    config: AppConfig,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let state = AppState::from_config(config).await?;
    let active = !args.inactive;

    let Some(user) = state.users.set_user_active(&args.username, active).await? else {
        anyhow::bail!("No user named '{}'", args.username);
    };

    output_success(
        &output_format,
        &format!(
            "User '{}' is now {}",
            user.username,
            if user.is_active { "active" } else { "inactive" }
        ),
        Some(json!({ "user": user })),
    )
}

use clap::Parser;

mod app;
mod attributes;
mod auth;
mod cli;
mod config;
mod error;
mod extract;
mod memory;
mod recipes;
mod state;
mod users;

use crate::{
    cli::{Cli, Command},
    config::{JwtConfig, StoreConfig},
    state::{AppState, Repositories},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "recipebox=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let command = Cli::parse().into_command();
    let repos = Repositories::connect(&StoreConfig::from_env()?).await?;

    match command {
        Command::CreateUser {
            email,
            full_name,
            password,
            staff,
            superuser,
        } => cli::create_user(repos.users.as_ref(), email, full_name, password, staff, superuser).await,
        Command::Serve(args) => {
            let state = AppState::new(&JwtConfig::from_env()?, repos);
            app::serve(app::build_app(state), &args.host, args.port).await
        }
    }
}

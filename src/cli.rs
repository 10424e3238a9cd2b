use clap::{Args, Parser, Subcommand};

use crate::users::{repo::UserRepository, repo_types::NewUser, services};

#[derive(Parser)]
#[command(name = "recipebox")]
#[command(about = "Recipe, ingredient and step tracking API")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Server options used when no subcommand is given.
    #[command(flatten)]
    pub serve: ServeArgs,
}

impl Cli {
    /// The subcommand to run; `serve` when none was given.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Serve(self.serve))
    }
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ServeArgs {
    #[arg(long, env = "APP_HOST", default_value = "0.0.0.0")]
    pub host: String,
    #[arg(long, env = "APP_PORT", default_value_t = 8080)]
    pub port: u16,
}

#[derive(Subcommand)]
pub enum Command {
    #[command(about = "Run the HTTP server (default)")]
    Serve(ServeArgs),

    #[command(about = "Create a user, optionally with staff or superuser rights")]
    CreateUser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        full_name: String,
        #[arg(long, env = "RECIPEBOX_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        staff: bool,
        #[arg(long, help = "Implies --staff")]
        superuser: bool,
    },
}

pub async fn create_user(
    repo: &dyn UserRepository,
    email: String,
    full_name: String,
    password: String,
    staff: bool,
    superuser: bool,
) -> anyhow::Result<()> {
    let user = if superuser {
        services::create_superuser(repo, &full_name, &email, &password).await?
    } else if staff {
        services::create_staff_user(repo, &full_name, &email, &password).await?
    } else {
        services::create_user(repo, NewUser::new(full_name, email, password)).await?
    };
    println!("created user {} <{}>", user.id, user.email);
    Ok(())
}

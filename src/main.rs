use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use sessiongate::auth::AuthStatus;
use sessiongate::config::{config_schema, load_config};
use sessiongate::guard::GuardState;
use sessiongate::models::{LoginRole, UserType};
use sessiongate::startup;
use sessiongate::utils::init_logging;

/// Session gate command
#[derive(Parser, Debug)]
#[command(version, propagate_version = true, subcommand_required = true)]
struct Cli {
    /// Path of the YAML configuration
    #[arg(long, env = "SESSIONGATE_CONFIG", default_value = "./config.yaml", global = true)]
    config: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve the stored token and print the session
    Status,
    /// Log in and store the new token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "SESSIONGATE_PASSWORD", hide_env_values = true)]
        password: String,
        /// talent, company or admin
        #[arg(long, default_value = "talent")]
        role: LoginRole,
    },
    /// End the session and forget the stored token
    Logout,
    /// Run the route guard for a path and print the outcome
    Check {
        #[arg(long)]
        path: String,
        /// freelancer, company or admin
        #[arg(long)]
        role: Option<UserType>,
    },
    /// Print the JSON schema of the configuration
    Schema,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Command::Schema = cli.command {
        println!("{}", config_schema());
        return Ok(());
    }

    let config = load_config(&cli.config)?;
    init_logging(&config.logging)?;
    let gate = startup::build(Arc::new(config))?;
    let state = gate.auth.bootstrap().await;

    match cli.command {
        Command::Status => match &state.status {
            AuthStatus::Authenticated(session) => println!(
                "authenticated as {} <{}> ({}), since {}",
                session.user.display_name(),
                session.user.email,
                session.user.user_type,
                session.established_at.to_rfc3339()
            ),
            _ => println!("anonymous"),
        },
        Command::Login {
            email,
            password,
            role,
        } => {
            let session = gate
                .auth
                .login(&email, &password, role)
                .await
                .map_err(|e| e.user_message())?;
            info!("Logged in as '{}'", session.user.email);
            println!(
                "logged in as {} ({}); home is {}",
                session.user.display_name(),
                session.user.user_type,
                gate.routes.home_for(session.user.user_type)
            );
        }
        Command::Logout => {
            if let Some(notification) = gate.auth.logout() {
                let _ = notification.await;
            }
            println!("logged out; back to {}", gate.routes.landing());
        }
        Command::Check { path, role } => {
            let guard = gate.guard(role, &path);
            match guard.resolve(gate.auth.subscribe()).await {
                GuardState::Allowed => println!("allowed"),
                GuardState::Denied { redirect } => println!("denied; redirect to {}", redirect),
                GuardState::Pending => println!("pending"),
            }
        }
        // Printed before the configuration is loaded.
        Command::Schema => {}
    }
    Ok(())
}

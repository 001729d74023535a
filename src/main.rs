//! `rest-service` binary: serve the API or manage user accounts.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use validator::ValidateEmail;

use rest_service::config::{load_config, ServiceConfig};
use rest_service::mail::Mailgun;
use rest_service::observability::logging;
use rest_service::store::{MemoryUsers, PgUsers, User, UserStore};
use rest_service::{app, App};

const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Parser)]
#[command(name = "rest-service")]
#[command(about = "JSON REST service", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP and metrics servers (default)
    Serve,
    /// Manage user accounts
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a user in the configured database
    Create { email: String, password: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    logging::init(config.environment)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::User {
            command: UserCommands::Create { email, password },
        } => create_user(&config, &email, &password).await,
    }
}

async fn serve(config: ServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        service = %config.service_name,
        environment = %config.environment,
        port = config.server.port,
        metrics_port = config.server.metrics_port,
        "Configuration loaded"
    );

    let mailer = if config.mailgun.is_configured() {
        Some(Mailgun::new(&config.mailgun)?)
    } else {
        tracing::info!("Mailgun not configured, mail route disabled");
        None
    };

    let app = if config.database.is_configured() {
        app::build(&config, PgUsers::connect_lazy(&config.database)?, mailer)?
    } else {
        tracing::warn!("Database not configured, users are kept in memory");
        app::build(&config, MemoryUsers::new(), mailer)?
    };

    run(app, &config).await
}

async fn run(app: App, config: &ServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    app.into_server(config).run_until_signal().await?;
    Ok(())
}

async fn create_user(
    config: &ServiceConfig,
    email: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if !email.validate_email() {
        return Err(format!("invalid e-mail address: {email}").into());
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!("password must be at least {MIN_PASSWORD_LENGTH} characters").into());
    }
    if !config.database.is_configured() {
        return Err("database not configured (set database.host or DB_HOST)".into());
    }

    let users = PgUsers::connect_lazy(&config.database)?;
    let user = User::new(email, password)?;
    users.insert(&user).await?;

    println!("created user {} ({})", user.email, user.id);
    Ok(())
}

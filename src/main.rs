//! TeachFlow CLI - session and access control for a school portal
//!
//! Run `teachflow --help` for usage information.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use teachflow::auth::{AccessPolicy, ProfileRecord, Role, SessionManager};
use teachflow::config::{Config, LogFormat};
use teachflow::nav::{
    can_upload_resources, dashboard_cards, nav_items, GuardDecision, NavigationGuard, RoleView, Route,
    UiEvent,
};
use teachflow::service::MemoryAuthService;
use tokio::sync::mpsc;
use tracing::{debug, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(
    name = "teachflow",
    about = "Session and role-based access control for the TeachFlow school portal",
    version
)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the route table and who may reach each route
    Routes {
        /// Only show routes reachable by any of these roles (comma-separated)
        #[arg(short, long)]
        role: Option<String>,
    },

    /// Sign in against the configured accounts and report the outcome
    Check {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,

        /// Route to navigate to after signing in
        #[arg(short, long)]
        route: Option<String>,

        /// Print the resolved identity as JSON
        #[arg(long)]
        json: bool,
    },

    /// Initialize configuration
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Commands::Init { force } = cli.command {
        return init_config(cli.config, force).await;
    }

    // Load configuration
    let config = if let Some(config_path) = &cli.config {
        Config::load(config_path).await?
    } else {
        let default_path = Config::default_path();
        if default_path.exists() {
            Config::load(&default_path).await?
        } else {
            Config::default()
        }
    };

    init_logging(&config, cli.verbose);
    debug!(environment = ?config.app.environment, accounts = config.accounts.len(), "Configuration loaded");

    match cli.command {
        Commands::Routes { role } => show_routes(role)?,
        Commands::Check {
            email,
            password,
            route,
            json,
        } => check_login(config, email, password, route, json).await?,
        Commands::Init { .. } => {}
    }

    Ok(())
}

fn init_logging(config: &Config, verbose: u8) {
    let level = match verbose {
        0 => None,
        1 => Some(Level::DEBUG),
        _ => Some(Level::TRACE),
    };

    let mut filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    if let Some(level) = level {
        filter = filter.add_directive(level.into());
    }

    let registry = tracing_subscriber::registry().with(filter);
    match config.logging.format {
        LogFormat::Json => registry.with(fmt::layer().json().with_writer(std::io::stderr)).init(),
        LogFormat::Pretty => registry.with(fmt::layer().with_writer(std::io::stderr)).init(),
    }
}

fn show_routes(role: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let wanted = match role {
        Some(names) => Role::parse_many(&names)?,
        None => AccessPolicy::all(),
    };

    println!("{:<16} {:<14} {}", "PATH", "SCREEN", "ROLES");
    println!("{}", "-".repeat(70));

    for route in Route::ALL {
        let roles = match route.policy() {
            Some(policy) => {
                if !wanted.roles().any(|r| policy.contains(r)) {
                    continue;
                }
                policy.to_string()
            }
            None => "(public)".to_string(),
        };
        println!("{:<16} {:<14} {}", route.path(), route.label(), roles);
    }

    Ok(())
}

async fn check_login(
    config: Config,
    email: String,
    password: String,
    route: Option<String>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = Arc::new(MemoryAuthService::new());
    for account in &config.accounts {
        service.add_account(
            &account.email,
            account.password.expose(),
            ProfileRecord {
                display_name: account.name.clone(),
                role: account.role.as_str().to_string(),
                tenant_id: account.school.clone(),
            },
        );
    }
    info!(accounts = service.account_count(), "Seeded auth service");

    let (manager, mut events) = SessionManager::new(service, &config);
    let subscription = manager.start();
    manager.bootstrap().await;

    let outcome = manager.login(&email, &password).await;
    print_events(&mut events);

    if !outcome.is_success() {
        return Err("Login rejected".into());
    }

    match manager.identity() {
        Some(identity) if json => println!("{}", serde_json::to_string_pretty(&identity)?),
        Some(identity) => {
            println!("\nSigned in as {} <{}>", identity.name, identity.email);
            println!("  Role:   {}", identity.role.label());
            println!("  School: {}", identity.school_id.as_deref().unwrap_or("-"));
            println!("  Via:    {:?}", outcome);

            println!("\nMenu:");
            for item in nav_items(Some(&identity)) {
                println!("  {:<14} {}", item.label, item.href);
            }

            println!("\nDashboard:");
            for (card, caption) in dashboard_cards(identity.role) {
                println!("  {:<20} {}", card.title(), caption);
            }
        }
        None => println!("\nSigned in, but no identity could be resolved"),
    }

    if let Some(path) = route {
        let route = Route::from_path(&path);
        let decision = NavigationGuard::navigate(&mut manager.watch(), route).await;
        println!("\n{} -> {:?}", route, decision);

        if let (GuardDecision::Render, Some(identity)) = (decision, manager.identity()) {
            if let Some(view) = RoleView::for_page(route, identity.role) {
                println!("  View: {:?}", view);
            }
            if route == Route::Resources {
                println!("  Uploads: {}", can_upload_resources(identity.role));
            }
        }
    }

    if let Some(subscription) = subscription {
        subscription.shutdown().await;
    }
    Ok(())
}

fn print_events(events: &mut mpsc::UnboundedReceiver<UiEvent>) {
    while let Ok(event) = events.try_recv() {
        match event {
            UiEvent::Notify(n) => println!("[{}] {}: {}", n.kind.as_str(), n.title, n.description),
            UiEvent::Navigate(route) => println!("-> {}", route),
        }
    }
}

async fn init_config(path: Option<PathBuf>, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = path.unwrap_or_else(Config::default_path);

    if config_path.exists() && !force {
        return Err(format!(
            "Configuration already exists at {}. Use --force to overwrite.",
            config_path.display()
        )
        .into());
    }

    // Create config directory
    if let Some(parent) = config_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let default_config = r#"# TeachFlow Configuration

[app]
name = "TeachFlow"
# production | development | test (TEACHFLOW_ENV overrides)
environment = "development"

# Demo sign-in without a backend; refused in production
[dev_identity]
enabled = true
domain = "example.com"
shared_secret = "password"
default_school = "1"

[session]
login_settle_timeout_ms = 5000

[logging]
level = "info"
format = "pretty"

# Accounts seeded into the in-memory auth service
# [[accounts]]
# email = "principal@school.org"
# password = "change-me"
# name = "Seymour Skinner"
# role = "school_admin"
# school = "1"
"#;

    tokio::fs::write(&config_path, default_config).await?;

    println!("Configuration initialized at {}", config_path.display());
    Ok(())
}

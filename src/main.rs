use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rightsdesk::config::ServerConfig;
use rightsdesk::identity::{bootstrap_admin, issue_token};
use rightsdesk::server::{AppState, create_router};
use rightsdesk::store::SqliteStore;

const TOKEN_FILE: &str = ".admin_token";

#[cfg(unix)]
fn set_restrictive_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        tracing::warn!("Failed to set permissions on {}: {e}", path.display());
    }
}

#[derive(Parser)]
#[command(name = "rightsdesk")]
#[command(about = "A royalty and rights back office for music labels", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// TOML config file; flags below override its values
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long, short)]
        port: Option<u16>,

        /// Data directory for the database
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Initialize the server (create database, first admin and admin token)
    Init {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,

        /// Admin login email
        #[arg(long, env = "RIGHTSDESK_ADMIN_EMAIL")]
        email: String,

        /// Admin password (at least 8 characters)
        #[arg(long, env = "RIGHTSDESK_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long)]
        nickname: Option<String>,
    },
}

fn run_init(data_dir: &Path, email: &str, password: &str, nickname: Option<&str>) -> anyhow::Result<()> {
    fs::create_dir_all(data_dir)?;

    let config = ServerConfig {
        data_dir: data_dir.to_path_buf(),
        ..ServerConfig::default()
    };
    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;

    let token_file = data_dir.join(TOKEN_FILE);

    let Some(admin) = bootstrap_admin(&store, email, password, nickname)? else {
        bail!(
            "Server already initialized. Admin token exists at: {}",
            token_file.display()
        );
    };

    let (_token, raw_token) = issue_token(&store, admin.id, None)?;
    fs::write(&token_file, &raw_token)?;

    #[cfg(unix)]
    set_restrictive_permissions(&token_file);

    println!();
    println!("========================================");
    println!("Created admin '{}'.", admin.email);
    println!("Admin token (save this, it won't be shown again):");
    println!();
    println!("  {raw_token}");
    println!();
    println!("Token also written to: {}", token_file.display());
    println!("========================================");
    println!();

    Ok(())
}

fn load_config(
    path: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
    data_dir: Option<PathBuf>,
) -> anyhow::Result<ServerConfig> {
    let mut config = match path {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };

    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(data_dir) = data_dir {
        config.data_dir = data_dir;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("rightsdesk=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init {
                data_dir,
                email,
                password,
                nickname,
            } => {
                run_init(&data_dir, &email, &password, nickname.as_deref())?;
            }
        },
        Commands::Serve {
            config,
            host,
            port,
            data_dir,
        } => {
            let config = load_config(config.as_deref(), host, port, data_dir)?;

            if !config.db_path().exists() {
                bail!(
                    "Server not initialized. Run 'rightsdesk admin init' first to create the database and admin account."
                );
            }

            let store = SqliteStore::new(config.db_path())?;
            store.initialize()?;
            if !store.has_admin()? {
                bail!(
                    "Server not initialized. Run 'rightsdesk admin init' first to create the database and admin account."
                );
            }

            let state = Arc::new(AppState::new(Arc::new(store), &config));

            let app = create_router(state);
            let addr = config.socket_addr()?;

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}

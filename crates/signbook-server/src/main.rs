mod api;
mod cli;
mod config;
mod storage;

use std::sync::Arc;

use crate::cli::{ConfigCommand, ServeArgs};
use clap::Parser;
use color_eyre::Result;
use signbook_accounts::AccountService;
use signbook_core::{accounts::Accounts, store::RecordStore};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Entry point wiring the CLI to the HTTP server and admin commands.
#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = cli::Cli::parse();
    let config = config::load()?;
    match cli
        .command
        .unwrap_or(cli::Command::Serve(ServeArgs::default()))
    {
        cli::Command::Serve(args) => serve(&config, &args).await?,
        cli::Command::Version => print_version(),
        cli::Command::Health => run_health_check(&config).await?,
        cli::Command::Users => print_users(&config).await?,
        cli::Command::Config(ConfigCommand::Init) => init_config(&config)?,
    }

    Ok(())
}

fn init_tracing() {
    // Respect user-provided filters, default to info to avoid noisy stdout.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn print_version() {
    println!("signbook {}", env!("CARGO_PKG_VERSION"));
}

async fn serve(config: &config::Config, args: &ServeArgs) -> Result<()> {
    let settings = config::Settings::resolve(config, args)?;
    let store = storage::store_from_settings(&settings);
    store
        .ensure_initialized()
        .await
        .map_err(|e| color_eyre::eyre::eyre!(e.to_string()))?;

    let accounts: Arc<dyn Accounts> = Arc::new(AccountService::new(store));
    let app = api::router(accounts, settings.cors_origin.as_deref())?;

    let listener = TcpListener::bind(settings.listen).await?;
    info!(addr = %settings.listen, data_file = ?settings.data_file, "server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c, serving until killed: {err}");
        std::future::pending::<()>().await;
    }
}

/// Runs a quick health check of the user table.
async fn run_health_check(config: &config::Config) -> Result<()> {
    let settings = config::Settings::resolve(config, &ServeArgs::default())?;
    let store = storage::store_from_settings(&settings);
    let count = run_store_health(&store).await?;
    println!("Storage: ok ({count} users in {})", settings.data_file.display());
    Ok(())
}

async fn run_store_health<S: RecordStore>(store: &S) -> Result<usize> {
    store
        .ensure_initialized()
        .await
        .map_err(|e| color_eyre::eyre::eyre!(e.to_string()))?;
    let records = store
        .read_all()
        .await
        .map_err(|e| color_eyre::eyre::eyre!(e.to_string()))?;
    Ok(records.len())
}

async fn print_users(config: &config::Config) -> Result<()> {
    let settings = config::Settings::resolve(config, &ServeArgs::default())?;
    let accounts = AccountService::new(storage::store_from_settings(&settings));
    let lines = user_lines(&accounts).await?;
    if lines.is_empty() {
        println!("No users yet.");
        return Ok(());
    }
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

async fn user_lines(accounts: &dyn Accounts) -> Result<Vec<String>> {
    let users = accounts
        .list_users()
        .await
        .map_err(|e| color_eyre::eyre::eyre!(e.to_string()))?;
    Ok(users
        .into_iter()
        .map(|u| format!("{} <{}> phone={} gender={}", u.name, u.email, u.phone, u.gender))
        .collect())
}

fn init_config(config: &config::Config) -> Result<()> {
    let path = config::write_default_if_missing(config)?;
    println!("Config initialized at {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use signbook_core::{accounts::NewAccount, store::InMemoryRecordStore};
    use signbook_storage::csv_file_store::CsvFileStore;

    use super::*;

    #[tokio::test]
    async fn health_check_creates_and_reads_table() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CsvFileStore::new(dir.path().join("users.csv"));
        let count = run_store_health(&store)
            .await
            .expect("health check should succeed");
        assert_eq!(count, 0);
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn user_lines_omit_passwords() {
        let accounts = AccountService::new(InMemoryRecordStore::new());
        accounts
            .register(NewAccount {
                name: "Ann".into(),
                email: "a@x.com".into(),
                phone: "1234567890".into(),
                password: "pass12".into(),
                gender: "female".into(),
            })
            .await
            .expect("register");

        let lines = user_lines(&accounts).await.expect("lines");
        assert_eq!(lines, vec!["Ann <a@x.com> phone=1234567890 gender=female"]);
        assert!(!lines[0].contains("pass12"));
    }
}

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use daybook::backend::{self, StaticIdentity};
use daybook::cli::{self, Cli, RemoteContext};
use daybook::preferences::Preferences;
use daybook::remote::{RemoteMirror, RestRemote};
use daybook::rewards::ConsoleNotifier;
use daybook::{Config, Database, Planner, Profile, RecordStore};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // --dev keeps a separate config and database
    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };

    let config = match &cli.config {
        Some(path) => Config::load_from(&PathBuf::from(path), profile)?,
        None => Config::load_with_profile(profile)?,
    };

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let db_path = config.get_database_path();
    let db = Database::new(
        db_path
            .to_str()
            .ok_or_else(|| color_eyre::eyre::eyre!("Database path contains invalid UTF-8"))?,
    )?
    .with_quota(config.storage_quota_bytes);
    let store = RecordStore::new(Arc::new(db));

    let user_id = cli.user.clone().or_else(|| config.identity.user_id.clone());
    let mirror: Option<Arc<dyn RemoteMirror>> = match &config.remote {
        Some(remote) => Some(Arc::new(RestRemote::new(remote)?)),
        None => None,
    };

    let bypass_auth = Preferences::new(store.clone()).bypass_auth();
    let backend = backend::select_backend(
        &StaticIdentity(user_id.clone()),
        store.clone(),
        mirror.clone(),
        bypass_auth,
    );

    let mut planner = Planner::open(store, backend, Arc::new(ConsoleNotifier)).await?;
    let remote = RemoteContext { mirror, user_id };
    cli::dispatch(cli.command, &mut planner, &remote).await?;

    Ok(())
}

//! impala-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and serves the site API, admin sign-in, CSV
//! exports, and uploaded media over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `admin_password_hash` in config.toml:
//!
//! ```
//! cargo run -p impala-server --bin server -- --hash-password
//! ```

use std::{
  net::SocketAddr,
  path::{Path, PathBuf},
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum::{body::Body, http::Request};
use clap::Parser;
use impala_server::{AppState, ServerConfig, media::FsMediaStore};
use impala_store_sqlite::SqliteStore;
use rand_core::OsRng;
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Impala site server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,

  /// Rewrite legacy `subscribedAt` fields to `subscribed_at` and exit.
  #[arg(long)]
  migrate_subscriptions: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_password {
    let password = read_password()?;
    if password.is_empty() {
      anyhow::bail!("refusing to hash an empty password");
    }
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("IMPALA"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if cli.migrate_subscriptions {
    let rewritten = impala_core::migrate::migrate_subscription_timestamps(&store)
      .await
      .context("subscription migration failed")?;
    println!("{rewritten} subscription(s) migrated");
    return Ok(());
  }

  if !server_cfg.export_auth {
    tracing::warn!("export_auth is off: CSV exports are readable by anyone");
  }
  if server_cfg.admin_password_hash.is_none() {
    tracing::warn!("admin_password_hash is not set: admin sign-in is disabled");
  }

  let media_dir = expand_tilde(&server_cfg.media_dir);
  let media = FsMediaStore::new(media_dir.clone(), &server_cfg.public_url);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let project = server_cfg.project_id.clone();
  tracing::info!(%project, media = ?media_dir, "starting");

  let state = AppState::new(store, media, server_cfg);
  let app = impala_server::router(state)
    .nest_service("/media", ServeDir::new(&media_dir))
    .layer(TraceLayer::new_for_http().make_span_with(move |req: &Request<Body>| {
      tracing::info_span!("server", project = %project, method = %req.method(), uri = %req.uri())
    }));

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  // Peer addresses key the failed sign-in counters.
  axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
    .await
    .context("server error")?;

  Ok(())
}

/// One line from stdin, prompt on stderr so stdout stays just the hash.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  eprint!("Admin password: ");
  io::stderr().flush().ok();
  let mut line = String::new();
  io::stdin()
    .lock()
    .read_line(&mut line)
    .context("reading password from stdin")?;
  Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

fn expand_tilde(path: &Path) -> PathBuf {
  match (path.strip_prefix("~"), std::env::var_os("HOME")) {
    (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
    _ => path.to_path_buf(),
  }
}

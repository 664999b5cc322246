//! `impala`: admin console for the Impala site.
//!
//! # Usage
//!
//! ```
//! impala --url http://localhost:8080 --email admin@impala.org --password secret stats
//! impala --config ~/.config/impala/config.toml articles list
//! impala export contacts --out contacts.csv
//! ```

mod app;
mod client;

use std::{
  io::{self, BufRead, Write},
  path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use app::{AdminConsole, stat_cards};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig, ArticleRequest, ExportKind, UploadRequest};
use impala_core::record::{ArticleDraft, fields};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DELETE_PROMPT: &str =
  "Are you sure you want to delete this article? This action cannot be undone.";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "impala", about = "Admin console for the Impala site")]
struct Args {
  /// Path to a TOML config file (url, email, password).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the impala server (default: http://localhost:8080).
  #[arg(long, env = "IMPALA_URL")]
  url: Option<String>,

  /// Admin email.
  #[arg(long, env = "IMPALA_EMAIL")]
  email: Option<String>,

  /// Admin password (plaintext).
  #[arg(long, env = "IMPALA_PASSWORD")]
  password: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Show the dashboard counts.
  Stats,
  /// Download a collection as CSV.
  Export {
    kind: ExportKind,
    /// Output file (default: `<kind>-<YYYY-MM-DD>.csv`).
    #[arg(short, long)]
    out:  Option<PathBuf>,
  },
  /// Manage published updates.
  #[command(subcommand)]
  Articles(ArticlesCommand),
}

#[derive(Subcommand, Debug)]
enum ArticlesCommand {
  /// List articles, newest first.
  List,
  /// Delete an article.
  Delete {
    id:  String,
    /// Skip the confirmation prompt.
    #[arg(short, long)]
    yes: bool,
  },
  /// Publish a new article.
  Create(ArticleArgs),
  /// Edit an existing article; omitted fields keep their current value.
  Edit {
    id:   String,
    #[command(flatten)]
    args: ArticleArgs,
  },
}

#[derive(clap::Args, Debug)]
struct ArticleArgs {
  #[arg(long)]
  title:     Option<String>,
  /// Article body as HTML.
  #[arg(long, conflicts_with = "body_file")]
  body:      Option<String>,
  /// Read the HTML body from a file.
  #[arg(long, value_name = "FILE")]
  body_file: Option<PathBuf>,
  /// Comma-separated keywords.
  #[arg(long)]
  keywords:  Option<String>,
  /// Image file to upload as the featured image.
  #[arg(long, value_name = "FILE")]
  image:     Option<PathBuf>,
  /// Image URL to use directly, or if the upload fails.
  #[arg(long, value_name = "URL")]
  image_url: Option<String>,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:      String,
  #[serde(default)]
  email:    String,
  #[serde(default)]
  password: String,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags and env override the config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| "http://localhost:8080".to_string()),
    email:    args
      .email
      .or_else(|| (!file_cfg.email.is_empty()).then(|| file_cfg.email.clone()))
      .unwrap_or_default(),
    password: args
      .password
      .or_else(|| (!file_cfg.password.is_empty()).then(|| file_cfg.password.clone()))
      .unwrap_or_default(),
  };

  let mut client = ApiClient::new(api_config)?;

  match args.command {
    Command::Stats => {
      let user = client.sign_in().await?;
      println!("Signed in as {} <{}>\n", user.display_name, user.email);
      let stats = client.stats().await?;
      for card in stat_cards(&stats) {
        println!("{card}");
      }
    }
    Command::Export { kind, out } => {
      client.sign_in().await?;
      let csv = client.export(kind).await?;
      let path = out.unwrap_or_else(|| default_export_path(kind));
      std::fs::write(&path, csv).with_context(|| format!("writing {}", path.display()))?;
      println!("Saved {}", path.display());
    }
    Command::Articles(ArticlesCommand::List) => {
      let mut console = AdminConsole::new(client);
      console.load_articles().await?;
      for line in console.table() {
        println!("{line}");
      }
    }
    Command::Articles(ArticlesCommand::Delete { id, yes }) => {
      client.sign_in().await?;
      let mut console = AdminConsole::new(client);
      console.load_articles().await?;
      let title = console
        .find(&id)
        .map(|a| a.title.clone())
        .ok_or_else(|| anyhow!("no article with id {id}"))?;

      if !yes && !confirm(&format!("\"{title}\"\n{DELETE_PROMPT}"))? {
        println!("Cancelled.");
        return Ok(());
      }
      console.delete_article(&id).await?;
      println!("{}", console.status_msg);
      for line in console.table() {
        println!("{line}");
      }
    }
    Command::Articles(ArticlesCommand::Create(article)) => {
      let body = build_request(article, None)?;
      client.sign_in().await?;
      let doc = client.create_article(&body).await?;
      println!("Published {} ({})", body.title, doc.id);
    }
    Command::Articles(ArticlesCommand::Edit { id, args }) => {
      let current = client.get_article(&id).await?;
      let current = ArticleDraft {
        title:          current.str_field(fields::TITLE).unwrap_or_default().to_owned(),
        body:           current.str_field(fields::BODY).unwrap_or_default().to_owned(),
        keywords:       current.str_field(fields::KEYWORDS).unwrap_or_default().to_owned(),
        featured_image: None,
      };
      let body = build_request(args, Some(current))?;
      client.sign_in().await?;
      client.update_article(&id, &body).await?;
      println!("Updated {id}");
    }
  }

  Ok(())
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn default_export_path(kind: ExportKind) -> PathBuf {
  let date = chrono::Local::now().format("%Y-%m-%d");
  PathBuf::from(format!("{}-{date}.csv", kind.as_str()))
}

/// Ask a yes/no question on stdin; anything but `y`/`yes` is a no.
fn confirm(prompt: &str) -> Result<bool> {
  print!("{prompt} [y/N] ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Merge flags over `current` (on edit), validate, and attach any image.
fn build_request(args: ArticleArgs, current: Option<ArticleDraft>) -> Result<ArticleRequest> {
  let current = current.unwrap_or_default();
  let body = match (&args.body, &args.body_file) {
    (Some(body), _) => body.clone(),
    (None, Some(path)) => std::fs::read_to_string(path)
      .with_context(|| format!("reading {}", path.display()))?,
    (None, None) => current.body,
  };
  let draft = ArticleDraft {
    title: args.title.unwrap_or(current.title),
    body,
    keywords: args.keywords.unwrap_or(current.keywords),
    featured_image: None,
  };
  draft.validate().map_err(|e| anyhow!("{e}"))?;

  let upload = args.image.as_deref().map(read_upload).transpose()?;

  Ok(ArticleRequest {
    title: draft.title,
    body: draft.body,
    keywords: draft.keywords,
    featured_image_url: args.image_url.filter(|u| !u.trim().is_empty()),
    upload,
  })
}

fn read_upload(path: &Path) -> Result<UploadRequest> {
  let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
  let file_name = path
    .file_name()
    .and_then(|n| n.to_str())
    .unwrap_or("image")
    .to_owned();
  let media_type = match path
    .extension()
    .and_then(|e| e.to_str())
    .map(str::to_ascii_lowercase)
    .as_deref()
  {
    Some("jpg" | "jpeg") => "image/jpeg",
    Some("png") => "image/png",
    Some("gif") => "image/gif",
    Some("webp") => "image/webp",
    Some("svg") => "image/svg+xml",
    _ => "application/octet-stream",
  };
  Ok(UploadRequest { file_name, media_type: media_type.to_owned(), data: B64.encode(bytes) })
}

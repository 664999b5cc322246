//! Admin console state: the article list and dashboard formatting.

use std::cmp::Reverse;

use anyhow::Result;
use impala_core::{
  document::Document,
  record::fields,
  stats::DashboardStats,
  time::Timestamp,
};

use crate::client::ApiClient;

// ─── Article source ───────────────────────────────────────────────────────────

/// Where the console reads and deletes articles.
pub trait ArticleSource {
  async fn list_articles(&self) -> Result<Vec<Document>>;
  async fn delete_article(&self, id: &str) -> Result<()>;
}

impl ArticleSource for ApiClient {
  async fn list_articles(&self) -> Result<Vec<Document>> { ApiClient::list_articles(self).await }

  async fn delete_article(&self, id: &str) -> Result<()> { ApiClient::delete_article(self, id).await }
}

// ─── Rows ─────────────────────────────────────────────────────────────────────

/// One line of the article table.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleRow {
  pub id:         String,
  pub title:      String,
  pub author:     String,
  pub created_at: Option<Timestamp>,
}

impl ArticleRow {
  pub fn from_document(doc: &Document) -> Self {
    let author = doc
      .field(fields::AUTHOR)
      .and_then(|a| a.get("displayName"))
      .and_then(|n| n.as_str())
      .map(str::trim)
      .filter(|n| !n.is_empty())
      .unwrap_or("Unknown");

    Self {
      id:         doc.id.clone(),
      title:      doc.str_field(fields::TITLE).unwrap_or_default().to_owned(),
      author:     author.to_owned(),
      created_at: doc.timestamp(fields::ARTICLE_TIMESTAMP),
    }
  }
}

/// `Jan 5, 2024`
pub fn format_date(ts: Option<Timestamp>) -> String {
  match ts {
    Some(ts) => ts.format("%b %-d, %Y").to_string(),
    None => "Unknown date".to_owned(),
  }
}

/// The three dashboard cards, one per line.
pub fn stat_cards(stats: &DashboardStats) -> [String; 3] {
  [
    format!(
      "Total Contacts         {:>6}  (+{} this week)",
      stats.total_contacts, stats.contacts_this_week
    ),
    format!(
      "Newsletter Subscribers {:>6}  (+{} this week)",
      stats.total_subscribers, stats.subscribers_this_week
    ),
    format!(
      "Published Updates      {:>6}  (+{} this month)",
      stats.total_articles, stats.articles_this_month
    ),
  ]
}

// ─── Console ──────────────────────────────────────────────────────────────────

/// Top-level console state.
pub struct AdminConsole<C> {
  pub source:     C,
  /// Articles newest first, as last loaded and locally edited.
  pub articles:   Vec<ArticleRow>,
  /// One-line status message printed after each action.
  pub status_msg: String,
}

impl<C: ArticleSource> AdminConsole<C> {
  pub fn new(source: C) -> Self {
    Self { source, articles: Vec::new(), status_msg: String::new() }
  }

  /// Fetch all articles and sort them newest first.
  pub async fn load_articles(&mut self) -> Result<()> {
    match self.source.list_articles().await {
      Ok(docs) => {
        let mut rows: Vec<_> = docs.iter().map(ArticleRow::from_document).collect();
        rows.sort_by_key(|r| Reverse(r.created_at));
        self.articles = rows;
        self.status_msg = String::new();
        Ok(())
      }
      Err(e) => {
        self.status_msg = format!("Error: {e}");
        Err(e)
      }
    }
  }

  /// Delete on the server, then drop the row locally without reloading.
  pub async fn delete_article(&mut self, id: &str) -> Result<()> {
    match self.source.delete_article(id).await {
      Ok(()) => {
        self.articles.retain(|a| a.id != id);
        self.status_msg = "Article deleted.".into();
        Ok(())
      }
      Err(e) => {
        self.status_msg = format!("Error: {e}");
        Err(e)
      }
    }
  }

  pub fn find(&self, id: &str) -> Option<&ArticleRow> { self.articles.iter().find(|a| a.id == id) }

  /// The article table as printable lines.
  pub fn table(&self) -> Vec<String> {
    if self.articles.is_empty() {
      return vec!["No articles yet.".to_owned()];
    }
    let width = self
      .articles
      .iter()
      .map(|a| a.title.chars().count())
      .max()
      .unwrap_or(0)
      .max("Title".len());

    let mut lines = vec![format!("{:<width$}  {:<20}  {:<14}  Id", "Title", "Author", "Date")];
    for a in &self.articles {
      lines.push(format!(
        "{:<width$}  {:<20}  {:<14}  {}",
        a.title,
        a.author,
        format_date(a.created_at),
        a.id
      ));
    }
    lines
  }
}

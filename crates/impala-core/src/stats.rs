//! Dashboard statistics: counts computed on read, never stored.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::{
  document::Document,
  record::fields,
  time::Timestamp,
};

/// Window for "this week" counts, in days.
pub const WEEK_DAYS: i64 = 7;
/// Window for "this month" counts, in days.
pub const MONTH_DAYS: i64 = 30;

/// The six numbers shown on the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
  pub total_contacts:        usize,
  pub total_subscribers:     usize,
  pub total_articles:        usize,
  pub contacts_this_week:    usize,
  pub subscribers_this_week: usize,
  pub articles_this_month:   usize,
}

impl DashboardStats {
  /// Tally all three collections relative to `now`.
  pub fn tally(
    now: Timestamp,
    contacts: &[Document],
    subscriptions: &[Document],
    articles: &[Document],
  ) -> Self {
    let mut stats = Self::default();
    stats.record_contacts(now, contacts);
    stats.record_subscriptions(now, subscriptions);
    stats.record_articles(now, articles);
    stats
  }

  pub fn record_contacts(&mut self, now: Timestamp, docs: &[Document]) {
    self.total_contacts = docs.len();
    self.contacts_this_week =
      count_since(docs, fields::CONTACT_TIMESTAMP, now - Duration::days(WEEK_DAYS));
  }

  pub fn record_subscriptions(&mut self, now: Timestamp, docs: &[Document]) {
    self.total_subscribers = docs.len();
    self.subscribers_this_week =
      count_since(docs, fields::SUBSCRIPTION_TIMESTAMP, now - Duration::days(WEEK_DAYS));
  }

  pub fn record_articles(&mut self, now: Timestamp, docs: &[Document]) {
    self.total_articles = docs.len();
    self.articles_this_month =
      count_since(docs, fields::ARTICLE_TIMESTAMP, now - Duration::days(MONTH_DAYS));
  }
}

/// Documents whose timestamp is at or after `cutoff`. Documents without a
/// parseable timestamp are not counted.
fn count_since(docs: &[Document], names: &[&str], cutoff: Timestamp) -> usize {
  docs
    .iter()
    .filter_map(|d| d.timestamp(names))
    .filter(|ts| *ts >= cutoff)
    .count()
}

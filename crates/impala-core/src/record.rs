//! Typed records written by the site's forms and admin screens.
//!
//! Writers go through these types so every document they produce has the
//! same field names. Readers that must cope with whatever is actually in the
//! store (the CSV export, the stats aggregator) read raw [`Document`]s and
//! use the field-name constants below.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
  Error, Result, ValidationError,
  document::{Collection, Document, Fields},
  time::{Timestamp, to_iso_string},
};

// ─── Field names ─────────────────────────────────────────────────────────────

pub mod fields {
  pub const NAME: &str = "name";
  pub const EMAIL: &str = "email";
  pub const SUBJECT: &str = "subject";
  pub const MESSAGE: &str = "message";
  pub const CREATED_AT: &str = "created_at";
  pub const UPDATED_AT: &str = "updated_at";
  /// Older contact documents carry their submission time here.
  pub const LEGACY_CONTACT_TIMESTAMP: &str = "timestamp";
  pub const SUBSCRIBED_AT: &str = "subscribed_at";
  /// Pre-migration spelling of [`SUBSCRIBED_AT`].
  pub const LEGACY_SUBSCRIBED_AT: &str = "subscribedAt";
  pub const TITLE: &str = "title";
  pub const BODY: &str = "body";
  pub const KEYWORDS: &str = "keywords";
  pub const FEATURED_IMAGE: &str = "featured_image";
  pub const AUTHOR: &str = "author";

  /// Where a contact's submission time may be found, preferred first.
  pub const CONTACT_TIMESTAMP: &[&str] = &[CREATED_AT, LEGACY_CONTACT_TIMESTAMP];
  /// Where a subscription's time may be found, preferred first.
  pub const SUBSCRIPTION_TIMESTAMP: &[&str] = &[SUBSCRIBED_AT, LEGACY_SUBSCRIBED_AT];
  pub const ARTICLE_TIMESTAMP: &[&str] = &[CREATED_AT];
}

fn to_fields<T: Serialize>(value: &T) -> Result<Fields> {
  match serde_json::to_value(value)? {
    Value::Object(map) => Ok(map),
    other => Err(Error::InvalidDocument {
      id:     String::new(),
      reason: format!("expected an object, got {other}"),
    }),
  }
}

fn require(value: &str, message: &str) -> Result<(), ValidationError> {
  if value.trim().is_empty() {
    Err(ValidationError::new(message))
  } else {
    Ok(())
  }
}

fn require_email(email: &str) -> Result<(), ValidationError> {
  require(email, "Email is required.")?;
  let trimmed = email.trim();
  match trimmed.split_once('@') {
    Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
    _ => Err(ValidationError::new("Please enter a valid email address.")),
  }
}

// ─── Contact ─────────────────────────────────────────────────────────────────

/// A contact-form submission as entered by a visitor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewContact {
  pub name:    String,
  pub email:   String,
  #[serde(default)]
  pub subject: String,
  pub message: String,
}

impl NewContact {
  pub fn validate(&self) -> Result<(), ValidationError> {
    require(&self.name, "Name is required.")?;
    require_email(&self.email)?;
    require(&self.message, "Message is required.")
  }

  /// Validate and stamp the submission, producing the stored record.
  pub fn into_contact(self, now: Timestamp) -> Result<Contact, ValidationError> {
    self.validate()?;
    Ok(Contact {
      name:       self.name.trim().to_owned(),
      email:      self.email.trim().to_owned(),
      subject:    self.subject.trim().to_owned(),
      message:    self.message,
      created_at: to_iso_string(now),
    })
  }
}

/// A stored contact-form submission. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
  pub name:       String,
  pub email:      String,
  pub subject:    String,
  pub message:    String,
  pub created_at: String,
}

impl Contact {
  pub const COLLECTION: Collection = Collection::Contacts;

  pub fn to_fields(&self) -> Result<Fields> { to_fields(self) }
}

// ─── Subscription ────────────────────────────────────────────────────────────

/// A newsletter sign-up as entered by a visitor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSubscription {
  pub email: String,
}

impl NewSubscription {
  pub fn into_subscription(
    self,
    now: Timestamp,
  ) -> Result<Subscription, ValidationError> {
    require_email(&self.email)?;
    Ok(Subscription {
      email:         self.email.trim().to_owned(),
      subscribed_at: to_iso_string(now),
    })
  }
}

/// A stored newsletter subscription. Immutable after creation.
///
/// Deserialising accepts the legacy `subscribedAt` spelling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
  pub email:         String,
  #[serde(alias = "subscribedAt")]
  pub subscribed_at: String,
}

impl Subscription {
  pub const COLLECTION: Collection = Collection::Subscriptions;

  pub fn to_fields(&self) -> Result<Fields> { to_fields(self) }
}

// ─── Article ─────────────────────────────────────────────────────────────────

/// Snapshot of the signed-in admin, embedded in an article at creation time.
///
/// Denormalised on purpose: later changes to the account never reach
/// articles already written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
  pub uid:          String,
  #[serde(rename = "displayName")]
  pub display_name: String,
}

/// The editable part of an article, as submitted by the admin form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticleDraft {
  pub title:          String,
  /// Rich HTML from the editor.
  pub body:           String,
  #[serde(default)]
  pub keywords:       String,
  #[serde(default)]
  pub featured_image: Option<String>,
}

impl ArticleDraft {
  pub fn validate(&self) -> Result<(), ValidationError> {
    require(&self.title, "Title is required.")?;
    if rendered_text(&self.body).is_empty() {
      return Err(ValidationError::new("Content is required."));
    }
    Ok(())
  }

  /// Build a new article owned by `author`.
  pub fn into_article(
    self,
    author: Author,
    now: Timestamp,
  ) -> Result<Article, ValidationError> {
    self.validate()?;
    let stamp = to_iso_string(now);
    Ok(Article {
      title:          self.title.trim().to_owned(),
      body:           self.body,
      keywords:       self.keywords,
      featured_image: self.featured_image,
      created_at:     stamp.clone(),
      updated_at:     stamp,
      author,
    })
  }

  /// Top-level fields to merge into an existing article on edit.
  ///
  /// `author` and `created_at` are never part of the patch. The image is
  /// left untouched when the draft carries none.
  pub fn into_patch(self, now: Timestamp) -> Result<Fields> {
    self.validate()?;
    let mut patch = Fields::new();
    patch.insert(fields::TITLE.into(), Value::String(self.title.trim().to_owned()));
    patch.insert(fields::BODY.into(), Value::String(self.body));
    patch.insert(fields::KEYWORDS.into(), Value::String(self.keywords));
    if let Some(url) = self.featured_image {
      patch.insert(fields::FEATURED_IMAGE.into(), Value::String(url));
    }
    patch.insert(fields::UPDATED_AT.into(), Value::String(to_iso_string(now)));
    Ok(patch)
  }
}

/// A stored article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
  pub title:          String,
  pub body:           String,
  #[serde(default)]
  pub keywords:       String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub featured_image: Option<String>,
  pub created_at:     String,
  pub updated_at:     String,
  pub author:         Author,
}

impl Article {
  pub const COLLECTION: Collection = Collection::Articles;

  pub fn to_fields(&self) -> Result<Fields> { to_fields(self) }

  pub fn from_document(doc: &Document) -> Result<Self> {
    serde_json::from_value(Value::Object(doc.data.clone())).map_err(|e| {
      Error::InvalidDocument { id: doc.id.clone(), reason: e.to_string() }
    })
  }

  /// Comma-separated keywords, trimmed, blanks dropped.
  pub fn keyword_list(&self) -> Vec<&str> {
    self
      .keywords
      .split(',')
      .map(str::trim)
      .filter(|k| !k.is_empty())
      .collect()
  }
}

/// Visible text of an HTML fragment: tags removed, `&nbsp;` treated as
/// space, surrounding whitespace trimmed.
pub fn rendered_text(html: &str) -> String {
  let mut out = String::with_capacity(html.len());
  let mut in_tag = false;
  for c in html.chars() {
    match c {
      '<' => in_tag = true,
      '>' if in_tag => {
        in_tag = false;
        out.push(' ');
      }
      _ if !in_tag => out.push(c),
      _ => {}
    }
  }
  out.replace("&nbsp;", " ").trim().to_owned()
}

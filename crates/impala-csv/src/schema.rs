//! Fixed column layouts for each exportable collection.

use impala_core::{document::Collection, record::fields};

/// One output column.
#[derive(Debug, Clone, Copy)]
pub struct Column {
  /// Header text.
  pub title:  &'static str,
  /// Source field names, preferred first; the first one present is used.
  pub fields: &'static [&'static str],
}

/// The column layout and download name for one collection.
#[derive(Debug, Clone, Copy)]
pub struct ExportSchema {
  pub collection: Collection,
  /// Suggested file name for the `Content-Disposition` header.
  pub file_name:  &'static str,
  pub columns:    &'static [Column],
}

impl ExportSchema {
  pub fn headers(&self) -> impl Iterator<Item = &'static str> + '_ {
    self.columns.iter().map(|c| c.title)
  }
}

pub const CONTACTS: ExportSchema = ExportSchema {
  collection: Collection::Contacts,
  file_name:  "contacts.csv",
  columns:    &[
    Column { title: "Name", fields: &[fields::NAME] },
    Column { title: "Email", fields: &[fields::EMAIL] },
    Column { title: "Subject", fields: &[fields::SUBJECT] },
    Column { title: "Message", fields: &[fields::MESSAGE] },
    Column { title: "Submitted At", fields: fields::CONTACT_TIMESTAMP },
  ],
};

pub const SUBSCRIPTIONS: ExportSchema = ExportSchema {
  collection: Collection::Subscriptions,
  file_name:  "subscriptions.csv",
  columns:    &[
    Column { title: "Email", fields: &[fields::EMAIL] },
    Column { title: "Subscribed At", fields: fields::SUBSCRIPTION_TIMESTAMP },
  ],
};

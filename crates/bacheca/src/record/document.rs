//! Documents: ordinances, templates, circulars, and procedures.

use std::fmt;
use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Entry, EntryDraft, EntryPatch, Record};
use crate::error::Result;
use crate::seed;
use crate::storage::Slot;

/// Kind of document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    /// An ordinance.
    #[serde(alias = "ordinanza")]
    Ordinance,
    /// A reusable form or template.
    #[serde(alias = "modello")]
    Template,
    /// A circular.
    #[serde(alias = "circolare")]
    Circular,
    /// An operating procedure.
    #[serde(alias = "procedura")]
    Procedure,
}

impl DocumentType {
    /// The serialized name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ordinance => "ordinance",
            Self::Template => "template",
            Self::Circular => "circular",
            Self::Procedure => "procedure",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Shared record fields.
    #[serde(flatten)]
    pub entry: Entry,
    /// Document kind.
    #[serde(rename = "type")]
    pub kind: DocumentType,
}

impl Deref for Document {
    type Target = Entry;

    fn deref(&self) -> &Entry {
        &self.entry
    }
}

impl DerefMut for Document {
    fn deref_mut(&mut self) -> &mut Entry {
        &mut self.entry
    }
}

/// Input for creating a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDraft {
    /// Shared fields.
    #[serde(flatten)]
    pub entry: EntryDraft,
    /// Document kind.
    #[serde(rename = "type")]
    pub kind: DocumentType,
}

impl DocumentDraft {
    /// Create a draft of the given kind.
    #[must_use]
    pub fn new(kind: DocumentType, entry: EntryDraft) -> Self {
        Self { entry, kind }
    }
}

/// A partial update to a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentPatch {
    /// Changes to shared fields.
    #[serde(flatten)]
    pub entry: EntryPatch,
    /// New document kind.
    #[serde(rename = "type")]
    pub kind: Option<DocumentType>,
}

impl DocumentPatch {
    /// Check whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kind.is_none() && self.entry.is_empty()
    }
}

impl From<EntryPatch> for DocumentPatch {
    fn from(entry: EntryPatch) -> Self {
        Self { entry, kind: None }
    }
}

impl Record for Document {
    type Draft = DocumentDraft;
    type Patch = DocumentPatch;

    const SLOT: Slot = Slot::Documents;
    const KIND: &'static str = "document";

    fn entry(&self) -> &Entry {
        &self.entry
    }

    fn entry_mut(&mut self) -> &mut Entry {
        &mut self.entry
    }

    fn create(draft: DocumentDraft, id: String, now: DateTime<Utc>) -> Result<Self> {
        draft.entry.validate()?;
        Ok(Self {
            entry: draft.entry.into_entry(id, now),
            kind: draft.kind,
        })
    }

    fn apply(&mut self, patch: DocumentPatch) -> Result<()> {
        patch.entry.validate()?;
        patch.entry.apply_to(&mut self.entry);
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        Ok(())
    }

    fn samples() -> Vec<Self> {
        seed::documents()
    }

    fn type_label(&self) -> Option<&'static str> {
        Some(self.kind.as_str())
    }
}

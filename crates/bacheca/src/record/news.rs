//! News items.

use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Entry, EntryDraft, EntryPatch, Record};
use crate::error::Result;
use crate::seed;
use crate::storage::Slot;

/// A news item on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    /// Shared record fields.
    #[serde(flatten)]
    pub entry: Entry,
}

/// Input for creating a news item.
pub type NewsDraft = EntryDraft;

/// A partial update to a news item.
pub type NewsPatch = EntryPatch;

impl Deref for NewsItem {
    type Target = Entry;

    fn deref(&self) -> &Entry {
        &self.entry
    }
}

impl DerefMut for NewsItem {
    fn deref_mut(&mut self) -> &mut Entry {
        &mut self.entry
    }
}

impl Record for NewsItem {
    type Draft = NewsDraft;
    type Patch = NewsPatch;

    const SLOT: Slot = Slot::News;
    const KIND: &'static str = "news item";

    fn entry(&self) -> &Entry {
        &self.entry
    }

    fn entry_mut(&mut self) -> &mut Entry {
        &mut self.entry
    }

    fn create(draft: NewsDraft, id: String, now: DateTime<Utc>) -> Result<Self> {
        draft.validate()?;
        Ok(Self {
            entry: draft.into_entry(id, now),
        })
    }

    fn apply(&mut self, patch: NewsPatch) -> Result<()> {
        patch.validate()?;
        patch.apply_to(&mut self.entry);
        Ok(())
    }

    fn samples() -> Vec<Self> {
        seed::news()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Link;

    #[test]
    fn test_create_and_apply() {
        let draft = NewsDraft {
            title: "Corso".to_string(),
            content: "Iscrizioni aperte".to_string(),
            category: "Formazione".to_string(),
            author: "Ufficio Formazione".to_string(),
            links: vec![Link::new("Iscrizioni", "https://example.com", None)],
            ..NewsDraft::default()
        };
        let mut item = NewsItem::create(draft, "n1".to_string(), Utc::now()).unwrap();
        assert_eq!(item.links.len(), 1);

        item.apply(NewsPatch {
            category: Some("Eventi".to_string()),
            ..NewsPatch::default()
        })
        .unwrap();
        assert_eq!(item.category, "Eventi");
    }

    #[test]
    fn test_missing_category_rejected() {
        let draft = NewsDraft {
            title: "Corso".to_string(),
            content: "Testo".to_string(),
            author: "Ufficio".to_string(),
            ..NewsDraft::default()
        };
        let err = NewsItem::create(draft, "n1".to_string(), Utc::now()).unwrap_err();
        assert!(err.to_string().contains("category"));
    }

    #[test]
    fn test_serialized_without_type() {
        let item = NewsItem::samples().remove(0);
        let value = serde_json::to_value(&item).unwrap();
        assert!(value.get("type").is_none());
        assert!(value.get("title").is_some());
    }
}

//! Dashboard statistics over both collections.

use serde::Serialize;

use crate::record::{Document, DocumentType, NewsItem, Priority};

/// Number of recent records shown per collection.
pub const RECENT_LIMIT: usize = 5;

/// Number of high-priority records shown.
pub const URGENT_LIMIT: usize = 3;

/// Record counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    /// All documents.
    pub documents: usize,
    /// All news items.
    pub news: usize,
    /// Documents of type ordinance.
    pub ordinances: usize,
    /// Documents of type template.
    pub templates: usize,
}

/// A high-priority record from either collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "record", rename_all = "lowercase")]
pub enum Urgent<'a> {
    /// A document.
    Document(&'a Document),
    /// A news item.
    News(&'a NewsItem),
}

impl Urgent<'_> {
    /// Title of the underlying record.
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Document(doc) => &doc.title,
            Self::News(item) => &item.title,
        }
    }
}

/// Snapshot of the board for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overview<'a> {
    /// Record counts.
    pub counts: Counts,
    /// Most recent documents, newest first.
    pub recent_documents: Vec<&'a Document>,
    /// Most recent news items, newest first.
    pub recent_news: Vec<&'a NewsItem>,
    /// High-priority records, documents first.
    pub urgent: Vec<Urgent<'a>>,
}

impl<'a> Overview<'a> {
    /// Build an overview from both collections (each ordered newest first).
    #[must_use]
    pub fn build(documents: &'a [Document], news: &'a [NewsItem]) -> Self {
        let counts = Counts {
            documents: documents.len(),
            news: news.len(),
            ordinances: documents
                .iter()
                .filter(|d| d.kind == DocumentType::Ordinance)
                .count(),
            templates: documents
                .iter()
                .filter(|d| d.kind == DocumentType::Template)
                .count(),
        };

        let urgent = documents
            .iter()
            .filter(|d| d.priority == Priority::High)
            .map(Urgent::Document)
            .chain(
                news.iter()
                    .filter(|n| n.priority == Priority::High)
                    .map(Urgent::News),
            )
            .take(URGENT_LIMIT)
            .collect();

        Self {
            counts,
            recent_documents: documents.iter().take(RECENT_LIMIT).collect(),
            recent_news: news.iter().take(RECENT_LIMIT).collect(),
            urgent,
        }
    }
}

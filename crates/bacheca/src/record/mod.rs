//! Board records: documents and news items.
//!
//! Both record kinds share the fields in [`Entry`]; a [`Document`] adds a
//! [`DocumentType`]. The serialized form uses camelCase keys so payloads
//! written by earlier versions of the board load unchanged.

mod document;
mod news;

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::storage::Slot;

pub use document::{Document, DocumentDraft, DocumentPatch, DocumentType};
pub use news::{NewsDraft, NewsItem, NewsPatch};

/// Record priority.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Low priority.
    #[serde(alias = "bassa")]
    Low,
    /// Medium priority (the default).
    #[default]
    #[serde(alias = "media")]
    Medium,
    /// High priority.
    #[serde(alias = "alta")]
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// An ordered set of tags.
///
/// Tags are trimmed; blanks and repeats are dropped, keeping the first
/// occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Tags(Vec<String>);

impl Tags {
    /// Create an empty tag set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag. Returns `false` if it was blank or already present.
    pub fn insert(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.contains(tag) {
            return false;
        }
        self.0.push(tag.to_string());
        true
    }

    /// Remove a tag. Returns `true` if it was present.
    pub fn remove(&mut self, tag: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|t| t != tag);
        self.0.len() != before
    }

    /// Check whether a tag is present (exact match).
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    /// Iterate the tags in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    /// Number of tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no tags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The tags as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for Tags {
    fn from(tags: Vec<String>) -> Self {
        tags.iter().map(String::as_str).collect()
    }
}

impl From<Tags> for Vec<String> {
    fn from(tags: Tags) -> Self {
        tags.0
    }
}

impl<'a> FromIterator<&'a str> for Tags {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut tags = Tags::new();
        for tag in iter {
            tags.insert(tag);
        }
        tags
    }
}

impl<'a> IntoIterator for &'a Tags {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A file attached to a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Identifier, unique within the record.
    pub id: String,
    /// File name.
    pub name: String,
    /// Human-readable size, e.g. `2.3 MB`.
    #[serde(rename = "size", default)]
    pub size_label: String,
    /// Where the file can be fetched.
    #[serde(rename = "url", default)]
    pub locator: String,
}

impl Attachment {
    /// Create an attachment with a fresh id.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        size_label: impl Into<String>,
        locator: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            size_label: size_label.into(),
            locator: locator.into(),
        }
    }

    /// Create an attachment whose size label is derived from a byte count.
    #[must_use]
    pub fn with_size(name: impl Into<String>, bytes: u64, locator: impl Into<String>) -> Self {
        Self::new(name, format_size(bytes), locator)
    }

    /// Describe a local file as an attachment with a `file://` locator.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be inspected.
    pub fn from_file(path: &Path) -> Result<Self> {
        let path = path.canonicalize()?;
        let metadata = std::fs::metadata(&path)?;
        if !metadata.is_file() {
            return Err(Error::validation(
                "attachments",
                format!("{} is not a file", path.display()),
            ));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::with_size(
            name,
            metadata.len(),
            format!("file://{}", path.display()),
        ))
    }
}

/// An image attached to a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Identifier, unique within the record.
    pub id: String,
    /// Image name.
    pub name: String,
    /// Where the image can be fetched.
    #[serde(rename = "url")]
    pub locator: String,
}

impl Image {
    /// Create an image with a fresh id.
    #[must_use]
    pub fn new(name: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            locator: locator.into(),
        }
    }
}

/// A link attached to a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Identifier, unique within the record.
    pub id: String,
    /// Link title.
    pub title: String,
    /// Target URL.
    pub url: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Link {
    /// Create a link with a fresh id.
    #[must_use]
    pub fn new(title: impl Into<String>, url: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            url: url.into(),
            description: description.filter(|d| !d.trim().is_empty()),
        }
    }
}

/// Fields shared by every record kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Unique identifier within the collection.
    pub id: String,
    /// Title.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Free-form category, e.g. `Traffico`.
    pub category: String,
    /// Author or issuing office.
    pub author: String,
    /// Priority.
    #[serde(default)]
    pub priority: Priority,
    /// Tags.
    #[serde(default)]
    pub tags: Tags,
    /// Attached files.
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Attached images.
    #[serde(default)]
    pub images: Vec<Image>,
    /// Attached links.
    #[serde(default)]
    pub links: Vec<Link>,
    /// Creation time; never changes.
    pub created_at: DateTime<Utc>,
    /// Time of the last mutation.
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    /// Case-insensitive substring match over title, content, category, and
    /// tags. `needle` must already be lowercase.
    #[must_use]
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.content.to_lowercase().contains(needle)
            || self.category.to_lowercase().contains(needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(needle))
    }

    /// Refresh `updated_at`, never moving it backwards.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.updated_at);
    }
}

/// Input for creating a record; the store assigns id and timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryDraft {
    /// Title (required).
    pub title: String,
    /// Body text (required).
    pub content: String,
    /// Category (required).
    pub category: String,
    /// Author (required).
    pub author: String,
    /// Priority; medium if not given.
    pub priority: Priority,
    /// Tags.
    pub tags: Vec<String>,
    /// Attached files.
    pub attachments: Vec<Attachment>,
    /// Attached images.
    pub images: Vec<Image>,
    /// Attached links.
    pub links: Vec<Link>,
}

impl EntryDraft {
    /// Check that every required field is present.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first missing field.
    pub fn validate(&self) -> Result<()> {
        require("title", &self.title)?;
        require("content", &self.content)?;
        require("category", &self.category)?;
        require("author", &self.author)?;
        validate_links(&self.links)
    }

    fn into_entry(self, id: String, now: DateTime<Utc>) -> Entry {
        Entry {
            id,
            title: self.title,
            content: self.content,
            category: self.category,
            author: self.author,
            priority: self.priority,
            tags: self.tags.into(),
            attachments: self.attachments,
            images: self.images,
            links: self.links,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A partial update; only the fields that are `Some` change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryPatch {
    /// New title.
    pub title: Option<String>,
    /// New body text.
    pub content: Option<String>,
    /// New category.
    pub category: Option<String>,
    /// New author.
    pub author: Option<String>,
    /// New priority.
    pub priority: Option<Priority>,
    /// Replacement tag list.
    pub tags: Option<Vec<String>>,
    /// Replacement attachment list.
    pub attachments: Option<Vec<Attachment>>,
    /// Replacement image list.
    pub images: Option<Vec<Image>>,
    /// Replacement link list.
    pub links: Option<Vec<Link>>,
}

impl EntryPatch {
    /// Check that no required field is being cleared.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("title", &self.title),
            ("content", &self.content),
            ("category", &self.category),
            ("author", &self.author),
        ] {
            if let Some(value) = value {
                require(field, value)?;
            }
        }
        if let Some(links) = &self.links {
            validate_links(links)?;
        }
        Ok(())
    }

    /// Check whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn apply_to(self, entry: &mut Entry) {
        if let Some(title) = self.title {
            entry.title = title;
        }
        if let Some(content) = self.content {
            entry.content = content;
        }
        if let Some(category) = self.category {
            entry.category = category;
        }
        if let Some(author) = self.author {
            entry.author = author;
        }
        if let Some(priority) = self.priority {
            entry.priority = priority;
        }
        if let Some(tags) = self.tags {
            entry.tags = tags.into();
        }
        if let Some(attachments) = self.attachments {
            entry.attachments = attachments;
        }
        if let Some(images) = self.images {
            entry.images = images;
        }
        if let Some(links) = self.links {
            entry.links = links;
        }
    }
}

/// A record kind that can live in a [`RecordStore`](crate::store::RecordStore).
pub trait Record: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Input for creating a record.
    type Draft;
    /// Input for partially updating a record.
    type Patch;

    /// The slot the collection is persisted in.
    const SLOT: Slot;
    /// Human-readable kind, used in messages.
    const KIND: &'static str;

    /// Shared fields.
    fn entry(&self) -> &Entry;

    /// Shared fields, mutably.
    fn entry_mut(&mut self) -> &mut Entry;

    /// Validate a draft and build the stored record.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a required field is missing.
    fn create(draft: Self::Draft, id: String, now: DateTime<Utc>) -> Result<Self>;

    /// Validate a patch and merge it into this record.
    ///
    /// On error the record is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the patch clears a required field.
    fn apply(&mut self, patch: Self::Patch) -> Result<()>;

    /// The sample dataset used to seed an empty collection.
    fn samples() -> Vec<Self>;

    /// The record id.
    fn id(&self) -> &str {
        &self.entry().id
    }

    /// Sub-kind shown in listings and exports, if the record kind has one.
    fn type_label(&self) -> Option<&'static str> {
        None
    }
}

/// Generate a fresh record or resource id.
#[must_use]
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Render a byte count with 1024-based units and one decimal.
///
/// A trailing `.0` is dropped: `2048` becomes `2 KB`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{rounded:.0} {}", UNITS[unit])
    } else {
        format!("{rounded:.1} {}", UNITS[unit])
    }
}

fn require(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(field, "must not be empty"));
    }
    Ok(())
}

fn validate_links(links: &[Link]) -> Result<()> {
    for link in links {
        if link.url.trim().is_empty() {
            return Err(Error::validation("links", format!("link '{}' has no url", link.title)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> EntryDraft {
        EntryDraft {
            title: "Ordinanza A".to_string(),
            content: "Testo".to_string(),
            category: "Traffico".to_string(),
            author: "Comandante".to_string(),
            tags: vec!["Viabilità".to_string()],
            ..EntryDraft::default()
        }
    }

    #[test]
    fn test_priority_default_and_display() {
        assert_eq!(Priority::default(), Priority::Medium);
        assert_eq!(Priority::High.to_string(), "high");
    }

    #[test]
    fn test_priority_accepts_legacy_values() {
        let p: Priority = serde_json::from_str("\"alta\"").unwrap();
        assert_eq!(p, Priority::High);
        let p: Priority = serde_json::from_str("\"bassa\"").unwrap();
        assert_eq!(p, Priority::Low);
        assert_eq!(serde_json::to_string(&Priority::Medium).unwrap(), "\"medium\"");
    }

    #[test]
    fn test_tags_deduplicate_and_trim() {
        let tags: Tags = vec![
            " traffico ".to_string(),
            "traffico".to_string(),
            String::new(),
            "centro".to_string(),
        ]
        .into();
        assert_eq!(tags.as_slice(), ["traffico", "centro"]);
    }

    #[test]
    fn test_tags_insert_and_remove() {
        let mut tags = Tags::new();
        assert!(tags.insert("a"));
        assert!(!tags.insert("a"));
        assert!(!tags.insert("   "));
        assert!(tags.remove("a"));
        assert!(!tags.remove("a"));
        assert!(tags.is_empty());
    }

    #[test]
    fn test_tags_deserialize_drops_duplicates() {
        let tags: Tags = serde_json::from_str(r#"["x","y","x"]"#).unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(serde_json::to_string(&tags).unwrap(), r#"["x","y"]"#);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2 KB");
        assert_eq!(format_size(159_744), "156 KB");
        assert_eq!(format_size(2_411_724), "2.3 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3 GB");
    }

    #[test]
    fn test_attachment_with_size() {
        let a = Attachment::with_size("verbale.doc", 1536, "file:///tmp/verbale.doc");
        assert_eq!(a.size_label, "1.5 KB");
        assert!(!a.id.is_empty());
    }

    #[test]
    fn test_attachment_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("planimetria.pdf");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();

        let a = Attachment::from_file(&path).unwrap();
        assert_eq!(a.name, "planimetria.pdf");
        assert_eq!(a.size_label, "2 KB");
        assert!(a.locator.starts_with("file://"));

        assert!(Attachment::from_file(dir.path()).is_err());
        assert!(Attachment::from_file(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_attachment_legacy_fields() {
        let json = r##"{"id":"1","name":"planimetria.pdf","type":"file","size":"2.3 MB","url":"#"}"##;
        let a: Attachment = serde_json::from_str(json).unwrap();
        assert_eq!(a.size_label, "2.3 MB");
        assert_eq!(a.locator, "#");
    }

    #[test]
    fn test_link_drops_blank_description() {
        let link = Link::new("CdS", "https://example.com", Some("  ".to_string()));
        assert!(link.description.is_none());
    }

    #[test]
    fn test_draft_validation() {
        assert!(draft().validate().is_ok());

        let mut missing = draft();
        missing.author = "  ".to_string();
        let err = missing.validate().unwrap_err();
        assert!(matches!(err, Error::Validation { field: "author", .. }));
    }

    #[test]
    fn test_draft_rejects_link_without_url() {
        let mut d = draft();
        d.links.push(Link::new("broken", "", None));
        assert!(d.validate().is_err());
    }

    #[test]
    fn test_into_entry_sets_equal_timestamps() {
        let now = Utc::now();
        let entry = draft().into_entry("id-1".to_string(), now);
        assert_eq!(entry.created_at, entry.updated_at);
        assert_eq!(entry.priority, Priority::Medium);
        assert_eq!(entry.tags.as_slice(), ["Viabilità"]);
    }

    #[test]
    fn test_entry_matches_case_insensitive() {
        let entry = draft().into_entry("1".to_string(), Utc::now());
        assert!(entry.matches("ordinanza"));
        assert!(entry.matches("traff"));
        assert!(entry.matches("viabilità"));
        assert!(!entry.matches("zzz"));
    }

    #[test]
    fn test_touch_never_moves_backwards() {
        let now = Utc::now();
        let mut entry = draft().into_entry("1".to_string(), now);
        entry.touch(now - chrono::Duration::seconds(10));
        assert_eq!(entry.updated_at, now);
        entry.touch(now + chrono::Duration::seconds(10));
        assert!(entry.updated_at > entry.created_at);
    }

    #[test]
    fn test_patch_validation_and_apply() {
        let mut entry = draft().into_entry("1".to_string(), Utc::now());

        let bad = EntryPatch {
            title: Some(String::new()),
            ..EntryPatch::default()
        };
        assert!(bad.validate().is_err());

        let patch = EntryPatch {
            priority: Some(Priority::High),
            tags: Some(vec!["a".to_string(), "a".to_string()]),
            ..EntryPatch::default()
        };
        assert!(!patch.is_empty());
        patch.validate().unwrap();
        patch.apply_to(&mut entry);
        assert_eq!(entry.priority, Priority::High);
        assert_eq!(entry.tags.as_slice(), ["a"]);
        assert_eq!(entry.title, "Ordinanza A");
    }

    #[test]
    fn test_empty_patch() {
        assert!(EntryPatch::default().is_empty());
    }
}

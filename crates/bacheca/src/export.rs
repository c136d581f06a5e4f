//! Plain-text export of records.

use std::fmt::Write as _;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::record::Record;

/// Line drawn above and below each record in a batch export.
pub const BANNER: &str = "=====================================";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Render one record as plain text.
#[must_use]
pub fn render<R: Record>(record: &R) -> String {
    let entry = record.entry();
    let mut out = String::new();

    let _ = writeln!(out, "Title: {}", entry.title);
    if let Some(kind) = record.type_label() {
        let _ = writeln!(out, "Type: {kind}");
    }
    let _ = writeln!(out, "Category: {}", entry.category);
    let _ = writeln!(out, "Author: {}", entry.author);
    let _ = writeln!(out, "Created: {}", entry.created_at.format(DATE_FORMAT));
    let _ = writeln!(out, "Updated: {}", entry.updated_at.format(DATE_FORMAT));
    let _ = writeln!(out, "Priority: {}", entry.priority);
    let tags: Vec<&str> = entry.tags.iter().map(String::as_str).collect();
    let _ = writeln!(out, "Tags: {}", tags.join(", "));
    let _ = write!(out, "\nContent:\n{}", entry.content);

    if !entry.attachments.is_empty() {
        out.push_str("\n\nAttachments:");
        for attachment in &entry.attachments {
            let _ = write!(out, "\n- {} ({})", attachment.name, attachment.size_label);
        }
    }

    if !entry.images.is_empty() {
        out.push_str("\n\nImages:");
        for image in &entry.images {
            let _ = write!(out, "\n- {}: {}", image.name, image.locator);
        }
    }

    if !entry.links.is_empty() {
        out.push_str("\n\nLinks:");
        for link in &entry.links {
            let _ = write!(out, "\n- {}: {}", link.title, link.url);
            if let Some(description) = &link.description {
                let _ = write!(out, " ({description})");
            }
        }
    }

    out.push('\n');
    out
}

/// Render several records, each framed by [`BANNER`] lines and separated by
/// a blank line.
#[must_use]
pub fn render_batch<'a, R, I>(records: I) -> String
where
    R: Record,
    I: IntoIterator<Item = &'a R>,
{
    records
        .into_iter()
        .map(|record| format!("{BANNER}\n{}{BANNER}\n", render(record)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn unsafe_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("[^A-Za-z0-9]").expect("valid file name pattern"))
}

/// File name for a single-record export: every character outside
/// `[A-Za-z0-9]` becomes `_`, then lowercase, then `.txt`.
#[must_use]
pub fn file_name(title: &str) -> String {
    format!("{}.txt", unsafe_chars().replace_all(title, "_").to_lowercase())
}

/// File name for a batch export, e.g. `documents_2024-01-15.txt`.
#[must_use]
pub fn batch_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{prefix}_{}.txt", date.format(DATE_FORMAT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Document, NewsItem};

    #[test]
    fn test_render_document() {
        let doc = Document::samples().remove(0);
        let text = render(&doc);

        assert!(text.starts_with("Title: Ordinanza Traffico Centro Storico\n"));
        assert!(text.contains("Type: ordinance\n"));
        assert!(text.contains("Category: Traffico\n"));
        assert!(text.contains("Author: Comandante Rossi\n"));
        assert!(text.contains("Created: 2024-01-15\n"));
        assert!(text.contains("Updated: 2024-01-15\n"));
        assert!(text.contains("Priority: high\n"));
        assert!(text.contains("Tags: traffico, centro storico, ordinanza\n"));
        assert!(text.contains("\nContent:\nOrdinanza per la regolamentazione"));
        assert!(text.contains("Attachments:\n- planimetria_centro.pdf (2.3 MB)"));
        assert!(text.contains("Images:\n- mappa_zona.jpg: https://images.unsplash.com/"));
        assert!(text.contains(
            "Links:\n- Codice della Strada - Art. 7: https://www.gazzettaufficiale.it (Riferimento normativo)"
        ));
    }

    #[test]
    fn test_render_news_has_no_type() {
        let item = NewsItem::samples().remove(1);
        let text = render(&item);
        assert!(!text.contains("Type:"));
        assert!(!text.contains("Images:"));
        assert!(text.contains("Priority: medium"));
    }

    #[test]
    fn test_render_batch() {
        let docs = Document::samples();
        let text = render_batch(&docs);

        assert_eq!(text.matches(BANNER).count(), 4);
        assert!(text.starts_with(BANNER));
        assert!(text.contains(&format!("{BANNER}\n\n{BANNER}\n")));
        assert_eq!(BANNER.len(), 37);
    }

    #[test]
    fn test_render_batch_empty() {
        let docs: Vec<Document> = Vec::new();
        assert_eq!(render_batch(&docs), "");
    }

    #[test]
    fn test_file_name() {
        assert_eq!(
            file_name("Ordinanza Traffico Centro Storico"),
            "ordinanza_traffico_centro_storico.txt"
        );
        assert_eq!(file_name("Art. 7 - CdS"), "art__7___cds.txt");
        assert_eq!(file_name("Festività"), "festivit_.txt");
    }

    #[test]
    fn test_batch_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(batch_file_name("documents", date), "documents_2024-01-15.txt");
    }
}

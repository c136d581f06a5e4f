//! Text rendering for command output.

use std::fmt::Write as _;

use serde::Serialize;

use super::OutputFormat;
use crate::auth::UserProfile;
use crate::overview::Overview;
use crate::record::Record;

/// Longest title shown in a table cell.
const TITLE_WIDTH: usize = 40;

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = line(headers.to_vec());
    out.push('\n');
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&line(rule.iter().map(String::as_str).collect()));
    for row in rows {
        out.push('\n');
        out.push_str(&line(row.iter().map(String::as_str).collect()));
    }
    out
}

fn json<T: Serialize + ?Sized>(value: &T) -> crate::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Render a list of records.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn records<R: Record>(records: &[&R], format: OutputFormat) -> crate::Result<String> {
    match format {
        OutputFormat::Json => json(records),
        OutputFormat::Plain => Ok(records
            .iter()
            .map(|record| {
                let entry = record.entry();
                let kind = record
                    .type_label()
                    .map(|k| format!(" <{k}>"))
                    .unwrap_or_default();
                format!(
                    "{}  {}{}  [{}] ({})",
                    entry.id, entry.title, kind, entry.category, entry.priority
                )
            })
            .collect::<Vec<_>>()
            .join("\n")),
        OutputFormat::Table => {
            let with_type = records.iter().any(|r| r.type_label().is_some());
            let mut headers = vec!["ID"];
            if with_type {
                headers.push("TYPE");
            }
            headers.extend(["TITLE", "CATEGORY", "PRIORITY", "UPDATED"]);

            let rows: Vec<Vec<String>> = records
                .iter()
                .map(|record| {
                    let entry = record.entry();
                    let mut row = vec![entry.id.clone()];
                    if with_type {
                        row.push(record.type_label().unwrap_or_default().to_string());
                    }
                    row.extend([
                        truncate(&entry.title, TITLE_WIDTH),
                        entry.category.clone(),
                        entry.priority.to_string(),
                        entry.updated_at.format("%Y-%m-%d").to_string(),
                    ]);
                    row
                })
                .collect();
            Ok(table(&headers, &rows))
        }
    }
}

/// Render a list of user accounts.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn users(users: &[UserProfile], format: OutputFormat) -> crate::Result<String> {
    match format {
        OutputFormat::Json => json(users),
        OutputFormat::Plain => Ok(users
            .iter()
            .map(|u| format!("{}  {} <{}> ({})", u.id, u.full_name, u.email, u.role))
            .collect::<Vec<_>>()
            .join("\n")),
        OutputFormat::Table => {
            let rows: Vec<Vec<String>> = users
                .iter()
                .map(|u| {
                    vec![
                        u.id.clone(),
                        u.full_name.clone(),
                        u.email.clone(),
                        u.role.to_string(),
                        u.department.clone(),
                        u.badge_number.clone(),
                    ]
                })
                .collect();
            Ok(table(
                &["ID", "NAME", "EMAIL", "ROLE", "DEPARTMENT", "BADGE"],
                &rows,
            ))
        }
    }
}

/// Render the dashboard overview as plain text.
#[must_use]
pub fn overview(overview: &Overview<'_>) -> String {
    let mut out = String::new();
    let counts = &overview.counts;

    let _ = writeln!(out, "Documents:   {}", counts.documents);
    let _ = writeln!(out, "News:        {}", counts.news);
    let _ = writeln!(out, "Ordinances:  {}", counts.ordinances);
    let _ = writeln!(out, "Templates:   {}", counts.templates);

    out.push_str("\nRecent documents:\n");
    for doc in &overview.recent_documents {
        let _ = writeln!(out, "  {}  {} <{}>", doc.created_at.format("%Y-%m-%d"), doc.title, doc.kind);
    }

    out.push_str("\nRecent news:\n");
    for item in &overview.recent_news {
        let _ = writeln!(out, "  {}  {}", item.created_at.format("%Y-%m-%d"), item.title);
    }

    if !overview.urgent.is_empty() {
        out.push_str("\nHigh priority:\n");
        for urgent in &overview.urgent {
            let _ = writeln!(out, "  ! {}", urgent.title());
        }
    }

    out
}

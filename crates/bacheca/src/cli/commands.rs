//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands and turns their
//! arguments into drafts and patches.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::auth::{NewUser, Role};
use crate::error::Result;
use crate::record::{
    Attachment, Document, DocumentDraft, DocumentPatch, DocumentType, EntryDraft, EntryPatch,
    Image, Link, Priority, Record,
};
use crate::store::RecordStore;

/// Login command arguments.
#[derive(Debug, Args)]
pub struct LoginCommand {
    /// Account email
    pub email: String,

    /// Account password; prompted for when neither this nor
    /// `BACHECA_PASSWORD` is set
    #[arg(short, long, env = "BACHECA_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

/// Document commands.
#[derive(Debug, Subcommand)]
pub enum DocumentCommand {
    /// List or search documents
    List(DocumentListArgs),

    /// Show one document
    Show(ShowArgs),

    /// Add a document
    Add(DocumentAddArgs),

    /// Change a document
    Edit(DocumentEditArgs),

    /// Delete a document
    Delete(DeleteArgs),

    /// Export documents to text files
    Export(DocumentExportArgs),
}

/// News commands.
#[derive(Debug, Subcommand)]
pub enum NewsCommand {
    /// List or search news
    List(ListArgs),

    /// Show one news item
    Show(ShowArgs),

    /// Add a news item
    Add(EntryArgs),

    /// Change a news item
    Edit(EditArgs),

    /// Delete a news item
    Delete(DeleteArgs),

    /// Export news to text files
    Export(ExportArgs),
}

/// User administration commands (admin only).
#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    /// List accounts
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Create an account
    Create(CreateUserArgs),

    /// Change an account's role
    SetRole {
        /// Account id
        id: String,

        /// New role
        #[arg(value_enum)]
        role: RoleArg,
    },

    /// Delete an account
    Delete {
        /// Account id
        id: String,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Search text and category shared by the list and export commands.
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Case-insensitive text to look for in title, content, category, and tags
    #[arg(short = 's', long)]
    pub query: Option<String>,

    /// Only records in exactly this category
    #[arg(long)]
    pub category: Option<String>,
}

impl FilterArgs {
    /// Records of `store` matching the search text and category, in store
    /// order.
    #[must_use]
    pub fn select<'a, R: Record>(&self, store: &'a RecordStore<R>) -> Vec<&'a R> {
        let mut found = match &self.query {
            Some(query) => store.search(query),
            None => store.records().iter().collect(),
        };
        if let Some(category) = &self.category {
            found.retain(|record| record.entry().category == *category);
        }
        found
    }
}

/// Arguments shared by the list commands.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Search text and category
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Maximum number of results
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Document list arguments.
#[derive(Debug, Args)]
pub struct DocumentListArgs {
    /// Shared list options
    #[command(flatten)]
    pub list: ListArgs,

    /// Only documents of this type
    #[arg(short = 't', long = "type", value_enum)]
    pub kind: Option<DocumentTypeArg>,
}

impl DocumentListArgs {
    /// Documents matching every given filter.
    #[must_use]
    pub fn select<'a>(&self, store: &'a RecordStore<Document>) -> Vec<&'a Document> {
        select_documents(&self.list.filter, self.kind, store)
    }
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Record id
    pub id: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Record id
    pub id: String,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Export only this record; all matching records otherwise
    pub id: Option<String>,

    /// Batch export only the records matching these filters
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Directory the file is written to
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,
}

/// Document export arguments.
#[derive(Debug, Args)]
pub struct DocumentExportArgs {
    /// Shared export options
    #[command(flatten)]
    pub export: ExportArgs,

    /// Batch export only documents of this type
    #[arg(short = 't', long = "type", value_enum)]
    pub kind: Option<DocumentTypeArg>,
}

impl DocumentExportArgs {
    /// Documents a batch export covers.
    #[must_use]
    pub fn select<'a>(&self, store: &'a RecordStore<Document>) -> Vec<&'a Document> {
        select_documents(&self.export.filter, self.kind, store)
    }
}

fn select_documents<'a>(
    filter: &FilterArgs,
    kind: Option<DocumentTypeArg>,
    store: &'a RecordStore<Document>,
) -> Vec<&'a Document> {
    let mut found = filter.select(store);
    if let Some(kind) = kind.map(DocumentType::from) {
        found.retain(|doc| doc.kind == kind);
    }
    found
}

/// Fields for a new record.
#[derive(Debug, Args)]
pub struct EntryArgs {
    /// Title
    #[arg(long)]
    pub title: String,

    /// Body text
    #[arg(long)]
    pub content: String,

    /// Category
    #[arg(long)]
    pub category: String,

    /// Author; defaults to the logged-in user's name
    #[arg(long)]
    pub author: Option<String>,

    /// Priority
    #[arg(short, long, value_enum, default_value = "medium")]
    pub priority: PriorityArg,

    /// Tag (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Attach a local file (repeatable)
    #[arg(long = "attach", value_name = "FILE")]
    pub attachments: Vec<PathBuf>,

    /// Attach an image as NAME=URL (repeatable)
    #[arg(long = "image", value_name = "NAME=URL", value_parser = parse_pair)]
    pub images: Vec<(String, String)>,

    /// Attach a link as TITLE=URL (repeatable)
    #[arg(long = "link", value_name = "TITLE=URL", value_parser = parse_pair)]
    pub links: Vec<(String, String)>,
}

impl EntryArgs {
    /// Build a draft, reading attached files from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if an attached file cannot be inspected.
    pub fn into_draft(self, default_author: &str) -> Result<EntryDraft> {
        let attachments = self
            .attachments
            .iter()
            .map(|path| Attachment::from_file(path))
            .collect::<Result<Vec<_>>>()?;

        Ok(EntryDraft {
            title: self.title,
            content: self.content,
            category: self.category,
            author: self
                .author
                .unwrap_or_else(|| default_author.to_string()),
            priority: self.priority.into(),
            tags: self.tags,
            attachments,
            images: self
                .images
                .into_iter()
                .map(|(name, url)| Image::new(name, url))
                .collect(),
            links: self
                .links
                .into_iter()
                .map(|(title, url)| Link::new(title, url, None))
                .collect(),
        })
    }
}

/// Document add arguments.
#[derive(Debug, Args)]
pub struct DocumentAddArgs {
    /// Document type
    #[arg(short = 't', long = "type", value_enum)]
    pub kind: DocumentTypeArg,

    /// Record fields
    #[command(flatten)]
    pub entry: EntryArgs,
}

impl DocumentAddArgs {
    /// Build a document draft.
    ///
    /// # Errors
    ///
    /// Returns an error if an attached file cannot be inspected.
    pub fn into_draft(self, default_author: &str) -> Result<DocumentDraft> {
        Ok(DocumentDraft::new(
            self.kind.into(),
            self.entry.into_draft(default_author)?,
        ))
    }
}

/// Fields to change on an existing record.
#[derive(Debug, Args)]
pub struct EditArgs {
    /// Record id
    pub id: String,

    /// New title
    #[arg(long)]
    pub title: Option<String>,

    /// New body text
    #[arg(long)]
    pub content: Option<String>,

    /// New category
    #[arg(long)]
    pub category: Option<String>,

    /// New author
    #[arg(long)]
    pub author: Option<String>,

    /// New priority
    #[arg(short, long, value_enum)]
    pub priority: Option<PriorityArg>,

    /// Replace the tags (repeatable)
    #[arg(long = "tag")]
    pub tags: Option<Vec<String>>,

    /// Remove every tag
    #[arg(long, conflicts_with = "tags")]
    pub clear_tags: bool,
}

impl EditArgs {
    /// Build a patch from the given options.
    #[must_use]
    pub fn to_patch(&self) -> EntryPatch {
        let tags = if self.clear_tags {
            Some(Vec::new())
        } else {
            self.tags.clone()
        };

        EntryPatch {
            title: self.title.clone(),
            content: self.content.clone(),
            category: self.category.clone(),
            author: self.author.clone(),
            priority: self.priority.map(Into::into),
            tags,
            ..EntryPatch::default()
        }
    }
}

/// Document edit arguments.
#[derive(Debug, Args)]
pub struct DocumentEditArgs {
    /// Record fields
    #[command(flatten)]
    pub entry: EditArgs,

    /// New document type
    #[arg(short = 't', long = "type", value_enum)]
    pub kind: Option<DocumentTypeArg>,
}

impl DocumentEditArgs {
    /// Build a document patch.
    #[must_use]
    pub fn to_patch(&self) -> DocumentPatch {
        DocumentPatch {
            entry: self.entry.to_patch(),
            kind: self.kind.map(Into::into),
        }
    }
}

/// Create-user arguments.
#[derive(Debug, Args)]
pub struct CreateUserArgs {
    /// Display name
    #[arg(long)]
    pub name: String,

    /// Login email
    #[arg(long)]
    pub email: String,

    /// Initial password
    #[arg(long)]
    pub password: String,

    /// Role
    #[arg(short, long, value_enum, default_value = "consultatore")]
    pub role: RoleArg,

    /// Department or office
    #[arg(long, default_value = "")]
    pub department: String,

    /// Badge number
    #[arg(long, default_value = "")]
    pub badge: String,
}

impl From<CreateUserArgs> for NewUser {
    fn from(args: CreateUserArgs) -> Self {
        Self {
            full_name: args.name,
            email: args.email,
            password: args.password,
            role: Some(args.role.into()),
            department: args.department,
            badge_number: args.badge,
        }
    }
}

/// Parse a `KEY=VALUE` argument.
fn parse_pair(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() {
        return Err(format!("expected KEY=VALUE, got '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Document type argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DocumentTypeArg {
    /// Ordinance
    Ordinance,
    /// Template
    Template,
    /// Circular
    Circular,
    /// Procedure
    Procedure,
}

impl From<DocumentTypeArg> for DocumentType {
    fn from(arg: DocumentTypeArg) -> Self {
        match arg {
            DocumentTypeArg::Ordinance => Self::Ordinance,
            DocumentTypeArg::Template => Self::Template,
            DocumentTypeArg::Circular => Self::Circular,
            DocumentTypeArg::Procedure => Self::Procedure,
        }
    }
}

/// Priority argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PriorityArg {
    /// Low
    Low,
    /// Medium
    Medium,
    /// High
    High,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Low => Self::Low,
            PriorityArg::Medium => Self::Medium,
            PriorityArg::High => Self::High,
        }
    }
}

/// Role argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    /// Administrator
    Admin,
    /// Read-only user
    Consultatore,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Admin => Self::Admin,
            RoleArg::Consultatore => Self::Consultatore,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}

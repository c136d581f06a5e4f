//! `bacheca` - Document and news board for a local police department
//!
//! This library provides the record model, the persisted document and news
//! collections, role-based access control over them, and plain-text export.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod auth;
pub mod board;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod overview;
pub mod record;
pub mod seed;
pub mod storage;
pub mod store;

pub use auth::{AuthGate, AuthState, NewUser, Permission, Role, Session, UserDirectory};
pub use board::{Board, BoardRecord};
pub use config::Config;
pub use error::{AuthError, Error, Result};
pub use logging::init_logging;
pub use overview::Overview;
pub use record::{
    Document, DocumentDraft, DocumentPatch, DocumentType, Entry, EntryDraft, EntryPatch,
    NewsDraft, NewsItem, NewsPatch, Priority, Record,
};
pub use storage::{FileSlots, MemorySlots, Slot, SlotStorage, SqliteSlots};
pub use store::RecordStore;

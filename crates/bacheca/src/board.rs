//! The board: both record stores behind the auth gate.
//!
//! Every record operation checks the active session against the role table
//! before touching a store.

use std::sync::Arc;

use tracing::debug;

use crate::auth::{AuthGate, Permission, Session, UserDirectory};
use crate::config::Config;
use crate::error::{AuthError, Error, Result};
use crate::overview::Overview;
use crate::record::{Document, NewsItem, Record};
use crate::storage::{self, SlotStorage};
use crate::store::RecordStore;

/// A record kind the board manages, with the permissions that guard it.
pub trait BoardRecord: Record {
    /// Needed to read the collection (besides `view_all`).
    const VIEW: Permission;
    /// Needed to add a record.
    const CREATE: Permission;
    /// Needed to change a record.
    const EDIT: Permission;
    /// Needed to remove a record.
    const DELETE: Permission;

    /// The board's store for this kind.
    fn store(board: &Board) -> &RecordStore<Self>;

    /// The board's store for this kind, mutably.
    fn store_mut(board: &mut Board) -> &mut RecordStore<Self>;
}

impl BoardRecord for Document {
    const VIEW: Permission = Permission::ViewDocuments;
    const CREATE: Permission = Permission::CreateDocument;
    const EDIT: Permission = Permission::EditDocument;
    const DELETE: Permission = Permission::DeleteDocument;

    fn store(board: &Board) -> &RecordStore<Self> {
        &board.documents
    }

    fn store_mut(board: &mut Board) -> &mut RecordStore<Self> {
        &mut board.documents
    }
}

impl BoardRecord for NewsItem {
    const VIEW: Permission = Permission::ViewNews;
    const CREATE: Permission = Permission::CreateNews;
    const EDIT: Permission = Permission::EditNews;
    const DELETE: Permission = Permission::DeleteNews;

    fn store(board: &Board) -> &RecordStore<Self> {
        &board.news
    }

    fn store_mut(board: &mut Board) -> &mut RecordStore<Self> {
        &mut board.news
    }
}

/// Documents, news, and the gate in front of them.
#[derive(Debug)]
pub struct Board {
    documents: RecordStore<Document>,
    news: RecordStore<NewsItem>,
    auth: AuthGate,
}

impl Board {
    /// Build a board over the given storage and user directory.
    #[must_use]
    pub fn new(storage: Arc<dyn SlotStorage>, users: UserDirectory, seed_samples: bool) -> Self {
        Self {
            documents: RecordStore::load(storage.clone(), seed_samples),
            news: RecordStore::load(storage.clone(), seed_samples),
            auth: AuthGate::new(storage, users),
        }
    }

    /// Build the board described by the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend or user directory cannot be
    /// opened.
    pub fn open(config: &Config) -> Result<Self> {
        let storage = storage::open(config)?;
        let users = UserDirectory::from_config(config)?;
        debug!("Users served by the {} source", users.source_name());
        Ok(Self::new(storage, users, config.storage.seed_samples))
    }

    /// The auth gate.
    #[must_use]
    pub fn auth(&self) -> &AuthGate {
        &self.auth
    }

    /// Log in; see [`AuthGate::login`].
    ///
    /// # Errors
    ///
    /// Returns the gate's login error.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<Session> {
        self.auth.login(email, password).await
    }

    /// Log out; see [`AuthGate::logout`].
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted session could not be removed.
    pub fn logout(&mut self) -> Result<()> {
        self.auth.logout()
    }

    fn require_view(&self, permission: Permission) -> Result<()> {
        let session = self.auth.require_session()?;
        if session.has_permission(Permission::ViewAll) || session.has_permission(permission) {
            Ok(())
        } else {
            Err(AuthError::NotAuthorized.into())
        }
    }

    /// The store for a record kind, if the session may read it.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` or `NotAuthorized`.
    pub fn store<R: BoardRecord>(&self) -> Result<&RecordStore<R>> {
        self.require_view(R::VIEW)?;
        Ok(R::store(self))
    }

    /// The document store, if the session may read it.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` or `NotAuthorized`.
    pub fn documents(&self) -> Result<&RecordStore<Document>> {
        self.store()
    }

    /// The news store, if the session may read it.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` or `NotAuthorized`.
    pub fn news(&self) -> Result<&RecordStore<NewsItem>> {
        self.store()
    }

    /// Look a record up by id.
    ///
    /// # Errors
    ///
    /// Returns an auth error, or `NotFound` for an unknown id.
    pub fn get<R: BoardRecord>(&self, id: &str) -> Result<&R> {
        self.store::<R>()?
            .get(id)
            .ok_or_else(|| Error::not_found(R::KIND, id))
    }

    /// Search a collection; see [`RecordStore::search`].
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` or `NotAuthorized`.
    pub fn search<R: BoardRecord>(&self, query: &str) -> Result<Vec<&R>> {
        Ok(self.store::<R>()?.search(query))
    }

    /// Add a record.
    ///
    /// # Errors
    ///
    /// Returns an auth error, a validation error, or a storage error.
    pub fn add<R: BoardRecord>(&mut self, draft: R::Draft) -> Result<R> {
        self.auth.require(R::CREATE)?;
        R::store_mut(self).add(draft)
    }

    /// Update a record.
    ///
    /// # Errors
    ///
    /// Returns an auth error, `NotFound` for an unknown id, a validation
    /// error, or a storage error.
    pub fn update<R: BoardRecord>(&mut self, id: &str, patch: R::Patch) -> Result<R> {
        self.auth.require(R::EDIT)?;
        R::store_mut(self)
            .update(id, patch)?
            .ok_or_else(|| Error::not_found(R::KIND, id))
    }

    /// Remove a record. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an auth error or a storage error.
    pub fn remove<R: BoardRecord>(&mut self, id: &str) -> Result<bool> {
        self.auth.require(R::DELETE)?;
        R::store_mut(self).remove(id)
    }

    /// Dashboard statistics.
    ///
    /// # Errors
    ///
    /// Returns an auth error unless the session may read both collections.
    pub fn overview(&self) -> Result<Overview<'_>> {
        let documents = self.documents()?;
        let news = self.news()?;
        Ok(Overview::build(documents.records(), news.records()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{FixedUsers, NewUser};
    use crate::config::UserSourceKind;
    use crate::record::{DocumentDraft, DocumentPatch, DocumentType, EntryDraft, NewsPatch};
    use crate::storage::MemorySlots;

    fn board() -> Board {
        let users = UserDirectory::new(Arc::new(FixedUsers::demo().unwrap()));
        Board::new(Arc::new(MemorySlots::new()), users, true)
    }

    fn draft() -> DocumentDraft {
        DocumentDraft::new(
            DocumentType::Circular,
            EntryDraft {
                title: "Circolare turni".to_string(),
                content: "Nuovi turni di servizio".to_string(),
                category: "Personale".to_string(),
                author: "Comando".to_string(),
                ..EntryDraft::default()
            },
        )
    }

    #[test]
    fn test_anonymous_is_rejected() {
        let mut board = board();
        let err = board.documents().unwrap_err();
        assert_eq!(err.as_auth(), Some(&AuthError::NotAuthenticated));
        let err = board.add::<Document>(draft()).unwrap_err();
        assert_eq!(err.as_auth(), Some(&AuthError::NotAuthenticated));
        assert!(board.overview().is_err());
    }

    #[tokio::test]
    async fn test_admin_crud() {
        let mut board = board();
        board.login("admin@polizialocale.it", "admin123").await.unwrap();

        let doc = board.add::<Document>(draft()).unwrap();
        assert_eq!(board.documents().unwrap().len(), 3);

        let patch = NewsPatch {
            title: Some("Aggiornato".to_string()),
            ..NewsPatch::default()
        };
        let item = board.update::<NewsItem>("1", patch).unwrap();
        assert_eq!(item.title, "Aggiornato");

        let err = board
            .update::<Document>("missing", DocumentPatch::default())
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "document", .. }));

        assert!(board.remove::<Document>(&doc.id).unwrap());
        assert!(!board.remove::<Document>(&doc.id).unwrap());
        let err = board.get::<Document>(&doc.id).unwrap_err();
        assert_eq!(err.to_string(), format!("document not found: {}", doc.id));
    }

    #[tokio::test]
    async fn test_consultatore_reads_but_cannot_write() {
        let mut board = board();
        board
            .login("consultatore@polizialocale.it", "user123")
            .await
            .unwrap();

        assert_eq!(board.search::<Document>("ordinanza").unwrap().len(), 1);
        assert_eq!(board.news().unwrap().len(), 2);
        assert!(board.get::<NewsItem>("1").is_ok());
        assert!(board.overview().is_ok());

        let err = board.add::<Document>(draft()).unwrap_err();
        assert_eq!(err.as_auth(), Some(&AuthError::NotAuthorized));
        assert!(board
            .update::<NewsItem>("1", NewsPatch::default())
            .unwrap_err()
            .is_auth());
        assert!(board.remove::<Document>("1").unwrap_err().is_auth());
        assert_eq!(board.documents().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_logout_revokes_access() {
        let mut board = board();
        board.login("admin@polizialocale.it", "admin123").await.unwrap();
        board.logout().unwrap();
        assert!(board.documents().is_err());
    }

    #[tokio::test]
    async fn test_overview() {
        let mut board = board();
        board.login("admin@polizialocale.it", "admin123").await.unwrap();
        let overview = board.overview().unwrap();
        assert_eq!(overview.counts.documents, 2);
        assert_eq!(overview.counts.news, 2);
    }

    #[test]
    fn test_open_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.data_dir = Some(dir.path().to_path_buf());

        let board = Board::open(&config).unwrap();
        assert!(board.auth().session().is_none());
        assert!(dir.path().join("documents.json").exists());
        assert!(dir.path().join("news.json").exists());
    }

    fn config_in(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.storage.data_dir = Some(dir.join("data"));
        config
    }

    fn marco() -> NewUser {
        NewUser {
            full_name: "Marco Bianchi".to_string(),
            email: "marco.bianchi@polizialocale.it".to_string(),
            password: "pattuglia7".to_string(),
            ..NewUser::default()
        }
    }

    #[tokio::test]
    async fn test_fixed_accounts_refuse_changes_across_restarts() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let mut board = Board::open(&config).unwrap();
        board.login("admin@polizialocale.it", "admin123").await.unwrap();
        let err = board.auth().create_user(marco()).await.unwrap_err();
        assert!(matches!(
            err.as_auth(),
            Some(AuthError::ReadOnlyUsers { .. })
        ));
        assert!(board.auth().delete_user("3").await.unwrap_err().is_auth());

        let mut board = Board::open(&config).unwrap();
        assert!(board.auth().is_admin());
        assert_eq!(board.auth().list_users().await.unwrap().len(), 3);
        let err = board
            .login("marco.bianchi@polizialocale.it", "pattuglia7")
            .await
            .unwrap_err();
        assert_eq!(err.as_auth(), Some(&AuthError::UserNotFound));

        let board = Board::open(&config).unwrap();
        assert!(board.auth().session().is_none());
    }

    #[tokio::test]
    async fn test_database_accounts_survive_restarts() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.users.source = UserSourceKind::Database;
        config.users.database_path = Some(dir.path().join("users.db"));

        let mut board = Board::open(&config).unwrap();
        board.login("admin@polizialocale.it", "admin123").await.unwrap();
        let created = board.auth().create_user(marco()).await.unwrap();
        let temporary = board
            .auth()
            .create_user(NewUser {
                full_name: "Anna Neri".to_string(),
                email: "anna.neri@polizialocale.it".to_string(),
                ..marco()
            })
            .await
            .unwrap();
        board.auth().delete_user(&temporary.id).await.unwrap();

        let mut board = Board::open(&config).unwrap();
        let session = board
            .login("marco.bianchi@polizialocale.it", "pattuglia7")
            .await
            .unwrap();
        assert_eq!(session.user.id, created.id);
        let err = board
            .login("anna.neri@polizialocale.it", "pattuglia7")
            .await
            .unwrap_err();
        assert_eq!(err.as_auth(), Some(&AuthError::UserNotFound));
    }
}

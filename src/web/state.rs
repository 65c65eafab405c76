//! Shared application state.

use crate::auth::{AccountService, SessionManager};
use crate::board::BoardService;
use crate::config::Config;
use crate::content::{EmoticonSet, Enricher};
use crate::moderation::{AnnouncementService, EmoticonAdminService};
use crate::upload::UploadStorage;
use crate::{Database, Result};

/// Default name of the session cookie.
pub const DEFAULT_COOKIE_NAME: &str = "userSessionToken";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub sessions: SessionManager,
    /// Renders stored text; owns the shared emoticon set.
    pub enricher: Enricher,
    pub storage: UploadStorage,
    pub max_upload_bytes: usize,
    pub cookie_name: String,
}

impl AppState {
    pub fn new(
        db: Database,
        sessions: SessionManager,
        enricher: Enricher,
        storage: UploadStorage,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            db,
            sessions,
            enricher,
            storage,
            max_upload_bytes,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
        }
    }

    /// Build the state described by `config`, creating the upload directory.
    pub fn from_config(config: &Config, db: Database) -> Result<Self> {
        let storage = UploadStorage::new(&config.uploads.path)?;
        let enricher = Enricher::new(EmoticonSet::new(), &config.emoticons.url_prefix);
        let sessions = SessionManager::new(config.session.duration_secs);

        Ok(Self::new(
            db,
            sessions,
            enricher,
            storage,
            config.uploads.max_upload_bytes(),
        )
        .with_cookie_name(&config.session.cookie_name))
    }

    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    pub fn emoticons(&self) -> &EmoticonSet {
        self.enricher.emoticons()
    }

    pub fn board(&self) -> BoardService<'_> {
        BoardService::new(
            &self.db,
            &self.storage,
            &self.enricher,
            self.max_upload_bytes,
        )
    }

    pub fn accounts(&self) -> AccountService<'_> {
        AccountService::new(&self.db, &self.sessions)
    }

    pub fn emoticon_admin(&self) -> EmoticonAdminService<'_> {
        EmoticonAdminService::new(&self.db, self.emoticons())
    }

    pub fn announcements(&self) -> AnnouncementService<'_> {
        AnnouncementService::new(&self.db)
    }
}

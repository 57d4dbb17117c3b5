use std::sync::Arc;

use db::DBService;
use services::services::{
    config::Config, demo::DemoSessions, feed::FeedHub, storage::AttachmentStore,
};
use sqlx::SqlitePool;
use utils::assets::storage_dir;

use crate::auth::JwtService;

/// Shared handles every route works with. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: DBService,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtService>,
    pub feed: FeedHub,
    pub demo: Arc<DemoSessions>,
    pub attachments: AttachmentStore,
}

impl AppState {
    pub fn new(db: DBService, config: Config, attachments: AttachmentStore) -> Self {
        let jwt = Arc::new(JwtService::new(&config.jwt_secret));
        let demo = Arc::new(DemoSessions::new(config.history_limit));
        Self {
            db,
            config: Arc::new(config),
            jwt,
            feed: FeedHub::new(),
            demo,
            attachments,
        }
    }

    /// State rooted at the configured storage directory.
    pub fn with_default_storage(db: DBService, config: Config, public_base_url: &str) -> Self {
        let attachments = AttachmentStore::new(&storage_dir(), public_base_url);
        Self::new(db, config, attachments)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

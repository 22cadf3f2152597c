use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::config::Config;
use crate::services::SpotifyService;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<Config>,
    pub spotify: SpotifyService,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config, spotify: SpotifyService) -> Self {
        Self {
            db,
            config: Arc::new(config),
            spotify,
        }
    }
}

use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn, pool_from_orm},
    storage::ImageStorage,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub storage: Arc<ImageStorage>,
}

impl AppState {
    pub fn new(orm: OrmConn, config: AppConfig) -> Self {
        let storage = ImageStorage::from_config(&config);
        Self {
            pool: pool_from_orm(&orm),
            orm,
            config: Arc::new(config),
            storage: Arc::new(storage),
        }
    }
}

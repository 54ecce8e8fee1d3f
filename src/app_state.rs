use std::sync::Arc;

use crate::{api::followiz::FollowizClient, config::AppConfig, store::OrderStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: OrderStore,
    pub followiz: FollowizClient,
}

impl AppState {
    pub fn new(config: AppConfig, store: OrderStore, followiz: FollowizClient) -> Self {
        Self {
            config: Arc::new(config),
            store,
            followiz,
        }
    }
}

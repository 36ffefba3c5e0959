use std::path::Path;
use std::sync::Arc;

use tracing::warn;

use crate::api::{FeedApi, FeedSource, HttpFeedApi};
use crate::app::error::Result;
use crate::config::{Config, TokenSource};
use crate::feed::FeedPaginator;

pub struct AppContext {
    pub config: Config,
    pub api: Arc<dyn FeedApi + Send + Sync>,
}

impl AppContext {
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> Result<Self> {
        let token = TokenSource::new(config.api.token_file.clone()).load();
        if token.is_none() {
            warn!("No API token found; requests will be sent unauthenticated");
        }

        let api: Arc<dyn FeedApi + Send + Sync> = Arc::new(HttpFeedApi::new(&config.api, token)?);
        Ok(Self { config, api })
    }

    pub fn paginator(&self, source: FeedSource) -> FeedPaginator {
        FeedPaginator::new(self.api.clone(), source, &self.config.feed)
    }
}

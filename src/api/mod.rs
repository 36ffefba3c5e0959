pub mod http_client;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::{FeedItem, PageEdit, ReactionKind, ReactionSummary, UniqueId};

pub use crate::normalizer::PostsPage;
pub use http_client::HttpFeedApi;

/// Which feed the paginator walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedSource {
    /// The signed-in user's home feed
    Home,
    /// Posts of one page profile
    Page(i64),
}

impl FeedSource {
    /// Whether the user's own just-published posts jump to the top.
    pub fn promotes_recent_own(&self) -> bool {
        matches!(self, FeedSource::Home)
    }
}

#[async_trait]
pub trait FeedApi {
    /// Fetch posts the server has not yet sent, given every id already seen.
    async fn fetch_posts(&self, source: FeedSource, exclude: &[UniqueId]) -> Result<PostsPage>;

    /// Record the user's reaction. The server may answer with its view of
    /// the post's reactions.
    async fn react(&self, post: UniqueId, kind: ReactionKind) -> Result<Option<ReactionSummary>>;

    async fn delete_post(&self, post: UniqueId) -> Result<()>;

    /// Submit an already checked edit of a page post.
    async fn update_post(&self, edit: &PageEdit) -> Result<()>;

    /// Flip the saved flag on the server and return the server's new value.
    async fn toggle_saved(&self, post: UniqueId) -> Result<bool>;

    /// Fetch one post by numeric id, as shared links do.
    async fn fetch_post(&self, post_id: i64) -> Result<FeedItem>;
}

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::api::{FeedApi, FeedSource, PostsPage};
use crate::app::{MurmurError, Result};
use crate::config::ApiConfig;
use crate::domain::{FeedItem, PageEdit, PostKind, ReactionKind, ReactionSummary, UniqueId};
use crate::normalizer::wire::{ReactionResponse, SaveResponse, SharedPostResponse, StatusResponse};
use crate::normalizer::{reaction_summary, Normalizer};

#[derive(Serialize)]
struct FetchPostsBody<'a> {
    already_fetched_ids: &'a [UniqueId],
    #[serde(skip_serializing_if = "Option::is_none")]
    page_id: Option<i64>,
}

#[derive(Serialize)]
struct ReactionBody {
    post_id: i64,
    reaction_type: ReactionKind,
}

#[derive(Serialize)]
struct UpdatePostBody<'a> {
    post_id: i64,
    page_id: i64,
    content: &'a str,
    #[serde(rename = "type")]
    kind: PostKind,
    visibility: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    poll_question: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    poll_options: Option<&'a [String]>,
}

impl<'a> From<&'a PageEdit> for UpdatePostBody<'a> {
    fn from(edit: &'a PageEdit) -> Self {
        Self {
            post_id: edit.post.id,
            page_id: edit.page_id,
            content: &edit.body,
            kind: edit.kind(),
            visibility: "public",
            poll_question: edit.poll.as_ref().map(|p| p.question.as_str()),
            poll_options: edit.poll.as_ref().map(|p| p.options.as_slice()),
        }
    }
}

#[derive(Serialize)]
struct SaveBody {
    post_id: i64,
}

pub struct HttpFeedApi {
    client: Client,
    base_url: Url,
    token: Option<String>,
    normalizer: Normalizer,
}

impl HttpFeedApi {
    pub fn new(config: &ApiConfig, token: Option<String>) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        let client = Client::builder()
            .timeout(config.timeout())
            .gzip(true)
            .brotli(true)
            .user_agent(concat!("murmur/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let normalizer = Normalizer::new(&base_url);

        Ok(Self {
            client,
            base_url,
            token,
            normalizer,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.endpoint(path);
        debug!("{} {}", method, url);

        let builder = self
            .client
            .request(method, url)
            .header(ACCEPT, "application/json");

        match &self.token {
            Some(token) => builder.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => builder,
        }
    }

    /// Turn non-2xx responses into `Server` errors, keeping the backend's
    /// `message` when it sent one.
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        let message = serde_json::from_slice::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
            .unwrap_or_default();

        Err(MurmurError::server(status.as_u16(), message))
    }

    /// `{success: false}` bodies are failures even on a 2xx status.
    fn require_success(status: u16, success: bool, message: Option<String>, fallback: &str) -> Result<()> {
        if success {
            Ok(())
        } else {
            Err(MurmurError::server(
                status,
                message.unwrap_or_else(|| fallback.to_string()),
            ))
        }
    }
}

#[async_trait]
impl FeedApi for HttpFeedApi {
    async fn fetch_posts(&self, source: FeedSource, exclude: &[UniqueId]) -> Result<PostsPage> {
        let (path, page_id) = match source {
            FeedSource::Home => ("allposts", None),
            FeedSource::Page(id) => ("pages/allposts", Some(id)),
        };
        let body = FetchPostsBody {
            already_fetched_ids: exclude,
            page_id,
        };

        let response = self.request(Method::POST, path).json(&body).send().await?;
        let response = Self::check(response).await?;
        let bytes = response.bytes().await?;

        self.normalizer.normalize_body(&bytes)
    }

    async fn react(&self, post: UniqueId, kind: ReactionKind) -> Result<Option<ReactionSummary>> {
        let body = ReactionBody {
            post_id: post.id,
            reaction_type: kind,
        };

        let response = self
            .request(Method::POST, "postsreactions")
            .json(&body)
            .send()
            .await?;
        let response = Self::check(response).await?;
        let bytes = response.bytes().await?;

        // The snapshot is a courtesy; an unexpected shape is not a failure.
        let snapshot = match serde_json::from_slice::<ReactionResponse>(&bytes) {
            Ok(parsed) => parsed.reactions_count.as_ref().map(|counts| {
                reaction_summary(Some(counts), parsed.current_user_reaction.as_deref())
            }),
            Err(e) => {
                debug!("Ignoring unreadable reaction snapshot for {}: {}", post, e);
                None
            }
        };

        Ok(snapshot)
    }

    async fn delete_post(&self, post: UniqueId) -> Result<()> {
        let response = self
            .request(Method::DELETE, &format!("posts/{}", post.id))
            .send()
            .await?;
        let response = Self::check(response).await?;
        let status = response.status().as_u16();
        let parsed: StatusResponse = serde_json::from_slice(&response.bytes().await?)?;

        Self::require_success(status, parsed.success, parsed.message, "Failed to delete post")
    }

    async fn update_post(&self, edit: &PageEdit) -> Result<()> {
        let response = self
            .request(Method::POST, "pages/UpdatePost")
            .json(&UpdatePostBody::from(edit))
            .send()
            .await?;
        let response = Self::check(response).await?;
        let status = response.status().as_u16();
        let parsed: StatusResponse = serde_json::from_slice(&response.bytes().await?)?;

        Self::require_success(status, parsed.success, parsed.message, "Failed to update post")
    }

    async fn toggle_saved(&self, post: UniqueId) -> Result<bool> {
        let response = self
            .request(Method::POST, "savedapost")
            .json(&SaveBody { post_id: post.id })
            .send()
            .await?;
        let response = Self::check(response).await?;
        let status = response.status().as_u16();
        let parsed: SaveResponse = serde_json::from_slice(&response.bytes().await?)?;

        Self::require_success(status, parsed.success, parsed.message, "Failed to save post")?;
        parsed
            .data
            .and_then(|d| d.user_saved)
            .ok_or_else(|| MurmurError::server(status, "Save response is missing user_saved"))
    }

    async fn fetch_post(&self, post_id: i64) -> Result<FeedItem> {
        let response = self
            .request(Method::GET, &format!("shareapost/{}", post_id))
            .send()
            .await?;
        let response = Self::check(response).await?;
        let status = response.status().as_u16();
        let parsed: SharedPostResponse = serde_json::from_slice(&response.bytes().await?)?;

        Self::require_success(status, parsed.success, parsed.message, "Post not found")?;
        let raw = parsed
            .data
            .ok_or_else(|| MurmurError::server(status, "Post not found"))?;
        self.normalizer.normalize_post(raw)
    }
}

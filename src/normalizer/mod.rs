pub mod wire;

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use html_escape::decode_html_entities;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::app::{MurmurError, Result};
use crate::domain::{
    AuthorRef, FeedItem, PollContent, PostContent, PostKind, ReactionKind, ReactionSummary,
    UniqueId,
};
use self::wire::{PostsResponse, WirePost};

/// One page of posts after normalization.
///
/// `rejected` holds ids the server sent that could not be turned into items;
/// they still count as fetched so the server stops sending them.
#[derive(Debug, Clone, Default)]
pub struct PostsPage {
    pub items: Vec<FeedItem>,
    pub rejected: Vec<UniqueId>,
}

impl PostsPage {
    pub fn new(items: Vec<FeedItem>) -> Self {
        Self {
            items,
            rejected: Vec::new(),
        }
    }
}

#[derive(Clone)]
pub struct Normalizer {
    storage_base: String,
}

impl Normalizer {
    /// `api_base` is the REST root (`https://host/api`); media lives under
    /// `https://host/storage`.
    pub fn new(api_base: &Url) -> Self {
        let base = api_base.as_str().trim_end_matches('/');
        let host_root = base.strip_suffix("/api").unwrap_or(base);
        Self {
            storage_base: format!("{}/storage", host_root),
        }
    }

    pub fn normalize_body(&self, body: &[u8]) -> Result<PostsPage> {
        let response: PostsResponse = serde_json::from_slice(body)?;
        if response.is_empty() {
            debug!("Server returned no posts");
        }
        Ok(self.normalize(response))
    }

    /// Convert every bucket. Posts that fail to decode or convert are
    /// reported in `rejected`; posts without a readable id are dropped.
    pub fn normalize(&self, response: PostsResponse) -> PostsPage {
        let mut page = PostsPage::default();

        let buckets = [
            (PostKind::Text, response.text_posts),
            (PostKind::Image, response.image_posts),
            (PostKind::Video, response.video_posts),
            (PostKind::Poll, response.poll_posts),
        ];

        for (kind, posts) in buckets {
            for raw in posts {
                let Some(id) = wire::post_id(&raw) else {
                    warn!("Dropping {} post without an id", kind);
                    continue;
                };
                let unique_id = UniqueId::new(kind, id);

                let item = match serde_json::from_value::<WirePost>(raw) {
                    Ok(post) => self.convert(kind, post),
                    Err(e) => {
                        warn!("Skipping {}: {}", unique_id, e);
                        None
                    }
                };

                match item {
                    Some(item) => page.items.push(item),
                    None => page.rejected.push(unique_id),
                }
            }
        }

        page
    }

    /// Convert one post from the share endpoint, which names the kind in a
    /// `type` field.
    pub fn normalize_post(&self, raw: Value) -> Result<FeedItem> {
        let post: WirePost = serde_json::from_value(raw)?;
        let kind = post
            .kind
            .as_deref()
            .ok_or_else(|| decode_error("post has no type"))?
            .parse::<PostKind>()
            .map_err(decode_error)?;
        let unique_id = UniqueId::new(kind, post.id);

        self.convert(kind, post)
            .ok_or_else(|| decode_error(format!("unreadable post {}", unique_id)))
    }

    /// Absolute URLs pass through; anything else is a storage-relative path.
    pub fn resolve_media(&self, path: &str) -> String {
        if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}/{}", self.storage_base, path.trim_start_matches('/'))
        }
    }

    fn convert(&self, kind: PostKind, post: WirePost) -> Option<FeedItem> {
        let unique_id = UniqueId::new(kind, post.id);

        let Some(created_at) = post.created_at.as_deref().and_then(parse_datetime) else {
            warn!("Skipping {}: missing or unparsable created_at", unique_id);
            return None;
        };

        let Some(author) = self.author(&post) else {
            warn!("Skipping {}: no user or page author", unique_id);
            return None;
        };

        let body = post
            .content
            .as_deref()
            .map(|c| decode_html_entities(c).to_string());

        let direct = match kind {
            PostKind::Image => post.image.as_deref(),
            PostKind::Video => post.video.as_deref(),
            _ => None,
        };
        let media_url = post
            .media
            .as_ref()
            .and_then(|m| m.file.as_deref())
            .or(direct)
            .map(|file| self.resolve_media(file));

        let content = match kind {
            PostKind::Text => PostContent::Text,
            PostKind::Image => PostContent::Image { url: media_url },
            PostKind::Video => PostContent::Video { url: media_url },
            PostKind::Poll => {
                let poll = post.poll.unwrap_or_default();
                let question = poll
                    .question
                    .filter(|q| !q.trim().is_empty())
                    .or_else(|| body.clone())
                    .unwrap_or_default();
                PostContent::Poll(PollContent::from_options(question, poll.options))
            }
        };

        let reactions = reaction_summary(
            post.reactions_count.as_ref(),
            post.current_user_reaction.as_deref(),
        );

        Some(FeedItem {
            id: post.id,
            author,
            created_at,
            body,
            content,
            reactions,
            comment_count: post.comments_count.unwrap_or(0),
            is_current_user: post.is_current_user,
            is_saved: post.user_saved,
        })
    }

    fn author(&self, post: &WirePost) -> Option<AuthorRef> {
        if let Some(page) = &post.page {
            return Some(AuthorRef::Page {
                id: page.id,
                name: page.name.clone().unwrap_or_default(),
                logo: page.logo.as_deref().map(|l| self.resolve_media(l)),
            });
        }

        post.user.as_ref().map(|user| {
            let photo = user
                .profile_photo
                .as_deref()
                .or_else(|| user.profile.as_ref().and_then(|p| p.profile_photo.as_deref()));
            AuthorRef::User {
                id: user.id,
                name: user.name.clone().unwrap_or_default(),
                profile_photo: photo.map(|p| self.resolve_media(p)),
            }
        })
    }
}

/// Build a summary from the backend's `reactions_count` value.
///
/// The server's own `total_reactions` is ignored; the total is always the
/// sum of the per-kind counts.
pub fn reaction_summary(counts: Option<&Value>, current: Option<&str>) -> ReactionSummary {
    let mut parsed = BTreeMap::new();

    if let Some(Value::Object(map)) = counts {
        for (key, value) in map {
            let Ok(kind) = key.parse::<ReactionKind>() else {
                warn!("Ignoring unknown reaction kind {:?}", key);
                continue;
            };
            let count = value
                .as_u64()
                .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
                .unwrap_or(0);
            parsed.insert(kind, count.min(u32::MAX as u64) as u32);
        }
    }

    let current = current.and_then(|c| match c.parse::<ReactionKind>() {
        Ok(kind) => Some(kind),
        Err(e) => {
            warn!("{}", e);
            None
        }
    });

    ReactionSummary::new(parsed, current)
}

fn decode_error(message: impl std::fmt::Display) -> MurmurError {
    MurmurError::Decode(serde::de::Error::custom(message))
}

pub(crate) fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
                .map(|naive| naive.and_utc())
                .ok()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const ALLPOSTS_SAMPLE: &str = r#"{
        "text_posts": [
            {
                "id": 1,
                "content": "Fish &amp; chips",
                "created_at": "2024-05-01T10:00:00.000000Z",
                "user": {"id": 9, "name": "Ada", "profile_photo": "profile_photos/ada.png"},
                "comments_count": 3,
                "reactions_count": {"like": 2, "love": 1},
                "total_reactions": 3,
                "current_user_reaction": "like",
                "is_current_user": true
            }
        ],
        "image_posts": [
            {
                "id": 1,
                "content": "Sunset",
                "created_at": "2024-05-01 09:00:00",
                "user": {"id": 4, "name": "Grace", "profile": {"profile_photo": "https://cdn.example.com/g.png"}},
                "reactions_count": [],
                "media": {"file": "posts/sunset.jpg"}
            }
        ],
        "video_posts": [
            {
                "id": 2,
                "created_at": "2024-05-01T08:00:00Z",
                "page": {"id": 12, "page_name": "Rustaceans", "logo": "logos/crab.png"},
                "user": {"id": 4, "name": "Grace"},
                "media": {"file": "https://videos.example.com/v.mp4"}
            }
        ],
        "poll_posts": [
            {
                "id": 3,
                "content": "Tabs or spaces?",
                "created_at": "2024-05-01T07:00:00Z",
                "user": {"id": 9, "name": "Ada"},
                "poll": {"options": ["Tabs", "Spaces"]}
            },
            {
                "id": 4,
                "created_at": "yesterday",
                "user": {"id": 9, "name": "Ada"}
            }
        ]
    }"#;

    fn normalizer() -> Normalizer {
        Normalizer::new(&Url::parse("https://social.example.com/api").unwrap())
    }

    #[test]
    fn test_normalize_all_buckets() {
        let page = normalizer().normalize_body(ALLPOSTS_SAMPLE.as_bytes()).unwrap();

        assert_eq!(page.items.len(), 4);
        assert_eq!(page.rejected, vec![UniqueId::new(PostKind::Poll, 4)]);

        let ids: Vec<String> = page.items.iter().map(|i| i.unique_id().to_string()).collect();
        assert_eq!(ids, vec!["text_1", "image_1", "video_2", "poll_3"]);
    }

    #[test]
    fn test_text_post_fields() {
        let page = normalizer().normalize_body(ALLPOSTS_SAMPLE.as_bytes()).unwrap();
        let text = &page.items[0];

        assert_eq!(text.body.as_deref(), Some("Fish & chips"));
        assert_eq!(text.comment_count, 3);
        assert!(text.is_current_user);
        assert_eq!(text.reactions.count(ReactionKind::Like), 2);
        assert_eq!(text.reactions.total(), 3);
        assert_eq!(text.reactions.current(), Some(ReactionKind::Like));
        assert_eq!(
            text.created_at,
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
        );
        assert_eq!(
            text.author,
            AuthorRef::User {
                id: 9,
                name: "Ada".into(),
                profile_photo: Some(
                    "https://social.example.com/storage/profile_photos/ada.png".into()
                ),
            }
        );
    }

    #[test]
    fn test_media_urls_resolved() {
        let page = normalizer().normalize_body(ALLPOSTS_SAMPLE.as_bytes()).unwrap();

        assert_eq!(
            page.items[1].content,
            PostContent::Image {
                url: Some("https://social.example.com/storage/posts/sunset.jpg".into())
            }
        );
        assert_eq!(
            page.items[2].content,
            PostContent::Video {
                url: Some("https://videos.example.com/v.mp4".into())
            }
        );
    }

    #[test]
    fn test_empty_reaction_array_is_empty_summary() {
        let page = normalizer().normalize_body(ALLPOSTS_SAMPLE.as_bytes()).unwrap();
        assert_eq!(page.items[1].reactions, ReactionSummary::default());
    }

    #[test]
    fn test_page_author_preferred_over_user() {
        let page = normalizer().normalize_body(ALLPOSTS_SAMPLE.as_bytes()).unwrap();
        assert_eq!(page.items[2].author.display_name(), "Rustaceans");
    }

    #[test]
    fn test_poll_question_falls_back_to_content() {
        let page = normalizer().normalize_body(ALLPOSTS_SAMPLE.as_bytes()).unwrap();
        let poll = page.items[3].poll().unwrap();

        assert_eq!(poll.question, "Tabs or spaces?");
        assert_eq!(poll.options.len(), 2);
        assert_eq!(poll.option(1).unwrap().text, "Tabs");
    }

    #[test]
    fn test_empty_poll_question_falls_back_to_content() {
        let body = br#"{"poll_posts": [{
            "id": 8,
            "content": "Best editor?",
            "created_at": "2024-05-01T07:00:00Z",
            "user": {"id": 9, "name": "Ada"},
            "poll": {"question": "", "options": ["vim", "emacs"]}
        }]}"#;
        let page = normalizer().normalize_body(body).unwrap();

        assert_eq!(page.items[0].poll().unwrap().question, "Best editor?");
    }

    #[test]
    fn test_malformed_post_does_not_sink_page() {
        let body = br#"{"text_posts": [
            {"id": 1, "created_at": "2024-05-01T10:00:00Z", "user": {"id": 9, "name": "Ada"}},
            {"id": 2, "created_at": "2024-05-01T09:00:00Z", "user": {"id": 9}, "is_current_user": null},
            {"id": 3, "created_at": "2024-05-01T08:00:00Z", "user": {"name": "no id"}},
            {"id": 4, "created_at": "2024-05-01T07:00:00Z", "user": {"id": 9}, "comments_count": "5"},
            {"content": "no id at all"}
        ]}"#;
        let page = normalizer().normalize_body(body).unwrap();

        let ids: Vec<String> = page.items.iter().map(|i| i.unique_id().to_string()).collect();
        assert_eq!(ids, vec!["text_1", "text_2", "text_4"]);
        assert!(!page.items[1].is_current_user);
        assert_eq!(page.items[2].comment_count, 5);
        assert_eq!(page.rejected, vec![UniqueId::new(PostKind::Text, 3)]);
    }

    #[test]
    fn test_normalize_shared_post() {
        let raw = serde_json::json!({
            "id": 31,
            "type": "video",
            "content": "Launch",
            "video": "posts/launch.mp4",
            "created_at": "2024-05-02 12:00:00",
            "user": {"id": 2, "name": "Grace"},
            "comments": 4,
            "reactions_count": {"wow": 1},
            "user_saved": true
        });
        let item = normalizer().normalize_post(raw).unwrap();

        assert_eq!(item.unique_id(), UniqueId::new(PostKind::Video, 31));
        assert_eq!(
            item.content,
            PostContent::Video {
                url: Some("https://social.example.com/storage/posts/launch.mp4".into())
            }
        );
        assert_eq!(item.comment_count, 4);
        assert!(item.is_saved);
    }

    #[test]
    fn test_shared_post_without_type_is_decode_error() {
        let raw = serde_json::json!({"id": 1, "created_at": "2024-05-02T12:00:00Z", "user": {"id": 2}});
        assert!(matches!(
            normalizer().normalize_post(raw),
            Err(crate::app::MurmurError::Decode(_))
        ));
    }

    #[test]
    fn test_missing_buckets_are_empty() {
        let page = normalizer().normalize_body(b"{\"text_posts\": []}").unwrap();
        assert!(page.items.is_empty());
        assert!(page.rejected.is_empty());
    }

    #[test]
    fn test_invalid_json_is_decode_error() {
        let err = normalizer().normalize_body(b"<html>").unwrap_err();
        assert!(matches!(err, crate::app::MurmurError::Decode(_)));
    }

    #[test]
    fn test_storage_base_without_api_suffix() {
        let n = Normalizer::new(&Url::parse("https://social.example.com/").unwrap());
        assert_eq!(
            n.resolve_media("/a/b.png"),
            "https://social.example.com/storage/a/b.png"
        );
    }

    #[test]
    fn test_unknown_reaction_kinds_dropped() {
        let counts = serde_json::json!({"like": 1, "yawn": 5, "sad": "2"});
        let summary = reaction_summary(Some(&counts), Some("yawn"));

        assert_eq!(summary.total(), 3);
        assert_eq!(summary.count(ReactionKind::Sad), 2);
        assert_eq!(summary.current(), None);
    }
}

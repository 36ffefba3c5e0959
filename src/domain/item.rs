use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{PollContent, ReactionSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    Text,
    Image,
    Video,
    Poll,
}

impl PostKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostKind::Text => "text",
            PostKind::Image => "image",
            PostKind::Video => "video",
            PostKind::Poll => "poll",
        }
    }
}

impl fmt::Display for PostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(PostKind::Text),
            "image" => Ok(PostKind::Image),
            "video" => Ok(PostKind::Video),
            "poll" => Ok(PostKind::Poll),
            other => Err(format!("unknown post kind: {}", other)),
        }
    }
}

/// Composite `kind_id` key. Numeric ids are shared between the backend's
/// per-kind tables, so the kind is part of identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UniqueId {
    pub kind: PostKind,
    pub id: i64,
}

impl UniqueId {
    pub fn new(kind: PostKind, id: i64) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.kind, self.id)
    }
}

impl FromStr for UniqueId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once('_')
            .ok_or_else(|| format!("expected <kind>_<id>, got {}", s))?;
        let kind = kind.parse::<PostKind>()?;
        let id = id
            .parse::<i64>()
            .map_err(|_| format!("invalid post id in {}", s))?;
        Ok(Self { kind, id })
    }
}

impl Serialize for UniqueId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for UniqueId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AuthorRef {
    User {
        id: i64,
        name: String,
        profile_photo: Option<String>,
    },
    Page {
        id: i64,
        name: String,
        logo: Option<String>,
    },
}

impl AuthorRef {
    pub fn display_name(&self) -> &str {
        match self {
            AuthorRef::User { name, .. } | AuthorRef::Page { name, .. } => name,
        }
    }

    pub fn page_id(&self) -> Option<i64> {
        match self {
            AuthorRef::Page { id, .. } => Some(*id),
            AuthorRef::User { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PostContent {
    Text,
    Image { url: Option<String> },
    Video { url: Option<String> },
    Poll(PollContent),
}

impl PostContent {
    pub fn kind(&self) -> PostKind {
        match self {
            PostContent::Text => PostKind::Text,
            PostContent::Image { .. } => PostKind::Image,
            PostContent::Video { .. } => PostKind::Video,
            PostContent::Poll(_) => PostKind::Poll,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: i64,
    pub author: AuthorRef,
    pub created_at: DateTime<Utc>,
    pub body: Option<String>,
    pub content: PostContent,
    pub reactions: ReactionSummary,
    pub comment_count: u32,
    pub is_current_user: bool,
    #[serde(default)]
    pub is_saved: bool,
}

impl FeedItem {
    pub fn new(id: i64, author: AuthorRef, created_at: DateTime<Utc>, content: PostContent) -> Self {
        Self {
            id,
            author,
            created_at,
            body: None,
            content,
            reactions: ReactionSummary::default(),
            comment_count: 0,
            is_current_user: false,
            is_saved: false,
        }
    }

    pub fn kind(&self) -> PostKind {
        self.content.kind()
    }

    pub fn unique_id(&self) -> UniqueId {
        UniqueId::new(self.kind(), self.id)
    }

    pub fn display_body(&self) -> &str {
        self.body.as_deref().unwrap_or("")
    }

    pub fn poll(&self) -> Option<&PollContent> {
        match &self.content {
            PostContent::Poll(poll) => Some(poll),
            _ => None,
        }
    }
}

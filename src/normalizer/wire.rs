//! Response shapes of the REST backend.
//!
//! Fields the client never reads (`total_reactions`, poll vote tallies, ...)
//! are left out; serde ignores them. Buckets are kept as raw JSON so that one
//! malformed post does not sink the whole page.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PostsResponse {
    pub text_posts: Vec<Value>,
    pub image_posts: Vec<Value>,
    pub video_posts: Vec<Value>,
    pub poll_posts: Vec<Value>,
}

impl PostsResponse {
    pub fn len(&self) -> usize {
        self.text_posts.len() + self.image_posts.len() + self.video_posts.len() + self.poll_posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Deserialize)]
pub struct WirePost {
    #[serde(deserialize_with = "lenient_id")]
    pub id: i64,
    /// Only the share endpoint names the kind; feed buckets imply it
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub user: Option<WireUser>,
    #[serde(default)]
    pub page: Option<WirePage>,
    #[serde(default, alias = "comments", deserialize_with = "lenient_count")]
    pub comments_count: Option<u32>,
    /// Either an object of kind → count or, when empty, `[]`
    #[serde(default)]
    pub reactions_count: Option<Value>,
    #[serde(default)]
    pub current_user_reaction: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_current_user: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub user_saved: bool,
    #[serde(default)]
    pub media: Option<WireMedia>,
    /// Share endpoint media, in place of `media.file`
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub video: Option<String>,
    #[serde(default)]
    pub poll: Option<WirePoll>,
}

#[derive(Debug, Deserialize)]
pub struct WireUser {
    #[serde(deserialize_with = "lenient_id")]
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub profile_photo: Option<String>,
    #[serde(default)]
    pub profile: Option<WireProfile>,
}

#[derive(Debug, Deserialize)]
pub struct WireProfile {
    #[serde(default)]
    pub profile_photo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WirePage {
    #[serde(deserialize_with = "lenient_id")]
    pub id: i64,
    #[serde(default, alias = "page_name")]
    pub name: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WireMedia {
    #[serde(default)]
    pub file: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WirePoll {
    pub question: Option<String>,
    #[serde(deserialize_with = "poll_options")]
    pub options: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReactionResponse {
    pub reactions_count: Option<Value>,
    pub current_user_reaction: Option<String>,
}

/// `{success, message}` answer of the delete and update endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StatusResponse {
    pub success: bool,
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SaveResponse {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<SaveState>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SaveState {
    pub user_saved: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SharedPostResponse {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<Value>,
}

/// Numeric id of a raw post, whether sent as a number or a numeric string.
pub fn post_id(value: &Value) -> Option<i64> {
    value.get("id").and_then(id_of)
}

fn id_of(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    id_of(&value).ok_or_else(|| serde::de::Error::custom(format!("invalid id {}", value)))
}

/// Numbers, numeric strings and `null`; anything unreadable counts as absent.
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let count = value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()));
    Ok(count.map(|c| c.min(u32::MAX as u64) as u32))
}

/// `true`/`false`, `1`/`0`, `"1"`/`"true"`; `null` and anything else is false.
fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
        Value::String(s) => matches!(s.trim(), "1" | "true"),
        _ => false,
    })
}

/// Plain strings or `{text}` objects, as the edit screen sends them back.
fn poll_options<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let values = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(values
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s),
            Value::Object(map) => map.get("text").and_then(Value::as_str).map(String::from),
            _ => None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_and_string_fields_tolerated() {
        let post: WirePost = serde_json::from_value(json!({
            "id": "7",
            "is_current_user": null,
            "comments_count": "12",
            "user_saved": 1,
            "user": {"id": 3}
        }))
        .unwrap();

        assert_eq!(post.id, 7);
        assert!(!post.is_current_user);
        assert!(post.user_saved);
        assert_eq!(post.comments_count, Some(12));
    }

    #[test]
    fn test_share_shape_fields() {
        let post: WirePost = serde_json::from_value(json!({
            "id": 4,
            "type": "image",
            "image": "posts/a.jpg",
            "comments": 2
        }))
        .unwrap();

        assert_eq!(post.kind.as_deref(), Some("image"));
        assert_eq!(post.image.as_deref(), Some("posts/a.jpg"));
        assert_eq!(post.comments_count, Some(2));
    }

    #[test]
    fn test_poll_options_as_objects() {
        let poll: WirePoll = serde_json::from_value(json!({
            "question": "Q",
            "options": [{"id": 1, "text": "a"}, "b", 3]
        }))
        .unwrap();
        assert_eq!(poll.options, vec!["a", "b"]);
    }

    #[test]
    fn test_post_id_of_raw_value() {
        assert_eq!(post_id(&json!({"id": 5})), Some(5));
        assert_eq!(post_id(&json!({"id": "6"})), Some(6));
        assert_eq!(post_id(&json!({"id": null})), None);
        assert_eq!(post_id(&json!("text")), None);
    }

    #[test]
    fn test_user_without_id_is_an_error() {
        let result = serde_json::from_value::<WirePost>(json!({"id": 1, "user": {"name": "Ada"}}));
        assert!(result.is_err());
    }
}

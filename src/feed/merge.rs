use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};

use crate::domain::FeedItem;

/// How a new batch is folded into the rendered list.
#[derive(Debug, Clone, Copy)]
pub struct MergePolicy {
    /// Move the current user's fresh posts ahead of everything else
    pub promote_recent_own: bool,
    /// How fresh "fresh" is
    pub recent_own_window: Duration,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self {
            promote_recent_own: true,
            recent_own_window: Duration::minutes(5),
        }
    }
}

impl MergePolicy {
    pub fn is_recent_own(&self, item: &FeedItem, now: DateTime<Utc>) -> bool {
        item.is_current_user && now.signed_duration_since(item.created_at) < self.recent_own_window
    }
}

/// Fold `incoming` into `existing`.
///
/// Items already present (by unique id) are dropped, the rest are sorted
/// newest first and appended. When the policy allows it, the current user's
/// posts created within the window go to the very front instead, ahead of
/// items that were already rendered.
pub fn merge_incoming(
    existing: Vec<FeedItem>,
    incoming: Vec<FeedItem>,
    now: DateTime<Utc>,
    policy: &MergePolicy,
) -> Vec<FeedItem> {
    let mut seen: HashSet<_> = existing.iter().map(FeedItem::unique_id).collect();

    let mut fresh: Vec<FeedItem> = incoming
        .into_iter()
        .filter(|item| seen.insert(item.unique_id()))
        .collect();
    fresh.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    if !policy.promote_recent_own {
        let mut merged = existing;
        merged.extend(fresh);
        return merged;
    }

    let (promoted, rest): (Vec<_>, Vec<_>) = fresh
        .into_iter()
        .partition(|item| policy.is_recent_own(item, now));

    let mut merged = Vec::with_capacity(promoted.len() + existing.len() + rest.len());
    merged.extend(promoted);
    merged.extend(existing);
    merged.extend(rest);
    merged
}

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Reaction palette offered by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Love,
    Laugh,
    Wow,
    Sad,
    Angry,
}

impl ReactionKind {
    pub const ALL: [ReactionKind; 6] = [
        ReactionKind::Like,
        ReactionKind::Love,
        ReactionKind::Laugh,
        ReactionKind::Wow,
        ReactionKind::Sad,
        ReactionKind::Angry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Love => "love",
            ReactionKind::Laugh => "laugh",
            ReactionKind::Wow => "wow",
            ReactionKind::Sad => "sad",
            ReactionKind::Angry => "angry",
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown reaction kind: {0}")]
pub struct UnknownReaction(pub String);

impl FromStr for ReactionKind {
    type Err = UnknownReaction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        ReactionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lowered)
            .ok_or_else(|| UnknownReaction(s.to_string()))
    }
}

/// What a toggle did to a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionTransition {
    Added(ReactionKind),
    Switched { from: ReactionKind, to: ReactionKind },
    Cleared(ReactionKind),
}

/// Per-kind reaction counts on a post plus the current user's own reaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionSummary {
    counts: BTreeMap<ReactionKind, u32>,
    current: Option<ReactionKind>,
}

impl ReactionSummary {
    pub fn new(counts: BTreeMap<ReactionKind, u32>, current: Option<ReactionKind>) -> Self {
        let mut summary = Self { counts, current };
        summary.counts.retain(|_, count| *count > 0);
        summary
    }

    pub fn count(&self, kind: ReactionKind) -> u32 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    pub fn current(&self) -> Option<ReactionKind> {
        self.current
    }

    pub fn counts(&self) -> impl Iterator<Item = (ReactionKind, u32)> + '_ {
        self.counts.iter().map(|(kind, count)| (*kind, *count))
    }

    /// Apply the current user's selection of `kind`.
    ///
    /// NONE -> REACTED(kind), REACTED(other) -> REACTED(kind),
    /// REACTED(kind) -> NONE. Decrements never go below zero.
    pub fn toggle(&mut self, kind: ReactionKind) -> ReactionTransition {
        match self.current {
            None => {
                self.increment(kind);
                self.current = Some(kind);
                ReactionTransition::Added(kind)
            }
            Some(prev) if prev == kind => {
                self.decrement(kind);
                self.current = None;
                ReactionTransition::Cleared(kind)
            }
            Some(prev) => {
                self.decrement(prev);
                self.increment(kind);
                self.current = Some(kind);
                ReactionTransition::Switched {
                    from: prev,
                    to: kind,
                }
            }
        }
    }

    fn increment(&mut self, kind: ReactionKind) {
        let count = self.counts.entry(kind).or_insert(0);
        *count = count.saturating_add(1);
    }

    fn decrement(&mut self, kind: ReactionKind) {
        if let Some(count) = self.counts.get_mut(&kind) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.counts.remove(&kind);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(pairs: &[(ReactionKind, u32)], current: Option<ReactionKind>) -> ReactionSummary {
        ReactionSummary::new(pairs.iter().copied().collect(), current)
    }

    #[test]
    fn test_parse_reaction_kind() {
        assert_eq!("love".parse::<ReactionKind>().unwrap(), ReactionKind::Love);
        assert_eq!(" WOW ".parse::<ReactionKind>().unwrap(), ReactionKind::Wow);
        assert!("meh".parse::<ReactionKind>().is_err());
    }

    #[test]
    fn test_first_reaction_increments() {
        let mut s = summary(&[(ReactionKind::Like, 2)], None);
        let transition = s.toggle(ReactionKind::Like);

        assert_eq!(transition, ReactionTransition::Added(ReactionKind::Like));
        assert_eq!(s.count(ReactionKind::Like), 3);
        assert_eq!(s.current(), Some(ReactionKind::Like));
    }

    #[test]
    fn test_same_reaction_twice_restores_original() {
        let original = summary(&[(ReactionKind::Love, 4), (ReactionKind::Sad, 1)], None);
        let mut s = original.clone();

        s.toggle(ReactionKind::Love);
        let transition = s.toggle(ReactionKind::Love);

        assert_eq!(transition, ReactionTransition::Cleared(ReactionKind::Love));
        assert_eq!(s, original);
        assert_eq!(s.current(), None);
    }

    #[test]
    fn test_switch_moves_one_count() {
        let mut s = summary(
            &[(ReactionKind::Like, 5), (ReactionKind::Wow, 1)],
            Some(ReactionKind::Like),
        );
        let transition = s.toggle(ReactionKind::Wow);

        assert_eq!(
            transition,
            ReactionTransition::Switched {
                from: ReactionKind::Like,
                to: ReactionKind::Wow
            }
        );
        assert_eq!(s.count(ReactionKind::Like), 4);
        assert_eq!(s.count(ReactionKind::Wow), 2);
        assert_eq!(s.total(), 6);
    }

    #[test]
    fn test_switch_floors_at_zero() {
        // Server snapshot claims our reaction but reports no count for it
        let mut s = summary(&[], Some(ReactionKind::Angry));
        s.toggle(ReactionKind::Laugh);

        assert_eq!(s.count(ReactionKind::Angry), 0);
        assert_eq!(s.count(ReactionKind::Laugh), 1);
    }

    #[test]
    fn test_increment_saturates_at_max() {
        let mut s = summary(&[(ReactionKind::Like, u32::MAX)], None);
        s.toggle(ReactionKind::Like);
        assert_eq!(s.count(ReactionKind::Like), u32::MAX);

        s.toggle(ReactionKind::Like);
        assert_eq!(s.count(ReactionKind::Like), u32::MAX - 1);
    }

    #[test]
    fn test_zero_counts_dropped_on_construction() {
        let s = summary(&[(ReactionKind::Like, 0), (ReactionKind::Sad, 2)], None);
        assert_eq!(s.counts().count(), 1);
        assert_eq!(s.total(), 2);
    }
}

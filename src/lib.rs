//! # murmur
//!
//! Client core for a social-network REST backend: an incrementally loaded,
//! de-duplicated post feed with optimistic reactions, saves, edits and deletes.
//!
//! ## Architecture
//!
//! ```text
//! api → normalizer → feed (paginator + merge) → events
//! ```
//!
//! - [`api`]: the [`FeedApi`](api::FeedApi) trait and its reqwest implementation
//! - [`normalizer`]: backend JSON to [`FeedItem`](domain::FeedItem)s
//! - [`feed`]: [`FeedPaginator`](feed::FeedPaginator), merge rules, event bus
//!
//! ## Quick Start
//!
//! ```bash
//! # Print the first two pages of the home feed
//! murmur feed --pages 2
//!
//! # React to a post
//! murmur react image_42 love
//!
//! # Fix a typo in a page post
//! murmur edit text_7 "Fixed text"
//! ```

/// Application context and error handling.
pub mod app;

/// Configuration and token lookup.
///
/// Loads from `~/.config/murmur/config.toml`.
pub mod config;

/// Command-line interface using clap.
pub mod cli;

/// Core domain models.
///
/// - [`FeedItem`](domain::FeedItem): one post of any kind
/// - [`UniqueId`](domain::UniqueId): the `kind_id` de-duplication key
/// - [`ReactionSummary`](domain::ReactionSummary): counts and the user's own reaction
/// - [`PostEdit`](domain::PostEdit): a user's edit, checked before it is sent
pub mod domain;

/// Backend access.
///
/// - [`FeedApi`](api::FeedApi): async trait for the feed and post endpoints
/// - [`HttpFeedApi`](api::HttpFeedApi): reqwest-based implementation
pub mod api;

/// Conversion of backend responses into domain items.
pub mod normalizer;

/// Feed pagination and optimistic updates.
pub mod feed;

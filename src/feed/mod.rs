//! The paginated feed and everything that hangs off it.

pub mod events;
pub mod merge;
pub mod paginator;
pub mod request_state;

pub use events::{FeedEvent, FeedEvents, Notification, NotificationLevel};
pub use merge::{merge_incoming, MergePolicy};
pub use paginator::{FeedPaginator, FetchCursor, FetchOutcome};
pub use request_state::{Operation, RequestState, RequestTracker};

pub mod edit;
pub mod item;
pub mod poll;
pub mod reaction;

pub use edit::{EditError, PageEdit, PollEdit, PostEdit, MAX_POLL_OPTIONS, MIN_POLL_OPTIONS};
pub use item::{AuthorRef, FeedItem, PostContent, PostKind, UniqueId};
pub use poll::{PollContent, PollOption, PollState};
pub use reaction::{ReactionKind, ReactionSummary, ReactionTransition, UnknownReaction};

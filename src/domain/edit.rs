//! Edits to existing page posts.
//!
//! A [`PostEdit`] is what the user typed; [`PostEdit::check`] turns it into a
//! [`PageEdit`], the trimmed request the server accepts.

use thiserror::Error;

use super::{FeedItem, PollContent, PostContent, PostKind, UniqueId};

pub const MIN_POLL_OPTIONS: usize = 2;
pub const MAX_POLL_OPTIONS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollEdit {
    pub question: String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostEdit {
    pub body: String,
    /// New poll details; `None` keeps a poll post's current poll
    pub poll: Option<PollEdit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("Post text cannot be empty")]
    EmptyBody,

    #[error("Cannot post: Invalid page ID")]
    NotPagePost,

    #[error("Poll details can only be set on poll posts")]
    NotAPoll,

    #[error("Poll question cannot be empty")]
    EmptyQuestion,

    #[error("Poll must have at least 2 options")]
    TooFewOptions,

    #[error("Poll can have at most 6 options")]
    TooManyOptions,
}

/// A checked edit, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEdit {
    pub post: UniqueId,
    pub page_id: i64,
    pub body: String,
    pub poll: Option<PollEdit>,
}

impl PostEdit {
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            poll: None,
        }
    }

    pub fn poll(body: impl Into<String>, question: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            body: body.into(),
            poll: Some(PollEdit {
                question: question.into(),
                options,
            }),
        }
    }

    /// Validate against the post being edited. Text is trimmed and blank poll
    /// options are dropped before the option count is checked.
    pub fn check(&self, item: &FeedItem) -> Result<PageEdit, EditError> {
        let body = self.body.trim();
        if body.is_empty() {
            return Err(EditError::EmptyBody);
        }

        let page_id = item
            .author
            .page_id()
            .filter(|id| *id > 0)
            .ok_or(EditError::NotPagePost)?;

        let poll = match (item.poll(), &self.poll) {
            (None, Some(_)) => return Err(EditError::NotAPoll),
            (None, None) => None,
            (Some(current), None) => Some(PollEdit {
                question: current.question.clone(),
                options: current.options.iter().map(|o| o.text.clone()).collect(),
            }),
            (Some(_), Some(edit)) => Some(PollEdit {
                question: edit.question.trim().to_string(),
                options: edit
                    .options
                    .iter()
                    .map(|o| o.trim())
                    .filter(|o| !o.is_empty())
                    .map(String::from)
                    .collect(),
            }),
        };

        if let Some(poll) = &poll {
            if poll.question.is_empty() {
                return Err(EditError::EmptyQuestion);
            }
            if poll.options.len() < MIN_POLL_OPTIONS {
                return Err(EditError::TooFewOptions);
            }
            if poll.options.len() > MAX_POLL_OPTIONS {
                return Err(EditError::TooManyOptions);
            }
        }

        Ok(PageEdit {
            post: item.unique_id(),
            page_id,
            body: body.to_string(),
            poll,
        })
    }
}

impl PageEdit {
    pub fn kind(&self) -> PostKind {
        self.post.kind
    }

    /// Write the accepted edit into the local copy of the post.
    pub fn apply(&self, item: &mut FeedItem) {
        item.body = Some(self.body.clone());
        if let (Some(edit), PostContent::Poll(poll)) = (&self.poll, &mut item.content) {
            *poll = PollContent::from_options(edit.question.clone(), edit.options.clone());
        }
    }
}

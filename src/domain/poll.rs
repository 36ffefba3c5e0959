use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::UniqueId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    /// 1-based position in the server's option list
    pub id: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollContent {
    pub question: String,
    pub options: Vec<PollOption>,
}

impl PollContent {
    pub fn from_options(question: String, options: Vec<String>) -> Self {
        let options = options
            .into_iter()
            .enumerate()
            .map(|(index, text)| PollOption {
                id: index as u32 + 1,
                text,
            })
            .collect();
        Self { question, options }
    }

    pub fn option(&self, id: u32) -> Option<&PollOption> {
        self.options.iter().find(|o| o.id == id)
    }
}

/// Client-local poll selections. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct PollState {
    selections: HashMap<UniqueId, u32>,
}

impl PollState {
    pub fn select(&mut self, poll: UniqueId, option_id: u32) {
        self.selections.insert(poll, option_id);
    }

    pub fn selection(&self, poll: &UniqueId) -> Option<u32> {
        self.selections.get(poll).copied()
    }

    pub fn forget(&mut self, poll: &UniqueId) {
        self.selections.remove(poll);
    }

    pub fn clear(&mut self) {
        self.selections.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PostKind;

    #[test]
    fn test_options_numbered_from_one() {
        let poll = PollContent::from_options("Lunch?".into(), vec!["Pizza".into(), "Tacos".into()]);
        assert_eq!(poll.options[0].id, 1);
        assert_eq!(poll.option(2).map(|o| o.text.as_str()), Some("Tacos"));
        assert!(poll.option(3).is_none());
    }

    #[test]
    fn test_selection_replaces_previous() {
        let id = UniqueId::new(PostKind::Poll, 7);
        let mut state = PollState::default();
        state.select(id, 1);
        state.select(id, 2);
        assert_eq!(state.selection(&id), Some(2));

        state.clear();
        assert_eq!(state.selection(&id), None);
    }
}

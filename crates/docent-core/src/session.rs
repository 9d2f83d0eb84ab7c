use serde::Serialize;

use crate::composer::SourceRef;
use crate::router::{Mode, RouteOutcome};

/// One user query and the answer it produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationTurn {
    pub user_text: String,
    pub answer_text: String,
    pub mode: Mode,
    pub sources: Vec<SourceRef>,
    pub tools_used: Vec<String>,
}

impl ConversationTurn {
    #[must_use]
    pub fn new(user_text: &str, outcome: &RouteOutcome) -> Self {
        Self {
            user_text: user_text.to_owned(),
            answer_text: outcome.answer.clone(),
            mode: outcome.mode,
            sources: outcome.sources.clone(),
            tools_used: outcome.tools_used.clone(),
        }
    }
}

/// Ordered conversation history of one chat session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    turns: Vec<ConversationTurn>,
}

impl Session {
    pub fn record(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    #[must_use]
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

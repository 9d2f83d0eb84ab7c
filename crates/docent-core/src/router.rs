//! Calculation-vs-lookup classification and dispatch to the agent or retrieval path.

use std::fmt;
use std::sync::{Arc, LazyLock};

use docent_llm::LlmProvider;
use docent_memory::VectorIndex;
use docent_tools::calculator::fold_full_width;
use regex::Regex;
use serde::Serialize;

use crate::agent::ToolAgent;
use crate::composer::{RetrievalComposer, SourceRef};

/// Fixed reply to an empty or whitespace-only query.
pub const EMPTY_QUERY_PROMPT: &str = "Please enter a question.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    None,
    Rag,
    Agents,
}

impl Mode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Rag => "rag",
            Self::Agents => "agents",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a non-blank query goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Agent,
    Retrieve,
}

/// Tag of the classification rule that matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalcRule {
    DigitOperatorDigit,
    PercentOf,
    Percent,
    NamedOperation,
    OperatorGlyph,
}

struct Rule {
    tag: CalcRule,
    pattern: Regex,
}

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    let rule = |tag, pattern: &str| Rule {
        tag,
        pattern: Regex::new(pattern).unwrap(),
    };
    vec![
        rule(
            CalcRule::DigitOperatorDigit,
            r"\d\s*(?:\*\*|[+\-*/×÷^])\s*\d",
        ),
        rule(
            CalcRule::PercentOf,
            r"\d\s*(?:%|percent)\s+of\s+\d|\d\s*の\s*\d+(?:\.\d+)?\s*(?:%|パーセント)",
        ),
        rule(CalcRule::Percent, r"\d\s*%|\bpercent\b"),
        rule(
            CalcRule::NamedOperation,
            r"\b(?:calculate|square\s+root|sqrt|power|squared|cubed|plus|minus|times|multiplied|divided|sum\s+of|product\s+of)\b|計算|足し算|引き算|掛け算|割り算|パーセント|平方根|累乗",
        ),
        // `/` counts only when not joining two words, so "and/or" stays a lookup.
        rule(
            CalcRule::OperatorGlyph,
            r"[+*=×÷√^]|(?:^|[^\p{L}])/|/(?:[^\p{L}]|$)",
        ),
    ]
});

/// First rule that marks `query` as a calculation, if any.
#[must_use]
pub fn matched_rule(query: &str) -> Option<CalcRule> {
    let text = fold_full_width(query).to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.pattern.is_match(&text))
        .map(|rule| rule.tag)
}

impl From<Option<CalcRule>> for Route {
    fn from(rule: Option<CalcRule>) -> Self {
        if rule.is_some() {
            Self::Agent
        } else {
            Self::Retrieve
        }
    }
}

#[must_use]
pub fn classify(query: &str) -> Route {
    Route::from(matched_rule(query))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteOutcome {
    pub answer: String,
    pub mode: Mode,
    pub sources: Vec<SourceRef>,
    pub tools_used: Vec<String>,
}

pub type QueryResponse = RouteOutcome;

pub struct QueryRouter<P: LlmProvider> {
    composer: RetrievalComposer<P>,
    agent: ToolAgent<P>,
    index: Arc<VectorIndex<P>>,
}

impl<P: LlmProvider> QueryRouter<P> {
    #[must_use]
    pub fn new(composer: RetrievalComposer<P>, agent: ToolAgent<P>, index: Arc<VectorIndex<P>>) -> Self {
        Self {
            composer,
            agent,
            index,
        }
    }

    #[must_use]
    pub fn agent(&self) -> &ToolAgent<P> {
        &self.agent
    }

    pub fn agent_mut(&mut self) -> &mut ToolAgent<P> {
        &mut self.agent
    }

    pub async fn route(&mut self, query: &str) -> RouteOutcome {
        let query = query.trim();
        if query.is_empty() {
            return RouteOutcome {
                answer: EMPTY_QUERY_PROMPT.to_owned(),
                mode: Mode::None,
                sources: Vec::new(),
                tools_used: Vec::new(),
            };
        }

        let rule = matched_rule(query);
        match Route::from(rule) {
            Route::Agent => {
                tracing::debug!(?rule, "routing to agent");
                let response = self.agent.process_query(query).await;
                RouteOutcome {
                    answer: response.answer,
                    mode: Mode::Agents,
                    sources: Vec::new(),
                    tools_used: response.tools_used,
                }
            }
            Route::Retrieve => {
                let composed = self.composer.answer(query).await;
                if !composed.grounded && self.index.count().await == 0 {
                    tracing::debug!("no documents indexed, falling back to general chat");
                    let response = self.agent.general_chat(query).await;
                    return RouteOutcome {
                        answer: response.answer,
                        mode: Mode::Agents,
                        sources: Vec::new(),
                        tools_used: response.tools_used,
                    };
                }
                RouteOutcome {
                    answer: composed.answer,
                    mode: Mode::Rag,
                    sources: composed.sources,
                    tools_used: Vec::new(),
                }
            }
        }
    }
}

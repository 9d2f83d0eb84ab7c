//! Tool path: direct calculator evaluation, model-assisted translation, general chat.

use std::sync::Arc;
use std::time::Duration;

use docent_llm::{LlmProvider, Message, call_with_timeout};
use docent_tools::calculator::{TOOL_ID, normalize_query};
use docent_tools::{CalculatorExecutor, ToolCall, ToolError, ToolExecutor, ToolOutput, ToolRegistry};

const CHAT_PROMPT: &str = "You are a helpful assistant. Answer concisely and accurately.";

const TRANSLATE_PROMPT: &str = "Translate the user's question into a single arithmetic \
expression and reply with only that expression, either inside a ```calc fenced block or as a \
calculator tool_call JSON object. If the question is not a calculation, reply with the word NONE.";

/// Conversation buffer replayed into general chat.
#[derive(Debug, Clone, Default)]
pub struct AgentMemory {
    messages: Vec<Message>,
}

impl AgentMemory {
    pub fn push(&mut self, user: &str, assistant: &str) {
        self.messages.push(Message::user(user));
        self.messages.push(Message::assistant(assistant));
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of recorded exchanges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len() / 2
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentResponse {
    pub answer: String,
    pub tools_used: Vec<String>,
}

impl AgentResponse {
    fn plain(answer: String) -> Self {
        Self {
            answer,
            tools_used: Vec::new(),
        }
    }
}

pub struct ToolAgent<P: LlmProvider> {
    provider: Arc<P>,
    calculator: CalculatorExecutor,
    registry: ToolRegistry,
    memory: AgentMemory,
    llm_timeout: Duration,
}

impl<P: LlmProvider> ToolAgent<P> {
    #[must_use]
    pub fn new(provider: Arc<P>, llm_timeout: Duration) -> Self {
        let calculator = CalculatorExecutor;
        let registry = ToolRegistry::from_definitions(calculator.tool_definitions());
        Self {
            provider,
            calculator,
            registry,
            memory: AgentMemory::default(),
            llm_timeout,
        }
    }

    #[must_use]
    pub fn memory(&self) -> &AgentMemory {
        &self.memory
    }

    pub fn clear_memory(&mut self) {
        self.memory.clear();
    }

    #[must_use]
    pub fn tools_available(&self) -> bool {
        !self.registry.is_empty()
    }

    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Answer a calculation-shaped query, falling back to general chat when nothing evaluates.
    pub async fn process_query(&mut self, query: &str) -> AgentResponse {
        if let Some(expression) = normalize_query(query) {
            match self.calculator.calculate(&expression) {
                Ok(output) => return self.record_tool(query, output),
                Err(e) => tracing::debug!(%expression, "direct evaluation failed: {e}"),
            }
        }

        if let Some(output) = self.translate_and_evaluate(query).await {
            return self.record_tool(query, output);
        }

        self.general_chat(query).await
    }

    /// Plain completion over the agent memory.
    pub async fn general_chat(&mut self, query: &str) -> AgentResponse {
        let mut messages = Vec::with_capacity(self.memory.messages().len() + 2);
        messages.push(Message::system(CHAT_PROMPT));
        messages.extend_from_slice(self.memory.messages());
        messages.push(Message::user(query));

        match call_with_timeout(self.llm_timeout, self.provider.chat(&messages)).await {
            Ok(answer) => {
                self.memory.push(query, &answer);
                AgentResponse::plain(answer)
            }
            Err(e) => {
                tracing::warn!("general chat failed: {e}");
                AgentResponse::plain(format!("An error occurred while generating the answer: {e}"))
            }
        }
    }

    async fn translate_and_evaluate(&self, query: &str) -> Option<ToolOutput> {
        let messages = [
            Message::system(format!(
                "{TRANSLATE_PROMPT}\n\n{}",
                self.registry.format_for_prompt()
            )),
            Message::user(query),
        ];
        let response = match call_with_timeout(self.llm_timeout, self.provider.chat(&messages)).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("expression translation failed: {e}");
                return None;
            }
        };

        if let Some(call) = ToolCall::from_response(&response) {
            return match self.run_tool_call(&call).await {
                Ok(output) => Some(output),
                Err(e) => {
                    tracing::debug!(tool = %call.tool_id, "tool call failed: {e}");
                    None
                }
            };
        }

        match self.calculator.execute(&response).await {
            Ok(Some(output)) => Some(output),
            Ok(None) => {
                let bare = response.trim();
                if bare.is_empty() || bare.eq_ignore_ascii_case("none") {
                    return None;
                }
                self.calculator.calculate(bare).ok()
            }
            Err(e) => {
                tracing::debug!("translated expression did not evaluate: {e}");
                None
            }
        }
    }

    /// Dispatch a structured call to the registered tool named by `tool_id`.
    async fn run_tool_call(&self, call: &ToolCall) -> Result<ToolOutput, ToolError> {
        if self.registry.find(&call.tool_id).is_none() {
            return Err(ToolError::UnknownTool(call.tool_id.clone()));
        }
        self.calculator
            .execute_tool_call(call)
            .await?
            .ok_or_else(|| ToolError::UnknownTool(call.tool_id.clone()))
    }

    fn record_tool(&mut self, query: &str, output: ToolOutput) -> AgentResponse {
        tracing::debug!(tool = %output.tool_name, summary = %output.summary, "tool answered");
        self.memory.push(query, &output.summary);
        AgentResponse {
            answer: output.summary,
            tools_used: vec![TOOL_ID.to_owned()],
        }
    }
}

#[cfg(test)]
mod tests {
    use docent_llm::Role;
    use docent_llm::mock::MockProvider;

    use super::*;

    fn agent(provider: MockProvider) -> ToolAgent<MockProvider> {
        ToolAgent::new(Arc::new(provider), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn percent_of_is_evaluated_without_the_model() {
        let provider = MockProvider::default();
        let mut a = agent(provider.clone());
        let response = a.process_query("what is 15% of 320?").await;
        assert!(response.answer.contains("48"), "{}", response.answer);
        assert_eq!(response.tools_used, vec!["calculator"]);
        assert!(provider.requests().is_empty());
        assert_eq!(a.memory().len(), 1);
    }

    #[tokio::test]
    async fn square_root_is_evaluated() {
        let mut a = agent(MockProvider::default());
        let response = a.process_query("square root of 16").await;
        assert!(response.answer.ends_with("= 4"), "{}", response.answer);
    }

    #[tokio::test]
    async fn model_translation_is_evaluated() {
        let provider = MockProvider::with_responses(vec!["```calc\n12 * 7\n```".into()]);
        let mut a = agent(provider.clone());
        let response = a.process_query("calculate a dozen weeks in days").await;
        assert_eq!(response.answer, "12 * 7 = 84");
        assert_eq!(response.tools_used, vec!["calculator"]);

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0][0].content.contains("<tools>"));
    }

    #[tokio::test]
    async fn bare_translation_is_evaluated() {
        let provider = MockProvider::with_responses(vec!["365 * 24".into()]);
        let mut a = agent(provider);
        let response = a.process_query("calculate the hours in a year").await;
        assert_eq!(response.answer, "365 * 24 = 8760");
    }

    #[tokio::test]
    async fn tool_call_translation_is_evaluated() {
        let provider = MockProvider::with_responses(vec![
            r#"{"tool_id": "calculator", "params": {"expression": "60 * 24"}}"#.into(),
        ]);
        let mut a = agent(provider);
        let response = a.process_query("calculate the minutes in a day").await;
        assert_eq!(response.answer, "60 * 24 = 1440");
        assert_eq!(response.tools_used, vec!["calculator"]);
    }

    #[tokio::test]
    async fn unknown_tool_call_falls_back_to_chat() {
        let provider = MockProvider::with_responses(vec![
            r#"{"tool_id": "shell", "params": {"cmd": "ls"}}"#.into(),
            "I can only calculate.".into(),
        ]);
        let mut a = agent(provider.clone());
        let response = a.process_query("calculate the files here").await;
        assert_eq!(response.answer, "I can only calculate.");
        assert!(response.tools_used.is_empty());
        assert_eq!(provider.requests().len(), 2);
    }

    #[tokio::test]
    async fn run_tool_call_rejects_unregistered_tool() {
        let a = agent(MockProvider::default());
        let call = ToolCall::from_response(r#"{"tool_id": "shell"}"#).unwrap();
        let err = a.run_tool_call(&call).await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(id) if id == "shell"));
    }

    #[tokio::test]
    async fn deeply_nested_query_does_not_overflow() {
        let provider = MockProvider::with_responses(vec!["NONE".into(), "Too deep.".into()]);
        let mut a = agent(provider);
        let query = format!("1+{}1{}", "(".repeat(5_000), ")".repeat(5_000));
        let response = a.process_query(&query).await;
        assert_eq!(response.answer, "Too deep.");
        assert!(response.tools_used.is_empty());
    }

    #[tokio::test]
    async fn unevaluable_query_falls_back_to_chat() {
        let provider =
            MockProvider::with_responses(vec!["NONE".into(), "Happy to help.".into()]);
        let mut a = agent(provider.clone());
        let response = a.process_query("calculate my happiness").await;
        assert_eq!(response.answer, "Happy to help.");
        assert!(response.tools_used.is_empty());
        assert_eq!(provider.requests().len(), 2);
    }

    #[tokio::test]
    async fn general_chat_replays_memory() {
        let provider = MockProvider::with_responses(vec!["first".into(), "second".into()]);
        let mut a = agent(provider.clone());
        a.general_chat("hello").await;
        a.general_chat("again").await;

        let requests = provider.requests();
        let last = &requests[1];
        assert_eq!(last.len(), 4);
        assert_eq!(last[1].role, Role::User);
        assert_eq!(last[1].content, "hello");
        assert_eq!(last[2].role, Role::Assistant);
        assert_eq!(last[2].content, "first");
        assert_eq!(last[3].content, "again");
    }

    #[tokio::test]
    async fn provider_failure_is_not_remembered() {
        let mut a = agent(MockProvider::failing());
        let response = a.general_chat("hello").await;
        assert!(response.answer.contains("error"));
        assert!(a.memory().is_empty());
    }

    #[tokio::test]
    async fn clear_memory_empties_buffer() {
        let mut a = agent(MockProvider::default());
        a.general_chat("hello").await;
        assert!(!a.memory().is_empty());
        a.clear_memory();
        assert!(a.memory().is_empty());
    }

    #[test]
    fn calculator_is_registered() {
        let a = agent(MockProvider::default());
        assert!(a.tools_available());
        assert!(a.registry().find("calculator").is_some());
    }
}

use std::collections::HashMap;
use std::fmt;

/// Structured tool invocation from the model.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ToolCall {
    pub tool_id: String,
    #[serde(default)]
    pub params: HashMap<String, serde_json::Value>,
}

impl ToolCall {
    /// Read a `{"tool_id": ..., "params": {...}}` reply, bare or inside a ` ```json ` fence.
    ///
    /// Returns `None` when the reply is not a JSON tool call.
    #[must_use]
    pub fn from_response(response: &str) -> Option<Self> {
        let body = extract_fenced_blocks(response, "json")
            .into_iter()
            .next()
            .unwrap_or_else(|| response.trim());
        if !body.starts_with('{') {
            return None;
        }
        serde_json::from_str(body).ok()
    }
}

/// Structured result from tool execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub tool_name: String,
    pub summary: String,
    pub blocks_executed: u32,
}

impl fmt::Display for ToolOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("could not parse expression at position {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("evaluation failed: {0}")]
    Evaluation(String),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid tool parameters: {message}")]
    InvalidParams { message: String },
}

/// Deserialize tool call params from a `HashMap<String, Value>` into a typed struct.
///
/// # Errors
///
/// Returns `ToolError::InvalidParams` when deserialization fails.
pub fn deserialize_params<T: serde::de::DeserializeOwned, S: std::hash::BuildHasher>(
    params: &HashMap<String, serde_json::Value, S>,
) -> Result<T, ToolError> {
    let obj =
        serde_json::Value::Object(params.iter().map(|(k, v)| (k.clone(), v.clone())).collect());
    serde_json::from_value(obj).map_err(|e| ToolError::InvalidParams {
        message: e.to_string(),
    })
}

/// Async trait for tool backends.
///
/// Accepts the full model response and returns `None` when it contains no invocation.
pub trait ToolExecutor: Send + Sync {
    fn execute(
        &self,
        response: &str,
    ) -> impl Future<Output = Result<Option<ToolOutput>, ToolError>> + Send;

    /// Tool definitions this executor can handle.
    fn tool_definitions(&self) -> Vec<crate::registry::ToolDef> {
        vec![]
    }

    /// Execute a structured tool call. Returns `None` if `tool_id` is not handled.
    fn execute_tool_call(
        &self,
        _call: &ToolCall,
    ) -> impl Future<Output = Result<Option<ToolOutput>, ToolError>> + Send {
        std::future::ready(Ok(None))
    }
}

/// Extract fenced code blocks with the given language marker from text.
///
/// Only exact tags count: with `lang = "calc"`, a `` ```calculator `` fence is skipped.
#[must_use]
pub fn extract_fenced_blocks<'a>(text: &'a str, lang: &str) -> Vec<&'a str> {
    let open = format!("```{lang}");
    let mut blocks = Vec::new();
    let mut rest = text;

    while let Some((_, tail)) = rest.split_once(open.as_str()) {
        if !tail.starts_with(char::is_whitespace) {
            rest = tail;
            continue;
        }
        let Some((body, after)) = tail.split_once("```") else {
            break;
        };
        blocks.push(body.trim());
        rest = after;
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_output_display() {
        let output = ToolOutput {
            tool_name: "calculator".to_owned(),
            summary: "2 + 2 = 4".to_owned(),
            blocks_executed: 1,
        };
        assert_eq!(output.to_string(), "2 + 2 = 4");
    }

    #[test]
    fn tool_error_parse_display() {
        let err = ToolError::Parse {
            position: 3,
            message: "unexpected ')'".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "could not parse expression at position 3: unexpected ')'"
        );
    }

    #[test]
    fn tool_error_evaluation_display() {
        let err = ToolError::Evaluation("division by zero".to_owned());
        assert_eq!(err.to_string(), "evaluation failed: division by zero");
    }

    #[test]
    fn deserialize_params_valid() {
        #[derive(Debug, serde::Deserialize, PartialEq)]
        struct P {
            expression: String,
        }
        let mut map = HashMap::new();
        map.insert("expression".to_owned(), serde_json::json!("1 + 1"));
        let p: P = deserialize_params(&map).unwrap();
        assert_eq!(p.expression, "1 + 1");
    }

    #[test]
    fn deserialize_params_missing_required_field() {
        #[derive(Debug, serde::Deserialize)]
        struct P {
            #[allow(dead_code)]
            expression: String,
        }
        let map: HashMap<String, serde_json::Value> = HashMap::new();
        let err = deserialize_params::<P, _>(&map).unwrap_err();
        assert!(matches!(err, ToolError::InvalidParams { .. }));
    }

    #[test]
    fn tool_call_from_bare_json() {
        let call =
            ToolCall::from_response(r#" {"tool_id": "calculator", "params": {"expression": "2*3"}} "#)
                .unwrap();
        assert_eq!(call.tool_id, "calculator");
        assert_eq!(call.params["expression"], serde_json::json!("2*3"));
    }

    #[test]
    fn tool_call_from_json_fence() {
        let call = ToolCall::from_response("```json\n{\"tool_id\": \"calculator\"}\n```").unwrap();
        assert_eq!(call.tool_id, "calculator");
        assert!(call.params.is_empty());
    }

    #[test]
    fn tool_call_rejects_other_replies() {
        assert!(ToolCall::from_response("NONE").is_none());
        assert!(ToolCall::from_response("```calc\n1+1\n```").is_none());
        assert!(ToolCall::from_response("{\"expression\": \"1+1\"}").is_none());
    }

    #[test]
    fn extract_single_block() {
        let text = "Sure:\n```calc\n15 / 100 * 320\n```\nDone.";
        assert_eq!(extract_fenced_blocks(text, "calc"), vec!["15 / 100 * 320"]);
    }

    #[test]
    fn extract_multiple_blocks() {
        let text = "```calc\n1+1\n```\ntext\n```calc\n2*3\n```";
        assert_eq!(extract_fenced_blocks(text, "calc"), vec!["1+1", "2*3"]);
    }

    #[test]
    fn extract_ignores_other_languages() {
        let text = "```python\nprint(1)\n```";
        assert!(extract_fenced_blocks(text, "calc").is_empty());
    }

    #[test]
    fn extract_requires_exact_tag() {
        let text = "```calculator\n1+1\n```\n```calc 2*3```";
        assert_eq!(extract_fenced_blocks(text, "calc"), vec!["2*3"]);
    }

    #[test]
    fn extract_unterminated_block() {
        assert!(extract_fenced_blocks("```calc\n1+1", "calc").is_empty());
    }
}

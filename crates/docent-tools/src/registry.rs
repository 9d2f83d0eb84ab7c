use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationHint {
    /// Tool invoked via ```{tag}\n...\n``` fenced block in the model response
    FencedBlock(&'static str),
    /// Tool invoked via structured `ToolCall` JSON
    ToolCall,
}

#[derive(Debug, Clone)]
pub struct ToolDef {
    pub id: &'static str,
    pub description: &'static str,
    pub schema: schemars::Schema,
    /// Accepted invocation forms, in the order they are advertised.
    pub invocations: &'static [InvocationHint],
}

#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDef>,
}

impl ToolRegistry {
    #[must_use]
    pub fn from_definitions(tools: Vec<ToolDef>) -> Self {
        Self { tools }
    }

    #[must_use]
    pub fn tools(&self) -> &[ToolDef] {
        &self.tools
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<&ToolDef> {
        self.tools.iter().find(|t| t.id == id)
    }

    #[must_use]
    pub fn format_for_prompt(&self) -> String {
        let mut out = String::from("<tools>\n");
        for tool in &self.tools {
            format_tool(&mut out, tool);
        }
        out.push_str("</tools>");
        out
    }
}

fn format_tool(out: &mut String, tool: &ToolDef) {
    let _ = writeln!(out, "## {}\n{}", tool.id, tool.description);
    for hint in tool.invocations {
        let _ = match hint {
            InvocationHint::FencedBlock(tag) => {
                writeln!(out, "Invocation: use ```{tag} fenced block")
            }
            InvocationHint::ToolCall => writeln!(
                out,
                "Invocation: use tool_call with {{\"tool_id\": \"{}\", \"params\": {{...}}}}",
                tool.id
            ),
        };
    }
    let params = schema_params(&tool.schema);
    if !params.is_empty() {
        out.push_str("Parameters:\n");
        for line in params {
            let _ = writeln!(out, "  - {line}");
        }
    }
    out.push('\n');
}

/// One `name: description (type, required|optional)` line per schema property.
fn schema_params(schema: &schemars::Schema) -> Vec<String> {
    let Some(root) = schema.as_object() else {
        return Vec::new();
    };
    let Some(props) = root.get("properties").and_then(|p| p.as_object()) else {
        return Vec::new();
    };
    let required: Vec<&str> = root
        .get("required")
        .and_then(|r| r.as_array())
        .into_iter()
        .flatten()
        .filter_map(|v| v.as_str())
        .collect();

    props
        .iter()
        .map(|(name, prop)| {
            let field = |key: &str| prop.get(key).and_then(|v| v.as_str());
            let presence = if required.contains(&name.as_str()) {
                "required"
            } else {
                "optional"
            };
            format!(
                "{name}: {} ({}, {presence})",
                field("description").unwrap_or_default(),
                field("type").unwrap_or("string")
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::CalculatorParams;

    fn sample_tools() -> Vec<ToolDef> {
        vec![
            ToolDef {
                id: "calculator",
                description: "Evaluate an arithmetic expression",
                schema: schemars::schema_for!(CalculatorParams),
                invocations: &[InvocationHint::FencedBlock("calc")],
            },
            ToolDef {
                id: "structured_calculator",
                description: "Evaluate via tool call",
                schema: schemars::schema_for!(CalculatorParams),
                invocations: &[InvocationHint::ToolCall],
            },
        ]
    }

    #[test]
    fn default_registry_is_empty() {
        let reg = ToolRegistry::default();
        assert!(reg.is_empty());
        assert!(reg.tools().is_empty());
    }

    #[test]
    fn find_existing_tool() {
        let reg = ToolRegistry::from_definitions(sample_tools());
        assert!(reg.find("calculator").is_some());
        assert!(reg.find("nonexistent").is_none());
    }

    #[test]
    fn format_for_prompt_lists_tools() {
        let prompt = ToolRegistry::from_definitions(sample_tools()).format_for_prompt();
        assert!(prompt.starts_with("<tools>"));
        assert!(prompt.ends_with("</tools>"));
        assert!(prompt.contains("## calculator"));
        assert!(prompt.contains("Invocation: use ```calc fenced block"));
        assert!(prompt.contains("\"tool_id\": \"structured_calculator\""));
    }

    #[test]
    fn format_for_prompt_shows_param_info() {
        let prompt = ToolRegistry::from_definitions(sample_tools()).format_for_prompt();
        assert!(prompt.contains("expression:"));
        assert!(prompt.contains("(string, required)"));
    }

    #[test]
    fn empty_registry_prompt() {
        assert_eq!(ToolRegistry::default().format_for_prompt(), "<tools>\n</tools>");
    }
}

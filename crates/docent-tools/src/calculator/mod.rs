mod eval;
mod normalize;

use schemars::JsonSchema;
use serde::Deserialize;

use crate::executor::{
    ToolCall, ToolError, ToolExecutor, ToolOutput, deserialize_params, extract_fenced_blocks,
};
use crate::registry::{InvocationHint, ToolDef};

pub use self::eval::evaluate;
pub use self::normalize::{fold_full_width, normalize_query};

pub const TOOL_ID: &str = "calculator";
pub const FENCE_TAG: &str = "calc";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CalculatorParams {
    /// Arithmetic expression, e.g. `15/100*320` or `sqrt(16)`
    pub expression: String,
}

/// Render a result without float noise: integral values print as integers.
#[must_use]
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        // `+ 0.0` folds negative zero.
        return format!("{:.0}", value + 0.0);
    }
    let fixed = format!("{value:.10}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".into()
    } else {
        trimmed.to_owned()
    }
}

/// Evaluates arithmetic from ` ```calc ` blocks or structured `calculator` tool calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalculatorExecutor;

impl CalculatorExecutor {
    /// Evaluate one expression into a `"<expr> = <value>"` summary.
    ///
    /// # Errors
    ///
    /// Returns the parse or evaluation error for `expression`.
    pub fn calculate(&self, expression: &str) -> Result<ToolOutput, ToolError> {
        let expression = expression.trim();
        let value = evaluate(expression)?;
        tracing::debug!(expression, value, "calculator evaluated");
        Ok(ToolOutput {
            tool_name: TOOL_ID.to_owned(),
            summary: format!("{expression} = {}", format_number(value)),
            blocks_executed: 1,
        })
    }
}

impl ToolExecutor for CalculatorExecutor {
    fn tool_definitions(&self) -> Vec<ToolDef> {
        vec![ToolDef {
            id: TOOL_ID,
            description: "Evaluate an arithmetic expression. Supports + - * / ^ and postfix % \
                          (percent), parentheses, sqrt, abs, ln, log10, log2, exp, sin, cos, tan, \
                          floor, ceil, round, pi and e.\n\
                          Examples: \"15% of 320\" -> 15/100*320; \"square root of 25\" -> \
                          sqrt(25); \"2 to the power of 3\" -> 2^3",
            schema: schemars::schema_for!(CalculatorParams),
            invocations: &[InvocationHint::FencedBlock(FENCE_TAG), InvocationHint::ToolCall],
        }]
    }

    async fn execute(&self, response: &str) -> Result<Option<ToolOutput>, ToolError> {
        let blocks = extract_fenced_blocks(response, FENCE_TAG);
        if blocks.is_empty() {
            return Ok(None);
        }

        let mut summaries = Vec::with_capacity(blocks.len());
        for block in &blocks {
            summaries.push(self.calculate(block)?.summary);
        }

        Ok(Some(ToolOutput {
            tool_name: TOOL_ID.to_owned(),
            summary: summaries.join("\n"),
            blocks_executed: u32::try_from(blocks.len()).unwrap_or(u32::MAX),
        }))
    }

    async fn execute_tool_call(&self, call: &ToolCall) -> Result<Option<ToolOutput>, ToolError> {
        if call.tool_id != TOOL_ID {
            return Ok(None);
        }
        let params: CalculatorParams = deserialize_params(&call.params)?;
        self.calculate(&params.expression).map(Some)
    }
}

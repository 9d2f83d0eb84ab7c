//! Calculator tool, tool registry, and the executor abstraction used by the agent path.

pub mod calculator;
pub mod executor;
pub mod registry;

pub use calculator::CalculatorExecutor;
pub use executor::{ToolCall, ToolError, ToolExecutor, ToolOutput, extract_fenced_blocks};
pub use registry::{InvocationHint, ToolDef, ToolRegistry};

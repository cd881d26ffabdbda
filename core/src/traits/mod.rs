pub mod provider;
pub mod tool;

pub use provider::{ChatRequest, FunctionCall, Message, Provider, Role, ToolCall};
pub use tool::{Tool, ToolOutput, ToolSpec};
